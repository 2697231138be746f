extern crate clap;
use clap::*;

mod cmd_domseg;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let app = Command::new("domseg")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`domseg` - DOMain SEGmentation of contact matrices")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_domseg::detect::make_subcommand())
        .subcommand(cmd_domseg::scan::make_subcommand())
        .after_help(
            r###"Subcommands:

* detect - Detect domain boundaries in count matrices
* scan   - Single-breakpoint likelihood profile

Matrices are whitespace-separated numeric text, one row per line,
optionally gzipped. Pass several files to treat them as replicates.

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("detect", sub_matches)) => cmd_domseg::detect::execute(sub_matches),
        Some(("scan", sub_matches)) => cmd_domseg::scan::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
