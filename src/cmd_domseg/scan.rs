use anyhow::Context;
use clap::*;
use domseg::libs::matrix::{distance_matrix, ObservationSet, SquareMatrix};
use domseg::libs::seg::filter::single_break_scores;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("scan")
        .about("Single-breakpoint likelihood profile")
        .after_help(
            r###"
Scores every single split position of the matrix: the combined
likelihood of the segment before the split and the segment after it.
Peaks of this profile are where the candidate filter of `detect
--fast` looks for boundaries.

Notes:
* Output: TSV of `position score`, one line per position. Positions
  the scan never reaches print NaN.

Examples:
1. Profile a contact map:
   domseg scan matrix.tsv -o profile.tsv

"###,
        )
        .arg(
            Arg::new("infiles")
                .required(true)
                .num_args(1..)
                .index(1)
                .help("Input matrix file(s). [stdin] for standard input"),
        )
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let outfile = args.get_one::<String>("outfile").unwrap();

    let mut mats = vec![];
    for infile in args.get_many::<String>("infiles").unwrap() {
        let mat = SquareMatrix::from_file(infile)
            .with_context(|| format!("loading matrix from {}", infile))?;
        mats.push(mat);
    }
    let obs = ObservationSet::try_new(mats)?;

    //----------------------------
    // Scan
    //----------------------------
    let dis = distance_matrix(obs.size());
    let scores = single_break_scores(&obs, &dis)?;

    //----------------------------
    // Output
    //----------------------------
    let mut writer = domseg::writer(outfile);
    for (pos, score) in scores.iter().enumerate() {
        writer.write_all(format!("{}\t{}\n", pos, score).as_ref())?;
    }

    Ok(())
}
