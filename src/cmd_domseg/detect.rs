use anyhow::Context;
use clap::*;
use domseg::libs::matrix::{ObservationSet, SquareMatrix};
use domseg::libs::seg::{detect, DetectOpts};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("detect")
        .about("Detect domain boundaries in count matrices")
        .after_help(
            r###"
Detects boundaries between domains in symmetric count matrices whose
expected values change log-linearly with distance from the diagonal.
Each segment gets its own Poisson fit; boundaries are chosen by
dynamic programming over the pairwise segment likelihoods.

Notes:
* All input matrices are replicates of one experiment and must share
  one dimension.
* Output: detected boundary positions (0-based), one per line. The
  last position of the matrix is always reported.
* --fast restricts the search to local maxima of a single-boundary
  scan. This is an approximation: it can miss boundaries the
  exhaustive search finds, but cuts the quadratic pair scan down to
  the surviving candidates.

Examples:
1. Detect boundaries in a contact map:
   domseg detect matrix.tsv -o boundaries.txt

2. Two replicates, heuristic search, 4 threads:
   domseg detect rep1.tsv rep2.tsv --fast --parallel 4

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
            Arg::new("fast")
                .long("fast")
                .action(ArgAction::SetTrue)
                .help("Heuristic candidate filtering (approximate)"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .value_parser(value_parser!(usize))
                .num_args(1)
                .default_value("1")
                .help("Number of threads for parallel processing"),
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
    let is_fast = args.get_flag("fast");

    // Set the number of threads for rayon
    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    rayon::ThreadPoolBuilder::new()
        .num_threads(opt_parallel)
        .build_global()?;

    //----------------------------
    // Load matrices
    //----------------------------
    let mut mats = vec![];
    for infile in args.get_many::<String>("infiles").unwrap() {
        let mat = SquareMatrix::from_file(infile)
            .with_context(|| format!("loading matrix from {}", infile))?;
        mats.push(mat);
    }
    let obs = ObservationSet::try_new(mats)?;

    //----------------------------
    // Detect
    //----------------------------
    let seg = detect(&obs, &DetectOpts { fast: is_fast })?;
    if seg.failed_cells > 0 {
        eprintln!(
            "warning: {} of {} likelihood cells were unusable",
            seg.failed_cells, seg.evaluated_cells
        );
    }

    //----------------------------
    // Output
    //----------------------------
    let mut writer = domseg::writer(outfile);
    for pos in seg.positions() {
        writer.write_all(format!("{}\n", pos).as_ref())?;
    }

    Ok(())
}
