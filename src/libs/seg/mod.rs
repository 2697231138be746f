//! Maximum-likelihood breakpoint detection in symmetric count matrices.
//!
//! Expected cell values decay (or grow) log-linearly with distance from
//! the main diagonal; each segment between two boundaries gets its own
//! 2-parameter Poisson model. The engine scores every eligible boundary
//! pair and picks a segmentation by dynamic programming.

pub mod blocks;
pub mod error;
pub mod filter;
pub mod llik;
pub mod model;
pub mod select;

pub use error::SegError;
pub use model::ModelParams;

use crate::libs::matrix::{distance_matrix, ObservationSet};

/// Options for a detection run.
#[derive(Debug, Clone, Default)]
pub struct DetectOpts {
    /// Restrict the pair search to local maxima of the single-breakpoint
    /// scan. An approximation that trades exactness for an O(n^2) to
    /// O(k^2) reduction; the exhaustive search never scores lower.
    pub fast: bool,
}

/// The sole artifact of a run.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Length-n boolean vector marking detected boundaries; position
    /// n-1 is always set.
    pub breakpoints: Vec<bool>,
    /// Full-sequence score of the accepted segmentation.
    pub total: f64,
    /// Improving selection rounds accepted past the single-boundary
    /// baseline.
    pub rounds: usize,
    /// Breakpoint pairs whose likelihood was computed.
    pub evaluated_cells: usize,
    /// Evaluated pairs whose fits failed; their cells stayed undefined.
    pub failed_cells: usize,
}

impl Segmentation {
    /// 0-based positions of the detected boundaries, ascending.
    pub fn positions(&self) -> Vec<usize> {
        self.breakpoints
            .iter()
            .enumerate()
            .filter(|(_, &set)| set)
            .map(|(pos, _)| pos)
            .collect()
    }
}

/// Detect domain boundaries in a set of replicate count matrices.
///
/// Builds the distance-to-diagonal matrix, optionally reduces the
/// candidate set, scores every eligible breakpoint pair, and selects
/// the best segmentation. Numeric failures are absorbed per cell and
/// reported via `failed_cells`; only allocation failure aborts the run.
pub fn detect(obs: &ObservationSet, opts: &DetectOpts) -> Result<Segmentation, SegError> {
    let n = obs.size();
    let dis = distance_matrix(n);

    let mask = if opts.fast {
        filter::reduce(obs, &dis)?
    } else {
        vec![true; n]
    };

    let (scores, stats) = llik::build_scores(obs, &dis, &mask)?;
    if stats.failed > 0 {
        log::warn!(
            "{} of {} likelihood cells were unusable; they were excluded from selection",
            stats.failed,
            stats.evaluated
        );
    }

    let sel = select::select(&scores);
    log::info!(
        "accepted {} interior boundaries, total score {}",
        sel.rounds,
        sel.total
    );

    Ok(Segmentation {
        breakpoints: sel.breakpoints,
        total: sel.total,
        rounds: sel.rounds,
        evaluated_cells: stats.evaluated,
        failed_cells: stats.failed,
    })
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::libs::matrix::SquareMatrix;
    use rand::rngs::SmallRng;
    use rand::Rng;

    /// Expected counts for a matrix with two diagonal blocks.
    ///
    /// Positions 0..=split follow (a,b) of `first`, positions after
    /// `split` follow `second`, and cross entries follow `cross`; every
    /// rate is exp(a + b * |r - c|).
    pub fn two_segment_matrix(
        n: usize,
        split: usize,
        first: (f64, f64),
        second: (f64, f64),
        cross: (f64, f64),
    ) -> SquareMatrix {
        let mut mat = SquareMatrix::zeros(n);
        for r in 0..n {
            for c in 0..n {
                let (a, b) = if r <= split && c <= split {
                    first
                } else if r > split && c > split {
                    second
                } else {
                    cross
                };
                let d = (r as f64 - c as f64).abs();
                mat.set(r, c, (a + b * d).exp());
            }
        }

        mat
    }

    /// Replace every expected count with a Poisson draw, keeping the
    /// matrix symmetric.
    pub fn poissonize(mat: &SquareMatrix, rng: &mut SmallRng) -> SquareMatrix {
        let n = mat.size();
        let mut noisy = SquareMatrix::zeros(n);
        for r in 0..n {
            for c in r..n {
                let k = poisson(mat.get(r, c), rng);
                noisy.set(r, c, k);
                noisy.set(c, r, k);
            }
        }

        noisy
    }

    // Knuth's method; the rates in these tests stay far below the
    // range where it loses precision.
    fn poisson(lambda: f64, rng: &mut SmallRng) -> f64 {
        let limit = (-lambda).exp();
        let mut k = 0.0;
        let mut p = 1.0;
        loop {
            p *= rng.gen::<f64>();
            if p <= limit {
                return k;
            }
            k += 1.0;
        }
    }
}
