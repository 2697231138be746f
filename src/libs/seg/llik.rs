use itertools::Itertools;
use rayon::prelude::*;

use super::blocks::{partition, BlockBuffers};
use super::error::SegError;
use super::model::{fit_block, ModelParams};
use crate::libs::matrix::{ObservationSet, SquareMatrix};

/// Upper-triangular score matrix over breakpoint pairs.
///
/// Entry (i,j) holds the best 3-segment score for breakpoints at i and
/// j. NaN is the sentinel for "undefined" - never evaluated, masked
/// out, too close (j < i+2), or failed - and the accessor hides it
/// behind `Option` so undefined cells cannot leak into the selector.
pub struct ScoreMatrix {
    size: usize,
    data: Vec<f64>,
}

impl ScoreMatrix {
    pub(crate) fn new(size: usize) -> Result<Self, SegError> {
        let len = size * size;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| SegError::Resource {
            what: "score matrix",
            bytes: len * std::mem::size_of::<f64>(),
        })?;
        data.resize(len, f64::NAN);

        Ok(Self { size, data })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let value = self.data[i * self.size + j];
        if value.is_nan() {
            None
        } else {
            Some(value)
        }
    }

    pub(crate) fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.size + j] = value;
    }
}

/// Build-phase accounting, reported on the final result.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildStats {
    /// Breakpoint pairs whose likelihood was computed.
    pub evaluated: usize,
    /// Evaluated pairs whose fits failed; their cells stayed undefined.
    pub failed: usize,
}

struct Workspace {
    d_blk: BlockBuffers,
    k_blk: BlockBuffers,
}

impl Workspace {
    fn new(size: usize) -> Result<Self, SegError> {
        Ok(Self {
            d_blk: BlockBuffers::new(size)?,
            k_blk: BlockBuffers::new(size)?,
        })
    }
}

/// Compute the 3-segment score for every eligible breakpoint pair.
///
/// A pair (i,j) is eligible when j >= i+2, the end j is a candidate,
/// and the start i either is 0 or follows a candidate boundary at i-1.
/// Each cell sums, over replicates, the top fit halved, the triangular
/// fit, and the bottom fit halved; the halving keeps shared edges of
/// overlapping splits from counting twice. Cells are independent, so
/// pairs are fanned out across the rayon pool with per-worker scratch
/// buffers; per-block seeds restart from zero on every cell so results
/// do not depend on how work was distributed.
pub fn build_scores(
    obs: &ObservationSet,
    dis: &SquareMatrix,
    mask: &[bool],
) -> Result<(ScoreMatrix, BuildStats), SegError> {
    let n = dis.size();
    debug_assert_eq!(mask.len(), n);

    let mut scores = ScoreMatrix::new(n)?;
    // Probe one worker's allocation up front so an impossible dimension
    // fails before the pool spins up.
    Workspace::new(n)?;

    let pairs: Vec<(usize, usize)> = (0..n)
        .cartesian_product(0..n)
        .filter(|&(i, j)| j >= i + 2 && mask[j] && (i == 0 || mask[i - 1]))
        .collect();

    let cells: Vec<Option<f64>> = pairs
        .par_iter()
        .map_init(
            || Workspace::new(n).unwrap(),
            |ws, &(i, j)| eval_cell(obs, dis, ws, i, j),
        )
        .collect();

    let mut stats = BuildStats::default();
    for (&(i, j), cell) in pairs.iter().zip(cells) {
        stats.evaluated += 1;
        match cell {
            Some(value) => scores.set(i, j, value),
            None => stats.failed += 1,
        }
    }

    log::debug!(
        "scored {} breakpoint pairs, {} unusable",
        stats.evaluated,
        stats.failed
    );

    Ok((scores, stats))
}

/// One cell: partition the distance matrix and every replicate at
/// (i,j), fit the three blocks per replicate, and accumulate. Any fit
/// failure leaves the whole cell undefined.
fn eval_cell(
    obs: &ObservationSet,
    dis: &SquareMatrix,
    ws: &mut Workspace,
    i: usize,
    j: usize,
) -> Option<f64> {
    partition(dis, i, j, &mut ws.d_blk);

    let mut seeds = [ModelParams::default(); 3];
    let mut acc = 0.0;
    for mat in obs.iter() {
        partition(mat, i, j, &mut ws.k_blk);

        let top = fit_block(&ws.k_blk.top, &ws.d_blk.top, &mut seeds[0]).ok()?;
        let tri = fit_block(&ws.k_blk.tri, &ws.d_blk.tri, &mut seeds[1]).ok()?;
        let bot = fit_block(&ws.k_blk.bot, &ws.d_blk.bot, &mut seeds[2]).ok()?;

        acc += top / 2.0 + tri + bot / 2.0;
    }

    Some(acc)
}
