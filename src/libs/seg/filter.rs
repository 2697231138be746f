use super::blocks::{partition, BlockBuffers};
use super::error::SegError;
use super::model::{fit_block, ModelParams};
use crate::libs::matrix::{ObservationSet, SquareMatrix};

/// Combined two-segment score for every single split position.
///
/// The forward pass scores the segment [0, j] for j in [2, n-1]; the
/// backward pass scores the segment [j, n-1] for j in [3, n-4] and adds
/// the result at position j-1, the boundary preceding the segment.
/// Boundary blocks enter halved, the same convention the pairwise build
/// uses. Positions never scanned stay NaN, as does any position whose
/// fit failed.
pub fn single_break_scores(
    obs: &ObservationSet,
    dis: &SquareMatrix,
) -> Result<Vec<f64>, SegError> {
    let n = dis.size();
    let mut scores = vec![f64::NAN; n];

    let mut d_blk = BlockBuffers::new(n)?;
    let mut k_blk = BlockBuffers::new(n)?;
    let mut seeds = [ModelParams::default(); 3];

    // Score the first segment, scanning forward.
    for j in 2..n {
        partition(dis, 0, j, &mut d_blk);

        let mut acc = 0.0;
        for mat in obs.iter() {
            partition(mat, 0, j, &mut k_blk);
            acc += block_score(&k_blk.tri, &d_blk.tri, &mut seeds[1])
                + block_score(&k_blk.bot, &d_blk.bot, &mut seeds[2]) / 2.0;
        }
        scores[j] = acc;
    }

    // ... and the second segment, scanning backward.
    for j in 3..n.saturating_sub(3) {
        partition(dis, j, n - 1, &mut d_blk);

        let mut acc = 0.0;
        for mat in obs.iter() {
            partition(mat, j, n - 1, &mut k_blk);
            acc += block_score(&k_blk.top, &d_blk.top, &mut seeds[0]) / 2.0
                + block_score(&k_blk.tri, &d_blk.tri, &mut seeds[1]);
        }
        scores[j - 1] += acc;
    }

    Ok(scores)
}

fn block_score(counts: &[f64], dists: &[f64], seed: &mut ModelParams) -> f64 {
    fit_block(counts, dists, seed).unwrap_or(f64::NAN)
}

/// Restrict the breakpoint search to local maxima of the
/// single-breakpoint scan.
///
/// A position in [3, n-2] is a candidate iff its score strictly exceeds
/// both neighbors'; position n-1 always is. This trims the O(n^2) pair
/// search to the surviving maxima - an approximation of the exhaustive
/// scan, not an equivalent.
pub fn reduce(obs: &ObservationSet, dis: &SquareMatrix) -> Result<Vec<bool>, SegError> {
    let n = dis.size();
    let scores = single_break_scores(obs, dis)?;

    let mut mask = vec![false; n];
    mask[n - 1] = true;
    for q in 3..(n - 1) {
        // NaN scores fail both comparisons and drop out here.
        if scores[q] > scores[q - 1] && scores[q] > scores[q + 1] {
            mask[q] = true;
        }
    }

    let kept = mask.iter().filter(|&&m| m).count();
    log::debug!("candidate filter kept {} of {} positions", kept, n);

    Ok(mask)
}
