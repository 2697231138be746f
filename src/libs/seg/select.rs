use super::llik::ScoreMatrix;

/// Outcome of the dynamic program.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Length-n boolean vector; position n-1 is always set.
    pub breakpoints: Vec<bool>,
    /// Improving rounds accepted past the single-boundary baseline;
    /// equals the number of interior breakpoints.
    pub rounds: usize,
    /// Full-sequence score of the accepted segmentation. NaN when even
    /// the baseline cell (0, n-1) was undefined.
    pub total: f64,
}

/// Pick a multi-breakpoint segmentation by dynamic programming over
/// rounds, each round adding one interior breakpoint.
///
/// Round 0 anchors a single boundary at j: best[j] = score(0,j). Round
/// r then considers, for each end j >= 3r+2, every start i in
/// [3r, j-2]: the candidate value is best_prev[i-1] + score(i,j), ties
/// broken toward the smallest i, and the trace for j becomes the
/// previous round's trace at i-1 plus the boundary i-1. The search
/// stops at the first round whose full-sequence total fails to strictly
/// improve on the previous round's, and returns the previous round's
/// trace. A hard cap of n/3 rounds (the minimum viable segment length)
/// bounds the search even if totals keep creeping upward.
pub fn select(scores: &ScoreMatrix) -> Selection {
    let n = scores.size();
    let max_rounds = n / 3;

    // Round 0. Undefined cells surface as NaN, which loses every
    // comparison below, exactly like the -inf candidates.
    let mut best: Vec<f64> = (0..n)
        .map(|j| scores.get(0, j).unwrap_or(f64::NAN))
        .collect();
    let mut trace: Vec<Vec<bool>> = vec![vec![false; n]; n];

    let mut full = best[n - 1];
    let mut accepted: Vec<bool> = vec![false; n];
    let mut accepted_total = full;
    let mut accepted_rounds = 0;

    for round in 1..=max_rounds {
        let prev_best = best.clone();
        let prev_trace = trace.clone();

        let lo = 3 * round;
        if lo + 2 >= n {
            break;
        }

        for j in (lo + 2)..n {
            let mut top_value = f64::NEG_INFINITY;
            let mut top_start = usize::MAX;

            for i in lo..=(j - 2) {
                let Some(cell) = scores.get(i, j) else {
                    continue;
                };
                let candidate = prev_best[i - 1] + cell;
                if candidate > top_value {
                    top_value = candidate;
                    top_start = i;
                }
            }

            best[j] = top_value;
            if top_start != usize::MAX {
                let mut row = prev_trace[top_start - 1].clone();
                row[top_start - 1] = true;
                trace[j] = row;
            }
        }

        let new_full = best[n - 1];
        // The first round that fails to strictly improve the
        // full-sequence total ends the search; NaN never improves.
        if !(new_full > full) {
            break;
        }

        full = new_full;
        accepted = trace[n - 1].clone();
        accepted_total = full;
        accepted_rounds = round;
    }

    accepted[n - 1] = true;

    Selection {
        breakpoints: accepted,
        rounds: accepted_rounds,
        total: accepted_total,
    }
}
