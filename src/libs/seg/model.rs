use super::error::SegError;

/// Convergence threshold on the squared gradient norm f^2 + g^2.
pub const TOLERANCE: f64 = 1e-6;

const MAX_ITERS: usize = 100;
const MAX_HALVINGS: usize = 64;

/// Parameters of the log-linear rate lambda(d) = exp(a + b * d).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModelParams {
    pub a: f64,
    pub b: f64,
}

/// A successful fit: the parameters and the segment score evaluated at them.
#[derive(Debug, Clone, Copy)]
pub struct SegmentFit {
    pub params: ModelParams,
    pub score: f64,
}

/// Gradient pair of the Poisson log-likelihood, evaluated at
/// (a + da, b + db). Pure in its inputs so the step-halving loop can
/// probe trial steps without touching the committed parameters.
fn gradient(a: f64, b: f64, da: f64, db: f64, counts: &[f64], dists: &[f64]) -> (f64, f64) {
    let mut f = 0.0;
    let mut g = 0.0;
    for (k, d) in counts.iter().zip(dists.iter()) {
        let tmp = (a + da + (b + db) * d).exp() - k;
        f += tmp;
        g += tmp * d;
    }

    (f, g)
}

/// Fit lambda_i = exp(a + b * d_i) to `counts` by maximum likelihood.
///
/// Newton-Raphson on the gradient pair f = sum(lambda_i - k_i),
/// g = sum((lambda_i - k_i) * d_i), with the analytic 2x2 Hessian and a
/// step-halving safeguard: the step is halved until the squared gradient
/// norm stops increasing, then committed.
///
/// Returns the fitted parameters together with
/// sum(exp(a + b*d_i) + k_i * (a + b*d_i)). The exponential term enters
/// with a positive sign; the value is not the log-likelihood itself but
/// is comparable across all candidate splits, which is the only use it
/// is put to.
///
/// The segment must be non-empty; callers skip zero-length segments.
pub fn fit(counts: &[f64], dists: &[f64], seed: ModelParams) -> Result<SegmentFit, SegError> {
    debug_assert_eq!(counts.len(), dists.len());
    debug_assert!(!counts.is_empty());

    // With no counts at all the likelihood climbs forever as a goes to
    // negative infinity; there is nothing to estimate.
    if counts.iter().sum::<f64>() == 0.0 {
        return Err(SegError::Degenerate { len: counts.len() });
    }

    let ModelParams { mut a, mut b } = seed;
    let (mut f, mut g) = gradient(a, b, 0.0, 0.0, counts, dists);

    let mut iters = 0;
    loop {
        let oldgrad = f * f + g * g;
        if !oldgrad.is_finite() {
            return Err(SegError::NonConvergence { iters });
        }
        if oldgrad < TOLERANCE {
            break;
        }
        if iters == MAX_ITERS {
            return Err(SegError::NonConvergence { iters });
        }
        iters += 1;

        // Analytic Hessian at the committed (a, b).
        let mut dfda = 0.0;
        let mut dgda = 0.0;
        let mut dgdb = 0.0;
        for d in dists.iter() {
            let tmp = (a + b * d).exp();
            dfda += tmp;
            dgda += tmp * d;
            dgdb += tmp * d * d;
        }
        let dfdb = dgda;

        let denom = dfdb * dgda - dfda * dgdb;
        let scale = dfda * dgdb + dgda * dgda;
        if !denom.is_finite() || denom.abs() <= f64::EPSILON * scale {
            return Err(SegError::Degenerate { len: counts.len() });
        }

        let mut da = (f * dgdb - g * dfdb) / denom;
        let mut db = (g * dfda - f * dgda) / denom;

        let (mut new_f, mut new_g) = gradient(a, b, da, db, counts, dists);

        // Halve the step while it fails to descend the gradient norm.
        let mut halvings = 0;
        while new_f * new_f + new_g * new_g > oldgrad {
            if halvings == MAX_HALVINGS {
                return Err(SegError::NonConvergence { iters });
            }
            halvings += 1;
            da /= 2.0;
            db /= 2.0;
            let (hf, hg) = gradient(a, b, da, db, counts, dists);
            new_f = hf;
            new_g = hg;
        }

        a += da;
        b += db;
        f = new_f;
        g = new_g;
    }

    let mut score = 0.0;
    for (k, d) in counts.iter().zip(dists.iter()) {
        let eta = a + b * d;
        score += eta.exp() + k * eta;
    }

    Ok(SegmentFit {
        params: ModelParams { a, b },
        score,
    })
}

/// Fit one partitioned block, warm-starting from and updating `seed`.
///
/// Empty blocks are the caller's "skip" case and contribute a zero score.
pub fn fit_block(counts: &[f64], dists: &[f64], seed: &mut ModelParams) -> Result<f64, SegError> {
    if counts.is_empty() {
        return Ok(0.0);
    }

    let res = fit(counts, dists, *seed)?;
    *seed = res.params;

    Ok(res.score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn exact_counts(a: f64, b: f64, dists: &[f64]) -> Vec<f64> {
        dists.iter().map(|d| (a + b * d).exp()).collect()
    }

    #[test]
    fn test_fit_recovers_parameters() {
        let dists: Vec<f64> = (0..30).map(|d| d as f64).collect();
        let counts = exact_counts(2.0, -0.3, &dists);

        let res = fit(&counts, &dists, ModelParams::default()).unwrap();
        assert_relative_eq!(res.params.a, 2.0, epsilon = 1e-3);
        assert_relative_eq!(res.params.b, -0.3, epsilon = 1e-3);

        // Growing rates are as legitimate as decaying ones.
        let counts = exact_counts(0.5, 0.2, &dists[..12]);
        let res = fit(&counts, &dists[..12], ModelParams::default()).unwrap();
        assert_relative_eq!(res.params.a, 0.5, epsilon = 1e-3);
        assert_relative_eq!(res.params.b, 0.2, epsilon = 1e-3);
    }

    #[test]
    fn test_fit_score_convention() {
        let dists: Vec<f64> = (1..20).map(|d| d as f64).collect();
        let counts = exact_counts(1.5, -0.2, &dists);

        let res = fit(&counts, &dists, ModelParams::default()).unwrap();
        let expected: f64 = counts
            .iter()
            .zip(dists.iter())
            .map(|(k, d)| {
                let eta = res.params.a + res.params.b * d;
                eta.exp() + k * eta
            })
            .sum();
        assert_relative_eq!(res.score, expected);
    }

    #[test]
    fn test_fit_warm_start() {
        let dists: Vec<f64> = (0..15).map(|d| d as f64).collect();
        let counts = exact_counts(1.0, -0.1, &dists);

        let cold = fit(&counts, &dists, ModelParams::default()).unwrap();
        let warm = fit(&counts, &dists, cold.params).unwrap();
        assert_relative_eq!(warm.score, cold.score, epsilon = 1e-9);
    }

    #[test]
    fn test_fit_degenerate_inputs() {
        // Constant distances make the Hessian singular.
        let dists = vec![2.0, 2.0, 2.0, 2.0];
        let counts = vec![3.0, 4.0, 5.0, 4.0];
        assert!(matches!(
            fit(&counts, &dists, ModelParams::default()),
            Err(SegError::Degenerate { .. })
        ));

        // A single cell cannot pin down two parameters.
        assert!(matches!(
            fit(&[5.0], &[1.0], ModelParams::default()),
            Err(SegError::Degenerate { .. })
        ));

        // All-zero counts have no maximum-likelihood estimate.
        let dists = vec![1.0, 2.0, 3.0];
        assert!(matches!(
            fit(&[0.0, 0.0, 0.0], &dists, ModelParams::default()),
            Err(SegError::Degenerate { len: 3 })
        ));
    }

    #[test]
    fn test_fit_block_skips_empty() {
        let mut seed = ModelParams::default();
        assert_eq!(fit_block(&[], &[], &mut seed).unwrap(), 0.0);
        assert_eq!(seed, ModelParams::default());
    }
}
