//! Trapezoidal integration helpers.
//!
//! Integrands are plain closures so any unary function (analytic curve,
//! LUT lookup, method on a device) can be integrated without tying the
//! helper to a particular type.

/// Integrate `f` over `[lower, upper]` using `n` equal trapezoids.
pub fn trapezoid<F>(f: F, lower: f64, upper: f64, n: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    let n = n.max(1);
    let dx = (upper - lower) / n as f64;
    let mut s = 0.5 * (f(lower) + f(upper));
    for i in 1..n {
        s += f(lower + i as f64 * dx);
    }
    s * dx
}

/// Integrate uniformly spaced samples with spacing `dx`.
pub fn trapezoid_samples(samples: &[f64], dx: f64) -> f64 {
    match samples {
        [] | [_] => 0.0,
        [first, inner @ .., last] => dx * (0.5 * (first + last) + inner.iter().sum::<f64>()),
    }
}

/// Running integral from the first sample: `out[i] = ∫ samples[0..=i]`.
/// `out[0]` is always zero.
pub fn cumulative_trapezoid(samples: &[f64], dx: f64) -> Vec<f64> {
    let mut out = Vec::with_capacity(samples.len());
    let mut acc = 0.0;
    for (i, &y) in samples.iter().enumerate() {
        if i > 0 {
            acc += 0.5 * (samples[i - 1] + y) * dx;
        }
        out.push(acc);
    }
    out
}

/// Running integral towards the last sample: `out[i] = ∫ samples[i..]`.
/// The last element is always zero.
pub fn reverse_cumulative_trapezoid(samples: &[f64], dx: f64) -> Vec<f64> {
    let n = samples.len();
    let mut out = vec![0.0; n];
    let mut acc = 0.0;
    for i in (0..n.saturating_sub(1)).rev() {
        acc += 0.5 * (samples[i] + samples[i + 1]) * dx;
        out[i] = acc;
    }
    out
}

/// `num` evenly spaced points from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, num: usize) -> Vec<f64> {
    match num {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let delta = (end - start) / (num - 1) as f64;
            let mut out: Vec<f64> = (0..num - 1).map(|i| start + delta * i as f64).collect();
            // exact endpoint
            out.push(end);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn trapezoid_is_exact_for_linear_functions() {
        let area = trapezoid(|x| 2.0 * x + 1.0, 0.0, 3.0, 7);
        assert_abs_diff_eq!(area, 12.0, epsilon = 1e-12);
    }

    #[test]
    fn trapezoid_converges_on_exponential() {
        let area = trapezoid(|x: f64| (-x).exp(), 0.0, 5.0, 2000);
        assert_abs_diff_eq!(area, 1.0 - (-5.0f64).exp(), epsilon = 1e-6);
    }

    #[test]
    fn sampled_trapezoid_matches_closure_form() {
        let xs = linspace(0.0, 1.0, 101);
        let ys: Vec<f64> = xs.iter().map(|x| x * x).collect();
        let sampled = trapezoid_samples(&ys, 0.01);
        let closure = trapezoid(|x| x * x, 0.0, 1.0, 100);
        assert_abs_diff_eq!(sampled, closure, epsilon = 1e-12);
        assert_eq!(trapezoid_samples(&[3.0], 0.1), 0.0);
    }

    #[test]
    fn cumulative_ends_at_total() {
        let ys = vec![1.0, 2.0, 4.0, 3.0];
        let cum = cumulative_trapezoid(&ys, 0.5);
        assert_eq!(cum.len(), 4);
        assert_eq!(cum[0], 0.0);
        assert_abs_diff_eq!(cum[3], trapezoid_samples(&ys, 0.5), epsilon = 1e-12);
        assert!(cum.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn reverse_cumulative_is_tail_integral() {
        let ys = vec![1.0, 2.0, 4.0, 3.0];
        let rev = reverse_cumulative_trapezoid(&ys, 0.5);
        let fwd = cumulative_trapezoid(&ys, 0.5);
        let total = fwd[3];
        for i in 0..ys.len() {
            assert_abs_diff_eq!(rev[i], total - fwd[i], epsilon = 1e-12);
        }
        assert!(reverse_cumulative_trapezoid(&[], 1.0).is_empty());
    }

    #[test]
    fn linspace_hits_endpoints() {
        let xs = linspace(-1.0, 1.0, 5);
        assert_eq!(xs, vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 9.0, 1), vec![2.0]);
    }
}
