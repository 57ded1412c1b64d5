//! Gaussian output pulse shaping.

/// FWHM of a Gaussian is this many standard deviations.
const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949; // 2 * sqrt(2 ln 2)

/// Kernel half-width in standard deviations.
const KERNEL_SIGMAS: f64 = 4.0;

/// Normalized Gaussian kernel for a pulse of `fwhm` seconds sampled every `dt`.
/// Degenerates to the identity kernel `[1.0]` for non-positive widths.
pub fn gaussian_kernel(dt: f64, fwhm: f64) -> Vec<f64> {
    if !(fwhm > 0.0 && dt > 0.0) {
        return vec![1.0];
    }
    let sigma = (fwhm / dt) / FWHM_PER_SIGMA;
    let half = (KERNEL_SIGMAS * sigma).ceil() as usize;
    if half == 0 {
        return vec![1.0];
    }

    let mut kernel: Vec<f64> = (0..=2 * half)
        .map(|j| {
            let x = j as f64 - half as f64;
            (-0.5 * (x / sigma).powi(2)).exp()
        })
        .collect();
    let total: f64 = kernel.iter().sum();
    for k in kernel.iter_mut() {
        *k /= total;
    }
    kernel
}

/// Linear convolution centred on the kernel midpoint. Taps that fall outside
/// the input are skipped, so the output has the input's length.
pub fn convolve(input: &[f64], kernel: &[f64]) -> Vec<f64> {
    if kernel.len() <= 1 {
        let gain = kernel.first().copied().unwrap_or(1.0);
        return input.iter().map(|x| x * gain).collect();
    }
    let half = kernel.len() / 2;
    let n = input.len();
    (0..n)
        .map(|i| {
            // input index = i + j - half, kept within [0, n)
            let j_start = half.saturating_sub(i);
            let j_end = kernel.len().min(n + half - i);
            (j_start..j_end)
                .map(|j| kernel[j] * input[i + j - half])
                .sum::<f64>()
        })
        .collect()
}

/// Shape a charge sequence with a Gaussian pulse of width `fwhm`.
pub fn shape(charges: &[f64], dt: f64, fwhm: f64) -> Vec<f64> {
    convolve(charges, &gaussian_kernel(dt, fwhm))
}
