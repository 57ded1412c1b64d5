//! Steady-state initialization of microcell ages.
//!
//! Rather than simulating a burn-in period, each cell's time since its last
//! detection is drawn from the inter-detection distribution implied by the
//! mean input rate. The density used is an approximation (exact only for a
//! constant input) but sits far closer to steady state than zero or uniform
//! ages.

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;

use super::Sipm;
use super::lut::DEGENERATE_SPAN;
use super::microcell::MicrocellArray;
use crate::error::{Result, SimError};
use crate::numeric;

/// Points in the sampled distribution grid.
pub const PDF_POINTS: usize = 1500;

/// Fine sub-grid factor used when integrating the cumulative mean PDE.
pub const PDE_OVERSAMPLE: usize = 8;

/// Grid span in recovery time constants.
pub const SPAN_TAUS: f64 = 20.0;

/// Arithmetic mean of the expected photons per timestep. An input averaging
/// exactly zero is replaced by one photon over the whole sequence; a negative
/// mean is passed through and rejected when the distribution is derived.
pub fn mean_photons_per_dt(light: &[f64]) -> f64 {
    if light.is_empty() {
        return 0.0;
    }
    let mean = light.iter().sum::<f64>() / light.len() as f64;
    if mean == 0.0 {
        1.0 / light.len() as f64
    } else {
        mean
    }
}

#[derive(Debug, Clone)]
enum Sampler {
    /// Cells can never fire, so every cell is fully recovered.
    Recovered(f64),
    PiecewiseConstant(WeightedIndex<f64>),
}

/// Piecewise-constant distribution of time since last detection.
#[derive(Debug, Clone)]
pub struct AgeDistribution {
    times: Vec<f64>,
    weights: Vec<f64>,
    lambda: f64,
    sampler: Sampler,
}

impl AgeDistribution {
    pub fn from_light(sipm: &Sipm, light: &[f64]) -> Result<Self> {
        Self::from_mean_rate(sipm, mean_photons_per_dt(light))
    }

    pub fn from_mean_rate(sipm: &Sipm, mean_photons_per_dt: f64) -> Result<Self> {
        if !mean_photons_per_dt.is_finite() || mean_photons_per_dt <= 0.0 {
            return Err(SimError::distribution(format!(
                "mean photons per timestep must be positive and finite, got {mean_photons_per_dt}"
            )));
        }
        let params = sipm.params();

        // per-microcell photon arrival rate
        let lambda = mean_photons_per_dt / (params.dt * params.num_microcells as f64);
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(SimError::distribution(format!(
                "per-microcell arrival rate is degenerate ({lambda} /s)"
            )));
        }

        let tau = if params.tau_recovery > 0.0 {
            params.tau_recovery
        } else {
            DEGENERATE_SPAN
        };
        let span = SPAN_TAUS * tau;
        let times = numeric::linspace(0.0, span, PDF_POINTS);
        let step = times[1] - times[0];

        let mean_pde = cumulative_mean_pde(sipm, span);
        let density: Vec<f64> = times
            .iter()
            .zip(&mean_pde)
            .map(|(&t, &p)| sipm.pde_from_time(t) * lambda * (-lambda * t * p).exp())
            .collect();

        // survival weights: integral of the density from t to the end of the grid
        let mut weights = numeric::reverse_cumulative_trapezoid(&density, step);

        if weights.iter().any(|w| !w.is_finite()) {
            return Err(SimError::distribution("inter-detection density is not finite"));
        }

        let sampler = if sipm.pde_from_time(span) == 0.0 {
            Sampler::Recovered(span)
        } else {
            if weights[..PDF_POINTS - 1].iter().all(|&w| w == 0.0) {
                // Arrival rate so high the density underflows past the first
                // interval: every cell fired moments ago.
                log::warn!(
                    "Age density underflowed at {lambda:.3e} /s; starting all cells freshly discharged"
                );
                weights[0] = 1.0;
            }
            let index = WeightedIndex::new(&weights[..PDF_POINTS - 1])
                .map_err(|e| SimError::distribution(format!("invalid survival weights: {e}")))?;
            Sampler::PiecewiseConstant(index)
        };

        log::debug!(
            "Age distribution: lambda={lambda:.3e} /s, span={span:.3e} s, {PDF_POINTS} points"
        );

        Ok(Self {
            times,
            weights,
            lambda,
            sampler,
        })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Unnormalized weight of each grid interval; the last entry closes the grid.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Per-microcell photon arrival rate (1/s).
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    /// Draw one time since last detection (s).
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match &self.sampler {
            Sampler::Recovered(span) => *span,
            Sampler::PiecewiseConstant(index) => {
                let i = index.sample(rng);
                let lo = self.times[i];
                let hi = self.times[i + 1];
                lo + rng.random::<f64>() * (hi - lo)
            }
        }
    }

    /// Set `n` cells to independently sampled ages. A cell of age `s` last
    /// fired at simulated time `-s`.
    pub fn initialize<R: Rng>(&self, cells: &mut MicrocellArray, n: usize, rng: &mut R) {
        cells.fill_with(n, || self.sample(rng));
    }
}

/// `(1/t) ∫₀ᵗ pde(τ) dτ` on a `PDF_POINTS` grid over `[0, span]`, integrated
/// once on an oversampled sub-grid and then downsampled.
fn cumulative_mean_pde(sipm: &Sipm, span: f64) -> Vec<f64> {
    let fine_points = (PDF_POINTS - 1) * PDE_OVERSAMPLE + 1;
    let fine_times = numeric::linspace(0.0, span, fine_points);
    let fine_step = fine_times[1] - fine_times[0];
    let pde: Vec<f64> = fine_times.iter().map(|&t| sipm.pde_from_time(t)).collect();
    let integral = numeric::cumulative_trapezoid(&pde, fine_step);

    (0..PDF_POINTS)
        .map(|i| {
            let k = i * PDE_OVERSAMPLE;
            let t = fine_times[k];
            if t > 0.0 { integral[k] / t } else { pde[0] }
        })
        .collect()
}
