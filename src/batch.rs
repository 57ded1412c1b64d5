//! Independent simulation runs spread across the rayon thread pool.
//!
//! Each run gets its own entropy-seeded [`SimulationState`], so no random
//! engine or microcell array is ever shared between threads.

use rayon::prelude::*;

use crate::error::Result;
use crate::report;
use crate::sipm::Sipm;
use crate::sipm::microcell::SimulationState;

/// Simulate every `(device, light)` pair in parallel. Results keep input order.
pub fn simulate_many(jobs: &[(Sipm, Vec<f64>)]) -> Vec<Result<Vec<f64>>> {
    jobs.par_iter()
        .map(|(sipm, light)| {
            let mut state = SimulationState::from_entropy();
            sipm.simulate(&mut state, light)
        })
        .collect()
}

/// Number of leading samples covering `taus` recovery time constants.
pub fn settling_samples(sipm: &Sipm, taus: f64) -> usize {
    (taus * sipm.params().tau_recovery / sipm.dt()).round() as usize
}

/// Bias current under constant illumination for each expected photon count
/// per timestep. The first ten recovery time constants are discarded.
///
/// With a `seed`, point `i` of the sweep runs on `SimulationState::from_seed(seed + i)`
/// and the sweep is reproducible; otherwise every point draws from OS entropy.
pub fn bias_current_sweep(
    sipm: &Sipm,
    photons_per_dt: &[f64],
    steps: usize,
    seed: Option<u64>,
) -> Result<Vec<f64>> {
    let discard = settling_samples(sipm, 10.0);
    photons_per_dt
        .par_iter()
        .enumerate()
        .map(|(i, &photons)| {
            let mut state = match seed {
                Some(seed) => SimulationState::from_seed(seed.wrapping_add(i as u64)),
                None => SimulationState::from_entropy(),
            };
            let light = vec![photons; steps];
            let charges = sipm.simulate(&mut state, &light)?;
            Ok(report::bias_current(&charges, sipm.dt(), discard))
        })
        .collect()
}
