//! Per-timestep photon stimulation of the microcell array.

use rand::Rng;
use rand::rngs::SmallRng;
use rand_distr::{Distribution, Poisson};

use super::Sipm;
use super::lut::LookupTable;
use super::microcell::SimulationState;

/// Upper bound on strikes per step, in multiples of the cell count. Past this
/// a cell escapes every strike with probability below e^-64.
pub const MAX_STRIKES_PER_CELL: usize = 64;

/// Poisson sampler for the incident photon count, rebuilt only when the
/// expected count changes between steps.
#[derive(Debug, Default)]
struct PhotonCounter {
    cached: Option<(f64, Poisson<f64>)>,
}

impl PhotonCounter {
    fn sample(&mut self, expected: f64, rng: &mut SmallRng) -> usize {
        if expected <= 0.0 {
            return 0;
        }
        if let Some((rate, dist)) = &self.cached {
            if *rate == expected {
                return dist.sample(rng) as usize;
            }
        }
        match Poisson::new(expected) {
            Ok(dist) => {
                let count = dist.sample(rng) as usize;
                self.cached = Some((expected, dist));
                count
            }
            Err(e) => {
                // beyond the sampler's range the count is effectively deterministic
                log::warn!("Poisson({expected}) unavailable ({e}); using the expected count");
                expected.round() as usize
            }
        }
    }
}

/// Run every timestep of `light` against the already-initialized state.
pub fn run(sipm: &Sipm, state: &mut SimulationState, light: &[f64]) -> Vec<f64> {
    let negatives = light.iter().filter(|&&l| l < 0.0).count();
    if negatives > 0 {
        log::warn!("{negatives} negative light samples treated as darkness");
    }

    let mut counter = PhotonCounter::default();
    let mut charges = Vec::with_capacity(light.len());
    for &l in light {
        charges.push(step(sipm, state, &mut counter, l.max(0.0)));
    }
    charges
}

/// One timestep: strike, recharge, then detect. Returns the charge read out.
fn step(sipm: &Sipm, state: &mut SimulationState, counter: &mut PhotonCounter, photons: f64) -> f64 {
    let params = sipm.params();
    let SimulationState {
        cells,
        photon_rng,
        acceptance_rng,
        struck,
        ..
    } = state;

    let n = cells.len();
    if n == 0 {
        return 0.0;
    }
    let hits = counter
        .sample(photons, photon_rng)
        .min(n.saturating_mul(MAX_STRIKES_PER_CELL));
    struck.clear();
    struck.extend((0..hits).map(|_| photon_rng.random_range(0..n)));

    cells.recharge(params.dt);

    let threshold = params.digital_threshold * params.v_over();
    detect(
        sipm.lut(),
        cells.ages_mut(),
        struck,
        acceptance_rng,
        threshold,
        params.capacitance_per_cell,
    )
}

/// Acceptance test for each struck cell. A cell struck twice is re-tested
/// against its age after the first strike.
#[inline]
fn detect(
    lut: &LookupTable,
    ages: &mut [f64],
    struck: &[usize],
    rng: &mut SmallRng,
    threshold: f64,
    capacitance: f64,
) -> f64 {
    let mut charge = 0.0;
    for &i in struck {
        let age = ages[i];
        if rng.random::<f64>() < lut.pde_at(age) {
            let volt = lut.voltage_at(age);
            ages[i] = 0.0;
            // below-threshold avalanches still discharge the cell
            if volt > threshold {
                charge += volt * capacitance;
            }
        }
    }
    charge
}
