//! Mutable per-run state: microcell ages and the random engines driving them.

use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Time since each microcell last detected a photon, in seconds.
#[derive(Debug, Clone, Default)]
pub struct MicrocellArray {
    ages: Vec<f64>,
}

impl MicrocellArray {
    pub fn len(&self) -> usize {
        self.ages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ages.is_empty()
    }

    pub fn ages(&self) -> &[f64] {
        &self.ages
    }

    /// Resize to `n` cells, all with the same age.
    pub fn reset(&mut self, n: usize, age: f64) {
        self.ages.clear();
        self.ages.resize(n, age);
    }

    /// Resize to `n` cells with ages drawn from `age`.
    pub fn fill_with<F>(&mut self, n: usize, mut age: F)
    where
        F: FnMut() -> f64,
    {
        self.ages.clear();
        self.ages.extend((0..n).map(|_| age()));
    }

    /// Every cell recharges for one timestep.
    #[inline]
    pub fn recharge(&mut self, dt: f64) {
        for age in self.ages.iter_mut() {
            *age += dt;
        }
    }

    #[inline]
    pub(crate) fn ages_mut(&mut self) -> &mut [f64] {
        &mut self.ages
    }
}

/// Everything a run mutates. Owned by exactly one run at a time; concurrent
/// runs each build their own.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub(crate) cells: MicrocellArray,
    /// Photon counts and struck cell positions.
    pub(crate) photon_rng: SmallRng,
    /// Detection acceptance tests.
    pub(crate) acceptance_rng: SmallRng,
    /// Initial age sampling.
    pub(crate) renewal_rng: SmallRng,
    /// Struck cell indices for the current step, reused across steps.
    pub(crate) struck: Vec<usize>,
}

impl SimulationState {
    /// Independently seed every engine from OS entropy.
    pub fn from_entropy() -> Self {
        Self::with_engines(
            SmallRng::from_os_rng(),
            SmallRng::from_os_rng(),
            SmallRng::from_os_rng(),
        )
    }

    /// Reproducible state; the three engines get distinct streams.
    pub fn from_seed(seed: u64) -> Self {
        let mut seeder = SmallRng::seed_from_u64(seed);
        Self::with_engines(
            SmallRng::from_rng(&mut seeder),
            SmallRng::from_rng(&mut seeder),
            SmallRng::from_rng(&mut seeder),
        )
    }

    fn with_engines(photon_rng: SmallRng, acceptance_rng: SmallRng, renewal_rng: SmallRng) -> Self {
        Self {
            cells: MicrocellArray::default(),
            photon_rng,
            acceptance_rng,
            renewal_rng,
            struck: Vec::new(),
        }
    }

    /// Microcell ages as left by the most recent run.
    pub fn cells(&self) -> &MicrocellArray {
        &self.cells
    }
}
