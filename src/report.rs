//! Human-readable run summaries.

use std::fmt;
use std::time::Duration;

const PREFIXES: [&str; 9] = ["f", "p", "n", "μ", "m", "", "k", "M", "G"];

/// Scale `value` to engineering notation. Returns the SI prefix and the
/// scaled value, e.g. `2.5e-9` -> `("n", 2.5)`. Values outside the
/// femto..giga range keep the nearest prefix.
pub fn engineering(value: f64) -> (&'static str, f64) {
    if value == 0.0 || !value.is_finite() {
        return ("", value);
    }
    let exponent = (value.abs().log10() / 3.0).floor() as i32 * 3;
    let exponent = exponent.clamp(-15, 9);
    let index = ((exponent + 15) / 3) as usize;
    (PREFIXES[index], value / 10f64.powi(exponent))
}

/// Format `value` with an engineering prefix and `unit`.
pub fn format_si(value: f64, unit: &str) -> String {
    let (prefix, scaled) = engineering(value);
    format!("{scaled:.3} {prefix}{unit}")
}

/// Mean current from a charge sequence, ignoring the first `discard` steps.
pub fn bias_current(charges: &[f64], dt: f64, discard: usize) -> f64 {
    let kept = charges.get(discard..).unwrap_or(&[]);
    if kept.is_empty() || dt <= 0.0 {
        return 0.0;
    }
    kept.iter().sum::<f64>() / (kept.len() as f64 * dt)
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub elapsed: Duration,
    pub dt: f64,
    pub steps: usize,
    pub num_microcells: u64,
    pub bias_current: f64,
}

impl RunSummary {
    pub fn new(elapsed: Duration, dt: f64, num_microcells: u64, charges: &[f64]) -> Self {
        Self {
            elapsed,
            dt,
            steps: charges.len(),
            num_microcells,
            bias_current: bias_current(charges, dt, 0),
        }
    }

    pub fn simulated_time(&self) -> f64 {
        self.dt * self.steps as f64
    }

    pub fn compute_per_step(&self) -> f64 {
        if self.steps == 0 {
            return 0.0;
        }
        self.elapsed.as_secs_f64() / self.steps as f64
    }

    pub fn compute_per_cell_step(&self) -> f64 {
        self.compute_per_step() / self.num_microcells.max(1) as f64
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Elapsed Time:           {}", format_si(self.elapsed.as_secs_f64(), "s"))?;
        writeln!(f, "Simulated Time:         {}", format_si(self.simulated_time(), "s"))?;
        writeln!(f, "Simulation dt:          {}", format_si(self.dt, "s"))?;
        writeln!(f, "Time Steps:             {} Sa", self.steps)?;
        writeln!(f, "Compute Per Step:       {}", format_si(self.compute_per_step(), "s"))?;
        writeln!(f, "Compute Per uCell Step: {}", format_si(self.compute_per_cell_step(), "s"))?;
        write!(f, "Simulated Ibias:        {}", format_si(self.bias_current, "A"))
    }
}
