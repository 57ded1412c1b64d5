//! Time-since-discharge lookup table for microcell voltage and PDE.
//!
//! The stimulation loop evaluates both curves for every struck cell, so the
//! exponentials are sampled once here and linearly interpolated afterwards.

use super::DeviceParams;

pub const LUT_SIZE: usize = 20;

/// Table span in recovery time constants; voltage is >99.5% recovered here.
pub const RECOVERY_SPAN_TAUS: f64 = 5.3;

/// Span used when the recovery time constant is zero.
pub const DEGENERATE_SPAN: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Voltage,
    Pde,
}

#[derive(Debug, Clone)]
pub struct LookupTable {
    time: [f64; LUT_SIZE],
    voltage: [f64; LUT_SIZE],
    pde: [f64; LUT_SIZE],
}

impl LookupTable {
    pub fn build(params: &DeviceParams) -> Self {
        let span = if params.tau_recovery > 0.0 {
            RECOVERY_SPAN_TAUS * params.tau_recovery
        } else {
            DEGENERATE_SPAN
        };
        let step = span / LUT_SIZE as f64;

        let mut time = [0.0; LUT_SIZE];
        let mut voltage = [0.0; LUT_SIZE];
        let mut pde = [0.0; LUT_SIZE];
        for i in 0..LUT_SIZE {
            time[i] = i as f64 * step;
            voltage[i] = params.voltage_from_time(time[i]);
            pde[i] = params.pde_from_voltage(voltage[i]);
        }
        Self { time, voltage, pde }
    }

    pub fn times(&self) -> &[f64; LUT_SIZE] {
        &self.time
    }

    pub fn curve(&self, curve: Curve) -> &[f64; LUT_SIZE] {
        match curve {
            Curve::Voltage => &self.voltage,
            Curve::Pde => &self.pde,
        }
    }

    /// Last tabulated time; ages at or beyond it read as fully recovered.
    pub fn max_time(&self) -> f64 {
        self.time[LUT_SIZE - 1]
    }

    /// Clamped linear interpolation of `curve` at time `x`.
    #[inline]
    pub fn interpolate(&self, x: f64, curve: Curve) -> f64 {
        let ys = self.curve(curve);
        // Recovered cells dominate at low light, so test that first.
        if x >= self.time[LUT_SIZE - 1] {
            return ys[LUT_SIZE - 1];
        }
        if x.is_nan() || x <= self.time[0] {
            return ys[0];
        }
        // time[i] <= x < time[i + 1]
        let i = self.time.partition_point(|&t| t <= x) - 1;
        let dx = self.time[i + 1] - self.time[i];
        let dy = ys[i + 1] - ys[i];
        ys[i] + (x - self.time[i]) * dy / dx
    }

    #[inline]
    pub fn voltage_at(&self, x: f64) -> f64 {
        self.interpolate(x, Curve::Voltage)
    }

    #[inline]
    pub fn pde_at(&self, x: f64) -> f64 {
        self.interpolate(x, Curve::Pde)
    }
}
