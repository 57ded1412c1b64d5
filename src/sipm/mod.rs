pub mod age;
pub mod lut;
pub mod microcell;
pub mod pulse;
pub mod stimulation;

use crate::error::{Result, SimError};
use age::AgeDistribution;
use lut::LookupTable;
use microcell::SimulationState;

/// Number of values in the fixed binary parameter header.
pub const HEADER_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DevicePreset {
    J30020Over2V,
    J30020Over3V,
    J30020Over4V,
    Custom,
}

impl DevicePreset {
    pub const ALL: &[DevicePreset] = &[
        DevicePreset::J30020Over2V,
        DevicePreset::J30020Over3V,
        DevicePreset::J30020Over4V,
        DevicePreset::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DevicePreset::J30020Over2V => "J30020 2V Over",
            DevicePreset::J30020Over3V => "J30020 3V Over",
            DevicePreset::J30020Over4V => "J30020 4V Over",
            DevicePreset::Custom => "Custom",
        }
    }

    /// Active area of the device in m^2.
    pub fn area_m2(self) -> f64 {
        match self {
            DevicePreset::Custom => 1e-6,
            _ => 3.07e-3 * 3.07e-3,
        }
    }

    pub fn config(self) -> DeviceParams {
        let j30020 = DeviceParams {
            dt: 1e-10,
            num_microcells: 14410,
            v_bias: 26.5,
            v_breakdown: 24.5,
            tau_recovery: 2.2 * 14e-9,
            pde_max: 0.46,
            v_characteristic: 2.04,
            capacitance_per_cell: 4.6e-14,
            pulse_fwhm: 0.0,
            digital_threshold: 0.0,
        };
        match self {
            DevicePreset::J30020Over2V => j30020,
            DevicePreset::J30020Over3V => DeviceParams {
                v_bias: 27.5,
                ..j30020
            },
            DevicePreset::J30020Over4V => DeviceParams {
                v_bias: 28.5,
                ..j30020
            },
            DevicePreset::Custom => DeviceParams {
                num_microcells: 1000,
                v_bias: 29.0,
                v_breakdown: 25.0,
                tau_recovery: 10e-9,
                capacitance_per_cell: 20e-15,
                ..j30020
            },
        }
    }
}

/// Physical parameters of one SiPM plus the simulation timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceParams {
    /// Simulation timestep (s).
    pub dt: f64,
    pub num_microcells: u64,
    pub v_bias: f64,
    pub v_breakdown: f64,
    /// Microcell recharge RC time constant (s).
    pub tau_recovery: f64,
    /// Asymptotic PDE at large overvoltage, in [0, 1].
    pub pde_max: f64,
    /// Characteristic voltage of the PDE-overvoltage curve.
    pub v_characteristic: f64,
    /// Microcell capacitance (F).
    pub capacitance_per_cell: f64,
    /// Output pulse full width at half maximum (s). 0 disables shaping.
    pub pulse_fwhm: f64,
    /// Fraction of overvoltage below which a discharge is not read out. 0 = analog.
    pub digital_threshold: f64,
}

impl Default for DeviceParams {
    fn default() -> Self {
        DevicePreset::J30020Over2V.config()
    }
}

impl DeviceParams {
    pub fn v_over(&self) -> f64 {
        self.v_bias - self.v_breakdown
    }

    /// Recovered microcell voltage `time` seconds after its last discharge.
    pub fn voltage_from_time(&self, time: f64) -> f64 {
        if self.tau_recovery > 0.0 {
            self.v_over() * (1.0 - (-time / self.tau_recovery).exp())
        } else if time > 0.0 {
            self.v_over()
        } else {
            0.0
        }
    }

    pub fn pde_from_voltage(&self, voltage: f64) -> f64 {
        self.pde_max * (1.0 - (-voltage / self.v_characteristic).exp())
    }

    pub fn pde_from_time(&self, time: f64) -> f64 {
        self.pde_from_voltage(self.voltage_from_time(time))
    }

    /// Decode the fixed-order parameter header used by the binary file format.
    pub fn from_header(header: &[f64]) -> Result<Self> {
        if header.len() < HEADER_LEN {
            return Err(SimError::format(format!(
                "parameter header needs {HEADER_LEN} values, got {}",
                header.len()
            )));
        }
        let cells = header[1];
        if !cells.is_finite() || cells < 1.0 || cells.fract() != 0.0 || cells > u64::MAX as f64 {
            return Err(SimError::config(
                "num_microcells",
                format!("must be a positive integer, got {cells}"),
            ));
        }
        Ok(DeviceParams {
            dt: header[0],
            num_microcells: cells as u64,
            v_bias: header[2],
            v_breakdown: header[3],
            tau_recovery: header[4],
            pde_max: header[5],
            v_characteristic: header[6],
            capacitance_per_cell: header[7],
            pulse_fwhm: header[8],
            digital_threshold: header[9],
        })
    }

    pub fn to_header(&self) -> [f64; HEADER_LEN] {
        [
            self.dt,
            self.num_microcells as f64,
            self.v_bias,
            self.v_breakdown,
            self.tau_recovery,
            self.pde_max,
            self.v_characteristic,
            self.capacitance_per_cell,
            self.pulse_fwhm,
            self.digital_threshold,
        ]
    }

    /// Reject any parameter outside its physical domain. Nothing is clamped.
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("dt", self.dt),
            ("v_bias", self.v_bias),
            ("v_breakdown", self.v_breakdown),
            ("tau_recovery", self.tau_recovery),
            ("pde_max", self.pde_max),
            ("v_characteristic", self.v_characteristic),
            ("capacitance_per_cell", self.capacitance_per_cell),
            ("pulse_fwhm", self.pulse_fwhm),
            ("digital_threshold", self.digital_threshold),
        ];
        for (parameter, value) in named {
            if !value.is_finite() {
                return Err(SimError::config(parameter, format!("must be finite, got {value}")));
            }
        }

        if self.dt <= 0.0 {
            return Err(SimError::config("dt", "must be greater than zero"));
        }
        if self.num_microcells == 0 {
            return Err(SimError::config("num_microcells", "must be greater than zero"));
        }
        if usize::try_from(self.num_microcells).is_err() {
            return Err(SimError::config(
                "num_microcells",
                "does not fit in addressable memory",
            ));
        }
        if self.v_over() < 0.0 {
            return Err(SimError::config(
                "v_over",
                format!(
                    "bias {} V is below breakdown {} V",
                    self.v_bias, self.v_breakdown
                ),
            ));
        }
        if self.tau_recovery < 0.0 {
            return Err(SimError::config("tau_recovery", "cannot be negative"));
        }
        if !(0.0..=1.0).contains(&self.pde_max) {
            return Err(SimError::config(
                "pde_max",
                format!("must lie in [0, 1], got {}", self.pde_max),
            ));
        }
        if self.v_characteristic <= 0.0 {
            return Err(SimError::config("v_characteristic", "must be greater than zero"));
        }
        if self.capacitance_per_cell < 0.0 {
            return Err(SimError::config("capacitance_per_cell", "cannot be negative"));
        }
        if self.pulse_fwhm < 0.0 {
            return Err(SimError::config("pulse_fwhm", "cannot be negative"));
        }
        if self.digital_threshold < 0.0 {
            return Err(SimError::config("digital_threshold", "cannot be negative"));
        }
        Ok(())
    }
}

/// A validated SiPM device. Configuration is read-only; per-run mutable
/// state lives in [`SimulationState`].
#[derive(Debug, Clone)]
pub struct Sipm {
    params: DeviceParams,
    lut: LookupTable,
}

impl Sipm {
    pub fn new(params: DeviceParams) -> Result<Self> {
        params.validate()?;
        let lut = LookupTable::build(&params);
        Ok(Self { params, lut })
    }

    pub fn from_preset(preset: DevicePreset) -> Result<Self> {
        Self::new(preset.config())
    }

    pub fn from_header(header: &[f64]) -> Result<Self> {
        Self::new(DeviceParams::from_header(header)?)
    }

    /// Same device with a different timestep.
    pub fn with_dt(&self, dt: f64) -> Result<Self> {
        Self::new(DeviceParams { dt, ..self.params })
    }

    pub fn params(&self) -> &DeviceParams {
        &self.params
    }

    pub fn lut(&self) -> &LookupTable {
        &self.lut
    }

    pub fn dt(&self) -> f64 {
        self.params.dt
    }

    pub fn v_over(&self) -> f64 {
        self.params.v_over()
    }

    pub fn num_cells(&self) -> usize {
        // validated to fit in usize at construction
        self.params.num_microcells as usize
    }

    pub fn voltage_from_time(&self, time: f64) -> f64 {
        self.params.voltage_from_time(time)
    }

    pub fn pde_from_voltage(&self, voltage: f64) -> f64 {
        self.params.pde_from_voltage(voltage)
    }

    pub fn pde_from_time(&self, time: f64) -> f64 {
        self.params.pde_from_time(time)
    }

    /// Simulate the device response to `light`, the expected number of
    /// photons striking the device in each timestep. Returns the charge
    /// released in each timestep, aligned 1:1 with the input.
    pub fn simulate(&self, state: &mut SimulationState, light: &[f64]) -> Result<Vec<f64>> {
        if light.is_empty() {
            state.cells.reset(self.num_cells(), self.lut.max_time());
            return Ok(Vec::new());
        }

        let distribution = AgeDistribution::from_light(self, light)?;
        distribution.initialize(&mut state.cells, self.num_cells(), &mut state.renewal_rng);

        log::info!(
            "Simulating {} steps of {} s across {} microcells",
            light.len(),
            self.params.dt,
            self.params.num_microcells
        );
        let start = web_time::Instant::now();
        let charges = stimulation::run(self, state, light);
        log::debug!(
            "Stimulation finished in {:.1} ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(charges)
    }

    /// Simulate with a fresh, entropy-seeded run state.
    pub fn run(&self, light: &[f64]) -> Result<Vec<f64>> {
        let mut state = SimulationState::from_entropy();
        self.simulate(&mut state, light)
    }

    /// Convolve a charge sequence with this device's output pulse shape.
    pub fn shape_output(&self, charges: &[f64]) -> Vec<f64> {
        pulse::shape(charges, self.params.dt, self.params.pulse_fwhm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn default_is_j30020_at_two_volts() {
        let params = DeviceParams::default();
        assert_eq!(params.num_microcells, 14410);
        assert_abs_diff_eq!(params.v_over(), 2.0, epsilon = 1e-12);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn every_preset_is_valid() {
        for preset in DevicePreset::ALL {
            assert!(Sipm::from_preset(*preset).is_ok(), "{} invalid", preset.name());
        }
    }

    #[test]
    fn construction_names_offending_parameter() {
        let base = DeviceParams::default();
        let cases = [
            (DeviceParams { dt: 0.0, ..base }, "dt"),
            (DeviceParams { num_microcells: 0, ..base }, "num_microcells"),
            (DeviceParams { v_bias: 20.0, ..base }, "v_over"),
            (DeviceParams { tau_recovery: -1e-9, ..base }, "tau_recovery"),
            (DeviceParams { pde_max: 1.5, ..base }, "pde_max"),
            (DeviceParams { pde_max: -0.1, ..base }, "pde_max"),
            (DeviceParams { v_characteristic: 0.0, ..base }, "v_characteristic"),
            (DeviceParams { digital_threshold: -0.5, ..base }, "digital_threshold"),
            (DeviceParams { pulse_fwhm: -1.0, ..base }, "pulse_fwhm"),
            (DeviceParams { dt: f64::NAN, ..base }, "dt"),
        ];
        for (params, expected) in cases {
            let err = Sipm::new(params).unwrap_err();
            assert_eq!(err.parameter(), Some(expected), "{err}");
        }
    }

    #[test]
    fn zero_overvoltage_and_tau_are_accepted() {
        let params = DeviceParams {
            v_bias: 24.5,
            tau_recovery: 0.0,
            ..DeviceParams::default()
        };
        let sipm = Sipm::new(params).unwrap();
        assert_eq!(sipm.v_over(), 0.0);
        assert!(sipm.lut().times().iter().all(|t| t.is_finite()));
    }

    #[test]
    fn header_roundtrip_preserves_order() {
        let params = DevicePreset::Custom.config();
        let header = params.to_header();
        assert_eq!(header[0], params.dt);
        assert_eq!(header[1], 1000.0);
        assert_eq!(header[9], params.digital_threshold);
        assert_eq!(DeviceParams::from_header(&header).unwrap(), params);
    }

    #[test]
    fn header_rejects_fractional_cell_count() {
        let mut header = DeviceParams::default().to_header();
        header[1] = 10.5;
        let err = DeviceParams::from_header(&header).unwrap_err();
        assert_eq!(err.parameter(), Some("num_microcells"));
        assert!(matches!(
            DeviceParams::from_header(&header[..4]),
            Err(SimError::Format(_))
        ));
    }

    #[test]
    fn with_dt_revalidates() {
        let sipm = Sipm::from_preset(DevicePreset::Custom).unwrap();
        assert_eq!(sipm.with_dt(2e-10).unwrap().dt(), 2e-10);
        assert!(sipm.with_dt(-1.0).is_err());
    }

    #[test]
    fn analytic_curves_saturate() {
        let sipm = Sipm::from_preset(DevicePreset::J30020Over2V).unwrap();
        let tau = sipm.params().tau_recovery;
        assert_eq!(sipm.voltage_from_time(0.0), 0.0);
        assert_abs_diff_eq!(sipm.voltage_from_time(50.0 * tau), 2.0, epsilon = 1e-9);
        let pde_full = 0.46 * (1.0 - (-2.0f64 / 2.04).exp());
        assert_abs_diff_eq!(sipm.pde_from_time(50.0 * tau), pde_full, epsilon = 1e-9);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let sipm = Sipm::from_preset(DevicePreset::Custom).unwrap();
        let mut state = SimulationState::from_seed(3);
        assert!(sipm.simulate(&mut state, &[]).unwrap().is_empty());
    }
}
