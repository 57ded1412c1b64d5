//! Physical SiPM - library crate.
//!
//! Simulates the charge output of a silicon photomultiplier microcell array
//! driven by a sequence of expected photon counts, plus the file formats and
//! reporting used by the command-line tools.

#[cfg(not(target_arch = "wasm32"))]
pub mod batch;
pub mod constants;
pub mod error;
pub mod io;
pub mod numeric;
pub mod report;
pub mod sipm;

pub use error::{Result, SimError};
pub use sipm::microcell::SimulationState;
pub use sipm::{DeviceParams, DevicePreset, Sipm};
