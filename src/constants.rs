/// Speed of light (m/s).
pub const SPEED_OF_LIGHT: f64 = 2.997_924_58e8;

/// Planck's constant (J s).
pub const PLANCK: f64 = 6.626_075_5e-34;

/// Elementary charge (C).
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_63e-19;

/// Energy of one photon of the given wavelength (J).
pub fn photon_energy(wavelength_m: f64) -> f64 {
    SPEED_OF_LIGHT * PLANCK / wavelength_m
}

/// Expected photons striking `area_m2` during `dt` seconds under a
/// monochromatic irradiance (W/m^2).
pub fn photons_per_dt(irradiance: f64, area_m2: f64, wavelength_m: f64, dt: f64) -> f64 {
    dt * irradiance * area_m2 / photon_energy(wavelength_m)
}

/// Charge expressed as a number of electrons.
pub fn charge_to_electrons(charge: f64) -> f64 {
    charge / ELEMENTARY_CHARGE
}
