//! Bias current accuracy harness.
//!
//! Drives J30020 devices at three overvoltages with constant 405 nm light
//! and compares the simulated bias current with bench measurements. A run
//! passes when every current lands within 25% of its measurement.
//!
//! Usage: cargo run --release --bin current_accuracy

use physical_sipm::batch;
use physical_sipm::constants;
use physical_sipm::report::format_si;
use physical_sipm::{DevicePreset, Sipm};

const WAVELENGTH_M: f64 = 405e-9;
const STEPS: usize = 20_000;
const BOUNDS: (f64, f64) = (0.75, 1.25);
const IRRADIANCES: [f64; 8] = [0.0, 1e-4, 1e-3, 2e-3, 5e-3, 1e-2, 1e-1, 1e0];

struct Case {
    preset: DevicePreset,
    /// Measured bias current (A) at each irradiance.
    expected: [f64; 8],
}

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cases = [
        Case {
            preset: DevicePreset::J30020Over2V,
            expected: [0.0, 4.5235e-5, 4.2184e-4, 8.2776e-4, 1.960e-3, 3.6916e-3, 18.0968e-3, 34.0636e-3],
        },
        Case {
            preset: DevicePreset::J30020Over3V,
            expected: [0.0, 8.4519e-5, 8.0958e-4, 1.5820e-3, 3.7762e-3, 6.9938e-3, 31.4950e-3, 55.0066e-3],
        },
        Case {
            preset: DevicePreset::J30020Over4V,
            expected: [0.0, 1.3120e-4, 1.2665e-3, 2.4768e-3, 5.8981e-3, 10.7652e-3, 45.7787e-3, 76.3823e-3],
        },
    ];

    println!("=== SiPM Nonlinearity and Bias Current Accuracy ===\n");

    let mut all_pass = true;
    for case in &cases {
        all_pass &= check_case(case);
    }

    println!("\n=== Results ===");
    if all_pass {
        println!("ALL TESTS PASSED");
    } else {
        println!("SOME TESTS FAILED - check output above");
        std::process::exit(1);
    }
}

fn check_case(case: &Case) -> bool {
    println!("--- {} ---", case.preset.name());
    let sipm = match Sipm::from_preset(case.preset) {
        Ok(s) => s,
        Err(e) => {
            println!("  FAIL: {e}");
            return false;
        }
    };

    let area = case.preset.area_m2();
    let photons: Vec<f64> = IRRADIANCES
        .iter()
        .map(|&irr| constants::photons_per_dt(irr, area, WAVELENGTH_M, sipm.dt()))
        .collect();

    let start = web_time::Instant::now();
    let currents = match batch::bias_current_sweep(&sipm, &photons, STEPS, None) {
        Ok(c) => c,
        Err(e) => {
            println!("  FAIL: {e}");
            return false;
        }
    };
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    let mut pass = true;
    for ((&irr, &expected), &current) in IRRADIANCES.iter().zip(&case.expected).zip(&currents) {
        let ok = if expected == 0.0 {
            // no photons, no avalanches
            current < 1e-5
        } else {
            current >= expected * BOUNDS.0 && current <= expected * BOUNDS.1
        };
        println!(
            "  {:>12}  expected {:>12}  simulated {:>12}  {}",
            format_si(irr, "W/m2"),
            format_si(expected, "A"),
            format_si(current, "A"),
            if ok { "PASS" } else { "FAIL" }
        );
        pass &= ok;
    }
    println!("  sweep time: {elapsed_ms:.0} ms\n");
    pass
}
