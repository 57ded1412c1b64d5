use physical_sipm::batch;
use physical_sipm::report::bias_current;
use physical_sipm::{DeviceParams, DevicePreset, SimError, SimulationState, Sipm};

fn saturation_device() -> Sipm {
    Sipm::new(DeviceParams {
        num_microcells: 14410,
        v_bias: 26.5,
        v_breakdown: 24.5,
        tau_recovery: 3.08e-8,
        capacitance_per_cell: 4.6e-14,
        v_characteristic: 2.04,
        pde_max: 0.46,
        dt: 1e-10,
        pulse_fwhm: 0.0,
        digital_threshold: 0.0,
    })
    .unwrap()
}

#[test]
fn output_length_matches_input_for_every_size() {
    let sipm = Sipm::from_preset(DevicePreset::Custom).unwrap();
    let mut state = SimulationState::from_seed(1);
    for len in [0, 1, 2, 17, 500] {
        let light = vec![0.3; len];
        assert_eq!(sipm.simulate(&mut state, &light).unwrap().len(), len);
    }
}

#[test]
fn darkness_on_a_single_cell_is_silent() {
    let sipm = Sipm::new(DeviceParams {
        num_microcells: 1,
        ..DeviceParams::default()
    })
    .unwrap();
    let mut state = SimulationState::from_seed(2);
    let charges = sipm.simulate(&mut state, &[0.0; 1000]).unwrap();
    assert_eq!(charges, vec![0.0; 1000]);
}

#[test]
fn charge_is_never_negative() {
    let sipm = Sipm::from_preset(DevicePreset::J30020Over3V).unwrap();
    let mut state = SimulationState::from_seed(3);
    let light: Vec<f64> = (0..3000).map(|i| ((i as f64) * 0.01).sin().abs() * 40.0).collect();
    let charges = sipm.simulate(&mut state, &light).unwrap();
    assert!(charges.iter().all(|&q| q >= 0.0));
    assert!(charges.iter().any(|&q| q > 0.0));
}

#[test]
fn negative_light_reads_as_darkness() {
    let sipm = Sipm::new(DeviceParams {
        num_microcells: 1,
        ..DeviceParams::default()
    })
    .unwrap();
    let mut state = SimulationState::from_seed(4);
    let charges = sipm.simulate(&mut state, &[-5.0, 0.0, -1.0, 20.0]).unwrap();
    assert_eq!(charges.len(), 4);
    assert_eq!(&charges[..3], &[0.0; 3]);
}

#[test]
fn negative_mean_light_is_a_distribution_error() {
    let sipm = Sipm::from_preset(DevicePreset::Custom).unwrap();
    let mut state = SimulationState::from_seed(4);
    let err = sipm.simulate(&mut state, &[-5.0, 1.0]).unwrap_err();
    assert!(matches!(err, SimError::Distribution(_)), "{err}");
}

#[test]
fn enormous_light_saturates_without_panicking() {
    let sipm = Sipm::from_preset(DevicePreset::Custom).unwrap();
    let full = sipm.num_cells() as f64 * sipm.v_over() * sipm.params().capacitance_per_cell;
    for photons in [1e20, 1e15] {
        let mut state = SimulationState::from_seed(1);
        let charges = sipm.simulate(&mut state, &[photons]).unwrap();
        assert_eq!(charges.len(), 1);
        assert!(charges[0] >= 0.0 && charges[0] <= full, "{photons}: {}", charges[0]);
    }
}

#[test]
fn single_charge_never_exceeds_full_cell() {
    let sipm = Sipm::from_preset(DevicePreset::J30020Over2V).unwrap();
    let mut state = SimulationState::from_seed(5);
    let charges = sipm.simulate(&mut state, &[0.2; 2000]).unwrap();
    let full = sipm.v_over() * sipm.params().capacitance_per_cell;
    // at 0.2 photons per step, steps with more than a handful of avalanches are vanishingly rare
    assert!(charges.iter().all(|&q| q <= 6.0 * full));
}

#[test]
fn seeded_runs_reproduce() {
    let sipm = Sipm::from_preset(DevicePreset::Custom).unwrap();
    let light = vec![2.0; 400];
    let a = sipm.simulate(&mut SimulationState::from_seed(99), &light).unwrap();
    let b = sipm.simulate(&mut SimulationState::from_seed(99), &light).unwrap();
    assert_eq!(a, b);
}

#[test]
fn state_is_reinitialized_each_call() {
    let sipm = Sipm::from_preset(DevicePreset::Custom).unwrap();
    let mut state = SimulationState::from_seed(6);
    sipm.simulate(&mut state, &[1.0; 10]).unwrap();
    assert_eq!(state.cells().len(), 1000);

    let small = Sipm::new(DeviceParams {
        num_microcells: 7,
        ..DevicePreset::Custom.config()
    })
    .unwrap();
    small.simulate(&mut state, &[1.0; 10]).unwrap();
    assert_eq!(state.cells().len(), 7);
}

#[test]
fn infinite_light_is_a_distribution_error() {
    let sipm = Sipm::from_preset(DevicePreset::Custom).unwrap();
    let err = sipm.run(&[1.0, f64::INFINITY]).unwrap_err();
    assert!(matches!(err, SimError::Distribution(_)));
}

#[test]
fn shaping_with_zero_width_is_identity() {
    let sipm = Sipm::from_preset(DevicePreset::J30020Over2V).unwrap();
    let charges = sipm.run(&[3.0; 500]).unwrap();
    assert_eq!(sipm.shape_output(&charges), charges);
}

#[test]
fn shaping_spreads_but_keeps_interior_charge() {
    let sipm = Sipm::new(DeviceParams {
        pulse_fwhm: 1e-9,
        ..DeviceParams::default()
    })
    .unwrap();
    let mut charges = vec![0.0; 300];
    charges[150] = 1e-13;
    let shaped = sipm.shape_output(&charges);
    assert_eq!(shaped.len(), 300);
    assert!(shaped[150] < 1e-13);
    assert!(shaped[148] > 0.0 && shaped[152] > 0.0);
    let total: f64 = shaped.iter().sum();
    assert!((total - 1e-13).abs() < 1e-25);
}

#[test]
fn bias_current_saturates_at_high_light() {
    let sipm = saturation_device();
    let rates = [1.0, 10.0, 100.0, 1000.0];
    let currents = batch::bias_current_sweep(&sipm, &rates, 12_000, Some(7)).unwrap();

    assert!(currents.windows(2).all(|w| w[1] > w[0]), "{currents:?}");

    let gain: Vec<f64> = currents.windows(2).map(|w| w[1] / w[0]).collect();
    // linear would be 10x per decade
    assert!(gain[2] < 5.0, "{gain:?}");
    assert!(gain[2] < gain[0], "{gain:?}");

    // the steady-state ceiling is every cell discharging once per few time constants
    let params = sipm.params();
    let ceiling = params.num_microcells as f64 * params.v_over() * params.capacitance_per_cell / sipm.dt();
    assert!(currents[3] < ceiling);
}

#[test]
fn low_light_response_is_near_linear() {
    let sipm = saturation_device();
    let steps = 20_000;
    let discard = batch::settling_samples(&sipm, 10.0);
    let mut state = SimulationState::from_seed(8);
    let dim = sipm.simulate(&mut state, &vec![0.5; steps]).unwrap();
    let brighter = sipm.simulate(&mut state, &vec![1.0; steps]).unwrap();
    let ratio = bias_current(&brighter, sipm.dt(), discard) / bias_current(&dim, sipm.dt(), discard);
    assert!((1.7..2.3).contains(&ratio), "ratio {ratio}");
}
