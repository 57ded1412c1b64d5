use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use physical_sipm::report::RunSummary;
use physical_sipm::{Sipm, SimulationState, io};

/// Simulate a SiPM response to a binary light input file.
#[derive(Parser, Debug)]
#[command(name = "physical_sipm", version, about)]
struct Args {
    /// Binary input: device header followed by expected photons per timestep.
    input: PathBuf,

    /// Destination file. Defaults to the input path with an `.out` extension.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Suppress the run summary.
    #[arg(short, long)]
    silent: bool,

    /// Write `time, qOut` CSV instead of the binary format.
    #[arg(long)]
    csv: bool,

    /// Convolve the output with the device's Gaussian pulse shape.
    #[arg(long)]
    shape: bool,

    /// Seed the random engines for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    #[cfg(not(target_arch = "wasm32"))]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if args.silent {
        "warn"
    } else {
        "info"
    }))
    .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> physical_sipm::Result<()> {
    let (params, light) = io::read_binary(&args.input)?;
    let sipm = Sipm::new(params)?;
    let mut state = match args.seed {
        Some(seed) => SimulationState::from_seed(seed),
        None => SimulationState::from_entropy(),
    };

    let start = web_time::Instant::now();
    let mut charges = sipm.simulate(&mut state, &light)?;
    let elapsed = start.elapsed();

    if args.shape {
        charges = sipm.shape_output(&charges);
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.input.with_extension(if args.csv { "csv" } else { "out" }));
    if args.csv {
        io::write_csv(&output, sipm.dt(), &charges)?;
    } else {
        io::write_binary(&output, sipm.params(), &charges)?;
    }
    log::info!("Wrote {} samples to {}", charges.len(), output.display());

    if !args.silent {
        let summary = RunSummary::new(elapsed, sipm.dt(), params.num_microcells, &charges);
        println!("{summary}");
    }
    Ok(())
}
