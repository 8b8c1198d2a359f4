use std::path::PathBuf;

use clap::Parser;
use fissure::{input, post_processor::CsvOutput, FissureError, Simulation, SimulationConfig};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Simulates brittle fracture of a 2D spring lattice
#[derive(Parser, Debug)]
#[command(name = "fissure", version, about)]
struct Args {
    /// Simulation input json
    input: PathBuf,

    /// Directory to write nodes.csv, springs.csv and crack.csv into
    #[arg(short, long, default_value = "fissure-output")]
    output_dir: PathBuf,

    /// Number of steps to run, overriding physics.steps
    #[arg(long)]
    steps: Option<u64>,

    /// Write a snapshot every N steps. The last step is always written.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    every: u64,
}

/// Loads the input file and applies command line overrides
fn load_config(args: &Args) -> Result<SimulationConfig, FissureError> {
    let mut config = input::load_input_file(&args.input)?;
    if let Some(steps) = args.steps {
        config.physics.steps = steps;
    }
    Ok(config)
}

fn run(args: &Args) -> Result<(), FissureError> {
    let config = load_config(args)?;
    let steps = config.physics.steps;

    let mut simulation = Simulation::new(config)?;
    let connections = simulation.topology().connections().to_vec();

    let mut output = CsvOutput::create(&args.output_dir)?;
    output.write_snapshot(&simulation.snapshot(), &connections)?;

    info!("running {steps} steps...");
    let start = std::time::Instant::now();

    let bar = ProgressBar::new(steps);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} steps {msg}") {
        bar.set_style(style);
    }
    for _ in 0..steps {
        let events = simulation.step()?;
        if !events.is_empty() {
            bar.set_message(format!(
                "{} fractured",
                simulation.fracture_front().fracture_count()
            ));
        }

        let taken = simulation.steps_taken();
        if taken % args.every == 0 || taken == steps {
            output.write_snapshot(&simulation.snapshot(), &connections)?;
        }
        bar.inc(1);
    }
    bar.finish();
    output.into_inner()?;

    let elapsed = start.elapsed().as_secs_f32();
    info!("simulated {steps} steps in {elapsed:.3} seconds");

    let crack = simulation.crack();
    match crack.endpoints {
        Some((a, b)) => info!(
            crack_length = crack.length,
            a,
            b,
            fractured = simulation.fracture_front().fracture_count(),
            "final crack"
        ),
        None => info!("no springs fractured"),
    }

    Ok(())
}

fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fissure=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    if let Err(err) = run(&args) {
        error!("{err}");
        std::process::exit(1);
    }
}
