//! Outbreak Simulation Driver
//!
//! Builds a scenario, runs it for N ticks, prints final per-agent virus
//! levels, and optionally writes a JSON snapshot of the run.

use clap::{Parser, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::info;

use sim_core::{setup, Config, Environment, SimRng, WorldSnapshot};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "outbreak_sim")]
#[command(about = "An agent-based viral outbreak simulation")]
struct Args {
    /// Random seed for reproducibility (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate (overrides the config file)
    #[arg(long)]
    ticks: Option<u64>,

    /// Path to the tuning file
    #[arg(long, default_value = sim_core::config::DEFAULT_TUNING_PATH)]
    config: PathBuf,

    /// Scenario to run
    #[arg(long, value_enum, default_value_t = Scenario::Single)]
    scenario: Scenario,

    /// Write a JSON snapshot of the finished run to this path
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Scenario {
    /// One 50x50 room, 50 clean agents plus an index case
    Single,
    /// School hierarchy: buildings, classrooms, canteen, sports ground
    School,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let config = Config::from_file_or_default(&args.config)?;
    let seed = args.seed.unwrap_or(config.simulation.seed);
    let ticks = args.ticks.unwrap_or(config.simulation.ticks);
    let tick_duration = config.simulation.tick_duration;

    println!("Outbreak Simulation Engine");
    println!("==========================");
    println!("Seed: {}", seed);
    println!("Ticks: {}", ticks);
    println!("Scenario: {:?}", args.scenario);
    println!();

    let mut rng = SimRng::seed_from_u64(seed);
    let mut root: Environment = match args.scenario {
        Scenario::Single => setup::single_room(&config, &mut rng)?,
        Scenario::School => setup::school(&config, &mut rng)?,
    };

    let interval = config.simulation.snapshot_interval;
    for tick in 0..ticks {
        root.step(tick_duration, &mut rng);
        if tick % 100 == 0 {
            info!(
                tick,
                infected = root.infected_count_history.last().copied().unwrap_or(0),
                "tick complete"
            );
        }
        if interval > 0 && (tick + 1) % interval == 0 {
            if let Some(path) = &args.snapshot {
                write_snapshot(&root, tick + 1, &path.with_extension(format!("{}.json", tick + 1)))?;
            }
        }
    }

    println!("Final virus levels:");
    for agent in root.agents(-1) {
        println!("  {}: {:.2}", agent.id, agent.virus_level());
    }
    println!();
    println!(
        "Infected (direct, final tick): {}",
        root.infected_count_history.last().copied().unwrap_or(0)
    );

    if let Some(path) = &args.snapshot {
        write_snapshot(&root, ticks, path)?;
    }

    Ok(())
}

fn write_snapshot(
    root: &Environment,
    tick: u64,
    path: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let snapshot = WorldSnapshot::capture(tick, root);
    fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
    info!(path = %path.display(), "wrote run snapshot");
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}
