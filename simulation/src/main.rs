//! WSN lifetime simulator
//!
//! Runs LEACH, LEACH-Prim and APTEEN over a generated sensor field and
//! reports how long the network survives.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use wsn_logging::{LogConfig, SubscriberBuilder};
use wsn_simulation::{
    DeploymentBuilder, LifetimeReport, Position, Protocol, SimConfig, SimStats, Simulation,
    SquareAnchor, scenarios,
};

#[derive(Parser)]
#[command(
    name = "wsn-sim",
    about = "Wireless sensor network lifetime simulation (LEACH, LEACH-Prim, APTEEN)",
    version
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for deployment, election and sensing
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    /// Number of sensors
    #[arg(short, long, global = true, default_value = "100")]
    nodes: usize,

    /// Side of the square field in metres
    #[arg(long, global = true, default_value = "100.0")]
    area: f64,

    /// Sink position as X,Y
    #[arg(long, global = true, value_parser = parse_position, default_value = "50,175")]
    sink: Position,

    /// Initial sensor energy in joules
    #[arg(long, global = true, default_value = "0.5")]
    energy: f64,

    /// Write JSONL logs to this directory instead of the console
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one protocol until every sensor is dead
    Run {
        /// Protocol to simulate; defaults to the configured one
        #[arg(short, long, value_enum)]
        protocol: Option<Protocol>,

        /// Stop after this many rounds
        #[arg(long)]
        max_rounds: Option<u64>,

        /// Print statistics as JSON instead of progress lines
        #[arg(long)]
        json: bool,
    },

    /// Compare protocol lifetimes on the same deployment
    Compare,

    /// Compare APTEEN threshold presets and an adaptive per-cluster run
    Presets,

    /// Walk through global, per-cluster and queried TEEN parameters
    Params,

    /// Print the effective configuration as TOML
    Config,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    protocol: Protocol,
    rounds: u64,
    stats: &'a SimStats,
    lifetime: LifetimeReport,
}

fn parse_position(s: &str) -> Result<Position, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", s))?;
    let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok(Position::new(x, y))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let _guard = match &cli.log_dir {
        Some(dir) => SubscriberBuilder::new()
            .with_config(LogConfig::batch(dir.clone()))
            .with_level(level)
            .try_init()?,
        None => SubscriberBuilder::new().with_level(level).try_init()?,
    };

    let mut config = match &cli.config {
        Some(path) => SimConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SimConfig::default(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    let mut builder = DeploymentBuilder::new(cli.nodes)
        .with_sink(cli.sink)
        .with_initial_energy(cli.energy);
    if let Some(seed) = config.seed {
        builder = builder.with_seed(seed);
    }

    match cli.command {
        Commands::Run {
            protocol,
            max_rounds,
            json,
        } => {
            if let Some(protocol) = protocol {
                config.protocol = protocol;
            }
            if max_rounds.is_some() {
                config.max_rounds = max_rounds;
            }
            let deployment = builder.uniform_in_square(cli.area, SquareAnchor::LeftBottom)?;

            if json {
                let mut sim = Simulation::new(&deployment, config)?;
                sim.run_to_completion();
                let summary = RunSummary {
                    protocol: sim.config.protocol,
                    rounds: sim.round,
                    stats: &sim.stats,
                    lifetime: sim.lifetime_report(sim.config.protocol.name()),
                };
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                scenarios::run_protocol(&deployment, config)?;
            }
        }
        Commands::Compare => {
            let deployment = builder.uniform_in_square(cli.area, SquareAnchor::LeftBottom)?;
            scenarios::run_comparison(&deployment, &config)?;
        }
        Commands::Presets => {
            let deployment = builder.uniform_in_square(cli.area, SquareAnchor::LeftBottom)?;
            scenarios::run_preset_comparison(&deployment, &config)?;
        }
        Commands::Params => {
            let deployment = builder.uniform_in_square(cli.area, SquareAnchor::LeftBottom)?;
            scenarios::run_parameter_walkthrough(&deployment, &config)?;
        }
        Commands::Config => {
            print!("{}", config.to_toml_string()?);
        }
    }

    Ok(())
}
