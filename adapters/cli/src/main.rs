#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line host that runs a Tactica battle headlessly.

mod level;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tactica_core::{Event, Team};
use tactica_engine::{PresentationSink, Simulation, SimulationConfig};
use tactica_system_movement::DEFAULT_RNG_SEED;
use tactica_world::Catalog;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use crate::level::{LevelData, DEMO_LEVEL};

/// Runs a tile-based battle for a fixed number of ticks.
#[derive(Parser, Debug)]
#[command(name = "tactica", about = "Headless tactical combat simulation")]
struct Args {
    /// JSON level file; the built-in skirmish is used when omitted.
    #[arg(long)]
    level: Option<PathBuf>,

    /// TOML blueprint catalog merged over the built-in units and obstacles.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 200)]
    ticks: u64,

    /// Seed for movement conflict tie-breaks.
    #[arg(long, default_value_t = DEFAULT_RNG_SEED)]
    seed: u64,

    /// Milliseconds between ticks, used for presentation durations.
    #[arg(long, default_value_t = 300)]
    tick_ms: u64,

    /// Log every simulation event.
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// Forwards simulation events to the log.
#[derive(Debug, Default)]
struct EventLog;

impl PresentationSink for EventLog {
    fn notify(&mut self, event: &Event) {
        debug!(?event, "event");
    }
}

/// Entry point for the Tactica command-line interface.
fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let catalog = load_catalog(args.catalog.as_ref())?;
    let level = load_level(args.level.as_ref())?;
    let tiles = level.tile_map().context("level layout is invalid")?;

    let config = SimulationConfig {
        tick_interval: Duration::from_millis(args.tick_ms),
        rng_seed: args.seed,
    };
    let mut simulation = Simulation::new(tiles, catalog, config).with_sink(Box::new(EventLog));
    let _ = level.populate(&mut simulation);

    for _ in 0..args.ticks {
        let events = simulation.advance_tick();
        for event in &events {
            if let Event::UnitDied { unit, tile } = event {
                info!(tick = simulation.tick(), unit = unit.get(), %tile, "casualty");
            }
        }
        if one_side_remains(&simulation) {
            info!(tick = simulation.tick(), "battle decided");
            break;
        }
    }

    report(&simulation, &level.name);
    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_catalog(path: Option<&PathBuf>) -> Result<Catalog> {
    let mut catalog = Catalog::builtin();
    if let Some(path) = path {
        let document = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let extra = Catalog::from_toml_str(&document)
            .with_context(|| format!("failed to parse catalog {}", path.display()))?;
        catalog.merge(extra);
    }
    Ok(catalog)
}

fn load_level(path: Option<&PathBuf>) -> Result<LevelData> {
    let Some(path) = path else {
        return LevelData::parse(DEMO_LEVEL).context("built-in level is invalid");
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read level {}", path.display()))?;
    LevelData::parse(&json).with_context(|| format!("failed to load level {}", path.display()))
}

fn one_side_remains(simulation: &Simulation) -> bool {
    let view = simulation.units_snapshot();
    let mut teams = view.iter().map(|unit| unit.team);
    match teams.next() {
        Some(first) => teams.all(|team| team == first),
        None => true,
    }
}

fn report(simulation: &Simulation, name: &str) {
    let view = simulation.units_snapshot();
    println!("{name}: {} ticks", simulation.tick());
    for team in [Team::Player, Team::Enemy] {
        let survivors: Vec<_> = view.iter().filter(|unit| unit.team == team).collect();
        println!("  {team:?}: {} standing", survivors.len());
        for unit in survivors {
            println!(
                "    #{} {} at {} hp {}/{}",
                unit.id.get(),
                unit.kind,
                unit.position,
                unit.hp,
                unit.stats.max_hp
            );
        }
    }
}
