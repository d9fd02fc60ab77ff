//! Ember Colony - headless runner
//!
//! Builds a small scattered world, spawns a colony and runs it for a number
//! of ticks. With LLM_API_KEY set, crises are escalated to the configured
//! provider; otherwise the scorer runs alone.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tokio::runtime::Runtime;

use ember_colony::core::config::SimulationConfig;
use ember_colony::core::error::Result;
use ember_colony::core::types::Position;
use ember_colony::entity::agent::{Agent, ResourceKind, Role, Trait};
use ember_colony::llm::{DecisionSystem, HttpProvider, TracingUsageSink};
use ember_colony::simulation::tick::{run_tick, Colony};
use ember_colony::world::{AStarPathfinder, GridWorld, Threat, Tile, TileKind};

const NAMES: &[&str] = &[
    "Ada", "Bram", "Cora", "Dov", "Elin", "Fenn", "Greta", "Hale", "Ines", "Joss", "Kira", "Lev",
];

/// Headless Ember Colony runner
#[derive(Parser, Debug)]
#[command(name = "ember-colony")]
#[command(about = "Run a colony for a fixed number of ticks and report what happened")]
struct Args {
    /// Ticks to simulate
    #[arg(long, default_value_t = 500)]
    ticks: u64,

    /// Colonists to spawn
    #[arg(long, default_value_t = 8)]
    agents: usize,

    /// Map width and height in tiles
    #[arg(long, default_value_t = 48)]
    size: i32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// TOML file overriding the default tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// Tick at which a raid arrives
    #[arg(long)]
    raid_at: Option<u64>,

    /// Replace each colonist who dies with a newcomer who keeps their memories
    #[arg(long)]
    succession: bool,

    /// Never call the provider, even if configured
    #[arg(long)]
    no_llm: bool,

    /// Output format: json or text
    #[arg(long, default_value = "text")]
    format: String,
}

#[derive(Serialize)]
struct RunReport {
    seed: u64,
    ticks: u64,
    survivors: usize,
    deaths: usize,
    escalations: usize,
    decisions_applied: usize,
    surprises: usize,
    stockpile_food: u32,
    stockpile_stone: u32,
    provider_calls: u64,
    provider_failures: u64,
    tokens: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ember_colony=info")),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    let config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    tracing::info!(seed, ticks = args.ticks, agents = args.agents, "Ember Colony starting");

    // Runtime for provider calls; the tick itself stays on this thread
    let rt = Runtime::new()?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut world = scatter_world(args.size, &mut rng);
    let pathfinder = AStarPathfinder::default();
    let center = Position::new(args.size / 2, args.size / 2);

    let mut colony = Colony::new(config.clone(), center, seed);
    colony.stockpile.add(ResourceKind::Food, 20);
    spawn_colonists(&mut colony, args.agents, center, &mut rng);

    let mut decisions = if args.no_llm {
        None
    } else {
        match HttpProvider::from_env() {
            Ok(provider) => Some(
                DecisionSystem::new(Arc::new(provider), config.escalation.clone(), rt.handle().clone())
                    .with_usage_sink(Box::new(TracingUsageSink)),
            ),
            Err(e) => {
                tracing::warn!("{} - running without escalation", e);
                None
            }
        }
    };

    let mut report = RunReport {
        seed,
        ticks: 0,
        survivors: 0,
        deaths: 0,
        escalations: 0,
        decisions_applied: 0,
        surprises: 0,
        stockpile_food: 0,
        stockpile_stone: 0,
        provider_calls: 0,
        provider_failures: 0,
        tokens: 0,
    };

    for _ in 0..args.ticks {
        if args.raid_at == Some(colony.tick) {
            let edge = Position::new(1, rng.gen_range(1..args.size - 1));
            colony
                .threats
                .push(Threat::new(colony.tick as u32, "raiders", edge, 60.0).raiding());
            tracing::warn!(tick = colony.tick, "raiders sighted at {}", edge);
        }

        let summary = run_tick(&mut colony, &mut world, &pathfinder, decisions.as_mut());
        report.escalations += summary.escalations;
        report.decisions_applied += summary.decisions_applied;
        report.surprises += summary.surprises;
        report.deaths += summary.deaths.len();
        if !summary.deaths.is_empty() {
            let dead = colony.remove_dead(decisions.as_mut());
            if args.succession {
                for gone in &dead {
                    let name = NAMES[(report.deaths + colony.agents.len()) % NAMES.len()];
                    colony.spawn_heir(name, gone);
                    tracing::info!(tick = colony.tick, "{} takes up {}'s work", name, gone.name);
                }
            }
        }

        if args.format == "text" {
            for event in colony.events.drain() {
                println!("[{:>5}] {}", event.tick, event.message);
            }
        } else {
            colony.events.drain();
        }
        if colony.population() == 0 {
            tracing::warn!(tick = colony.tick, "colony lost");
            break;
        }
    }

    report.ticks = colony.tick;
    report.survivors = colony.population();
    report.stockpile_food = colony.stockpile.get(ResourceKind::Food);
    report.stockpile_stone = colony.stockpile.get(ResourceKind::Stone);
    if let Some(ds) = &decisions {
        let usage = ds.usage();
        report.provider_calls = usage.calls;
        report.provider_failures = usage.failures;
        report.tokens = usage.input_tokens + usage.output_tokens;
    }

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!();
        println!("=== after {} ticks (seed {}) ===", report.ticks, report.seed);
        for agent in &colony.agents {
            println!(
                "{:<6} {:<9} {:<10} hp {:>3.0} hunger {:>3.0} fatigue {:>3.0} morale {:>3.0} {}",
                agent.name,
                agent.role.name(),
                agent.personality.name(),
                agent.vitals.health,
                agent.vitals.hunger,
                agent.vitals.fatigue,
                agent.vitals.morale,
                agent.justification.as_deref().unwrap_or("")
            );
        }
        println!(
            "survivors {}  deaths {}  stockpile {} food / {} stone  escalations {}",
            report.survivors, report.deaths, report.stockpile_food, report.stockpile_stone, report.escalations
        );
    }

    // Outstanding calls are abandoned; their replies have nowhere to land
    rt.shutdown_background();
    Ok(())
}

/// Open ground with berry bushes, rock outcrops and a little water
fn scatter_world(size: i32, rng: &mut ChaCha8Rng) -> GridWorld {
    let mut world = GridWorld::new(size, size);
    let tiles = (size * size) as usize;
    for _ in 0..tiles / 30 {
        let pos = Position::new(rng.gen_range(0..size), rng.gen_range(0..size));
        world.set(
            pos,
            Tile {
                kind: TileKind::BerryBush,
                resource: rng.gen_range(4..12),
            },
        );
    }
    for _ in 0..tiles / 60 {
        let pos = Position::new(rng.gen_range(0..size), rng.gen_range(0..size));
        world.set(
            pos,
            Tile {
                kind: TileKind::Rock,
                resource: rng.gen_range(10..30),
            },
        );
    }
    for _ in 0..tiles / 120 {
        let pos = Position::new(rng.gen_range(0..size), rng.gen_range(0..size));
        world.set(
            pos,
            Tile {
                kind: TileKind::Water,
                resource: 0,
            },
        );
    }
    world
}

fn spawn_colonists(colony: &mut Colony, count: usize, center: Position, rng: &mut ChaCha8Rng) {
    for i in 0..count {
        let name = NAMES[i % NAMES.len()];
        let role = Role::ALL[i % Role::ALL.len()];
        let personality = *Trait::ALL.choose(rng).unwrap_or(&Trait::Steady);
        let pos = center.offset(rng.gen_range(-3..=3), rng.gen_range(-3..=3));
        let mut agent = Agent::new(name, role, personality, pos)
            .with_story(format!("A {} who came with the first wagons", role.name()), "See the colony through the winter");
        agent.metabolism = colony.config.needs.base_metabolism * rng.gen_range(0.8..1.2);
        colony.spawn(agent);
    }
}
