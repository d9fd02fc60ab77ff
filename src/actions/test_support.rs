//! Shared fixture for action unit tests

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::actions::context::ActionContext;
use crate::core::config::ActionConfig;
use crate::core::types::{Position, Tick};
use crate::entity::agent::{Agent, Role, Trait};
use crate::simulation::events::EventLog;
use crate::world::{AStarPathfinder, GridWorld, Stockpile, Threat};

pub(crate) struct Fixture {
    pub agents: Vec<Agent>,
    pub world: GridWorld,
    pub pathfinder: AStarPathfinder,
    pub stockpile: Stockpile,
    pub stockpile_position: Position,
    pub threats: Vec<Threat>,
    pub config: ActionConfig,
    pub rng: ChaCha8Rng,
    pub events: EventLog,
    pub tick: Tick,
}

impl Fixture {
    /// 40x40 open ground, empty stockpile at the center
    pub fn new() -> Self {
        Self {
            agents: Vec::new(),
            world: GridWorld::new(40, 40),
            pathfinder: AStarPathfinder::default(),
            stockpile: Stockpile::new(),
            stockpile_position: Position::new(20, 20),
            threats: Vec::new(),
            config: ActionConfig::default(),
            rng: ChaCha8Rng::seed_from_u64(7),
            events: EventLog::new(),
            tick: 1,
        }
    }

    pub fn spawn(&mut self, role: Role, personality: Trait, position: Position) -> usize {
        let name = format!("agent-{}", self.agents.len());
        self.agents.push(Agent::new(name, role, personality, position));
        self.agents.len() - 1
    }

    pub fn ctx(&mut self, actor: usize) -> ActionContext<'_> {
        ActionContext {
            actor,
            tick: self.tick,
            agents: &mut self.agents,
            world: &mut self.world,
            pathfinder: &self.pathfinder,
            stockpile: &mut self.stockpile,
            stockpile_position: self.stockpile_position,
            threats: &mut self.threats,
            config: &self.config,
            rng: &mut self.rng,
            events: &mut self.events,
        }
    }
}
