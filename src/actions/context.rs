//! Per-tick context shared by every catalog entry

use rand_chacha::ChaCha8Rng;

use crate::core::config::ActionConfig;
use crate::core::types::{Position, Tick};
use crate::entity::agent::{Activity, Agent};
use crate::entity::traits::{threshold, Threshold};
use crate::simulation::events::EventSink;
use crate::world::threat::nearest_threat;
use crate::world::{Pathfinder, Stockpile, Threat, TileMap};

/// Everything an action may read or touch while one agent acts
///
/// Built fresh for each agent inside the synchronous tick phase, so the
/// acting agent is the only writer for its duration.
pub struct ActionContext<'a> {
    /// Index of the acting agent in `agents`
    pub actor: usize,
    pub tick: Tick,
    pub agents: &'a mut [Agent],
    pub world: &'a mut dyn TileMap,
    pub pathfinder: &'a dyn Pathfinder,
    pub stockpile: &'a mut Stockpile,
    pub stockpile_position: Position,
    pub threats: &'a mut [Threat],
    pub config: &'a ActionConfig,
    pub rng: &'a mut ChaCha8Rng,
    pub events: &'a mut dyn EventSink,
}

/// Result of one movement attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    /// Already on or next to the target
    Arrived,
    Stepped,
    /// No path this tick
    Blocked,
}

impl<'a> ActionContext<'a> {
    pub fn agent(&self) -> &Agent {
        &self.agents[self.actor]
    }

    pub fn agent_mut(&mut self) -> &mut Agent {
        &mut self.agents[self.actor]
    }

    /// Trait-adjusted threshold for the acting agent
    pub fn threshold(&self, name: Threshold, default: f32) -> f32 {
        threshold(self.agent().personality, name, default)
    }

    /// Living agents other than the actor, with their indices
    pub fn others(&self) -> impl Iterator<Item = (usize, &Agent)> + '_ {
        let actor = self.actor;
        self.agents
            .iter()
            .enumerate()
            .filter(move |(i, a)| *i != actor && a.alive)
    }

    pub fn nearest_threat(&self) -> Option<(usize, f32)> {
        nearest_threat(self.threats, self.agent().position)
    }

    pub fn near_stockpile(&self) -> bool {
        self.agent().position.distance(&self.stockpile_position) <= self.config.stockpile_radius
    }

    /// Mutable access to the actor and one other agent at the same time
    ///
    /// Returns None when `other` is the actor or out of range.
    pub fn pair_mut(&mut self, other: usize) -> Option<(&mut Agent, &mut Agent)> {
        let actor = self.actor;
        if other == actor || other >= self.agents.len() {
            return None;
        }
        if actor < other {
            let (left, right) = self.agents.split_at_mut(other);
            Some((&mut left[actor], &mut right[0]))
        } else {
            let (left, right) = self.agents.split_at_mut(actor);
            Some((&mut right[0], &mut left[other]))
        }
    }

    /// Take one step toward `target`; arrival means adjacent or on it
    pub fn move_toward(&mut self, target: Position) -> Movement {
        let from = self.agent().position;
        if from.is_adjacent(&target) {
            return Movement::Arrived;
        }

        let world: &dyn TileMap = &*self.world;
        let step = self
            .pathfinder
            .next_step(from, target, &|p| world.is_walkable(p));

        match step {
            Some(next) => {
                let agent = self.agent_mut();
                agent.position = next;
                agent.activity = Activity::Moving;
                Movement::Stepped
            }
            None => Movement::Blocked,
        }
    }

    /// Emit an info event about the acting agent
    pub fn log(&mut self, message: String) {
        let (tick, id) = (self.tick, self.agent().id);
        self.events.info(tick, id, message);
    }
}
