//! Tick system - orchestrates one simulation step
//!
//! Order per tick:
//! apply finished escalations -> expire biases -> for each living agent
//! (needs -> crisis check -> maybe escalate -> pick and run one action)
//! -> check due verifications -> advance the clock.
//!
//! Everything here is single-threaded. The only concurrency is the detached
//! provider calls owned by [`DecisionSystem`].

use ahash::AHashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::actions::catalog::{ActionId, CATALOG};
use crate::actions::context::ActionContext;
use crate::core::config::SimulationConfig;
use crate::core::types::{AgentId, Position, Tick};
use crate::entity::agent::{Agent, ResourceKind};
use crate::entity::needs::{self, Environment, Neighbor};
use crate::llm::escalation::DecisionSystem;
use crate::llm::prompt::ColonyContext;
use crate::simulation::action_select::select_and_execute;
use crate::simulation::crisis::detect;
use crate::simulation::events::{EventLog, EventSink};
use crate::world::{Pathfinder, Stockpile, Threat, TileMap};

/// Everything the decision core owns between ticks
pub struct Colony {
    pub agents: Vec<Agent>,
    pub stockpile: Stockpile,
    pub stockpile_position: Position,
    pub threats: Vec<Threat>,
    /// The tick about to run
    pub tick: Tick,
    pub rng: ChaCha8Rng,
    pub config: SimulationConfig,
    pub environment: Environment,
    pub events: EventLog,
}

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickSummary {
    pub tick: Tick,
    /// One entry per agent that acted, in agent order
    pub actions: Vec<(AgentId, ActionId)>,
    pub escalations: usize,
    pub decisions_applied: usize,
    pub surprises: usize,
    pub deaths: Vec<AgentId>,
}

impl Colony {
    pub fn new(config: SimulationConfig, stockpile_position: Position, seed: u64) -> Self {
        Self {
            agents: Vec::new(),
            stockpile: Stockpile::new(),
            stockpile_position,
            threats: Vec::new(),
            tick: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
            environment: Environment::default(),
            events: EventLog::new(),
        }
    }

    /// Add an agent, applying the configured carry capacity
    pub fn spawn(&mut self, agent: Agent) -> AgentId {
        let agent = agent.with_capacity(self.config.actions.carry_capacity);
        let id = agent.id;
        self.agents.push(agent);
        id
    }

    /// Add a successor that takes over a removed agent's role and history
    pub fn spawn_heir(&mut self, name: impl Into<String>, predecessor: &Agent) -> AgentId {
        let mut heir = Agent::new(name, predecessor.role, predecessor.personality, self.stockpile_position)
            .with_story(format!("Took up {}'s work", predecessor.name), predecessor.goal.clone());
        heir.metabolism = predecessor.metabolism;
        heir.inherit_memory(predecessor);
        self.spawn(heir)
    }

    pub fn agent_index(&self, id: AgentId) -> Option<usize> {
        self.agents.iter().position(|a| a.id == id)
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|a| a.id == id)
    }

    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|a| a.id == id)
    }

    pub fn living(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.alive)
    }

    pub fn population(&self) -> usize {
        self.living().count()
    }

    /// Take dead agents out of the active set
    ///
    /// Survivors forget their relationships with the departed. Pass the
    /// decision system, if any, to drop its per-agent state as well.
    pub fn remove_dead(&mut self, decisions: Option<&mut DecisionSystem>) -> Vec<Agent> {
        let (dead, alive): (Vec<Agent>, Vec<Agent>) =
            std::mem::take(&mut self.agents).into_iter().partition(|a| !a.alive);
        self.agents = alive;

        for gone in &dead {
            for agent in &mut self.agents {
                agent.relationships.forget(gone.id);
            }
        }
        if let Some(ds) = decisions {
            for gone in &dead {
                ds.forget(gone.id);
            }
        }
        dead
    }

    /// Snapshot handed to prompts
    pub fn context(&self) -> ColonyContext {
        let threats = self
            .threats
            .iter()
            .filter(|t| t.is_active())
            .map(|t| {
                let kind = if t.raid { "raid" } else { "threat" };
                format!("{} ({}, strength {:.0}) at {}", t.name, kind, t.strength, t.position)
            })
            .collect();
        let roster: AHashMap<AgentId, String> =
            self.agents.iter().map(|a| (a.id, a.name.clone())).collect();

        ColonyContext {
            tick: self.tick,
            population: self.population(),
            stockpile_food: self.stockpile.get(ResourceKind::Food),
            stockpile_stone: self.stockpile.get(ResourceKind::Stone),
            threats,
            roster,
        }
    }
}

/// Run one full tick
pub fn run_tick(
    colony: &mut Colony,
    world: &mut dyn TileMap,
    pathfinder: &dyn Pathfinder,
    mut decisions: Option<&mut DecisionSystem>,
) -> TickSummary {
    let tick = colony.tick;
    let mut summary = TickSummary {
        tick,
        ..TickSummary::default()
    };

    if let Some(ds) = decisions.as_deref_mut() {
        summary.decisions_applied = ds.apply_completed(&mut colony.agents, tick, &mut colony.events);
    }

    for agent in colony.agents.iter_mut() {
        if agent.expire_bias(tick) {
            colony.events.debug(tick, agent.id, "decision bias expired".to_string());
        }
    }

    let context = colony.context();

    for i in 0..colony.agents.len() {
        if !colony.agents[i].alive {
            continue;
        }

        let neighbors: Vec<Neighbor> = colony.agents.iter().map(Neighbor::from).collect();
        let outcome = needs::advance(
            &mut colony.agents[i],
            &neighbors,
            tick,
            &colony.environment,
            &colony.config.needs,
            &mut colony.rng,
        );
        if outcome.died {
            let id = colony.agents[i].id;
            colony.events.warn(tick, Some(id), format!("{} starved to death", colony.agents[i].name));
            summary.deaths.push(id);
            continue;
        }

        let crisis = detect(
            &colony.agents[i],
            &colony.agents,
            &*world,
            &colony.stockpile,
            &colony.threats,
            &colony.config.crisis,
        );
        if let (Some(crisis), Some(ds)) = (crisis.as_ref(), decisions.as_deref_mut()) {
            let result = ds.request_decision(&colony.agents[i], crisis, &context, tick);
            if result.is_spawned() {
                summary.escalations += 1;
                let id = colony.agents[i].id;
                colony.events.info(tick, id, format!("escalated {}", crisis.kind));
            }
        }

        let mut ctx = ActionContext {
            actor: i,
            tick,
            agents: &mut colony.agents,
            world: &mut *world,
            pathfinder,
            stockpile: &mut colony.stockpile,
            stockpile_position: colony.stockpile_position,
            threats: &mut colony.threats,
            config: &colony.config.actions,
            rng: &mut colony.rng,
            events: &mut colony.events,
        };
        if let Some(selection) = select_and_execute(&mut ctx, CATALOG) {
            let id = ctx.agent().id;
            summary.actions.push((id, selection.action));
            if !ctx.agent().alive {
                summary.deaths.push(id);
            }
        }
    }

    if let Some(ds) = decisions.as_deref_mut() {
        summary.surprises = ds.drain_verifications(&mut colony.agents, tick, &mut colony.events);
    }

    colony.threats.retain(|t| t.is_active());
    colony.tick += 1;
    summary
}
