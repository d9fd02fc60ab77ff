//! Agent state: vitals, inventory, role, trait and per-agent stores

use serde::{Deserialize, Serialize};

use crate::actions::catalog::ActionId;
use crate::core::types::{AgentId, Position, Tick};
use crate::entity::memory::MemoryLog;
use crate::entity::relationships::Relationships;

/// Upper bound for every vital
pub const VITAL_MAX: f32 = 100.0;

/// Physiological and social counters, all on a 0–100 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: f32,
    /// 0 = fed, 100 = starving
    pub hunger: f32,
    /// 0 = rested, 100 = exhausted
    pub fatigue: f32,
    /// 0 = satisfied, 100 = lonely
    pub social: f32,
    /// 0 = despair, 100 = content
    pub morale: f32,
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            health: VITAL_MAX,
            hunger: 20.0,
            fatigue: 10.0,
            social: 30.0,
            morale: 70.0,
        }
    }
}

impl Vitals {
    /// Clamp every field back into [0, 100]
    pub fn clamp(&mut self) {
        self.health = self.health.clamp(0.0, VITAL_MAX);
        self.hunger = self.hunger.clamp(0.0, VITAL_MAX);
        self.fatigue = self.fatigue.clamp(0.0, VITAL_MAX);
        self.social = self.social.clamp(0.0, VITAL_MAX);
        self.morale = self.morale.clamp(0.0, VITAL_MAX);
    }
}

/// Counted resources an agent can carry or a stockpile can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Food,
    Stone,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Food, ResourceKind::Stone];

    pub(crate) fn slot(self) -> usize {
        match self {
            ResourceKind::Food => 0,
            ResourceKind::Stone => 1,
        }
    }
}

/// Carried resources, clamped to a shared carry capacity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    counts: [u32; 2],
    capacity: u32,
}

impl Inventory {
    pub fn new(capacity: u32) -> Self {
        Self {
            counts: [0; 2],
            capacity,
        }
    }

    pub fn get(&self, kind: ResourceKind) -> u32 {
        self.counts[kind.slot()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn free_space(&self) -> u32 {
        self.capacity.saturating_sub(self.total())
    }

    /// Add up to `amount`, returns amount actually added
    pub fn add(&mut self, kind: ResourceKind, amount: u32) -> u32 {
        let added = amount.min(self.free_space());
        self.counts[kind.slot()] += added;
        added
    }

    /// Remove up to `amount`, returns amount actually removed
    pub fn take(&mut self, kind: ResourceKind, amount: u32) -> u32 {
        let slot = &mut self.counts[kind.slot()];
        let removed = amount.min(*slot);
        *slot -= removed;
        removed
    }
}

/// Permanent occupation; decides which actions are open and how they weigh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Forager,
    Miner,
    Builder,
    Guard,
    Caretaker,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Forager,
        Role::Miner,
        Role::Builder,
        Role::Guard,
        Role::Caretaker,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Role::Forager => "forager",
            Role::Miner => "miner",
            Role::Builder => "builder",
            Role::Guard => "guard",
            Role::Caretaker => "caretaker",
        }
    }

    /// Multiplier applied to an action's score for this role
    pub fn weight(&self, action: ActionId) -> f32 {
        match (self, action) {
            (Role::Forager, ActionId::Forage) => 1.2,
            (Role::Miner, ActionId::Mine) => 1.2,
            (Role::Builder, ActionId::Build) => 1.2,
            (Role::Builder, ActionId::Mine) => 0.7,
            (Role::Caretaker, ActionId::Share) => 1.3,
            (Role::Caretaker, ActionId::Socialize) => 1.1,
            (Role::Guard, ActionId::Fight) => 1.2,
            _ => 1.0,
        }
    }
}

/// Permanent personality; shifts scorer thresholds, never gates actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trait {
    Steady,
    Brave,
    Cautious,
    Generous,
    Greedy,
    Lazy,
    Diligent,
    Gregarious,
    Loner,
}

impl Trait {
    pub const ALL: [Trait; 9] = [
        Trait::Steady,
        Trait::Brave,
        Trait::Cautious,
        Trait::Generous,
        Trait::Greedy,
        Trait::Lazy,
        Trait::Diligent,
        Trait::Gregarious,
        Trait::Loner,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Trait::Steady => "steady",
            Trait::Brave => "brave",
            Trait::Cautious => "cautious",
            Trait::Generous => "generous",
            Trait::Greedy => "greedy",
            Trait::Lazy => "lazy",
            Trait::Diligent => "diligent",
            Trait::Gregarious => "gregarious",
            Trait::Loner => "loner",
        }
    }
}

/// What the agent did last tick; drives fatigue in the needs model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Activity {
    #[default]
    Idle,
    Moving,
    Working,
    Resting,
}

/// Time-boxed nudge toward one catalog action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionBias {
    pub intent: ActionId,
    /// Last tick on which the bias applies
    pub expires_at: Tick,
}

impl DecisionBias {
    pub fn is_active(&self, tick: Tick) -> bool {
        tick <= self.expires_at
    }
}

/// An autonomous colonist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub bio: String,
    pub goal: String,
    pub position: Position,
    pub vitals: Vitals,
    pub inventory: Inventory,
    pub role: Role,
    pub personality: Trait,
    /// Hunger gained per tick before modifiers
    pub metabolism: f32,
    pub relationships: Relationships,
    pub bias: Option<DecisionBias>,
    pub memory: MemoryLog,
    pub alive: bool,
    pub activity: Activity,

    // Remembered targets; the only stickiness the scorer has
    pub wander_target: Option<Position>,
    pub resource_target: Option<Position>,
    pub build_target: Option<Position>,

    /// Display state from the last accepted decision
    pub justification: Option<String>,
    pub mood: Option<String>,

    /// Consecutive ticks spent at critical morale
    pub low_morale_ticks: u32,
    /// Consecutive ticks without friendly company
    pub ticks_alone: u32,
}

impl Agent {
    pub fn new(name: impl Into<String>, role: Role, personality: Trait, position: Position) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            bio: String::new(),
            goal: String::new(),
            position,
            vitals: Vitals::default(),
            inventory: Inventory::new(10),
            role,
            personality,
            metabolism: 0.5,
            relationships: Relationships::new(),
            bias: None,
            memory: MemoryLog::new(),
            alive: true,
            activity: Activity::Idle,
            wander_target: None,
            resource_target: None,
            build_target: None,
            justification: None,
            mood: None,
            low_morale_ticks: 0,
            ticks_alone: 0,
        }
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.inventory = Inventory::new(capacity);
        self
    }

    pub fn with_story(mut self, bio: impl Into<String>, goal: impl Into<String>) -> Self {
        self.bio = bio.into();
        self.goal = goal.into();
        self
    }

    /// Affinity this agent feels toward `other` (50 when unknown)
    pub fn affinity(&self, other: AgentId) -> f32 {
        self.relationships.affinity(other)
    }

    /// The bias intent if one applies on `tick`
    pub fn active_intent(&self, tick: Tick) -> Option<ActionId> {
        self.bias.filter(|b| b.is_active(tick)).map(|b| b.intent)
    }

    /// Drop a bias whose window has closed; true if one was cleared
    pub fn expire_bias(&mut self, tick: Tick) -> bool {
        match self.bias {
            Some(bias) if !bias.is_active(tick) => {
                self.bias = None;
                true
            }
            _ => false,
        }
    }

    /// Mark the agent dead; it is frozen from here on
    pub fn die(&mut self) {
        self.alive = false;
        self.vitals.health = 0.0;
        self.bias = None;
        self.activity = Activity::Idle;
    }

    /// Carry a predecessor's history forward into this agent
    pub fn inherit_memory(&mut self, predecessor: &Agent) {
        self.memory.extend_from(&predecessor.memory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_clamps_to_capacity() {
        let mut inv = Inventory::new(10);
        assert_eq!(inv.add(ResourceKind::Food, 7), 7);
        assert_eq!(inv.add(ResourceKind::Stone, 7), 3);
        assert_eq!(inv.total(), 10);
        assert_eq!(inv.free_space(), 0);
    }

    #[test]
    fn test_inventory_take_never_negative() {
        let mut inv = Inventory::new(10);
        inv.add(ResourceKind::Food, 2);
        assert_eq!(inv.take(ResourceKind::Food, 5), 2);
        assert_eq!(inv.get(ResourceKind::Food), 0);
        assert_eq!(inv.take(ResourceKind::Food, 1), 0);
    }

    #[test]
    fn test_bias_expiry_boundary() {
        let mut agent = Agent::new("Ada", Role::Forager, Trait::Steady, Position::new(0, 0));
        agent.bias = Some(DecisionBias {
            intent: ActionId::Eat,
            expires_at: 10,
        });

        assert_eq!(agent.active_intent(10), Some(ActionId::Eat));
        assert!(!agent.expire_bias(10));
        assert!(agent.expire_bias(11));
        assert!(agent.bias.is_none());
        // Cleared only once
        assert!(!agent.expire_bias(12));
    }

    #[test]
    fn test_die_freezes_state() {
        let mut agent = Agent::new("Bo", Role::Guard, Trait::Brave, Position::new(0, 0));
        agent.bias = Some(DecisionBias {
            intent: ActionId::Fight,
            expires_at: 100,
        });
        agent.die();
        assert!(!agent.alive);
        assert_eq!(agent.vitals.health, 0.0);
        assert!(agent.bias.is_none());
    }

    #[test]
    fn test_vitals_clamp() {
        let mut v = Vitals {
            health: 120.0,
            hunger: -4.0,
            fatigue: 50.0,
            social: 101.0,
            morale: -0.1,
        };
        v.clamp();
        assert_eq!(v.health, 100.0);
        assert_eq!(v.hunger, 0.0);
        assert_eq!(v.social, 100.0);
        assert_eq!(v.morale, 0.0);
    }
}
