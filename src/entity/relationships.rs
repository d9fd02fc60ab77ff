//! Per-pair affinity store
//!
//! Affinity is directional (A's opinion of B need not equal B's opinion of A)
//! and lives on a 0–100 scale with 50 as neutral.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::AgentId;
use crate::entity::agent::Agent;
use crate::entity::traits::{threshold, Threshold};

pub const NEUTRAL_AFFINITY: f32 = 50.0;
pub const MAX_AFFINITY: f32 = 100.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Relationships {
    affinity: AHashMap<AgentId, f32>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn affinity(&self, other: AgentId) -> f32 {
        self.affinity.get(&other).copied().unwrap_or(NEUTRAL_AFFINITY)
    }

    pub fn set(&mut self, other: AgentId, value: f32) {
        self.affinity.insert(other, value.clamp(0.0, MAX_AFFINITY));
    }

    /// Shift affinity by `delta`, clamped; returns the new value
    pub fn adjust(&mut self, other: AgentId, delta: f32) -> f32 {
        let value = (self.affinity(other) + delta).clamp(0.0, MAX_AFFINITY);
        self.affinity.insert(other, value);
        value
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, f32)> + '_ {
        self.affinity.iter().map(|(id, v)| (*id, *v))
    }

    pub fn forget(&mut self, other: AgentId) {
        self.affinity.remove(&other);
    }
}

/// Cooperative act: both sides warm up by the same amount
pub fn cooperate(a: &mut Agent, b: &mut Agent, amount: f32) {
    a.relationships.adjust(b.id, amount);
    b.relationships.adjust(a.id, amount);
}

/// Contested act by `actor` against `victim`
///
/// The victim's opinion of the actor drops by `base` scaled with the
/// victim's contest sensitivity; the actor's opinion drops by half of that.
pub fn contest(actor: &mut Agent, victim: &mut Agent, base: f32) {
    let scale = threshold(victim.personality, Threshold::ContestSensitivity, 1.0);
    let loss = base * scale;
    victim.relationships.adjust(actor.id, -loss);
    actor.relationships.adjust(victim.id, -loss / 2.0);
}
