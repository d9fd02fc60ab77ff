//! Delayed outcome checks for accepted decisions
//!
//! When a decision is accepted we photograph the agent. Some ticks later the
//! photograph is compared against the live agent with a predicate chosen by
//! the decision's intent. A miss writes a surprise onto the memory entry so
//! later prompts can learn from it.

use crate::actions::catalog::ActionId;
use crate::core::types::{AgentId, Tick};
use crate::entity::agent::{Agent, Inventory, ResourceKind, Vitals};

/// Agent state captured when a decision was accepted
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationSnapshot {
    pub agent: AgentId,
    pub intent: ActionId,
    pub vitals: Vitals,
    pub inventory: Inventory,
    /// Memory entry to backfill on a miss
    pub memory_index: usize,
    pub due: Tick,
}

impl VerificationSnapshot {
    pub fn capture(agent: &Agent, intent: ActionId, memory_index: usize, due: Tick) -> Self {
        Self {
            agent: agent.id,
            intent,
            vitals: agent.vitals,
            inventory: agent.inventory.clone(),
            memory_index,
            due,
        }
    }
}

/// Whether decisions with this intent can be checked at all
pub fn has_predicate(intent: ActionId) -> bool {
    !matches!(intent, ActionId::Wander | ActionId::Deposit | ActionId::Build)
}

/// Did the decision work out? None when the intent has no predicate.
pub fn succeeded(snapshot: &VerificationSnapshot, now: &Agent) -> Option<bool> {
    let (then, v) = (&snapshot.vitals, &now.vitals);
    let carried = |inv: &Inventory, kind| inv.get(kind);
    let result = match snapshot.intent {
        ActionId::Eat => v.hunger < then.hunger,
        ActionId::Forage => {
            carried(&now.inventory, ResourceKind::Food) > carried(&snapshot.inventory, ResourceKind::Food)
        }
        ActionId::Mine => {
            carried(&now.inventory, ResourceKind::Stone) > carried(&snapshot.inventory, ResourceKind::Stone)
        }
        ActionId::Rest => v.fatigue < then.fatigue,
        ActionId::Socialize => v.social < then.social,
        ActionId::Share => {
            carried(&now.inventory, ResourceKind::Food) < carried(&snapshot.inventory, ResourceKind::Food)
        }
        ActionId::Fight => v.health > 50.0,
        ActionId::Flee => v.health >= then.health,
        ActionId::Wander | ActionId::Deposit | ActionId::Build => return None,
    };
    Some(result)
}

/// Surprise text written to memory when a check fails
pub fn surprise(snapshot: &VerificationSnapshot, now: &Agent) -> String {
    let (then, v) = (&snapshot.vitals, &now.vitals);
    match snapshot.intent {
        ActionId::Eat => format!("surprise: still hungry (hunger {:.0} -> {:.0})", then.hunger, v.hunger),
        ActionId::Forage => "surprise: came back with no more food".to_string(),
        ActionId::Mine => "surprise: came back with no more stone".to_string(),
        ActionId::Rest => format!("surprise: no rest came (fatigue {:.0} -> {:.0})", then.fatigue, v.fatigue),
        ActionId::Socialize => "surprise: still lonely".to_string(),
        ActionId::Share => "surprise: the food never changed hands".to_string(),
        ActionId::Fight => format!("surprise: badly hurt in the fight (health {:.0})", v.health),
        ActionId::Flee => format!("surprise: hurt while fleeing (health {:.0} -> {:.0})", then.health, v.health),
        other => format!("surprise: {} did not go as planned", other.tag()),
    }
}

/// Pending snapshots, each consumed exactly once
#[derive(Debug, Default)]
pub struct VerificationQueue {
    pending: Vec<VerificationSnapshot>,
}

impl VerificationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, snapshot: VerificationSnapshot) {
        self.pending.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every snapshot due at or before `tick`
    pub fn take_due(&mut self, tick: Tick) -> Vec<VerificationSnapshot> {
        let (due, keep): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|s| s.due <= tick);
        self.pending = keep;
        due
    }

    /// Drop everything pending for `agent`
    pub fn forget(&mut self, agent: AgentId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|s| s.agent != agent);
        before - self.pending.len()
    }
}
