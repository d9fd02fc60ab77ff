use serde::{Deserialize, Serialize};

use crate::core::types::Position;

/// A hostile presence near the colony (wolf pack, raiders)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Threat {
    pub id: u32,
    pub name: String,
    pub position: Position,
    /// Remaining fighting strength; the threat is gone at zero
    pub strength: f32,
    /// Damage dealt to an agent that fights it, per tick
    pub damage: f32,
    /// Part of a coordinated raid wave
    pub raid: bool,
}

impl Threat {
    pub fn new(id: u32, name: impl Into<String>, position: Position, strength: f32) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            strength,
            damage: 5.0,
            raid: false,
        }
    }

    pub fn raiding(mut self) -> Self {
        self.raid = true;
        self
    }

    pub fn is_active(&self) -> bool {
        self.strength > 0.0
    }

    /// Apply damage, clamped at zero; returns true when this defeats it
    pub fn wound(&mut self, amount: f32) -> bool {
        let was_active = self.is_active();
        self.strength = (self.strength - amount).max(0.0);
        was_active && !self.is_active()
    }
}

/// Closest active threat to `pos`, with its index and distance
pub fn nearest_threat(threats: &[Threat], pos: Position) -> Option<(usize, f32)> {
    threats
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_active())
        .map(|(i, t)| (i, t.position.distance(&pos)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}
