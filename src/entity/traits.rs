//! Trait → threshold overrides
//!
//! Traits are data, not branches: each one lists the scorer thresholds it
//! shifts. Anything not listed keeps the configured default.

use crate::entity::agent::Trait;

/// Named thresholds a trait may override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Threshold {
    HungerMidpoint,
    ForageMidpoint,
    FatigueMidpoint,
    SocialMidpoint,
    /// Distance (tiles) at which fleeing reaches half desirability
    FleeMidpoint,
    ShareGate,
    ShareFloor,
    /// Multiplier on fatigue gained from work and movement
    FatigueRate,
    /// Multiplier on affinity lost when this agent is contested
    ContestSensitivity,
}

use Threshold::*;

const TRAIT_TABLE: &[(Trait, &[(Threshold, f32)])] = &[
    (Trait::Steady, &[]),
    (Trait::Brave, &[(FleeMidpoint, 1.5)]),
    (Trait::Cautious, &[(FleeMidpoint, 5.0), (HungerMidpoint, 45.0)]),
    (Trait::Generous, &[(ShareGate, 15.0), (ShareFloor, 3.0)]),
    (
        Trait::Greedy,
        &[(ShareGate, 60.0), (ShareFloor, 7.0), (ContestSensitivity, 0.6)],
    ),
    (Trait::Lazy, &[(FatigueMidpoint, 45.0), (FatigueRate, 1.3)]),
    (Trait::Diligent, &[(FatigueMidpoint, 80.0), (FatigueRate, 0.8)]),
    (Trait::Gregarious, &[(SocialMidpoint, 45.0)]),
    (
        Trait::Loner,
        &[(SocialMidpoint, 75.0), (ContestSensitivity, 1.4)],
    ),
];

/// Look up `name` for `personality`, falling back to `default`
pub fn threshold(personality: Trait, name: Threshold, default: f32) -> f32 {
    TRAIT_TABLE
        .iter()
        .find(|(t, _)| *t == personality)
        .and_then(|(_, overrides)| overrides.iter().find(|(n, _)| *n == name))
        .map(|(_, value)| *value)
        .unwrap_or(default)
}
