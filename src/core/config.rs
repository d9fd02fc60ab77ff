//! Simulation configuration with documented constants
//!
//! All tuning numbers are collected here with explanations of their purpose
//! and how they interact with each other. Every section can be overridden
//! from a TOML file; missing keys fall back to the defaults below.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{ColonyError, Result};

/// Top-level configuration, one section per subsystem
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub needs: NeedsConfig,
    pub actions: ActionConfig,
    pub crisis: CrisisConfig,
    pub escalation: EscalationConfig,
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing sections use defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let n = &self.needs;
        if n.base_metabolism <= 0.0 {
            return Err(ColonyError::Config("base_metabolism must be positive".into()));
        }
        if !(0.0..1.0).contains(&n.hunger_skip_chance) {
            return Err(ColonyError::Config(format!(
                "hunger_skip_chance ({}) must be in [0, 1)",
                n.hunger_skip_chance
            )));
        }
        if n.morale_low_hunger >= n.morale_high_hunger {
            return Err(ColonyError::Config(format!(
                "morale_low_hunger ({}) should be < morale_high_hunger ({})",
                n.morale_low_hunger, n.morale_high_hunger
            )));
        }

        let a = &self.actions;
        if a.steepness <= 0.0 || a.flee_steepness <= 0.0 {
            return Err(ColonyError::Config("curve steepness must be positive".into()));
        }
        if a.share_floor >= a.share_ceiling {
            return Err(ColonyError::Config(format!(
                "share_floor ({}) should be < share_ceiling ({})",
                a.share_floor, a.share_ceiling
            )));
        }
        if a.deposit_floor >= a.deposit_ceiling {
            return Err(ColonyError::Config(format!(
                "deposit_floor ({}) should be < deposit_ceiling ({})",
                a.deposit_floor, a.deposit_ceiling
            )));
        }
        if a.carry_capacity == 0 {
            return Err(ColonyError::Config("carry_capacity must be at least 1".into()));
        }

        let e = &self.escalation;
        if e.medium_cooldown_multiplier < 1.0 {
            return Err(ColonyError::Config(
                "medium_cooldown_multiplier must be >= 1.0".into(),
            ));
        }
        if e.timeout_ms == 0 {
            return Err(ColonyError::Config("timeout_ms must be positive".into()));
        }
        if e.verify_delay == 0 {
            return Err(ColonyError::Config("verify_delay must be at least 1 tick".into()));
        }

        Ok(())
    }
}

/// Needs model tuning
///
/// All vitals live on a 0–100 scale. Rates are per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedsConfig {
    /// Base hunger gain per tick; each agent gets a jittered copy at spawn
    ///
    /// At 0.5 an agent goes from fed to the starvation threshold in
    /// roughly 170 ticks without eating.
    pub base_metabolism: f32,

    /// Chance that the hunger step is skipped for a tick
    pub hunger_skip_chance: f64,

    /// Hunger above which morale decays
    pub morale_high_hunger: f32,
    /// Hunger below which morale recovers
    pub morale_low_hunger: f32,
    pub morale_decay_rate: f32,
    pub morale_recovery_rate: f32,

    /// Morale below this is "critical"
    pub critical_morale: f32,

    /// Consecutive critical-morale ticks before hunger accelerates
    ///
    /// This is the death spiral: miserable agents burn food faster, which
    /// keeps hunger high, which keeps morale low. Sharing and socializing
    /// are the scorer's way out of it.
    pub death_spiral_ticks: u32,
    pub death_spiral_multiplier: f32,

    pub fatigue_work_rate: f32,
    pub fatigue_move_rate: f32,
    /// Fatigue recovered per tick while idle or resting
    pub fatigue_idle_recovery: f32,

    /// Health below which an agent counts as wounded
    pub wounded_health: f32,
    /// Fatigue gain multiplier while wounded
    pub wounded_fatigue_multiplier: f32,

    /// Radius (tiles) within which a friendly neighbour relieves social need
    pub social_radius: f32,
    /// Minimum affinity for a neighbour to count as friendly
    pub friendly_affinity: f32,
    pub social_relief_rate: f32,
    /// Ticks without company before social need starts rising
    pub social_grace_ticks: u32,
    pub social_rise_rate: f32,

    /// Hunger at which starvation damage applies
    pub starvation_threshold: f32,
    pub starvation_damage: f32,

    /// Health regenerates while hunger and fatigue are both below these
    pub regen_hunger_below: f32,
    pub regen_fatigue_below: f32,
    pub regen_rate: f32,
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            base_metabolism: 0.5,
            hunger_skip_chance: 0.1,
            morale_high_hunger: 70.0,
            morale_low_hunger: 30.0,
            morale_decay_rate: 0.4,
            morale_recovery_rate: 0.2,
            critical_morale: 15.0,
            death_spiral_ticks: 20,
            death_spiral_multiplier: 1.5,
            fatigue_work_rate: 0.6,
            fatigue_move_rate: 0.3,
            fatigue_idle_recovery: 0.4,
            wounded_health: 50.0,
            wounded_fatigue_multiplier: 1.5,
            social_radius: 3.0,
            friendly_affinity: 60.0,
            social_relief_rate: 1.0,
            social_grace_ticks: 10,
            social_rise_rate: 0.3,
            starvation_threshold: 85.0,
            starvation_damage: 1.0,
            regen_hunger_below: 40.0,
            regen_fatigue_below: 50.0,
            regen_rate: 0.1,
        }
    }
}

/// Utility scorer tuning
///
/// Midpoints here are the defaults; traits shift them through the trait
/// table in `entity::traits`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionConfig {
    /// Score added to the action matching an active decision bias
    pub bias_boost: f32,

    /// Constant score for wandering
    ///
    /// Kept small so any real need outranks it, but positive so wander
    /// wins outright when nothing else is eligible.
    pub idle_score: f32,

    /// Logistic steepness for the vitals curves (per vital point)
    pub steepness: f32,
    pub hunger_midpoint: f32,
    pub forage_midpoint: f32,
    pub fatigue_midpoint: f32,
    pub social_midpoint: f32,

    /// Flee curve runs over distance to the threat, in tiles
    pub flee_midpoint: f32,
    pub flee_steepness: f32,
    pub flee_radius: f32,

    /// Max food units eaten in one tick
    pub eat_portion: u32,
    pub eat_hunger_per_food: f32,

    pub carry_capacity: u32,
    pub search_radius: i32,
    pub forage_yield: u32,
    pub mine_yield: u32,

    /// Distance (tiles) at which the stockpile can be used
    pub stockpile_radius: f32,

    /// Food an agent keeps when depositing
    pub deposit_keep_food: u32,
    pub deposit_floor: f32,
    pub deposit_ceiling: f32,

    /// Stone the colony wants on hand; mining pressure scales with the gap
    pub stone_target: u32,
    pub build_cost: u32,
    /// Ring radius around the stockpile where walls go
    pub build_ring: i32,

    pub share_floor: f32,
    pub share_ceiling: f32,
    pub share_amount: u32,
    pub share_radius: f32,
    pub needy_hunger: f32,
    /// Minimum affinity toward the recipient before sharing is considered
    pub share_gate: f32,

    pub socialize_relief: f32,
    pub socialize_morale: f32,
    /// Agents below this affinity do not socialize with each other
    pub hostility_floor: f32,
    pub social_search_radius: f32,

    pub rest_recovery: f32,

    pub fight_radius: f32,
    pub fight_health_floor: f32,
    pub guard_attack: f32,
    pub attack: f32,

    /// Symmetric affinity gain for sharing
    pub cooperation_gain: f32,
    /// Symmetric affinity gain for socializing
    pub social_gain: f32,
    /// Base affinity loss for contesting a resource site
    pub contest_penalty: f32,

    pub wander_radius: i32,
}

impl Default for ActionConfig {
    fn default() -> Self {
        Self {
            bias_boost: 0.3,
            idle_score: 0.05,
            steepness: 0.15,
            hunger_midpoint: 55.0,
            forage_midpoint: 45.0,
            fatigue_midpoint: 65.0,
            social_midpoint: 60.0,
            flee_midpoint: 3.0,
            flee_steepness: 1.5,
            flee_radius: 6.0,
            eat_portion: 3,
            eat_hunger_per_food: 20.0,
            carry_capacity: 10,
            search_radius: 12,
            forage_yield: 2,
            mine_yield: 2,
            stockpile_radius: 1.5,
            deposit_keep_food: 3,
            deposit_floor: 2.0,
            deposit_ceiling: 8.0,
            stone_target: 20,
            build_cost: 5,
            build_ring: 4,
            share_floor: 4.0,
            share_ceiling: 8.0,
            share_amount: 2,
            share_radius: 4.0,
            needy_hunger: 70.0,
            share_gate: 30.0,
            socialize_relief: 25.0,
            socialize_morale: 5.0,
            hostility_floor: 20.0,
            social_search_radius: 6.0,
            rest_recovery: 15.0,
            fight_radius: 2.0,
            fight_health_floor: 30.0,
            guard_attack: 15.0,
            attack: 8.0,
            cooperation_gain: 5.0,
            social_gain: 2.0,
            contest_penalty: 6.0,
            wander_radius: 6,
        }
    }
}

/// Crisis detector thresholds
///
/// These are tuning constants. The detector's ordering is structural and
/// does not depend on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrisisConfig {
    pub threat_radius_guard: f32,
    pub threat_radius_default: f32,
    /// Health an agent needs before a threat counts as something it can act on
    pub threat_health_floor: f32,

    pub critical_hunger: f32,
    /// Stockpile food below this counts as critically low
    pub critical_stockpile_food: u32,

    pub high_hunger: f32,
    pub low_morale: f32,
    pub high_fatigue: f32,
    pub high_social: f32,

    /// Affinity below which another agent counts as a rival
    pub rival_affinity: f32,
    /// Resource sites at or below this amount count as scarce
    pub scarce_resource: u32,
    pub contest_radius_guard: f32,
    pub contest_radius_forager: f32,
    pub contest_radius_default: f32,

    pub surplus_food: u32,
    pub needy_hunger: f32,
    pub needy_radius: f32,
}

impl Default for CrisisConfig {
    fn default() -> Self {
        Self {
            threat_radius_guard: 8.0,
            threat_radius_default: 5.0,
            threat_health_floor: 30.0,
            critical_hunger: 60.0,
            critical_stockpile_food: 5,
            high_hunger: 75.0,
            low_morale: 25.0,
            high_fatigue: 85.0,
            high_social: 80.0,
            rival_affinity: 35.0,
            scarce_resource: 3,
            contest_radius_guard: 6.0,
            contest_radius_forager: 5.0,
            contest_radius_default: 3.0,
            surplus_food: 6,
            needy_hunger: 70.0,
            needy_radius: 4.0,
        }
    }
}

/// Decision escalation tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Global switch; when false no call is ever issued
    pub enabled: bool,

    /// Per-agent cooldown after a high-priority escalation (ticks)
    pub cooldown_ticks: u64,

    /// Medium-priority crises wait `cooldown_ticks * multiplier`
    ///
    /// Defaults to 2.0. The value has no derivation beyond keeping flavour
    /// crises rarer than dilemmas, so it is left configurable.
    pub medium_cooldown_multiplier: f64,

    /// Colony-wide cooldown for raid-class crises, so one wave yields one call
    pub raid_cooldown_ticks: u64,

    /// How long an accepted decision biases the scorer (ticks)
    pub bias_window: u64,

    /// Ticks between acceptance and outcome verification
    pub verify_delay: u64,

    /// Hard timeout for a single provider call
    pub timeout_ms: u64,

    /// Upper bound on the user prompt length (characters)
    pub max_prompt_chars: usize,

    /// Memory entries included in a prompt
    pub memory_in_prompt: usize,

    /// Friendships and rivalries listed in a prompt, strongest first
    pub notable_relationships: usize,
    pub friend_affinity: f32,
    pub rival_affinity: f32,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_ticks: 200,
            medium_cooldown_multiplier: 2.0,
            raid_cooldown_ticks: 300,
            bias_window: 30,
            verify_delay: 20,
            timeout_ms: 8_000,
            max_prompt_chars: 4_000,
            memory_in_prompt: 5,
            notable_relationships: 4,
            friend_affinity: 70.0,
            rival_affinity: 30.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let toml = r#"
            [escalation]
            cooldown_ticks = 50
            enabled = false

            [actions]
            share_gate = 40.0
        "#;
        let config = SimulationConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.escalation.cooldown_ticks, 50);
        assert!(!config.escalation.enabled);
        assert_eq!(config.actions.share_gate, 40.0);
        // Untouched keys keep their defaults
        assert_eq!(config.actions.eat_portion, 3);
        assert_eq!(config.needs.starvation_threshold, 85.0);
    }

    #[test]
    fn test_invalid_share_band_rejected() {
        let toml = r#"
            [actions]
            share_floor = 9.0
            share_ceiling = 8.0
        "#;
        assert!(matches!(
            SimulationConfig::from_toml_str(toml),
            Err(ColonyError::Config(_))
        ));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        assert!(matches!(
            SimulationConfig::from_toml_str("[needs\nbase_metabolism = "),
            Err(ColonyError::TomlError(_))
        ));
    }
}
