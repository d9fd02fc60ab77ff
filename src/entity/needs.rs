//! Needs model: per-tick physiological and social drift
//!
//! Pure state mutation. The only randomness is a small chance to skip the
//! hunger step, drawn from the colony's seeded RNG so runs stay reproducible.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::core::config::NeedsConfig;
use crate::core::types::{AgentId, Position, Tick};
use crate::entity::agent::{Activity, Agent};
use crate::entity::traits::{threshold, Threshold};

/// What the needs model sees of another agent
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    pub id: AgentId,
    pub position: Position,
    pub alive: bool,
}

impl From<&Agent> for Neighbor {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            position: agent.position,
            alive: agent.alive,
        }
    }
}

/// Colony-wide modifiers (climate, season)
#[derive(Debug, Clone, Copy)]
pub struct Environment {
    /// Multiplies hunger growth; 1.0 is a mild climate
    pub hunger_multiplier: f32,
}

impl Default for Environment {
    fn default() -> Self {
        Self {
            hunger_multiplier: 1.0,
        }
    }
}

/// What happened to an agent during one needs step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NeedsOutcome {
    pub starved: bool,
    pub died: bool,
    pub death_spiral: bool,
}

/// Advance one agent's needs by a single tick
pub fn advance(
    agent: &mut Agent,
    neighbors: &[Neighbor],
    _tick: Tick,
    env: &Environment,
    config: &NeedsConfig,
    rng: &mut ChaCha8Rng,
) -> NeedsOutcome {
    let mut outcome = NeedsOutcome::default();
    if !agent.alive {
        return outcome;
    }

    // Death spiral bookkeeping first: it feeds the hunger rate below
    if agent.vitals.morale < config.critical_morale {
        agent.low_morale_ticks = agent.low_morale_ticks.saturating_add(1);
    } else {
        agent.low_morale_ticks = 0;
    }
    let spiral = agent.low_morale_ticks > config.death_spiral_ticks;
    outcome.death_spiral = spiral;

    // Hunger
    if !rng.gen_bool(config.hunger_skip_chance) {
        let mut gain = agent.metabolism * env.hunger_multiplier;
        if spiral {
            gain *= config.death_spiral_multiplier;
        }
        agent.vitals.hunger += gain;
    }

    // Morale follows hunger
    if agent.vitals.hunger > config.morale_high_hunger {
        agent.vitals.morale -= config.morale_decay_rate;
    } else if agent.vitals.hunger < config.morale_low_hunger {
        agent.vitals.morale += config.morale_recovery_rate;
    }

    // Fatigue
    let rate = threshold(agent.personality, Threshold::FatigueRate, 1.0);
    let wound = if agent.vitals.health < config.wounded_health {
        config.wounded_fatigue_multiplier
    } else {
        1.0
    };
    match agent.activity {
        Activity::Working => agent.vitals.fatigue += config.fatigue_work_rate * rate * wound,
        Activity::Moving => agent.vitals.fatigue += config.fatigue_move_rate * rate * wound,
        Activity::Idle | Activity::Resting => {
            agent.vitals.fatigue -= config.fatigue_idle_recovery
        }
    }

    // Social need
    let has_company = neighbors.iter().any(|n| {
        n.alive
            && n.id != agent.id
            && n.position.distance(&agent.position) <= config.social_radius
            && agent.affinity(n.id) >= config.friendly_affinity
    });
    if has_company {
        agent.ticks_alone = 0;
        agent.vitals.social -= config.social_relief_rate;
    } else {
        agent.ticks_alone = agent.ticks_alone.saturating_add(1);
        if agent.ticks_alone > config.social_grace_ticks {
            agent.vitals.social += config.social_rise_rate;
        }
    }

    agent.vitals.clamp();

    // Starvation and recovery
    if agent.vitals.hunger >= config.starvation_threshold {
        agent.vitals.health -= config.starvation_damage;
        outcome.starved = true;
    } else if agent.vitals.hunger < config.regen_hunger_below
        && agent.vitals.fatigue < config.regen_fatigue_below
    {
        agent.vitals.health += config.regen_rate;
    }
    agent.vitals.clamp();

    if agent.vitals.health <= 0.0 {
        agent.die();
        outcome.died = true;
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::agent::{Role, Trait};
    use rand::SeedableRng;

    fn setup() -> (Agent, NeedsConfig, ChaCha8Rng) {
        let agent = Agent::new("Ada", Role::Forager, Trait::Steady, Position::new(5, 5));
        let mut config = NeedsConfig::default();
        config.hunger_skip_chance = 0.0;
        (agent, config, ChaCha8Rng::seed_from_u64(7))
    }

    #[test]
    fn test_hunger_scales_with_environment() {
        let (mut agent, config, mut rng) = setup();
        agent.vitals.hunger = 10.0;
        let harsh = Environment {
            hunger_multiplier: 2.0,
        };
        advance(&mut agent, &[], 0, &harsh, &config, &mut rng);
        assert!((agent.vitals.hunger - 11.0).abs() < 0.001);
    }

    #[test]
    fn test_starvation_damages_health() {
        let (mut agent, config, mut rng) = setup();
        agent.vitals.hunger = 90.0;
        let before = agent.vitals.health;
        let outcome = advance(&mut agent, &[], 0, &Environment::default(), &config, &mut rng);
        assert!(outcome.starved);
        assert!(agent.vitals.health < before);
    }

    #[test]
    fn test_starvation_can_kill() {
        let (mut agent, config, mut rng) = setup();
        agent.vitals.hunger = 100.0;
        agent.vitals.health = 0.5;
        let outcome = advance(&mut agent, &[], 0, &Environment::default(), &config, &mut rng);
        assert!(outcome.died);
        assert!(!agent.alive);
    }

    #[test]
    fn test_dead_agent_is_frozen() {
        let (mut agent, config, mut rng) = setup();
        agent.die();
        let snapshot = agent.vitals;
        advance(&mut agent, &[], 0, &Environment::default(), &config, &mut rng);
        assert_eq!(agent.vitals, snapshot);
    }

    #[test]
    fn test_death_spiral_accelerates_hunger() {
        let (mut agent, config, mut rng) = setup();
        agent.vitals.morale = 5.0;
        agent.vitals.hunger = 10.0;
        agent.low_morale_ticks = config.death_spiral_ticks;

        let outcome = advance(&mut agent, &[], 0, &Environment::default(), &config, &mut rng);
        assert!(outcome.death_spiral);
        let expected = 10.0 + agent.metabolism * config.death_spiral_multiplier;
        assert!((agent.vitals.hunger - expected).abs() < 0.001);
    }

    #[test]
    fn test_fatigue_rises_with_work_and_falls_when_idle() {
        let (mut agent, config, mut rng) = setup();
        agent.vitals.fatigue = 20.0;
        agent.activity = Activity::Working;
        advance(&mut agent, &[], 0, &Environment::default(), &config, &mut rng);
        assert!(agent.vitals.fatigue > 20.0);

        let worked = agent.vitals.fatigue;
        agent.activity = Activity::Idle;
        advance(&mut agent, &[], 1, &Environment::default(), &config, &mut rng);
        assert!(agent.vitals.fatigue < worked);
    }

    #[test]
    fn test_wounded_lazy_agent_tires_faster() {
        let (mut steady, config, mut rng) = setup();
        let mut lazy = Agent::new("Lu", Role::Forager, Trait::Lazy, Position::new(0, 0));
        lazy.vitals.health = 40.0;
        steady.activity = Activity::Working;
        lazy.activity = Activity::Working;
        steady.vitals.fatigue = 0.0;
        lazy.vitals.fatigue = 0.0;

        advance(&mut steady, &[], 0, &Environment::default(), &config, &mut rng);
        advance(&mut lazy, &[], 0, &Environment::default(), &config, &mut rng);
        assert!(lazy.vitals.fatigue > steady.vitals.fatigue);
    }

    #[test]
    fn test_friendly_neighbor_relieves_social_need() {
        let (mut agent, config, mut rng) = setup();
        let friend = Agent::new("Bo", Role::Guard, Trait::Steady, Position::new(6, 5));
        agent.relationships.set(friend.id, 80.0);
        agent.vitals.social = 50.0;

        advance(
            &mut agent,
            &[Neighbor::from(&friend)],
            0,
            &Environment::default(),
            &config,
            &mut rng,
        );
        assert!(agent.vitals.social < 50.0);
        assert_eq!(agent.ticks_alone, 0);
    }

    #[test]
    fn test_social_need_rises_after_grace_period() {
        let (mut agent, config, mut rng) = setup();
        agent.vitals.social = 50.0;
        for t in 0..config.social_grace_ticks as u64 {
            advance(&mut agent, &[], t, &Environment::default(), &config, &mut rng);
        }
        assert_eq!(agent.vitals.social, 50.0);

        advance(&mut agent, &[], 99, &Environment::default(), &config, &mut rng);
        assert!(agent.vitals.social > 50.0);
    }
}
