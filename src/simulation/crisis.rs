//! Crisis detection
//!
//! Cheap, pure, runs for every living agent every tick. The first matching
//! rule wins; order below is priority order.

use serde::{Deserialize, Serialize};

use crate::actions::combat::can_fight;
use crate::core::config::CrisisConfig;
use crate::entity::agent::{Agent, ResourceKind, Role};
use crate::world::threat::nearest_threat;
use crate::world::{Stockpile, Threat, TileMap};

/// Escalation tier; decides the per-agent cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    High,
    Medium,
    /// Never escalated
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisKind {
    ImminentThreat,
    CriticalSupplies,
    HighHunger,
    LowMorale,
    HighFatigue,
    HighSocialNeed,
    ContestedResource,
    NeedyNeighbor,
}

impl CrisisKind {
    pub fn tier(&self) -> Tier {
        match self {
            CrisisKind::ImminentThreat
            | CrisisKind::CriticalSupplies
            | CrisisKind::ContestedResource
            | CrisisKind::NeedyNeighbor => Tier::High,
            CrisisKind::HighHunger | CrisisKind::LowMorale => Tier::Medium,
            CrisisKind::HighFatigue | CrisisKind::HighSocialNeed => Tier::Low,
        }
    }

    /// Raid-class crises share one colony-wide cooldown
    pub fn is_raid(&self) -> bool {
        matches!(self, CrisisKind::ImminentThreat)
    }

    pub fn label(&self) -> &'static str {
        match self {
            CrisisKind::ImminentThreat => "imminent threat",
            CrisisKind::CriticalSupplies => "critical supplies",
            CrisisKind::HighHunger => "high hunger",
            CrisisKind::LowMorale => "low morale",
            CrisisKind::HighFatigue => "high fatigue",
            CrisisKind::HighSocialNeed => "high social need",
            CrisisKind::ContestedResource => "contested resource",
            CrisisKind::NeedyNeighbor => "needy neighbor",
        }
    }
}

impl std::fmt::Display for CrisisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A dilemma worth a second opinion; lives for one tick
#[derive(Debug, Clone, PartialEq)]
pub struct CrisisSituation {
    pub kind: CrisisKind,
    pub description: String,
    /// Short factual summary for the prompt
    pub context: String,
}

impl CrisisSituation {
    fn new(kind: CrisisKind, description: String, context: String) -> Self {
        Self {
            kind,
            description,
            context,
        }
    }

    pub fn tier(&self) -> Tier {
        self.kind.tier()
    }
}

/// Check `agent` against every crisis rule, first match wins
///
/// `agents` is the whole population; the agent itself is skipped by id.
pub fn detect(
    agent: &Agent,
    agents: &[Agent],
    world: &dyn TileMap,
    stockpile: &Stockpile,
    threats: &[Threat],
    config: &CrisisConfig,
) -> Option<CrisisSituation> {
    if !agent.alive {
        return None;
    }
    let v = &agent.vitals;
    let carried_food = agent.inventory.get(ResourceKind::Food);
    let stock_food = stockpile.get(ResourceKind::Food);

    // Threats only matter to those able to answer them
    if can_fight(agent, config.threat_health_floor) {
        let radius = if agent.role == Role::Guard {
            config.threat_radius_guard
        } else {
            config.threat_radius_default
        };
        if let Some((i, d)) = nearest_threat(threats, agent.position) {
            if d <= radius {
                let threat = &threats[i];
                return Some(CrisisSituation::new(
                    CrisisKind::ImminentThreat,
                    format!("{} is {:.0} tiles away", threat.name, d),
                    format!(
                        "threat strength {:.0}, raid {}, own health {:.0}",
                        threat.strength, threat.raid, v.health
                    ),
                ));
            }
        }
    }

    if v.hunger >= config.critical_hunger
        && carried_food == 0
        && stock_food < config.critical_stockpile_food
    {
        return Some(CrisisSituation::new(
            CrisisKind::CriticalSupplies,
            "hungry with nothing to eat and the stores nearly empty".to_string(),
            format!("hunger {:.0}, stockpile food {}", v.hunger, stock_food),
        ));
    }

    if v.hunger >= config.high_hunger {
        return Some(CrisisSituation::new(
            CrisisKind::HighHunger,
            "badly hungry".to_string(),
            format!("hunger {:.0}, carried food {}", v.hunger, carried_food),
        ));
    }

    if v.morale <= config.low_morale {
        return Some(CrisisSituation::new(
            CrisisKind::LowMorale,
            "spirits are failing".to_string(),
            format!("morale {:.0}", v.morale),
        ));
    }

    if v.fatigue >= config.high_fatigue {
        return Some(CrisisSituation::new(
            CrisisKind::HighFatigue,
            "exhausted".to_string(),
            format!("fatigue {:.0}", v.fatigue),
        ));
    }

    if v.social >= config.high_social {
        return Some(CrisisSituation::new(
            CrisisKind::HighSocialNeed,
            "lonely".to_string(),
            format!("social need {:.0}", v.social),
        ));
    }

    if let Some(situation) = contested_resource(agent, agents, world, config) {
        return Some(situation);
    }

    if carried_food >= config.surplus_food {
        let needy = agents.iter().find(|other| {
            other.alive
                && other.id != agent.id
                && other.position.distance(&agent.position) <= config.needy_radius
                && other.vitals.hunger >= config.needy_hunger
        });
        if let Some(other) = needy {
            return Some(CrisisSituation::new(
                CrisisKind::NeedyNeighbor,
                format!("{} is going hungry nearby", other.name),
                format!(
                    "carried food {}, {}'s hunger {:.0}",
                    carried_food, other.name, other.vitals.hunger
                ),
            ));
        }
    }

    None
}

fn contested_resource(
    agent: &Agent,
    agents: &[Agent],
    world: &dyn TileMap,
    config: &CrisisConfig,
) -> Option<CrisisSituation> {
    let site = agent.resource_target?;
    let tile = world.tile(site)?;
    if tile.resource == 0 || tile.resource > config.scarce_resource {
        return None;
    }
    let radius = match agent.role {
        Role::Guard => config.contest_radius_guard,
        Role::Forager => config.contest_radius_forager,
        _ => config.contest_radius_default,
    };
    let rival = agents.iter().find(|other| {
        other.alive
            && other.id != agent.id
            && other.position.distance(&site) <= radius
            && agent.affinity(other.id) < config.rival_affinity
    })?;
    Some(CrisisSituation::new(
        CrisisKind::ContestedResource,
        format!("{} is closing in on a dwindling site at {}", rival.name, site),
        format!(
            "{} units left, affinity toward {} {:.0}",
            tile.resource,
            rival.name,
            agent.affinity(rival.id)
        ),
    ))
}
