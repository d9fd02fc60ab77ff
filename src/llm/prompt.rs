//! Prompt construction for escalated decisions
//!
//! The prompt carries who the agent is, how it is doing, what the crisis is,
//! a snapshot of the colony and a few memories. It is capped at a fixed
//! number of characters; the least important sections sit at the end so the
//! cap trims those first.

use ahash::AHashMap;

use crate::actions::catalog::CATALOG;
use crate::core::config::EscalationConfig;
use crate::core::types::{AgentId, Tick};
use crate::entity::agent::{Agent, ResourceKind};
use crate::simulation::crisis::CrisisSituation;

/// Colony snapshot handed to the prompt builder
#[derive(Debug, Clone, Default)]
pub struct ColonyContext {
    pub tick: Tick,
    pub population: usize,
    pub stockpile_food: u32,
    pub stockpile_stone: u32,
    /// One line per active threat
    pub threats: Vec<String>,
    /// Names by id, for the relationship section
    pub roster: AHashMap<AgentId, String>,
}

impl ColonyContext {
    /// Generate a text summary of the colony
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Tick: {}\n", self.tick));
        s.push_str(&format!("Colonists alive: {}\n", self.population));
        s.push_str(&format!(
            "Stockpile: {} food, {} stone\n",
            self.stockpile_food, self.stockpile_stone
        ));
        if self.threats.is_empty() {
            s.push_str("Threats: none\n");
        } else {
            s.push_str(&format!("Threats: {}\n", self.threats.join("; ")));
        }
        s
    }
}

/// System and user halves of one request
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub fn system_prompt() -> String {
    let intents: Vec<&str> = CATALOG.iter().map(|e| e.intent.tag()).collect();
    format!(
        "{}\nINTENT TAGS: {}\n\n{}",
        SYSTEM_PREAMBLE,
        intents.join(", "),
        OUTPUT_FORMAT
    )
}

pub fn build_prompt(
    agent: &Agent,
    crisis: &CrisisSituation,
    colony: &ColonyContext,
    config: &EscalationConfig,
) -> Prompt {
    let mut s = String::new();
    let v = &agent.vitals;

    s.push_str(&format!(
        "You are {}, a {} who is {}.\n",
        agent.name,
        agent.role.name(),
        agent.personality.name()
    ));
    if !agent.bio.is_empty() {
        s.push_str(&format!("Background: {}\n", agent.bio));
    }
    if !agent.goal.is_empty() {
        s.push_str(&format!("Goal: {}\n", agent.goal));
    }
    s.push_str(&format!(
        "Health {:.0}, hunger {:.0}, fatigue {:.0}, loneliness {:.0}, morale {:.0}\n",
        v.health, v.hunger, v.fatigue, v.social, v.morale
    ));
    s.push_str(&format!(
        "Carrying {} food and {} stone\n",
        agent.inventory.get(ResourceKind::Food),
        agent.inventory.get(ResourceKind::Stone)
    ));

    s.push_str(&format!(
        "\nCRISIS ({}): {}\n{}\n",
        crisis.kind, crisis.description, crisis.context
    ));

    s.push_str("\nCOLONY:\n");
    s.push_str(&colony.summary());

    let memories = agent.memory.recent(config.memory_in_prompt);
    if !memories.is_empty() {
        s.push_str("\nRECENT DECISIONS:\n");
        for m in memories {
            s.push_str(&format!("- tick {}: {} -> {}", m.tick, m.crisis, m.action));
            if let Some(outcome) = &m.outcome {
                s.push_str(&format!(" ({})", outcome));
            }
            s.push('\n');
        }
    }

    let notable = notable_relationships(agent, colony, config);
    if !notable.is_empty() {
        s.push_str("\nPEOPLE:\n");
        for line in notable {
            s.push_str(&format!("- {}\n", line));
        }
    }

    Prompt {
        system: system_prompt(),
        user: truncate(s, config.max_prompt_chars),
    }
}

/// Strongest friendships and rivalries, strongest first
fn notable_relationships(agent: &Agent, colony: &ColonyContext, config: &EscalationConfig) -> Vec<String> {
    let mut notable: Vec<(f32, String)> = agent
        .relationships
        .iter()
        .filter_map(|(id, affinity)| {
            let name = colony.roster.get(&id)?;
            let label = if affinity >= config.friend_affinity {
                "friend"
            } else if affinity <= config.rival_affinity {
                "rival"
            } else {
                return None;
            };
            let strength = (affinity - 50.0).abs();
            Some((strength, format!("{} ({}, {:.0})", name, label, affinity)))
        })
        .collect();
    notable.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.1.cmp(&b.1)));
    notable
        .into_iter()
        .take(config.notable_relationships)
        .map(|(_, line)| line)
        .collect()
}

/// Cut to at most `max_chars` characters on a char boundary
fn truncate(mut s: String, max_chars: usize) -> String {
    if let Some((byte, _)) = s.char_indices().nth(max_chars) {
        s.truncate(byte);
    }
    s
}

const SYSTEM_PREAMBLE: &str = r#"You are deciding for one colonist in a small survival colony.
Answer in character. Pick one concrete thing to do right now about the crisis
described. Stay within what a colonist can actually do."#;

const OUTPUT_FORMAT: &str = r#"OUTPUT FORMAT (JSON only, no explanation):
{
  "action": "what you do, in a few words",
  "intent": "one intent tag from the list",
  "justification": "one sentence why",
  "mood": "one word",
  "expected_outcome": "what you hope happens"
}"#;
