//! Action definitions and catalog

use serde::{Deserialize, Serialize};

use crate::actions::context::ActionContext;
use crate::actions::{combat, idle, social, survival, work};

/// Unique action identifier, also used as the intent tag of a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionId {
    Wander,
    Eat,
    Forage,
    Mine,
    Deposit,
    Build,
    Share,
    Socialize,
    Rest,
    Fight,
    Flee,
}

impl ActionId {
    pub fn tag(&self) -> &'static str {
        match self {
            ActionId::Wander => "wander",
            ActionId::Eat => "eat",
            ActionId::Forage => "forage",
            ActionId::Mine => "mine",
            ActionId::Deposit => "deposit",
            ActionId::Build => "build",
            ActionId::Share => "share",
            ActionId::Socialize => "socialize",
            ActionId::Rest => "rest",
            ActionId::Fight => "fight",
            ActionId::Flee => "flee",
        }
    }

    /// Parse a free-form intent tag, accepting common synonyms
    pub fn from_tag(tag: &str) -> Option<ActionId> {
        let tag = tag.trim().to_lowercase();
        let id = match tag.as_str() {
            "wander" | "explore" | "patrol" => ActionId::Wander,
            "eat" => ActionId::Eat,
            "forage" | "gather" | "hunt" => ActionId::Forage,
            "mine" | "quarry" => ActionId::Mine,
            "deposit" | "store" => ActionId::Deposit,
            "build" | "fortify" => ActionId::Build,
            "share" | "give" => ActionId::Share,
            "socialize" | "socialise" | "talk" => ActionId::Socialize,
            "rest" | "sleep" => ActionId::Rest,
            "fight" | "attack" | "defend" => ActionId::Fight,
            "flee" | "retreat" | "hide" => ActionId::Flee,
            _ => return None,
        };
        Some(id)
    }
}

/// One catalog row: an action and the three functions that drive it
pub struct CatalogEntry {
    pub id: ActionId,
    /// Intent tag a decision bias must carry to boost this entry
    pub intent: ActionId,
    pub eligible: fn(&ActionContext) -> bool,
    /// Desirability in [0, 1]
    pub score: fn(&ActionContext) -> f32,
    /// Must never panic and must leave every quantity in range
    pub execute: fn(&mut ActionContext),
}

/// The fixed catalog, in tie-break order
///
/// Wander comes first and is always eligible, so it wins whenever every
/// other entry scores zero or is ineligible.
pub static CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        id: ActionId::Wander,
        intent: ActionId::Wander,
        eligible: idle::wander_eligible,
        score: idle::wander_score,
        execute: idle::wander_execute,
    },
    CatalogEntry {
        id: ActionId::Eat,
        intent: ActionId::Eat,
        eligible: survival::eat_eligible,
        score: survival::eat_score,
        execute: survival::eat_execute,
    },
    CatalogEntry {
        id: ActionId::Forage,
        intent: ActionId::Forage,
        eligible: survival::forage_eligible,
        score: survival::forage_score,
        execute: survival::forage_execute,
    },
    CatalogEntry {
        id: ActionId::Mine,
        intent: ActionId::Mine,
        eligible: work::mine_eligible,
        score: work::mine_score,
        execute: work::mine_execute,
    },
    CatalogEntry {
        id: ActionId::Deposit,
        intent: ActionId::Deposit,
        eligible: work::deposit_eligible,
        score: work::deposit_score,
        execute: work::deposit_execute,
    },
    CatalogEntry {
        id: ActionId::Build,
        intent: ActionId::Build,
        eligible: work::build_eligible,
        score: work::build_score,
        execute: work::build_execute,
    },
    CatalogEntry {
        id: ActionId::Share,
        intent: ActionId::Share,
        eligible: social::share_eligible,
        score: social::share_score,
        execute: social::share_execute,
    },
    CatalogEntry {
        id: ActionId::Socialize,
        intent: ActionId::Socialize,
        eligible: social::socialize_eligible,
        score: social::socialize_score,
        execute: social::socialize_execute,
    },
    CatalogEntry {
        id: ActionId::Rest,
        intent: ActionId::Rest,
        eligible: survival::rest_eligible,
        score: survival::rest_score,
        execute: survival::rest_execute,
    },
    CatalogEntry {
        id: ActionId::Fight,
        intent: ActionId::Fight,
        eligible: combat::fight_eligible,
        score: combat::fight_score,
        execute: combat::fight_execute,
    },
    CatalogEntry {
        id: ActionId::Flee,
        intent: ActionId::Flee,
        eligible: combat::flee_eligible,
        score: combat::flee_score,
        execute: combat::flee_execute,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wander_is_first() {
        assert_eq!(CATALOG[0].id, ActionId::Wander);
    }

    #[test]
    fn test_every_action_has_one_entry() {
        for id in [
            ActionId::Wander,
            ActionId::Eat,
            ActionId::Forage,
            ActionId::Mine,
            ActionId::Deposit,
            ActionId::Build,
            ActionId::Share,
            ActionId::Socialize,
            ActionId::Rest,
            ActionId::Fight,
            ActionId::Flee,
        ] {
            assert_eq!(CATALOG.iter().filter(|e| e.id == id).count(), 1, "{:?}", id);
            assert_eq!(ActionId::from_tag(id.tag()), Some(id));
        }
    }

    #[test]
    fn test_tag_synonyms() {
        assert_eq!(ActionId::from_tag(" Attack "), Some(ActionId::Fight));
        assert_eq!(ActionId::from_tag("GATHER"), Some(ActionId::Forage));
        assert_eq!(ActionId::from_tag("dance"), None);
    }

    #[test]
    fn test_serde_uses_tags() {
        let json = serde_json::to_string(&ActionId::Socialize).unwrap();
        assert_eq!(json, "\"socialize\"");
    }
}
