//! Turn provider text into a validated decision
//!
//! Providers wrap JSON in prose or code fences often enough that we look for
//! the outermost object instead of parsing the text as-is.

use serde::Deserialize;

use crate::actions::catalog::ActionId;
use crate::core::error::{ColonyError, Result};

/// What an agent decided to do about a crisis
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Free-form action text, stored in memory
    pub action: String,
    /// Catalog action to bias toward, if the reply named one
    pub intent: Option<ActionId>,
    pub justification: String,
    pub mood: Option<String>,
    pub expected_outcome: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawDecision {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    justification: Option<String>,
    #[serde(default)]
    mood: Option<String>,
    #[serde(default)]
    expected_outcome: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse and validate a provider reply
///
/// An empty action or justification counts as a failed call.
pub fn parse_decision(response: &str) -> Result<Decision> {
    let json_str = extract_json(response)?;
    let raw: RawDecision = serde_json::from_str(json_str).map_err(|e| {
        ColonyError::MalformedDecision(format!("{} - Response: {}", e, response))
    })?;

    let action = non_empty(raw.action)
        .ok_or_else(|| ColonyError::MalformedDecision("empty action".into()))?;
    let justification = non_empty(raw.justification)
        .ok_or_else(|| ColonyError::MalformedDecision("empty justification".into()))?;

    // Fall back to the first word of the action ("eat the berries")
    let intent = non_empty(raw.intent)
        .and_then(|tag| ActionId::from_tag(&tag))
        .or_else(|| {
            action
                .split_whitespace()
                .next()
                .and_then(ActionId::from_tag)
        });

    Ok(Decision {
        action,
        intent,
        justification,
        mood: non_empty(raw.mood),
        expected_outcome: non_empty(raw.expected_outcome),
    })
}

/// Extract the outermost JSON object from a reply (handles surrounding text)
pub fn extract_json(response: &str) -> Result<&str> {
    let start = response
        .find('{')
        .ok_or_else(|| ColonyError::MalformedDecision("No JSON found in response".into()))?;
    let end = response
        .rfind('}')
        .ok_or_else(|| ColonyError::MalformedDecision("No closing brace found in response".into()))?;
    if end < start {
        return Err(ColonyError::MalformedDecision("Unbalanced braces in response".into()));
    }
    Ok(&response[start..=end])
}
