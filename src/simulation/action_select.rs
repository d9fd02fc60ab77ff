//! Action selection - the utility scorer
//!
//! Every eligible catalog entry is scored; the best one runs. A live decision
//! bias adds a flat boost to the entry whose intent it names. Nothing here
//! blocks or talks to the network.

use crate::actions::catalog::{ActionId, CatalogEntry};
use crate::actions::context::ActionContext;

/// Outcome of one scoring pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub action: ActionId,
    pub score: f32,
    /// Second-best candidate, kept for logging close calls
    pub runner_up: Option<(ActionId, f32)>,
    /// The winner was boosted by a decision bias
    pub biased: bool,
}

/// Score the catalog for the acting agent and pick the winner
///
/// Ties keep the earlier entry, so catalog order is the tie-break. Returns
/// None only for a catalog with no eligible entry; the shipped catalog
/// always has wander.
pub fn select_action(ctx: &ActionContext, catalog: &'static [CatalogEntry]) -> Option<(&'static CatalogEntry, Selection)> {
    let intent = ctx.agent().active_intent(ctx.tick);
    let boost = ctx.config.bias_boost;

    let mut best: Option<(&'static CatalogEntry, f32, bool)> = None;
    let mut runner_up: Option<(ActionId, f32)> = None;

    for entry in catalog {
        if !(entry.eligible)(ctx) {
            continue;
        }
        let raw = (entry.score)(ctx);
        // NaN would never lose a `>` comparison once it leads
        let mut score = if raw.is_finite() { raw.clamp(0.0, 1.0) } else { 0.0 };
        let biased = intent == Some(entry.intent);
        if biased {
            score = (score + boost).min(1.0);
        }

        match best {
            Some((current, current_score, _)) if score > current_score => {
                runner_up = Some((current.id, current_score));
                best = Some((entry, score, biased));
            }
            Some(_) => {
                if runner_up.map(|(_, r)| score > r).unwrap_or(true) {
                    runner_up = Some((entry.id, score));
                }
            }
            None => best = Some((entry, score, biased)),
        }
    }

    best.map(|(entry, score, biased)| {
        (
            entry,
            Selection {
                action: entry.id,
                score,
                runner_up,
                biased,
            },
        )
    })
}

/// Select and run exactly one action for the acting agent
pub fn select_and_execute(ctx: &mut ActionContext, catalog: &'static [CatalogEntry]) -> Option<Selection> {
    if !ctx.agent().alive {
        return None;
    }
    let (entry, selection) = select_action(ctx, catalog)?;
    (entry.execute)(ctx);
    Some(selection)
}
