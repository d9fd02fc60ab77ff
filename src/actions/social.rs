//! Share and socialize

use crate::actions::catalog::ActionId;
use crate::actions::context::ActionContext;
use crate::actions::curves::{linear, ramp_up};
use crate::entity::agent::{Activity, ResourceKind, VITAL_MAX};
use crate::entity::relationships::cooperate;
use crate::entity::traits::Threshold;

// === SHARE ===

fn share_floor(ctx: &ActionContext) -> f32 {
    ctx.threshold(Threshold::ShareFloor, ctx.config.share_floor)
}

/// Hungriest neighbor the actor is willing to feed
fn share_target(ctx: &ActionContext) -> Option<usize> {
    let actor = ctx.agent();
    let gate = ctx.threshold(Threshold::ShareGate, ctx.config.share_gate);
    ctx.others()
        .filter(|(_, a)| a.position.distance(&actor.position) <= ctx.config.share_radius)
        .filter(|(_, a)| a.vitals.hunger >= ctx.config.needy_hunger)
        .filter(|(_, a)| a.inventory.free_space() > 0)
        .filter(|(_, a)| actor.affinity(a.id) >= gate)
        .fold(None, |best: Option<(usize, f32)>, (i, a)| match best {
            Some((_, h)) if h >= a.vitals.hunger => best,
            _ => Some((i, a.vitals.hunger)),
        })
        .map(|(i, _)| i)
}

pub fn share_eligible(ctx: &ActionContext) -> bool {
    ctx.agent().inventory.get(ResourceKind::Food) as f32 >= share_floor(ctx)
        && share_target(ctx).is_some()
}

pub fn share_score(ctx: &ActionContext) -> f32 {
    let Some(target) = share_target(ctx) else {
        return 0.0;
    };
    let food = ctx.agent().inventory.get(ResourceKind::Food) as f32;
    // Holding exactly the floor still counts as a small surplus
    let surplus = linear(food, share_floor(ctx) - 1.0, ctx.config.share_ceiling);
    let need = ramp_up(
        ctx.agents[target].vitals.hunger,
        ctx.config.needy_hunger,
        ctx.config.steepness,
    );
    let weight = ctx.agent().role.weight(ActionId::Share);
    (surplus * need * weight).clamp(0.0, 1.0)
}

pub fn share_execute(ctx: &mut ActionContext) {
    let Some(target) = share_target(ctx) else {
        return;
    };
    let amount = ctx.config.share_amount;
    let gain = ctx.config.cooperation_gain;
    let morale = ctx.config.socialize_morale;

    let Some((actor, other)) = ctx.pair_mut(target) else {
        return;
    };
    let offered = amount.min(actor.inventory.get(ResourceKind::Food));
    let given = other.inventory.add(ResourceKind::Food, offered);
    actor.inventory.take(ResourceKind::Food, given);
    if given == 0 {
        return;
    }
    cooperate(actor, other, gain);
    actor.vitals.morale = (actor.vitals.morale + morale).clamp(0.0, VITAL_MAX);
    actor.activity = Activity::Working;
    let name = other.name.clone();
    ctx.log(format!("shared {} food with {}", given, name));
}

// === SOCIALIZE ===

/// Friendliest neighbor in range who is not hostile
fn social_partner(ctx: &ActionContext) -> Option<usize> {
    let actor = ctx.agent();
    ctx.others()
        .filter(|(_, a)| a.position.distance(&actor.position) <= ctx.config.social_search_radius)
        .map(|(i, a)| (i, actor.affinity(a.id)))
        .filter(|(_, affinity)| *affinity > ctx.config.hostility_floor)
        .fold(None, |best: Option<(usize, f32)>, (i, affinity)| match best {
            Some((_, b)) if b >= affinity => best,
            _ => Some((i, affinity)),
        })
        .map(|(i, _)| i)
}

pub fn socialize_eligible(ctx: &ActionContext) -> bool {
    social_partner(ctx).is_some()
}

pub fn socialize_score(ctx: &ActionContext) -> f32 {
    let midpoint = ctx.threshold(Threshold::SocialMidpoint, ctx.config.social_midpoint);
    let urge = ramp_up(ctx.agent().vitals.social, midpoint, ctx.config.steepness);
    (urge * ctx.agent().role.weight(ActionId::Socialize)).clamp(0.0, 1.0)
}

pub fn socialize_execute(ctx: &mut ActionContext) {
    let Some(partner) = social_partner(ctx) else {
        return;
    };
    let relief = ctx.config.socialize_relief;
    let morale = ctx.config.socialize_morale;
    let gain = ctx.config.social_gain;

    let Some((actor, other)) = ctx.pair_mut(partner) else {
        return;
    };
    actor.vitals.social = (actor.vitals.social - relief).clamp(0.0, VITAL_MAX);
    actor.vitals.morale = (actor.vitals.morale + morale).clamp(0.0, VITAL_MAX);
    actor.activity = Activity::Idle;
    cooperate(actor, other, gain);
    let name = other.name.clone();
    ctx.log(format!("talked with {}", name));
}
