//! Eat, forage and rest

use crate::actions::catalog::ActionId;
use crate::actions::context::{ActionContext, Movement};
use crate::actions::curves::ramp_up;
use crate::core::types::Position;
use crate::entity::agent::{Activity, ResourceKind, Role, VITAL_MAX};
use crate::entity::relationships::contest;
use crate::entity::traits::Threshold;
use crate::world::find_nearest_resource;

/// Baseline urge a forager feels to keep its basket full
const FORAGER_DRIVE: f32 = 0.25;

// === EAT ===

pub fn eat_eligible(ctx: &ActionContext) -> bool {
    ctx.agent().inventory.get(ResourceKind::Food) > 0
        || (ctx.near_stockpile() && ctx.stockpile.get(ResourceKind::Food) > 0)
}

pub fn eat_score(ctx: &ActionContext) -> f32 {
    let midpoint = ctx.threshold(Threshold::HungerMidpoint, ctx.config.hunger_midpoint);
    ramp_up(ctx.agent().vitals.hunger, midpoint, ctx.config.steepness)
}

pub fn eat_execute(ctx: &mut ActionContext) {
    let portion = ctx.config.eat_portion;
    let per_food = ctx.config.eat_hunger_per_food;

    let mut eaten = ctx.agent_mut().inventory.take(ResourceKind::Food, portion);
    if eaten < portion && ctx.near_stockpile() {
        eaten += ctx.stockpile.remove(ResourceKind::Food, portion - eaten);
    }

    let agent = ctx.agent_mut();
    agent.vitals.hunger = (agent.vitals.hunger - eaten as f32 * per_food).clamp(0.0, VITAL_MAX);
    agent.activity = Activity::Idle;
    let hunger = agent.vitals.hunger;
    ctx.log(format!("ate {} food (hunger {:.0})", eaten, hunger));
}

// === FORAGE ===

/// Remembered food site if it still has food, else the nearest one
fn forage_site(ctx: &ActionContext) -> Option<Position> {
    let agent = ctx.agent();
    if let Some(site) = agent.resource_target {
        let still_good = ctx
            .world
            .tile(site)
            .map(|t| t.kind.yields() == Some(ResourceKind::Food) && t.resource > 0)
            .unwrap_or(false);
        if still_good {
            return Some(site);
        }
    }
    find_nearest_resource(
        &*ctx.world,
        agent.position,
        ResourceKind::Food,
        ctx.config.search_radius,
    )
}

pub fn forage_eligible(ctx: &ActionContext) -> bool {
    ctx.agent().inventory.free_space() > 0 && forage_site(ctx).is_some()
}

pub fn forage_score(ctx: &ActionContext) -> f32 {
    let agent = ctx.agent();
    let midpoint = ctx.threshold(Threshold::ForageMidpoint, ctx.config.forage_midpoint);
    let space = agent.inventory.free_space() as f32 / agent.inventory.capacity().max(1) as f32;
    let carried_food = agent.inventory.get(ResourceKind::Food) as f32;
    // Food already in hand dulls the urge to go find more
    let satiety = 1.0 / (1.0 + carried_food);

    let hunger_drive = ramp_up(agent.vitals.hunger, midpoint, ctx.config.steepness) * satiety;
    let role_drive = if agent.role == Role::Forager {
        FORAGER_DRIVE
    } else {
        0.0
    };
    (hunger_drive.max(role_drive) * space * agent.role.weight(ActionId::Forage)).clamp(0.0, 1.0)
}

pub fn forage_execute(ctx: &mut ActionContext) {
    let Some(site) = forage_site(ctx) else {
        ctx.agent_mut().activity = Activity::Idle;
        return;
    };
    ctx.agent_mut().resource_target = Some(site);
    let per_tick = ctx.config.forage_yield;
    harvest(ctx, site, ResourceKind::Food, per_tick);
}

/// Walk to `site` and, once there, take what fits in the basket
///
/// Shared by forage and mine.
pub(crate) fn harvest(ctx: &mut ActionContext, site: Position, kind: ResourceKind, yield_per_tick: u32) {
    match ctx.move_toward(site) {
        Movement::Stepped => {}
        Movement::Blocked => {
            let agent = ctx.agent_mut();
            agent.resource_target = None;
            agent.activity = Activity::Idle;
        }
        Movement::Arrived => {
            let amount = yield_per_tick.min(ctx.agent().inventory.free_space());
            let taken = ctx.world.take_resource(site, amount);
            let agent = ctx.agent_mut();
            agent.inventory.add(kind, taken);
            agent.activity = Activity::Working;

            let exhausted = ctx.world.tile(site).map(|t| t.resource == 0).unwrap_or(true);
            if exhausted {
                ctx.agent_mut().resource_target = None;
            }

            // Anyone else working the same site resents the competition
            let rivals: Vec<usize> = ctx
                .others()
                .filter(|(_, a)| a.resource_target == Some(site) && a.position.is_adjacent(&site))
                .map(|(i, _)| i)
                .collect();
            let penalty = ctx.config.contest_penalty;
            for i in rivals {
                if let Some((actor, rival)) = ctx.pair_mut(i) {
                    contest(actor, rival, penalty);
                }
            }

            ctx.log(format!("harvested {} {:?} at {}", taken, kind, site));
        }
    }
}

// === REST ===

pub fn rest_eligible(ctx: &ActionContext) -> bool {
    ctx.agent().vitals.fatigue > 0.0
}

pub fn rest_score(ctx: &ActionContext) -> f32 {
    let midpoint = ctx.threshold(Threshold::FatigueMidpoint, ctx.config.fatigue_midpoint);
    ramp_up(ctx.agent().vitals.fatigue, midpoint, ctx.config.steepness)
}

pub fn rest_execute(ctx: &mut ActionContext) {
    let recovery = ctx.config.rest_recovery;
    let agent = ctx.agent_mut();
    agent.vitals.fatigue = (agent.vitals.fatigue - recovery).clamp(0.0, VITAL_MAX);
    agent.activity = Activity::Resting;
}
