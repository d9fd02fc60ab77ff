//! Mine, deposit and build

use crate::actions::catalog::ActionId;
use crate::actions::context::{ActionContext, Movement};
use crate::actions::curves::{linear, ramp_down};
use crate::actions::survival::harvest;
use crate::core::types::Position;
use crate::entity::agent::{Activity, ResourceKind, Role};
use crate::entity::traits::Threshold;
use crate::world::{find_nearest_resource, TileKind};

/// Peak desirability of routine work; needs outrank it when pressing
const WORK_CEILING: f32 = 0.5;
const DEPOSIT_CEILING: f32 = 0.7;

/// How rested the actor is, 1 = fresh
fn freshness(ctx: &ActionContext) -> f32 {
    let midpoint = ctx.threshold(Threshold::FatigueMidpoint, ctx.config.fatigue_midpoint);
    ramp_down(ctx.agent().vitals.fatigue, midpoint, ctx.config.steepness)
}

// === MINE ===

fn can_mine(role: Role) -> bool {
    matches!(role, Role::Miner | Role::Builder)
}

fn mine_site(ctx: &ActionContext) -> Option<Position> {
    let agent = ctx.agent();
    if let Some(site) = agent.resource_target {
        let still_good = ctx
            .world
            .tile(site)
            .map(|t| t.kind.yields() == Some(ResourceKind::Stone) && t.resource > 0)
            .unwrap_or(false);
        if still_good {
            return Some(site);
        }
    }
    find_nearest_resource(
        &*ctx.world,
        agent.position,
        ResourceKind::Stone,
        ctx.config.search_radius,
    )
}

pub fn mine_eligible(ctx: &ActionContext) -> bool {
    let agent = ctx.agent();
    can_mine(agent.role) && agent.inventory.free_space() > 0 && mine_site(ctx).is_some()
}

pub fn mine_score(ctx: &ActionContext) -> f32 {
    let agent = ctx.agent();
    let target = ctx.config.stone_target as f32;
    let on_hand = (ctx.stockpile.get(ResourceKind::Stone) + agent.inventory.get(ResourceKind::Stone)) as f32;
    let shortfall = linear(target - on_hand, 0.0, target);
    let space = agent.inventory.free_space() as f32 / agent.inventory.capacity().max(1) as f32;

    (WORK_CEILING * shortfall * space * freshness(ctx) * agent.role.weight(ActionId::Mine)).clamp(0.0, 1.0)
}

pub fn mine_execute(ctx: &mut ActionContext) {
    let Some(site) = mine_site(ctx) else {
        ctx.agent_mut().activity = Activity::Idle;
        return;
    };
    ctx.agent_mut().resource_target = Some(site);
    let per_tick = ctx.config.mine_yield;
    harvest(ctx, site, ResourceKind::Stone, per_tick);
}

// === DEPOSIT ===

/// Carried units that belong in the stockpile
fn surplus(ctx: &ActionContext, kind: ResourceKind) -> u32 {
    let carried = ctx.agent().inventory.get(kind);
    match kind {
        ResourceKind::Food => carried.saturating_sub(ctx.config.deposit_keep_food),
        ResourceKind::Stone => carried,
    }
}

pub fn deposit_eligible(ctx: &ActionContext) -> bool {
    ResourceKind::ALL.iter().any(|k| surplus(ctx, *k) > 0)
}

pub fn deposit_score(ctx: &ActionContext) -> f32 {
    let total: u32 = ResourceKind::ALL.iter().map(|k| surplus(ctx, *k)).sum();
    DEPOSIT_CEILING * linear(total as f32, ctx.config.deposit_floor, ctx.config.deposit_ceiling)
}

pub fn deposit_execute(ctx: &mut ActionContext) {
    let target = ctx.stockpile_position;
    if ctx.move_toward(target) != Movement::Arrived {
        return;
    }

    let mut moved = Vec::new();
    for kind in ResourceKind::ALL {
        let amount = surplus(ctx, kind);
        if amount == 0 {
            continue;
        }
        // Only hand over what the stockpile actually accepts
        let accepted = ctx.stockpile.add(kind, amount);
        ctx.agent_mut().inventory.take(kind, accepted);
        if accepted > 0 {
            moved.push(format!("{} {:?}", accepted, kind));
        }
    }
    ctx.agent_mut().activity = Activity::Working;
    if !moved.is_empty() {
        ctx.log(format!("deposited {}", moved.join(", ")));
    }
}

// === BUILD ===

fn site_is_free(ctx: &ActionContext, pos: Position) -> bool {
    let ground = ctx
        .world
        .tile(pos)
        .map(|t| t.kind == TileKind::Ground)
        .unwrap_or(false);
    ground && !ctx.agents.iter().any(|a| a.alive && a.position == pos)
}

/// Remembered build site if still free, else the first free tile on the ring
fn build_site(ctx: &ActionContext) -> Option<Position> {
    if let Some(site) = ctx.agent().build_target {
        if site_is_free(ctx, site) {
            return Some(site);
        }
    }
    let center = ctx.stockpile_position;
    let r = ctx.config.build_ring;
    for dy in -r..=r {
        for dx in -r..=r {
            if dx.abs().max(dy.abs()) != r {
                continue;
            }
            let pos = center.offset(dx, dy);
            if site_is_free(ctx, pos) {
                return Some(pos);
            }
        }
    }
    None
}

pub fn build_eligible(ctx: &ActionContext) -> bool {
    ctx.agent().role == Role::Builder
        && ctx.stockpile.get(ResourceKind::Stone) >= ctx.config.build_cost
        && build_site(ctx).is_some()
}

pub fn build_score(ctx: &ActionContext) -> f32 {
    let cost = ctx.config.build_cost as f32;
    let stone = ctx.stockpile.get(ResourceKind::Stone) as f32;
    let supply = linear(stone, cost, cost * 3.0);
    let weight = ctx.agent().role.weight(ActionId::Build);
    // Having just enough stone still counts for something
    (WORK_CEILING * (0.3 + 0.7 * supply) * freshness(ctx) * weight).clamp(0.0, 1.0)
}

pub fn build_execute(ctx: &mut ActionContext) {
    let Some(site) = build_site(ctx) else {
        ctx.agent_mut().build_target = None;
        return;
    };
    ctx.agent_mut().build_target = Some(site);

    match ctx.move_toward(site) {
        Movement::Stepped => {}
        Movement::Blocked => {
            let agent = ctx.agent_mut();
            agent.build_target = None;
            agent.activity = Activity::Idle;
        }
        Movement::Arrived => {
            if ctx.agent().position == site {
                // Standing on the site; pick another next time
                ctx.agent_mut().build_target = None;
                return;
            }
            let cost = ctx.config.build_cost;
            if ctx.stockpile.consume(ResourceKind::Stone, cost) {
                if ctx.world.place_structure(site, TileKind::Wall) {
                    ctx.log(format!("built a wall at {}", site));
                } else {
                    ctx.stockpile.add(ResourceKind::Stone, cost);
                }
            }
            let agent = ctx.agent_mut();
            agent.build_target = None;
            agent.activity = Activity::Working;
        }
    }
}
