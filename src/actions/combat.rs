//! Fight and flee

use crate::actions::catalog::ActionId;
use crate::actions::context::{ActionContext, Movement};
use crate::actions::curves::{linear, ramp_down};
use crate::core::types::Position;
use crate::entity::agent::{Activity, Agent, Role, Trait, VITAL_MAX};
use crate::entity::traits::Threshold;

/// Whether an agent is in any shape to stand its ground
pub fn can_fight(agent: &Agent, health_floor: f32) -> bool {
    (agent.role == Role::Guard || agent.personality == Trait::Brave)
        && agent.vitals.health > health_floor
}

// === FIGHT ===

fn fight_target(ctx: &ActionContext) -> Option<(usize, f32)> {
    ctx.nearest_threat()
        .filter(|(_, d)| *d <= ctx.config.fight_radius)
}

pub fn fight_eligible(ctx: &ActionContext) -> bool {
    can_fight(ctx.agent(), ctx.config.fight_health_floor) && fight_target(ctx).is_some()
}

pub fn fight_score(ctx: &ActionContext) -> f32 {
    let Some((_, distance)) = fight_target(ctx) else {
        return 0.0;
    };
    let agent = ctx.agent();
    let closeness = ramp_down(distance, ctx.config.fight_radius, ctx.config.flee_steepness);
    let health = linear(agent.vitals.health, ctx.config.fight_health_floor, VITAL_MAX);
    (closeness * health * agent.role.weight(ActionId::Fight)).clamp(0.0, 1.0)
}

pub fn fight_execute(ctx: &mut ActionContext) {
    let Some((index, _)) = fight_target(ctx) else {
        return;
    };
    let threat_pos = ctx.threats[index].position;
    match ctx.move_toward(threat_pos) {
        Movement::Stepped | Movement::Blocked => return,
        Movement::Arrived => {}
    }

    let attack = if ctx.agent().role == Role::Guard {
        ctx.config.guard_attack
    } else {
        ctx.config.attack
    };
    let defeated = ctx.threats[index].wound(attack);
    let damage = ctx.threats[index].damage;
    let name = ctx.threats[index].name.clone();

    let agent = ctx.agent_mut();
    agent.vitals.health = (agent.vitals.health - damage).clamp(0.0, VITAL_MAX);
    agent.activity = Activity::Working;
    let fell = agent.vitals.health <= 0.0;
    if fell {
        agent.die();
    }

    if defeated {
        ctx.log(format!("drove off {}", name));
    } else {
        ctx.log(format!("fought {}", name));
    }
    if fell {
        let (tick, id) = (ctx.tick, ctx.agent().id);
        ctx.events.warn(tick, Some(id), format!("fell fighting {}", name));
    }
}

// === FLEE ===

fn flee_from(ctx: &ActionContext) -> Option<(usize, f32)> {
    ctx.nearest_threat()
        .filter(|(_, d)| *d <= ctx.config.flee_radius)
}

pub fn flee_eligible(ctx: &ActionContext) -> bool {
    flee_from(ctx).is_some()
}

pub fn flee_score(ctx: &ActionContext) -> f32 {
    let Some((_, distance)) = flee_from(ctx) else {
        return 0.0;
    };
    let midpoint = ctx.threshold(Threshold::FleeMidpoint, ctx.config.flee_midpoint);
    ramp_down(distance, midpoint, ctx.config.flee_steepness)
}

pub fn flee_execute(ctx: &mut ActionContext) {
    let Some((index, current)) = flee_from(ctx) else {
        return;
    };
    let threat_pos = ctx.threats[index].position;
    let here = ctx.agent().position;

    let mut best: Option<(Position, f32)> = None;
    for step in here.neighbors() {
        if !ctx.world.is_walkable(step) {
            continue;
        }
        let d = step.distance(&threat_pos);
        if d > current && best.map(|(_, bd)| d > bd).unwrap_or(true) {
            best = Some((step, d));
        }
    }

    let agent = ctx.agent_mut();
    match best {
        Some((step, _)) => {
            agent.position = step;
            agent.activity = Activity::Moving;
            agent.wander_target = None;
        }
        // Cornered
        None => agent.activity = Activity::Idle,
    }
}
