//! Wander: the fallback that is always available

use rand::Rng;

use crate::actions::context::{ActionContext, Movement};
use crate::core::types::Position;
use crate::entity::agent::Activity;

/// Attempts at finding a walkable destination before giving up this tick
const PICK_ATTEMPTS: usize = 8;

pub fn wander_eligible(_ctx: &ActionContext) -> bool {
    true
}

pub fn wander_score(ctx: &ActionContext) -> f32 {
    ctx.config.idle_score
}

fn pick_destination(ctx: &mut ActionContext) -> Option<Position> {
    let origin = ctx.agent().position;
    let r = ctx.config.wander_radius.max(1);
    for _ in 0..PICK_ATTEMPTS {
        let dx = ctx.rng.gen_range(-r..=r);
        let dy = ctx.rng.gen_range(-r..=r);
        let candidate = origin.offset(dx, dy);
        if candidate != origin && ctx.world.is_walkable(candidate) {
            return Some(candidate);
        }
    }
    None
}

pub fn wander_execute(ctx: &mut ActionContext) {
    let here = ctx.agent().position;
    let target = match ctx.agent().wander_target {
        Some(t) if t != here => Some(t),
        _ => pick_destination(ctx),
    };
    let Some(target) = target else {
        ctx.agent_mut().activity = Activity::Idle;
        return;
    };
    ctx.agent_mut().wander_target = Some(target);

    match ctx.move_toward(target) {
        Movement::Stepped => {}
        Movement::Arrived => {
            // Close enough; finish on the tile if it is free to stand on
            if ctx.world.is_walkable(target) {
                let agent = ctx.agent_mut();
                agent.position = target;
                agent.activity = Activity::Moving;
            } else {
                ctx.agent_mut().activity = Activity::Idle;
            }
            ctx.agent_mut().wander_target = None;
        }
        Movement::Blocked => {
            let agent = ctx.agent_mut();
            agent.wander_target = None;
            agent.activity = Activity::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::test_support::Fixture;
    use crate::entity::agent::{Role, Trait};
    use crate::world::{Tile, TileKind};

    #[test]
    fn test_wander_always_eligible_with_constant_score() {
        let mut fx = Fixture::new();
        let a = fx.spawn(Role::Guard, Trait::Steady, Position::new(5, 5));
        fx.agents[a].vitals.hunger = 99.0;
        let ctx = fx.ctx(a);
        assert!(wander_eligible(&ctx));
        assert_eq!(wander_score(&ctx), ctx.config.idle_score);
    }

    #[test]
    fn test_wander_moves_and_remembers_destination() {
        let mut fx = Fixture::new();
        let a = fx.spawn(Role::Guard, Trait::Steady, Position::new(20, 20));
        wander_execute(&mut fx.ctx(a));

        let agent = &fx.agents[a];
        assert_ne!(agent.position, Position::new(20, 20));
        assert!(agent.position.chebyshev(&Position::new(20, 20)) <= fx.config.wander_radius);
    }

    #[test]
    fn test_walled_in_agent_stays_put() {
        let mut fx = Fixture::new();
        let center = Position::new(10, 10);
        for n in center.neighbors() {
            fx.world.set(
                n,
                Tile {
                    kind: TileKind::Wall,
                    resource: 0,
                },
            );
        }
        let a = fx.spawn(Role::Guard, Trait::Steady, center);
        for _ in 0..5 {
            wander_execute(&mut fx.ctx(a));
        }
        assert_eq!(fx.agents[a].position, center);
        assert!(fx.agents[a].wander_target.is_none());
    }
}
