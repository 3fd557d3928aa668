#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Motion system that steers actors and resolves obstacle collisions.
//!
//! Each axis is resolved on its own: the hitbox first travels along x and is
//! clamped against every obstacle it would enter, then the same happens on y
//! starting from the post-x position. Resolving the axes separately keeps an
//! actor from slipping through the shared corner of two obstacles.

use std::time::Duration;

use swarmfall_core::{Aabb, Collidable, Command, DamageSource, EntityId, Event, Movable, Vec2};
use swarmfall_world::{query, Entity, EntityKind, World};

/// Moves a single actor by `speed × dt` along its direction and pushes its
/// hitbox back out of any obstacle it would overlap.
///
/// Non-zero directions are normalised first, so diagonal travel covers the
/// same distance as axis-aligned travel. The render box is re-centred on the
/// resolved hitbox before returning.
pub fn resolve<M>(mover: &mut M, dt_secs: f32, obstacles: &[Aabb])
where
    M: Movable + ?Sized,
{
    let direction = mover.direction().normalize_or_zero();
    mover.set_direction(direction);
    let step = direction * mover.speed() * dt_secs.max(0.0);

    let body = mover.body_mut();
    resolve_axis(body.hitbox_mut(), Axis::X, step.x, obstacles);
    resolve_axis(body.hitbox_mut(), Axis::Y, step.y, obstacles);
    body.sync_render();
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Axis {
    X,
    Y,
}

fn resolve_axis(hitbox: &mut Aabb, axis: Axis, delta: f32, obstacles: &[Aabb]) {
    if delta == 0.0 {
        return;
    }

    let start = *hitbox;
    let offset = match axis {
        Axis::X => Vec2::new(delta, 0.0),
        Axis::Y => Vec2::new(0.0, delta),
    };
    hitbox.translate(offset);
    let swept = sweep(&start, hitbox);

    let hits = obstacles.iter().filter(|obstacle| obstacle.overlaps(&swept));
    match (axis, delta > 0.0) {
        (Axis::X, true) => {
            if let Some(edge) = hits.map(Aabb::left).reduce(f32::min) {
                hitbox.set_right(edge);
            }
        }
        (Axis::X, false) => {
            if let Some(edge) = hits.map(Aabb::right).reduce(f32::max) {
                hitbox.set_left(edge);
            }
        }
        (Axis::Y, true) => {
            if let Some(edge) = hits.map(Aabb::top).reduce(f32::min) {
                hitbox.set_bottom(edge);
            }
        }
        (Axis::Y, false) => {
            if let Some(edge) = hits.map(Aabb::bottom).reduce(f32::max) {
                hitbox.set_top(edge);
            }
        }
    }
}

fn sweep(from: &Aabb, to: &Aabb) -> Aabb {
    let left = from.left().min(to.left());
    let top = from.top().min(to.top());
    let right = from.right().max(to.right());
    let bottom = from.bottom().max(to.bottom());
    Aabb::new(left, top, right - left, bottom - top)
}

/// Pure system that moves the player and hostiles and reports contact hits.
#[derive(Debug, Default)]
pub struct Motion;

impl Motion {
    /// Consumes world events and the current world to emit movement and contact commands.
    ///
    /// The player follows `input`; every hostile steers straight at the
    /// player's resolved position. Hostiles overlapping the player after
    /// moving deal their contact damage.
    pub fn handle(&mut self, events: &[Event], world: &World, input: Vec2, out: &mut Vec<Command>) {
        let dt = elapsed(events);
        if dt.is_zero() || query::is_player_dead(world) {
            return;
        }
        let dt_secs = dt.as_secs_f32();

        let Some(player) = query::player(world) else {
            return;
        };
        let mut player = player.clone();
        player.set_direction(input);
        if input != Vec2::ZERO {
            step(world, &mut player, dt_secs);
            out.push(Command::MoveActor {
                actor: player.id(),
                body: *player.body(),
                direction: player.direction(),
            });
        }

        let target = player.center();
        let player_hitbox = player.hitbox();
        let player_id = player.id();

        for hostile in query::hostiles(world) {
            let mut hostile = hostile.clone();
            hostile.set_direction(target - hostile.center());
            step(world, &mut hostile, dt_secs);
            out.push(Command::MoveActor {
                actor: hostile.id(),
                body: *hostile.body(),
                direction: hostile.direction(),
            });

            if hostile.hitbox().overlaps(&player_hitbox) {
                push_contact(&hostile, player_id, out);
            }
        }
    }
}

fn elapsed(events: &[Event]) -> Duration {
    events
        .iter()
        .filter_map(|event| match event {
            Event::TimeAdvanced { dt } => Some(*dt),
            _ => None,
        })
        .fold(Duration::ZERO, Duration::saturating_add)
}

fn step(world: &World, actor: &mut Entity, dt_secs: f32) {
    let reach = actor.hitbox().half_diagonal() + actor.speed() * dt_secs;
    let obstacles = query::obstacles_near(world, actor.center(), reach);
    resolve(actor, dt_secs, &obstacles);
}

fn push_contact(hostile: &Entity, player: EntityId, out: &mut Vec<Command>) {
    if let EntityKind::Hostile {
        template,
        contact_damage,
        ..
    } = hostile.kind()
    {
        out.push(Command::DamageActor {
            target: player,
            amount: *contact_damage,
            source: DamageSource::Contact(*template),
        });
    }
}
