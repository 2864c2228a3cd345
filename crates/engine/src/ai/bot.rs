use crate::entity::{Body, PlayerId};
use crate::spatial::EntityRef;
use crate::world::World;
use glam::Vec2;
use std::time::Duration;

/// Heading, in radians, of a wandering bot at time `t` (seconds, seed
/// included). Smooth and bounded so bots drift instead of jittering.
#[inline]
pub fn wander_heading(t: f32) -> f32 {
    ((t * 0.7).sin() + (t * 1.3).cos()) * 0.7
}

/// Per-bot phase offset so bots don't all wander in lockstep.
#[inline]
fn wander_seed(id: PlayerId) -> f32 {
    (id.0 % 1024) as f32
}

/// Write a steering vector into every cell of every live bot.
///
/// Reads the index as built at the start of the tick.
pub fn think(world: &mut World, now: Duration) {
    let mut scratch = Vec::with_capacity(64);
    let clock_secs = now.as_secs_f32();

    for p in 0..world.players.len() {
        let player = &world.players[p];
        if !player.is_bot() || !player.alive {
            continue;
        }
        let t = clock_secs + wander_seed(player.id);

        for c in 0..player.cells.len() {
            let intent = match choose_target(world, p, c, &mut scratch) {
                Some(target) => (target - world.players[p].cells[c].position).normalize_or_zero(),
                None => Vec2::from_angle(wander_heading(t)) * world.config.bots.wander_weight,
            };
            world.players[p].cells[c].intent = intent;
        }
    }
}

/// Nearest food in sensing range, replaced by a strictly closer prey cell.
fn choose_target(world: &World, p: usize, c: usize, scratch: &mut Vec<EntityRef>) -> Option<Vec2> {
    let bots = &world.config.bots;
    let cell = &world.players[p].cells[c];
    world.index.query_into(cell.position, bots.sense_radius, scratch);

    let sense_sq = bots.sense_radius * bots.sense_radius;
    let mut best: Option<(f32, Vec2)> = None;

    for &entity in scratch.iter() {
        let food = match entity {
            EntityRef::Food(f) => &world.foods[f],
            EntityRef::Virus(_) | EntityRef::Cell { .. } => continue,
        };
        let d2 = cell.distance_squared(food);
        if d2 <= sense_sq && best.is_none_or(|(b, _)| d2 < b) {
            best = Some((d2, food.position));
        }
    }

    let chase_sq = bots.chase_radius * bots.chase_radius;
    let max_prey = cell.radius() * bots.prey_ratio;
    for &entity in scratch.iter() {
        let prey = match entity {
            EntityRef::Cell { player, cell } if player != p => &world.players[player].cells[cell],
            EntityRef::Cell { .. } | EntityRef::Food(_) | EntityRef::Virus(_) => continue,
        };
        if prey.is_removed || prey.radius() >= max_prey {
            continue;
        }
        let d2 = cell.distance_squared(prey);
        if d2 < chase_sq && best.is_none_or(|(b, _)| d2 < b) {
            best = Some((d2, prey.position));
        }
    }

    best.map(|(_, target)| target)
}
