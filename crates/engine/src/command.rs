//! Queued player commands.
//!
//! Split and eject requests are buffered by the simulation and applied at
//! the start of the next tick, before bots think and cells move.

use crate::entity::{Body, Color, Food, PlayerCell, PlayerId, clamp_to_world};
use crate::world::World;
use glam::Vec2;
use std::time::Duration;
use tracing::trace;

/// Distance added past twice the child's radius when placing a split child.
const SPLIT_SPACING: f32 = 10.0;
/// Launch speed of a split child: `base + scale / sqrt(r)`.
const SPLIT_SPEED_BASE: f32 = 12.0;
const SPLIT_SPEED_SCALE: f32 = 60.0;
/// Gap between an ejecting cell's edge and the new pellet's edge.
const EJECT_GAP: f32 = 2.0;
const EJECT_COLOR: Color = Color::new(117, 199, 240);

/// A discrete request from a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Split every eligible cell of the player in two.
    Split(PlayerId),
    /// Eject a pellet of mass from every eligible cell of the player.
    Eject(PlayerId),
}

impl Command {
    pub fn player(&self) -> PlayerId {
        match *self {
            Command::Split(id) | Command::Eject(id) => id,
        }
    }

    /// Apply the command, returning the number of entities it created.
    /// Commands for unknown or dead players do nothing.
    pub fn apply(self, world: &mut World, now: Duration) -> usize {
        let alive = world.player(self.player()).is_some_and(|p| p.alive);
        if !alive {
            trace!("Ignoring {:?}: player is not in play", self);
            return 0;
        }
        let created = match self {
            Command::Split(id) => split(world, id, now),
            Command::Eject(id) => eject(world, id),
        };
        if created == 0 {
            trace!("{:?} had no eligible cells", self);
        } else {
            world.mark_index_dirty();
        }
        created
    }
}

/// Unit direction for the player's cell at `index`: its steering when it
/// has one, `+x` otherwise.
fn aim(world: &World, id: PlayerId, index: usize) -> Vec2 {
    world
        .player(id)
        .and_then(|p| p.steering_for(index).try_normalize())
        .unwrap_or(Vec2::X)
}

fn split(world: &mut World, id: PlayerId, now: Duration) -> usize {
    let size = world.config.world.size;
    let player_config = &world.config.player;
    let (max_cells, min_radius, recoil) = (
        player_config.max_cells,
        player_config.split_min_radius,
        player_config.split_recoil,
    );
    let merge_at = now + player_config.merge_delay();

    // Only the cells that existed before the request split; children don't.
    let count = world.player(id).map_or(0, |p| p.cells.len());
    let mut created = 0;
    for i in 0..count {
        let direction = aim(world, id, i);
        let Some(player) = world.player_mut(id) else {
            break;
        };
        if player.cells.len() >= max_cells {
            break;
        }
        let cell = &mut player.cells[i];
        if cell.radius() < min_radius {
            continue;
        }

        let radius = (cell.radius() * cell.radius() / 2.0).sqrt();
        let speed = SPLIT_SPEED_BASE + SPLIT_SPEED_SCALE / radius.sqrt();
        cell.set_radius(radius);
        cell.merge_at = merge_at;
        cell.velocity -= direction * speed * recoil;

        let position = clamp_to_world(cell.position + direction * (radius * 2.0 + SPLIT_SPACING), size);
        let mut child = PlayerCell::new(cell.owner, position, radius, cell.color, merge_at);
        child.velocity = direction * speed;
        player.cells.push(child);
        created += 1;
    }
    created
}

fn eject(world: &mut World, id: PlayerId) -> usize {
    let size = world.config.world.size;
    let min_radius = world.config.player.min_radius;
    let eject = &world.config.eject;
    let (pellet_radius, speed, threshold) = (
        eject.pellet_radius,
        eject.speed,
        min_radius + eject.min_margin,
    );
    let pellet_sq = pellet_radius * pellet_radius;

    let count = world.player(id).map_or(0, |p| p.cells.len());
    let mut pellets = Vec::new();
    for i in 0..count {
        let direction = aim(world, id, i);
        let Some(player) = world.player_mut(id) else {
            break;
        };
        let cell = &mut player.cells[i];
        if cell.radius() <= threshold {
            continue;
        }
        // The cell pays exactly the pellet's mass; skip rather than go under.
        let remaining = cell.radius() * cell.radius() - pellet_sq;
        if remaining < min_radius * min_radius {
            continue;
        }
        cell.set_radius(remaining.sqrt());

        let offset = cell.radius() + pellet_radius + EJECT_GAP;
        let position = clamp_to_world(cell.position + direction * offset, size);
        pellets.push(Food::ejected(position, pellet_radius, EJECT_COLOR, direction * speed));
    }

    let created = pellets.len();
    for pellet in pellets {
        world.spawn_food(pellet);
    }
    created
}
