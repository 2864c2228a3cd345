//! Movement integration.
//!
//! Humans and bots are treated alike: each cell has a steering vector of
//! length at most 1 that is scaled by the cell's speed cap and blended into
//! its velocity.

use crate::entity::clamp_to_world;
use crate::world::World;

/// Advance every cell and drifting pellet by `dt` seconds.
pub fn integrate(world: &mut World, dt: f32) {
    let size = world.config.world.size;
    let physics = &world.config.physics;

    for player in &mut world.players {
        for i in 0..player.cells.len() {
            let steer = player.steering_for(i);
            let cell = &mut player.cells[i];

            if steer != glam::Vec2::ZERO {
                cell.velocity += steer * cell.max_speed(physics) * physics.accel;
            }
            cell.velocity *= cell.drag(physics);
            // Velocity is kept at the wall so the cell keeps pushing against it.
            cell.position = clamp_to_world(cell.position + cell.velocity * dt, size);
        }
    }

    let decay = world.config.eject.pellet_decay;
    for food in world.foods.iter_mut().filter(|f| f.is_drifting()) {
        food.drift(dt, decay, size);
    }
}
