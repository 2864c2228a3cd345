//! Collision detection and resolution.
//!
//! Rules run in a fixed order, each seeing the sizes left by the previous one:
//!
//! 1. cells eat food (circle overlap),
//! 2. oversized cells burst on viruses,
//! 3. same-owner cells merge once their cooldowns expire, or repel before,
//! 4. cells engulf sufficiently smaller cells of other players.
//!
//! Removal is deferred: eaten food is tracked in a bitset and filtered after
//! rule 1, eaten or merged cells are flagged and dropped by
//! [`World::cleanup`]. A flagged cell never eats later in the pass.

use crate::entity::{Body, PlayerCell, absorbed_radius, clamp_to_world};
use crate::spatial::EntityRef;
use crate::world::World;
use fixedbitset::FixedBitSet;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;
use std::time::Duration;

/// Fragments spawn this far beyond twice their radius from the burst point.
const BURST_SPACING: f32 = 8.0;

/// What happened during one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionStats {
    pub food_eaten: usize,
    pub food_spawned: usize,
    pub bursts: usize,
    pub fragments: usize,
    pub merges: usize,
    pub cells_eaten: usize,
}

/// Run all four rules against the current index.
pub fn resolve(world: &mut World, now: Duration) -> CollisionStats {
    let mut stats = CollisionStats::default();
    let mut scratch = Vec::with_capacity(64);

    eat_food(world, &mut scratch, &mut stats);
    burst_on_viruses(world, now, &mut scratch, &mut stats);
    resolve_siblings(world, now, &mut scratch, &mut stats);
    resolve_predation(world, &mut scratch, &mut stats);

    stats
}

/// Rule 1: every cell absorbs the food it overlaps.
fn eat_food(world: &mut World, scratch: &mut Vec<EntityRef>, stats: &mut CollisionStats) {
    let margin = world.config.collision.food_query_margin;
    let absorb = world.config.collision.food_absorb;
    let mut eaten = FixedBitSet::with_capacity(world.foods.len());

    for p in 0..world.players.len() {
        for c in 0..world.players[p].cells.len() {
            let cell = &world.players[p].cells[c];
            if cell.is_removed {
                continue;
            }
            let position = cell.position;
            let mut radius = cell.radius();
            world.index.query_into(position, radius + margin, scratch);

            for &entity in scratch.iter() {
                let f = match entity {
                    EntityRef::Food(f) => f,
                    EntityRef::Virus(_) | EntityRef::Cell { .. } => continue,
                };
                if eaten.contains(f) {
                    continue;
                }
                let food = &world.foods[f];
                let reach = radius + food.radius;
                if position.distance_squared(food.position) <= reach * reach {
                    radius = absorbed_radius(radius, food.radius, absorb);
                    eaten.insert(f);
                    stats.food_eaten += 1;
                }
            }

            world.players[p].cells[c].set_radius(radius);
        }
    }

    // New pellets land past the bitset's range and are never filtered here.
    stats.food_spawned = world.replenish_food();
    if stats.food_eaten > 0 {
        let mut slot = 0;
        world.foods.retain(|_| {
            let keep = !eaten.contains(slot);
            slot += 1;
            keep
        });
        world.mark_index_dirty();
    }
}

/// Rule 2: cells larger than a virus by the eat ratio burst into fragments.
fn burst_on_viruses(
    world: &mut World,
    now: Duration,
    scratch: &mut Vec<EntityRef>,
    stats: &mut CollisionStats,
) {
    let ratio = world.config.collision.eat_ratio;

    for p in 0..world.players.len() {
        // Fragments appended below are visited as well.
        let mut c = 0;
        while c < world.players[p].cells.len() {
            let cell = &world.players[p].cells[c];
            if cell.is_removed {
                c += 1;
                continue;
            }
            world.index.query_into(cell.position, cell.radius(), scratch);

            for &entity in scratch.iter() {
                let v = match entity {
                    EntityRef::Virus(v) => v,
                    EntityRef::Food(_) | EntityRef::Cell { .. } => continue,
                };
                let cell = &world.players[p].cells[c];
                let virus = &world.viruses[v];
                if virus.bursts(cell.radius(), ratio) && cell.overlaps(virus) {
                    let created = burst(world, p, c, now);
                    if created > 0 {
                        stats.bursts += 1;
                        stats.fragments += created;
                    }
                }
            }
            c += 1;
        }
    }
}

/// Split cell `c` of player slot `p` into equal pieces. Returns the number of
/// fragments created; zero when the player has no free cell capacity.
fn burst(world: &mut World, p: usize, c: usize, now: Duration) -> usize {
    let max_cells = world.config.player.max_cells;
    let collision = &world.config.collision;
    let size = world.config.world.size;
    let merge_at = now + world.config.player.merge_delay();

    let player = &mut world.players[p];
    let pieces = collision
        .burst_max_pieces
        .min(max_cells.saturating_sub(player.cells.len()));
    if pieces == 0 {
        return 0;
    }

    let cell = &mut player.cells[c];
    let radius = cell.radius();
    let each = (radius * radius / (pieces + 1) as f32).sqrt();
    cell.set_radius(each);
    cell.merge_at = merge_at;
    let (owner, origin, color) = (cell.owner, cell.position, cell.color);

    for _ in 0..pieces {
        let direction = Vec2::from_angle(world.rng.random_range(0.0..TAU));
        let speed = world
            .rng
            .random_range(collision.burst_speed_min..=collision.burst_speed_max);
        let position = clamp_to_world(origin + direction * (each * 2.0 + BURST_SPACING), size);

        let mut fragment = PlayerCell::new(owner, position, each, color, merge_at);
        fragment.velocity = direction * speed;
        let slot = EntityRef::Cell {
            player: p,
            cell: player.cells.len(),
        };
        world.index.insert(slot, &fragment);
        player.cells.push(fragment);
    }
    pieces
}

/// Rule 3: merge same-owner cells whose cooldowns have expired, push apart
/// the ones that are still cooling down.
fn resolve_siblings(
    world: &mut World,
    now: Duration,
    scratch: &mut Vec<EntityRef>,
    stats: &mut CollisionStats,
) {
    let overlap = world.config.collision.merge_overlap;
    let repel = world.config.collision.repel_strength;
    let scale = world.config.collision.cell_query_scale;

    for p in 0..world.players.len() {
        for c in 0..world.players[p].cells.len() {
            let cell = &world.players[p].cells[c];
            if cell.is_removed {
                continue;
            }
            world.index.query_into(cell.position, cell.radius() * scale, scratch);

            for &entity in scratch.iter() {
                let other = match entity {
                    EntityRef::Cell { player, cell } if player == p && cell != c => cell,
                    EntityRef::Cell { .. } | EntityRef::Food(_) | EntityRef::Virus(_) => continue,
                };
                let cells = &mut world.players[p].cells;
                if cells[c].is_removed {
                    break;
                }
                if cells[other].is_removed {
                    continue;
                }

                let (a, b) = (&cells[c], &cells[other]);
                let reach = a.radius() + b.radius();
                let delta = b.position - a.position;
                let distance_sq = delta.length_squared();

                if a.can_merge(now) && b.can_merge(now) {
                    if distance_sq <= overlap * reach * reach {
                        let (keep, gone) = if b.radius() > a.radius() { (other, c) } else { (c, other) };
                        let merged = absorbed_radius(cells[keep].radius(), cells[gone].radius(), 1.0);
                        cells[keep].set_radius(merged);
                        cells[gone].is_removed = true;
                        stats.merges += 1;
                    }
                } else if distance_sq < reach * reach && distance_sq > 0.0 {
                    let distance = distance_sq.sqrt();
                    let push = (reach - distance) * repel;
                    cells[c].velocity -= delta / distance * push;
                }
            }
        }
    }
}

/// Rule 4: a cell engulfs another player's cell when it is larger by the eat
/// ratio and the victim's center lies inside it.
fn resolve_predation(world: &mut World, scratch: &mut Vec<EntityRef>, stats: &mut CollisionStats) {
    let ratio = world.config.collision.eat_ratio;
    let absorb = world.config.collision.engulf_absorb;
    let scale = world.config.collision.cell_query_scale;

    for p in 0..world.players.len() {
        for c in 0..world.players[p].cells.len() {
            let cell = &world.players[p].cells[c];
            if cell.is_removed {
                continue;
            }
            world.index.query_into(cell.position, cell.radius() * scale, scratch);

            for &entity in scratch.iter() {
                let (op, oc) = match entity {
                    EntityRef::Cell { player, cell } if player != p => (player, cell),
                    EntityRef::Cell { .. } | EntityRef::Food(_) | EntityRef::Virus(_) => continue,
                };
                let hunter = &world.players[p].cells[c];
                if hunter.is_removed {
                    break;
                }
                let prey = &world.players[op].cells[oc];
                if prey.is_removed {
                    continue;
                }

                let (hr, pr) = (hunter.radius(), prey.radius());
                if hr > pr * ratio && hunter.distance_squared(prey) <= hr * hr {
                    world.players[op].cells[oc].is_removed = true;
                    world.players[p].cells[c].set_radius(absorbed_radius(hr, pr, absorb));
                    stats.cells_eaten += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::entity::{Color, Controller, Food, PlayerId, Virus};

    const NOW: Duration = Duration::from_secs(100);

    fn world() -> World {
        let mut config = Config::default();
        config.simulation.seed = Some(5);
        config.food.target_count = 0;
        World::new(config).unwrap()
    }

    /// Spawn a human with one cell per `(position, radius)`.
    fn add_player(world: &mut World, id: u32, cells: &[(Vec2, f32)]) -> usize {
        world
            .spawn_player(PlayerId(id), "p", Color::default(), Controller::Human, Duration::ZERO)
            .unwrap();
        let slot = world.players.len() - 1;
        let player = &mut world.players[slot];
        player.cells.clear();
        for &(position, radius) in cells {
            player
                .cells
                .push(PlayerCell::new(player.id, position, radius, player.color, Duration::ZERO));
        }
        slot
    }

    fn radii(world: &World, slot: usize) -> Vec<f32> {
        world.players[slot].cells.iter().filter(|c| !c.is_removed).map(|c| c.radius()).collect()
    }

    #[test]
    fn test_cell_eats_overlapping_food() {
        let mut world = world();
        let p = add_player(&mut world, 1, &[(Vec2::new(500.0, 500.0), 20.0)]);
        world.spawn_food(Food::new(Vec2::new(520.0, 500.0), 5.0, Color::default()));
        world.spawn_food(Food::new(Vec2::new(600.0, 500.0), 5.0, Color::default()));
        world.rebuild_index();

        let stats = resolve(&mut world, NOW);
        assert_eq!(stats.food_eaten, 1);
        assert_eq!(world.foods().len(), 1);
        assert_eq!(world.foods()[0].position, Vec2::new(600.0, 500.0));
        assert!((radii(&world, p)[0] - 420.0_f32.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn test_food_is_eaten_once() {
        let mut world = world();
        let a = add_player(&mut world, 1, &[(Vec2::new(500.0, 500.0), 20.0)]);
        let b = add_player(&mut world, 2, &[(Vec2::new(530.0, 500.0), 20.0)]);
        world.spawn_food(Food::new(Vec2::new(515.0, 500.0), 5.0, Color::default()));
        world.rebuild_index();

        let stats = resolve(&mut world, NOW);
        assert_eq!(stats.food_eaten, 1);
        let grown = radii(&world, a)[0] > 20.0;
        let other_grown = radii(&world, b)[0] > 20.0;
        assert!(grown ^ other_grown);
    }

    #[test]
    fn test_virus_burst_with_limited_capacity() {
        let mut world = world();
        let mut cells = vec![(Vec2::new(1000.0, 1000.0), 50.0)];
        // Twelve far-away siblings leave three free slots.
        for i in 0..12 {
            cells.push((Vec2::new(5000.0 + i as f32 * 100.0, 5000.0), 12.0));
        }
        let p = add_player(&mut world, 1, &cells);
        world.spawn_virus(Vec2::new(1060.0, 1000.0), 40.0);
        world.rebuild_index();

        let stats = resolve(&mut world, NOW);
        assert_eq!(stats.bursts, 1);
        assert_eq!(stats.fragments, 3);

        let player = &world.players[p];
        assert_eq!(player.cells.len(), 16);
        let burst: Vec<&PlayerCell> = std::iter::once(&player.cells[0]).chain(&player.cells[13..]).collect();
        let mut sum_sq = 0.0;
        for cell in &burst {
            assert!((cell.radius() - 25.0).abs() < 1e-4);
            assert_eq!(cell.merge_at, NOW + Duration::from_millis(6000));
            sum_sq += cell.radius() * cell.radius();
        }
        assert!((sum_sq - 2500.0).abs() < 0.01);
    }

    #[test]
    fn test_burst_at_capacity_is_noop() {
        let mut world = world();
        let mut cells = vec![(Vec2::new(1000.0, 1000.0), 50.0)];
        for i in 0..15 {
            cells.push((Vec2::new(5000.0 + i as f32 * 100.0, 5000.0), 12.0));
        }
        let p = add_player(&mut world, 1, &cells);
        world.spawn_virus(Vec2::new(1060.0, 1000.0), 40.0);
        world.rebuild_index();

        let stats = resolve(&mut world, NOW);
        assert_eq!(stats.bursts, 0);
        assert_eq!(world.players[p].cells.len(), 16);
        assert_eq!(world.players[p].cells[0].radius(), 50.0);
    }

    #[test]
    fn test_burst_fragments_are_visible_to_predators() {
        let mut world = world();
        world.config.player.max_cells = 9;
        let a = add_player(&mut world, 1, &[(Vec2::new(1000.0, 1000.0), 60.0)]);
        world.spawn_virus(Vec2::new(1065.0, 1000.0), 10.0);
        // Too far from the virus to burst itself, close enough to engulf
        // every fragment.
        add_player(&mut world, 2, &[(Vec2::new(1000.0, 1000.0), 50.0)]);
        world.rebuild_index();
        assert_eq!(world.index().len(), 3);

        let stats = resolve(&mut world, NOW);
        assert_eq!(stats.bursts, 1);
        assert_eq!(stats.fragments, 8);
        assert_eq!(world.index().len(), 11);
        assert_eq!(stats.cells_eaten, 9);
        assert!(radii(&world, a).is_empty());
    }

    #[test]
    fn test_small_cell_passes_virus() {
        let mut world = world();
        let p = add_player(&mut world, 1, &[(Vec2::new(1000.0, 1000.0), 40.0)]);
        world.spawn_virus(Vec2::new(1000.0, 1000.0), 40.0);
        world.rebuild_index();

        let stats = resolve(&mut world, NOW);
        assert_eq!(stats.bursts, 0);
        assert_eq!(radii(&world, p), vec![40.0]);
    }

    #[test]
    fn test_siblings_merge_after_cooldown() {
        let mut world = world();
        let p = add_player(
            &mut world,
            1,
            &[(Vec2::new(1000.0, 1000.0), 30.0), (Vec2::new(1010.0, 1000.0), 20.0)],
        );
        world.rebuild_index();

        let stats = resolve(&mut world, NOW);
        assert_eq!(stats.merges, 1);
        let left = radii(&world, p);
        assert_eq!(left.len(), 1);
        assert!((left[0] - 1300.0_f32.sqrt()).abs() < 1e-4);
        assert!(world.players[p].cells[1].is_removed);
    }

    #[test]
    fn test_siblings_repel_during_cooldown() {
        let mut world = world();
        let p = add_player(
            &mut world,
            1,
            &[(Vec2::new(1000.0, 1000.0), 30.0), (Vec2::new(1010.0, 1000.0), 30.0)],
        );
        for cell in &mut world.players[p].cells {
            cell.merge_at = NOW + Duration::from_millis(1);
        }
        world.rebuild_index();

        let stats = resolve(&mut world, NOW);
        assert_eq!(stats.merges, 0);
        let cells = &world.players[p].cells;
        assert_eq!(radii(&world, p), vec![30.0, 30.0]);
        assert!((cells[0].velocity.x - -(60.0 - 10.0) * 0.02).abs() < 1e-4);
        assert!(cells[1].velocity.x > 0.0);
    }

    #[test]
    fn test_engulf_requires_center_inside() {
        let mut world = world();
        let hunter = add_player(&mut world, 1, &[(Vec2::new(1000.0, 1000.0), 50.0)]);
        // Circles intersect but the center is 55 away, outside radius 50.
        let prey = add_player(&mut world, 2, &[(Vec2::new(1055.0, 1000.0), 20.0)]);
        world.rebuild_index();

        let stats = resolve(&mut world, NOW);
        assert_eq!(stats.cells_eaten, 0);
        assert_eq!(radii(&world, hunter), vec![50.0]);
        assert_eq!(radii(&world, prey), vec![20.0]);
    }

    #[test]
    fn test_engulf_transfers_mass() {
        let mut world = world();
        let hunter = add_player(&mut world, 1, &[(Vec2::new(1000.0, 1000.0), 50.0)]);
        let prey = add_player(&mut world, 2, &[(Vec2::new(1040.0, 1000.0), 20.0)]);
        world.rebuild_index();

        let stats = resolve(&mut world, NOW);
        assert_eq!(stats.cells_eaten, 1);
        assert!(radii(&world, prey).is_empty());
        let r = radii(&world, hunter)[0];
        assert!((r - (2500.0_f32 + 400.0 * 0.92).sqrt()).abs() < 1e-3);
        assert!(r * r <= 2500.0 + 400.0);
    }

    #[test]
    fn test_similar_sizes_do_not_eat() {
        let mut world = world();
        let a = add_player(&mut world, 1, &[(Vec2::new(1000.0, 1000.0), 40.0)]);
        let b = add_player(&mut world, 2, &[(Vec2::new(1001.0, 1000.0), 37.0)]);
        world.rebuild_index();

        let stats = resolve(&mut world, NOW);
        assert_eq!(stats.cells_eaten, 0);
        assert_eq!(radii(&world, a), vec![40.0]);
        assert_eq!(radii(&world, b), vec![37.0]);
    }

    #[test]
    fn test_eaten_cell_does_not_eat() {
        let mut world = world();
        let big = add_player(&mut world, 1, &[(Vec2::new(1000.0, 1000.0), 100.0)]);
        let mid = add_player(&mut world, 2, &[(Vec2::new(1030.0, 1000.0), 40.0)]);
        let small = add_player(&mut world, 3, &[(Vec2::new(1040.0, 1000.0), 10.5)]);
        world.rebuild_index();

        resolve(&mut world, NOW);
        assert!(radii(&world, mid).is_empty());
        assert_eq!(radii(&world, big).len(), 1);
        // Either the big cell got it first or the mid cell ate it before
        // being eaten; the small cell never survives both.
        assert!(radii(&world, small).is_empty());
    }

    #[test]
    fn test_virus_is_never_consumed() {
        let mut world = world();
        add_player(&mut world, 1, &[(Vec2::new(1000.0, 1000.0), 200.0)]);
        world.spawn_virus(Vec2::new(1000.0, 1000.0), 40.0);
        world.rebuild_index();

        resolve(&mut world, NOW);
        assert_eq!(world.viruses().len(), 1);
        let virus: &Virus = &world.viruses()[0];
        assert_eq!(virus.radius, 40.0);
    }
}
