//! World state management.
//!
//! Owns every food pellet, virus and player, plus the spatial index built
//! over them.

use crate::config::Config;
use crate::entity::{
    Body, Color, Controller, Food, Player, PlayerCell, PlayerId, Virus, clamp_to_world,
};
use crate::error::{ConfigError, WorldError};
use crate::spatial::{EntityRef, SpatialIndex};
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Bot name stems.
const BOT_NAMES: &[&str] = &["alpha", "beta", "zeta", "omicron", "tau", "ion", "neo"];

/// First id handed to bots, kept clear of externally chosen ids.
const FIRST_BOT_ID: u32 = 1_000_000;

/// A borrowed entity, resolved from an [`EntityRef`].
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Food(&'a Food),
    Virus(&'a Virus),
    Cell(&'a PlayerCell),
}

impl Entity<'_> {
    pub fn position(&self) -> Vec2 {
        match self {
            Entity::Food(f) => f.position(),
            Entity::Virus(v) => v.position(),
            Entity::Cell(c) => c.position(),
        }
    }

    pub fn radius(&self) -> f32 {
        match self {
            Entity::Food(f) => f.radius(),
            Entity::Virus(v) => v.radius(),
            Entity::Cell(c) => c.radius(),
        }
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    pub id: PlayerId,
    pub name: String,
    /// Radius-equivalent of the player's total mass.
    pub score: f32,
}

/// Population statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub players: usize,
    pub alive_players: usize,
    pub cells: usize,
    pub food: usize,
    pub viruses: usize,
}

/// Outcome of the end-of-tick cleanup pass.
#[derive(Debug, Clone, Default)]
pub struct Cleanup {
    /// Cells dropped because they were eaten, merged or undersized.
    pub removed_cells: usize,
    /// Players whose last cell disappeared this tick.
    pub deaths: Vec<PlayerId>,
    /// Bots given a fresh cell.
    pub respawned: Vec<PlayerId>,
}

/// The game world containing all entities.
pub struct World {
    pub(crate) config: Config,
    pub(crate) foods: Vec<Food>,
    pub(crate) viruses: Vec<Virus>,
    pub(crate) players: Vec<Player>,
    /// Position of each player in `players`.
    player_slots: HashMap<PlayerId, usize>,
    pub(crate) index: SpatialIndex,
    /// Set when collections changed since the last rebuild.
    index_dirty: bool,
    pub(crate) rng: StdRng,
    next_bot_id: u32,
}

impl World {
    /// Create an empty world. Call [`populate`](Self::populate) to seed it.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self {
            index: SpatialIndex::new(config.world.size, config.simulation.bucket_size),
            foods: Vec::with_capacity(config.food.target_count),
            viruses: Vec::with_capacity(config.virus.count),
            players: Vec::with_capacity(config.bots.count + 8),
            player_slots: HashMap::new(),
            index_dirty: true,
            rng,
            next_bot_id: FIRST_BOT_ID,
            config,
        })
    }

    /// Seed the configured food and viruses.
    pub fn populate(&mut self) {
        for _ in 0..self.config.food.target_count {
            self.spawn_random_food();
        }
        for _ in 0..self.config.virus.count {
            let position = self.random_position();
            let radius = self.random_in(self.config.virus.min_radius, self.config.virus.max_radius);
            self.spawn_virus(position, radius);
        }
        self.rebuild_index();
        info!(
            "World initialized: {} food, {} viruses",
            self.foods.len(),
            self.viruses.len()
        );
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn size(&self) -> f32 {
        self.config.world.size
    }

    #[inline]
    pub fn foods(&self) -> &[Food] {
        &self.foods
    }

    #[inline]
    pub fn viruses(&self) -> &[Virus] {
        &self.viruses
    }

    #[inline]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// The broad-phase index as of the last rebuild.
    #[inline]
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.player_slots.get(&id).map(|&slot| &self.players[slot])
    }

    /// Slot of a player in [`players`](Self::players).
    pub(crate) fn slot_of(&self, id: PlayerId) -> Option<usize> {
        self.player_slots.get(&id).copied()
    }

    /// Mutable access to a player. Marks the index stale, since callers may
    /// add or drop cells.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        let slot = *self.player_slots.get(&id)?;
        self.index_dirty = true;
        Some(&mut self.players[slot])
    }

    /// Resolve a handle returned by the index.
    pub fn get(&self, entity: EntityRef) -> Option<Entity<'_>> {
        match entity {
            EntityRef::Food(i) => self.foods.get(i).map(Entity::Food),
            EntityRef::Virus(i) => self.viruses.get(i).map(Entity::Virus),
            EntityRef::Cell { player, cell } => self
                .players
                .get(player)
                .and_then(|p| p.cells.get(cell))
                .map(Entity::Cell),
        }
    }

    /// A uniformly random point inside the world.
    pub fn random_position(&mut self) -> Vec2 {
        let size = self.config.world.size;
        Vec2::new(self.rng.random_range(0.0..=size), self.rng.random_range(0.0..=size))
    }

    fn random_in(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.rng.random_range(min..max)
        } else {
            min
        }
    }

    /// Add a food pellet and return its slot.
    pub fn spawn_food(&mut self, mut food: Food) -> usize {
        food.position = clamp_to_world(food.position, self.config.world.size);
        self.foods.push(food);
        self.index_dirty = true;
        self.foods.len() - 1
    }

    /// Add a pellet of random size and hue at a random point.
    pub fn spawn_random_food(&mut self) -> usize {
        let position = self.random_position();
        let radius = self.random_in(self.config.food.min_radius, self.config.food.max_radius);
        let color = Color::random_hue(&mut self.rng, 70.0, 60.0);
        self.spawn_food(Food::new(position, radius, color))
    }

    /// Add a virus and return its slot.
    pub fn spawn_virus(&mut self, position: Vec2, radius: f32) -> usize {
        let position = clamp_to_world(position, self.config.world.size);
        self.viruses.push(Virus::new(position, radius));
        self.index_dirty = true;
        self.viruses.len() - 1
    }

    /// Top up the food pool toward its target, at most one batch per call.
    /// Returns the number of pellets spawned.
    pub fn replenish_food(&mut self) -> usize {
        let target = self.config.food.target_count;
        let missing = target.saturating_sub(self.foods.len());
        let count = missing.min(self.config.food.respawn_batch);
        for _ in 0..count {
            self.spawn_random_food();
        }
        count
    }

    /// Register a player and give it a starting cell at a random point.
    pub fn spawn_player(
        &mut self,
        id: PlayerId,
        name: &str,
        color: Color,
        controller: Controller,
        now: Duration,
    ) -> Result<&mut Player, WorldError> {
        if self.player_slots.contains_key(&id) {
            return Err(WorldError::DuplicatePlayer(id.0));
        }
        let name: String = name.chars().take(self.config.player.max_name_length).collect();
        let slot = self.players.len();
        self.players.push(Player::new(id, name, color, controller));
        self.player_slots.insert(id, slot);
        self.respawn_slot(slot, now);

        let player = &mut self.players[slot];
        info!("Spawned {:?} player {} '{}'", controller, id, player.name);
        Ok(player)
    }

    /// Give an existing player a single fresh cell, replacing any it owns.
    pub fn respawn_player(&mut self, id: PlayerId, now: Duration) -> Result<(), WorldError> {
        let slot = *self
            .player_slots
            .get(&id)
            .ok_or(WorldError::UnknownPlayer(id.0))?;
        self.respawn_slot(slot, now);
        Ok(())
    }

    fn respawn_slot(&mut self, slot: usize, now: Duration) {
        let position = self.random_position();
        let radius = self.config.player.start_radius;
        let merge_at = now + self.config.player.merge_delay();
        let player = &mut self.players[slot];
        player.cells.clear();
        player
            .cells
            .push(PlayerCell::new(player.id, position, radius, player.color, merge_at));
        player.alive = true;
        self.index_dirty = true;
    }

    /// Remove a player and all of its cells. Later slots shift down, so the
    /// index is rebuilt right away.
    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        let slot = self.player_slots.remove(&id)?;
        let player = self.players.remove(slot);
        for (i, p) in self.players.iter().enumerate().skip(slot) {
            self.player_slots.insert(p.id, i);
        }
        self.rebuild_index();
        info!("Removed player {} '{}'", id, player.name);
        Some(player)
    }

    /// Add a bot with a generated name and color.
    pub fn add_bot(&mut self, now: Duration) -> PlayerId {
        let id = PlayerId(self.next_bot_id);
        self.next_bot_id += 1;
        let stem = BOT_NAMES[self.rng.random_range(0..BOT_NAMES.len())];
        let name = format!("{}{}", stem, id.0 - FIRST_BOT_ID);
        let color = Color::random_hue(&mut self.rng, 70.0, 55.0);
        // Bot ids come from a private counter, so they cannot collide.
        if self.spawn_player(id, &name, color, Controller::Bot, now).is_err() {
            debug!("Bot id {} already taken", id);
        }
        id
    }

    /// Rebuild the spatial index from the current collections.
    pub fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, food) in self.foods.iter().enumerate() {
            self.index.insert(EntityRef::Food(i), food);
        }
        for (i, virus) in self.viruses.iter().enumerate() {
            self.index.insert(EntityRef::Virus(i), virus);
        }
        for (p, player) in self.players.iter().enumerate() {
            for (c, cell) in player.cells.iter().enumerate() {
                if !cell.is_removed {
                    self.index.insert(EntityRef::Cell { player: p, cell: c }, cell);
                }
            }
        }
        self.index_dirty = false;
    }

    /// Rebuild only if collections changed since the last rebuild.
    pub fn refresh_index(&mut self) {
        if self.index_dirty {
            self.rebuild_index();
        }
    }

    pub(crate) fn mark_index_dirty(&mut self) {
        self.index_dirty = true;
    }

    /// Entities whose circle intersects the query circle (camera culling).
    pub fn query_area(&self, center: Vec2, radius: f32) -> Vec<EntityRef> {
        let mut found = self.index.query(center, radius);
        found.retain(|&entity| {
            self.get(entity).is_some_and(|e| {
                let reach = e.radius() + radius;
                e.position().distance_squared(center) <= reach * reach
            })
        });
        found
    }

    /// Drop removed and undersized cells, update alive flags and respawn
    /// dead bots.
    pub fn cleanup(&mut self, now: Duration) -> Cleanup {
        let min_radius = self.config.player.min_radius;
        let mut result = Cleanup::default();
        let mut dead_bots = Vec::new();

        for (slot, player) in self.players.iter_mut().enumerate() {
            let before = player.cells.len();
            player
                .cells
                .retain(|cell| !cell.is_removed && cell.radius() >= min_radius);
            result.removed_cells += before - player.cells.len();

            let was_alive = player.alive;
            player.alive = !player.cells.is_empty();
            if was_alive && !player.alive {
                result.deaths.push(player.id);
            }
            if !player.alive && player.is_bot() {
                dead_bots.push(slot);
            }
        }

        for slot in dead_bots {
            self.respawn_slot(slot, now);
            result.respawned.push(self.players[slot].id);
        }

        self.index_dirty = true;
        result
    }

    /// Top `limit` alive players by score, highest first.
    pub fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = self
            .players
            .iter()
            .filter(|p| p.alive)
            .map(|p| LeaderboardEntry {
                id: p.id,
                name: p.name.clone(),
                score: p.score(),
            })
            .collect();
        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        entries.truncate(limit);
        entries
    }

    pub fn counts(&self) -> Counts {
        Counts {
            players: self.players.len(),
            alive_players: self.players.iter().filter(|p| p.alive).count(),
            cells: self.players.iter().map(|p| p.cells.len()).sum(),
            food: self.foods.len(),
            viruses: self.viruses.len(),
        }
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("counts", &self.counts())
            .field("index", &self.index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        let mut config = Config::default();
        config.simulation.seed = Some(11);
        config.food.target_count = 50;
        config.virus.count = 4;
        World::new(config).unwrap()
    }

    #[test]
    fn test_populate_counts() {
        let mut world = world();
        world.populate();
        let counts = world.counts();
        assert_eq!(counts.food, 50);
        assert_eq!(counts.viruses, 4);
        for food in world.foods() {
            assert!((3.0..=6.0).contains(&food.radius));
        }
    }

    #[test]
    fn test_spawn_player_rejects_duplicates() {
        let mut world = world();
        let id = PlayerId(1);
        world
            .spawn_player(id, "somebody with a very long name", Color::default(), Controller::Human, Duration::ZERO)
            .unwrap();
        let player = world.player(id).unwrap();
        assert!(player.alive);
        assert_eq!(player.cells.len(), 1);
        assert_eq!(player.cells[0].radius(), 35.0);
        assert_eq!(player.name.chars().count(), 15);
        assert_eq!(player.cells[0].merge_at, Duration::from_millis(6000));

        let again = world.spawn_player(id, "x", Color::default(), Controller::Human, Duration::ZERO);
        assert_eq!(again.err(), Some(WorldError::DuplicatePlayer(1)));
    }

    #[test]
    fn test_remove_player_keeps_slots_consistent() {
        let mut world = world();
        for i in 1..=3 {
            world
                .spawn_player(PlayerId(i), "p", Color::default(), Controller::Human, Duration::ZERO)
                .unwrap();
        }
        assert!(world.remove_player(PlayerId(1)).is_some());
        assert!(world.remove_player(PlayerId(1)).is_none());
        assert_eq!(world.player(PlayerId(3)).unwrap().id, PlayerId(3));
        assert_eq!(world.players().len(), 2);
    }

    #[test]
    fn test_remove_player_reindexes_shifted_slots() {
        let mut world = world();
        for i in 1..=3 {
            world
                .spawn_player(PlayerId(i), "p", Color::default(), Controller::Human, Duration::ZERO)
                .unwrap();
        }
        world.rebuild_index();
        let last = world.player(PlayerId(3)).unwrap().cells[0].position;

        world.remove_player(PlayerId(1));
        let found = world.query_area(last, 5.0);
        assert!(found.iter().any(|&e| matches!(
            world.get(e),
            Some(Entity::Cell(cell)) if cell.owner == PlayerId(3)
        )));
        assert!(found.iter().all(|&e| world.get(e).is_some()));
    }

    #[test]
    fn test_populate_leaves_index_current() {
        let mut world = world();
        world.populate();
        let food = world.foods()[0].position;
        assert!(world.query_area(food, 1.0).contains(&EntityRef::Food(0)));
    }

    #[test]
    fn test_replenish_is_batched() {
        let mut world = world();
        assert_eq!(world.replenish_food(), 30);
        assert_eq!(world.replenish_food(), 20);
        assert_eq!(world.replenish_food(), 0);
        assert_eq!(world.foods().len(), 50);
    }

    #[test]
    fn test_cleanup_respawns_bots_only() {
        let mut world = world();
        let bot = world.add_bot(Duration::ZERO);
        world
            .spawn_player(PlayerId(5), "human", Color::default(), Controller::Human, Duration::ZERO)
            .unwrap();
        for player in &mut world.players {
            player.cells[0].is_removed = true;
        }

        let now = Duration::from_secs(3);
        let cleanup = world.cleanup(now);
        assert_eq!(cleanup.removed_cells, 2);
        assert_eq!(cleanup.deaths.len(), 2);
        assert_eq!(cleanup.respawned, vec![bot]);

        let bot = world.player(bot).unwrap();
        assert!(bot.alive);
        assert_eq!(bot.cells.len(), 1);
        assert_eq!(bot.cells[0].merge_at, now + Duration::from_millis(6000));
        assert!(!world.player(PlayerId(5)).unwrap().alive);
    }

    #[test]
    fn test_cleanup_drops_undersized_cells() {
        let mut world = world();
        world
            .spawn_player(PlayerId(1), "p", Color::default(), Controller::Human, Duration::ZERO)
            .unwrap();
        world.players[0].cells[0].set_radius(9.5);
        world.cleanup(Duration::ZERO);
        assert!(!world.player(PlayerId(1)).unwrap().alive);
    }

    #[test]
    fn test_query_area_is_exact() {
        let mut world = world();
        world.spawn_food(Food::new(Vec2::new(100.0, 100.0), 5.0, Color::default()));
        world.spawn_food(Food::new(Vec2::new(150.0, 100.0), 5.0, Color::default()));
        world.rebuild_index();

        let found = world.query_area(Vec2::new(100.0, 100.0), 20.0);
        assert_eq!(found, vec![EntityRef::Food(0)]);
    }

    #[test]
    fn test_leaderboard_sorted() {
        let mut world = world();
        for i in 1..=3 {
            world
                .spawn_player(PlayerId(i), "p", Color::default(), Controller::Human, Duration::ZERO)
                .unwrap();
        }
        world.players[1].cells[0].set_radius(80.0);
        world.players[2].cells[0].set_radius(50.0);

        let board = world.leaderboard(2);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].id, PlayerId(2));
        assert_eq!(board[1].id, PlayerId(3));
        assert!((board[0].score - 80.0).abs() < 1e-3);
    }
}
