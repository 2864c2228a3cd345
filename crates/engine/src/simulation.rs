//! The fixed per-tick pipeline.

use crate::ai;
use crate::clock::{Clock, MonotonicClock};
use crate::collision::{self, CollisionStats};
use crate::command::Command;
use crate::config::Config;
use crate::entity::{Color, Controller, MoveIntent, Player, PlayerId};
use crate::error::{ConfigError, WorldError};
use crate::motion;
use crate::world::World;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, trace};

/// Summary of one completed tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u64,
    /// Clock reading the tick ran at.
    pub now: Duration,
    /// Integration step after clamping.
    pub dt: Duration,
    /// Entities created by queued splits and ejects.
    pub commands_applied: usize,
    pub collisions: CollisionStats,
    pub removed_cells: usize,
    /// Players whose last cell was lost this tick.
    pub deaths: Vec<PlayerId>,
    /// Bots that were put back in play this tick.
    pub respawned: Vec<PlayerId>,
}

/// Owns the world, the time source and the pending command queue.
///
/// Everything happens inside [`tick`](Self::tick); the control surface only
/// records intents and queues commands.
pub struct Simulation<C: Clock = MonotonicClock> {
    world: World,
    clock: C,
    last_tick: Duration,
    tick_count: u64,
    commands: VecDeque<Command>,
}

impl Simulation<MonotonicClock> {
    /// A simulation on wall-clock time.
    pub fn with_monotonic_clock(config: Config) -> Result<Self, ConfigError> {
        Self::new(config, MonotonicClock::new())
    }
}

impl<C: Clock> Simulation<C> {
    /// Build an empty world from `config`. Call [`populate`](Self::populate)
    /// to seed food and viruses.
    pub fn new(config: Config, clock: C) -> Result<Self, ConfigError> {
        let world = World::new(config)?;
        let last_tick = clock.now();
        Ok(Self {
            world,
            clock,
            last_tick,
            tick_count: 0,
            commands: VecDeque::new(),
        })
    }

    /// Seed the configured food and viruses, then the configured bots.
    pub fn populate(&mut self) {
        self.world.populate();
        let bots = self.world.config.bots.count;
        self.add_bots(bots);
    }

    /// Rebuild the index if anything changed since the last rebuild, so
    /// queries through [`world`](Self::world) see current handles.
    pub fn refresh_index(&mut self) {
        self.world.refresh_index();
    }

    #[inline]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Direct world access for embedding code and scenario setup. The index
    /// is rebuilt before the next tick reads it, or on
    /// [`refresh_index`](Self::refresh_index).
    pub fn world_mut(&mut self) -> &mut World {
        self.world.mark_index_dirty();
        &mut self.world
    }

    #[inline]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    #[inline]
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    #[inline]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Number of commands waiting for the next tick.
    #[inline]
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Replace a player's movement intent. Unknown players are ignored.
    pub fn set_move_intent(&mut self, id: PlayerId, intent: MoveIntent) {
        match self.world.slot_of(id) {
            Some(slot) => self.world.players[slot].intent = Some(intent),
            None => trace!("Ignoring move intent for unknown player {}", id),
        }
    }

    /// Stop steering a player; its cells coast under drag.
    pub fn clear_move_intent(&mut self, id: PlayerId) {
        if let Some(slot) = self.world.slot_of(id) {
            self.world.players[slot].intent = None;
        }
    }

    /// Queue a split for the next tick.
    pub fn request_split(&mut self, id: PlayerId) {
        self.commands.push_back(Command::Split(id));
    }

    /// Queue a mass ejection for the next tick.
    pub fn request_eject(&mut self, id: PlayerId) {
        self.commands.push_back(Command::Eject(id));
    }

    /// Register a player with one starting cell. The cell is in the index
    /// by the time this returns.
    pub fn spawn_player(
        &mut self,
        id: PlayerId,
        name: &str,
        color: Color,
        controller: Controller,
    ) -> Result<&mut Player, WorldError> {
        let now = self.clock.now();
        self.world.spawn_player(id, name, color, controller, now)?;
        self.world.refresh_index();
        let slot = self.world.slot_of(id).ok_or(WorldError::UnknownPlayer(id.0))?;
        Ok(&mut self.world.players[slot])
    }

    /// Put a player back in play with a single fresh cell.
    pub fn respawn_player(&mut self, id: PlayerId) -> Result<(), WorldError> {
        let now = self.clock.now();
        self.world.respawn_player(id, now)?;
        self.world.refresh_index();
        Ok(())
    }

    pub fn remove_player(&mut self, id: PlayerId) -> Option<Player> {
        self.commands.retain(|command| command.player() != id);
        self.world.remove_player(id)
    }

    /// Add `count` bots and return their ids.
    pub fn add_bots(&mut self, count: usize) -> Vec<PlayerId> {
        let now = self.clock.now();
        let ids: Vec<PlayerId> = (0..count).map(|_| self.world.add_bot(now)).collect();
        self.world.refresh_index();
        ids
    }

    /// Run one tick at the clock's current time.
    pub fn tick(&mut self) -> TickReport {
        let now = self.clock.now();
        let max_dt = self.world.config.physics.max_dt();
        let dt = now.saturating_sub(self.last_tick).min(max_dt);
        self.last_tick = now;
        self.tick_count += 1;

        let mut report = TickReport {
            tick: self.tick_count,
            now,
            dt,
            ..Default::default()
        };

        while let Some(command) = self.commands.pop_front() {
            report.commands_applied += command.apply(&mut self.world, now);
        }

        self.world.refresh_index();
        ai::think(&mut self.world, now);
        motion::integrate(&mut self.world, dt.as_secs_f32());

        self.world.rebuild_index();
        report.collisions = collision::resolve(&mut self.world, now);

        let cleanup = self.world.cleanup(now);
        report.removed_cells = cleanup.removed_cells;
        report.deaths = cleanup.deaths;
        report.respawned = cleanup.respawned;
        self.world.rebuild_index();

        for id in &report.deaths {
            if let Some(player) = self.world.player(*id) {
                debug!("Player {} '{}' lost its last cell", id, player.name);
            }
        }

        let interval = self.world.config.simulation.log_interval_ticks;
        if interval > 0 && self.tick_count % interval == 0 {
            let counts = self.world.counts();
            debug!(
                "Tick {}: {} players ({} alive), {} cells, {} food, {} viruses, last {:?}",
                self.tick_count,
                counts.players,
                counts.alive_players,
                counts.cells,
                counts.food,
                counts.viruses,
                report.collisions
            );
        }

        report
    }
}

impl<C: Clock> std::fmt::Debug for Simulation<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick_count)
            .field("last_tick", &self.last_tick)
            .field("pending_commands", &self.commands.len())
            .field("world", &self.world)
            .finish()
    }
}
