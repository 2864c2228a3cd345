//! Cell arena simulation core.
//!
//! A [`Simulation`] owns a [`World`] of food, viruses and player cells and
//! advances it one tick at a time: queued commands, bot steering, motion,
//! collision resolution and cleanup, in that order.

pub mod ai;
pub mod clock;
pub mod collision;
pub mod command;
pub mod config;
pub mod entity;
pub mod error;
pub mod motion;
pub mod simulation;
pub mod spatial;
pub mod world;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use collision::CollisionStats;
pub use command::Command;
pub use config::Config;
pub use entity::{Body, Color, Controller, Food, MoveIntent, Player, PlayerCell, PlayerId, Virus};
pub use error::{ConfigError, WorldError};
pub use simulation::{Simulation, TickReport};
pub use spatial::{EntityRef, SpatialIndex};
pub use world::{Counts, Entity, LeaderboardEntry, World};
