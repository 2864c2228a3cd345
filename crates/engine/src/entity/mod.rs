//! Simulation entities.
//!
//! Food, viruses and player cells are distinct types sharing the [`Body`]
//! capability (position and radius, with mass derived from the radius).

mod body;
mod color;
mod food;
mod player;
mod player_cell;
mod virus;

pub use body::{Body, absorbed_radius, clamp_to_world, mass_of};
pub use color::Color;
pub use food::Food;
pub use player::{Controller, MoveIntent, Player, PlayerId};
pub use player_cell::PlayerCell;
pub use virus::{VIRUS_COLOR, Virus};
