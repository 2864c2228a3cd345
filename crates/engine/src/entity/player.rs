//! Players and their control state.

use super::body::Body;
use super::color::Color;
use super::player_cell::PlayerCell;
use glam::Vec2;
use std::fmt;

/// Stable player identity, assigned by whoever spawns the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who drives a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Controller {
    /// Driven from outside through the control surface.
    Human,
    /// Driven by the bot heuristic; respawns immediately on death.
    Bot,
}

/// Continuous movement request for a human-controlled player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveIntent {
    /// Every cell steers along the same direction (normalized on use).
    Direction(Vec2),
    /// Every cell steers toward a world point.
    Toward(Vec2),
}

impl MoveIntent {
    /// Unit steering vector for a cell at `from`, or zero when undefined.
    pub fn steering(&self, from: Vec2) -> Vec2 {
        match *self {
            MoveIntent::Direction(direction) => direction.normalize_or_zero(),
            MoveIntent::Toward(point) => (point - from).normalize_or_zero(),
        }
    }
}

/// An identity owning zero or more cells.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: Color,
    pub controller: Controller,
    pub cells: Vec<PlayerCell>,
    pub alive: bool,
    /// Latest movement request (humans only; bots steer per cell).
    pub intent: Option<MoveIntent>,
}

impl Player {
    pub fn new(id: PlayerId, name: String, color: Color, controller: Controller) -> Self {
        Self {
            id,
            name,
            color,
            controller,
            cells: Vec::new(),
            alive: false,
            intent: None,
        }
    }

    #[inline]
    pub fn is_bot(&self) -> bool {
        self.controller == Controller::Bot
    }

    /// Sum of the derived mass of every cell.
    pub fn total_mass(&self) -> f32 {
        self.cells.iter().map(Body::mass).sum()
    }

    /// Radius of a single circle holding the player's total mass.
    pub fn score(&self) -> f32 {
        (self.total_mass() / std::f32::consts::PI).sqrt()
    }

    /// Average position of the player's cells.
    pub fn center(&self) -> Option<Vec2> {
        if self.cells.is_empty() {
            return None;
        }
        let sum: Vec2 = self.cells.iter().map(|c| c.position).sum();
        Some(sum / self.cells.len() as f32)
    }

    /// Steering for the cell at `index`: the player intent when one is set,
    /// otherwise the cell's own per-tick intent. Length is at most 1.
    pub fn steering_for(&self, index: usize) -> Vec2 {
        let cell = &self.cells[index];
        match self.intent {
            Some(intent) => intent.steering(cell.position),
            None => cell.intent.clamp_length_max(1.0),
        }
    }
}
