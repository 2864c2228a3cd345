//! Engine error types.

use thiserror::Error;

/// Errors raised while validating a [`Config`](crate::Config).
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("world size must be positive and finite, got {0}")]
    InvalidWorldSize(f32),

    #[error("spatial bucket size must be positive and finite, got {0}")]
    InvalidBucketSize(f32),

    #[error("{field}: minimum {min} is greater than maximum {max}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },

    #[error("{field}: absorb factor {value} must lie in [0, 1]")]
    AbsorbFactor { field: &'static str, value: f32 },

    #[error("player.max_cells must be at least 1")]
    NoCellCapacity,

    #[error("collision.eat_ratio must be greater than 1, got {0}")]
    EatRatio(f32),
}

/// Errors raised by lifecycle operations on the world.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("player {0} already exists")]
    DuplicatePlayer(u32),

    #[error("player {0} not found")]
    UnknownPlayer(u32),
}
