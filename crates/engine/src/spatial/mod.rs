//! Spatial indexing.
//!
//! Uniform bucket grid rebuilt from scratch every tick.

mod grid;

pub use grid::SpatialIndex;

/// A handle to an entity in the [`World`](crate::World) collections.
///
/// Handles are positional. A rebuild makes them valid; they go stale when a
/// collection shrinks or reorders: eaten food is filtered in the middle of
/// collision resolution, cells are dropped by cleanup, and removing a player
/// shifts every later player slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityRef {
    Food(usize),
    Virus(usize),
    Cell { player: usize, cell: usize },
}
