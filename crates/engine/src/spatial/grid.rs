//! Uniform bucket grid for broad-phase queries.

use super::EntityRef;
use crate::entity::Body;
use glam::Vec2;

/// Inclusive range of bucket coordinates covered by a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BucketRange {
    min_col: usize,
    max_col: usize,
    min_row: usize,
    max_row: usize,
}

/// A world-sized grid of fixed square buckets.
///
/// An entity is stored in every bucket its bounding square (center ± radius)
/// touches, so large entities occupy many buckets. Queries return the
/// de-duplicated union of the buckets covering the query square: a superset
/// of the true neighbours that callers narrow with exact distance tests.
/// The grid keeps no state across ticks beyond reused allocations.
pub struct SpatialIndex {
    bucket_size: f32,
    /// Buckets along each axis.
    columns: usize,
    /// Row-major buckets; inner vectors keep their capacity across rebuilds.
    buckets: Vec<Vec<EntityRef>>,
    len: usize,
}

impl SpatialIndex {
    /// Create a grid covering `[0, world_size]²`. Both values must be
    /// positive and finite (checked by [`Config::validate`](crate::Config::validate)).
    pub fn new(world_size: f32, bucket_size: f32) -> Self {
        let columns = (world_size / bucket_size).floor() as usize + 1;
        Self {
            bucket_size,
            columns,
            buckets: vec![Vec::new(); columns * columns],
            len: 0,
        }
    }

    /// Number of insertions since the last clear.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every entry, keeping bucket allocations.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
        self.len = 0;
    }

    /// Insert `entity` into every bucket its bounding square touches.
    pub fn insert(&mut self, entity: EntityRef, body: &impl Body) {
        let range = self.range(body.position(), body.radius());
        for row in range.min_row..=range.max_row {
            let start = row * self.columns;
            for col in range.min_col..=range.max_col {
                self.buckets[start + col].push(entity);
            }
        }
        self.len += 1;
    }

    /// Every entity sharing a bucket with the circle's bounding square.
    pub fn query(&self, center: Vec2, radius: f32) -> Vec<EntityRef> {
        let mut out = Vec::with_capacity(64);
        self.query_into(center, radius, &mut out);
        out
    }

    /// Like [`query`](Self::query), reusing `out` (cleared first).
    pub fn query_into(&self, center: Vec2, radius: f32, out: &mut Vec<EntityRef>) {
        out.clear();
        let range = self.range(center, radius);
        for row in range.min_row..=range.max_row {
            let start = row * self.columns;
            for col in range.min_col..=range.max_col {
                out.extend_from_slice(&self.buckets[start + col]);
            }
        }
        if range.min_row != range.max_row || range.min_col != range.max_col {
            out.sort_unstable();
            out.dedup();
        }
    }

    /// Number of buckets an entity of `radius` at `center` would occupy.
    pub fn footprint(&self, center: Vec2, radius: f32) -> usize {
        let range = self.range(center, radius);
        (range.max_col - range.min_col + 1) * (range.max_row - range.min_row + 1)
    }

    #[inline]
    fn axis(&self, v: f32) -> usize {
        let last = self.columns - 1;
        let idx = (v / self.bucket_size).floor();
        if idx <= 0.0 {
            0
        } else {
            (idx as usize).min(last)
        }
    }

    #[inline]
    fn range(&self, center: Vec2, radius: f32) -> BucketRange {
        let radius = radius.max(0.0);
        BucketRange {
            min_col: self.axis(center.x - radius),
            max_col: self.axis(center.x + radius),
            min_row: self.axis(center.y - radius),
            max_row: self.axis(center.y + radius),
        }
    }
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("bucket_size", &self.bucket_size)
            .field("columns", &self.columns)
            .field("entries", &self.len)
            .finish()
    }
}
