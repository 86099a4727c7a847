//! # Broad-Phase Collision
//!
//! Sort-and-sweep on the x axis with y/z rejection. Boxes are closed
//! intervals, so boxes that share only a face are reported.
//!
//! Output is a canonical pair list: `first < second`, sorted, each unordered
//! pair at most once. Detection reads the boxes it is given and nothing else.

use strata_shared::Aabb;

/// Two overlapping boxes, as indices into the slice passed to
/// [`CollisionBroadphase::detect`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    /// Smaller index.
    pub first: usize,
    /// Larger index.
    pub second: usize,
}

impl CollisionPair {
    /// Builds the canonical pair for two distinct indices.
    #[must_use]
    pub fn new(a: usize, b: usize) -> Self {
        if a < b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }
}

/// Reusable sweep state.
#[derive(Debug, Default)]
pub struct CollisionBroadphase {
    order: Vec<usize>,
    active: Vec<usize>,
}

impl CollisionBroadphase {
    /// Creates an empty broad-phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every overlapping pair among `boxes`.
    pub fn detect(&mut self, boxes: &[Aabb]) -> Vec<CollisionPair> {
        let mut pairs = Vec::new();
        if boxes.len() < 2 {
            return pairs;
        }

        self.order.clear();
        self.order.extend(0..boxes.len());
        self.order
            .sort_by(|&a, &b| boxes[a].base.x.total_cmp(&boxes[b].base.x));

        self.active.clear();
        for &i in &self.order {
            let current = &boxes[i];
            let min_x = current.base.x;
            // Closed intervals: an active box ending exactly at min_x still counts.
            self.active.retain(|&j| boxes[j].max().x >= min_x);

            for &j in &self.active {
                if current.intersects(&boxes[j]) {
                    pairs.push(CollisionPair::new(i, j));
                }
            }
            self.active.push(i);
        }

        pairs.sort_unstable();
        pairs
    }
}
