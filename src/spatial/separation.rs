//! R*-tree index for minimum-separation queries.
//!
//! The post-processor's spacing repair needs "every pair closer than d".
//! An R-tree answers that in O(log n) per node instead of scanning all
//! pairs. The tree is bulk-loaded from a position snapshot once per repair
//! pass and discarded afterwards.

use rstar::{AABB, PointDistance, RTree, RTreeObject};

/// A node position in the separation index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotPoint {
    /// Slot index into the SoA position buffers.
    pub slot: u32,
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl RTreeObject for SlotPoint {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.x, self.y])
    }
}

impl PointDistance for SlotPoint {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let dx = self.x - point[0];
        let dy = self.y - point[1];
        dx * dx + dy * dy
    }
}

/// Spatial index over one snapshot of node positions.
pub struct SeparationIndex {
    tree: RTree<SlotPoint>,
}

impl SeparationIndex {
    /// Bulk-load the index from position buffers. Non-finite entries are
    /// skipped so they can never match a radius query.
    pub fn build(pos_x: &[f32], pos_y: &[f32]) -> Self {
        let points: Vec<_> = pos_x
            .iter()
            .zip(pos_y)
            .enumerate()
            .filter(|(_, (x, y))| x.is_finite() && y.is_finite())
            .map(|(slot, (&x, &y))| SlotPoint {
                slot: slot as u32,
                x,
                y,
            })
            .collect();

        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Slots strictly within `radius` of `(x, y)`, excluding `slot` itself.
    pub fn within_radius(&self, slot: u32, x: f32, y: f32, radius: f32) -> Vec<SlotPoint> {
        self.tree
            .locate_within_distance([x, y], radius * radius)
            .filter(|p| p.slot != slot)
            .copied()
            .collect()
    }

    /// Number of indexed nodes.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// True when no node was indexed.
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
