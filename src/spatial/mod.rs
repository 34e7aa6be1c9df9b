//! Spatial partitioning for the layout pipeline.
//!
//! Two indexes with different jobs: a throwaway bucket grid that bounds the
//! force simulator's repulsion pass, and an R*-tree used by the
//! post-processor to find node pairs that violate minimum spacing.

mod grid;
mod separation;

pub use grid::SpatialGrid;
pub use separation::SeparationIndex;
