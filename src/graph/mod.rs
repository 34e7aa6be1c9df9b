//! Graph data structures and operations.
//!
//! This module provides the caller-facing input model (serde types matching
//! the explorer's wire format) and the per-invocation simulation graph built
//! on petgraph's StableGraph with SoA position/velocity buffers.

mod model;
mod sim;

pub use model::{
    DEFAULT_HEIGHT, DEFAULT_WIDTH, EdgeEndpoint, GraphData, GraphEdge, GraphNode, Point,
    PositionMap,
};
pub use sim::SimGraph;
