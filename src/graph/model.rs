//! Input data model for the layout engine.
//!
//! These types mirror the wire format produced by the knowledge-graph
//! explorer: a flat node list and an edge list whose endpoints may be either
//! raw id strings or inlined node objects. Unknown fields are ignored so the
//! engine accepts the full statement payloads without caring about them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A 2D position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// True when both coordinates are finite.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// The sole externally visible artifact: node id → position.
pub type PositionMap = HashMap<String, Point>;

/// A graph node as received from the caller.
///
/// Only `id` matters to the engine; an optional pre-existing position is
/// reused as the force-simulation seed when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Unique identifier within the graph.
    pub id: String,
    /// Optional carried-over position from a previous layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
}

impl GraphNode {
    /// Create a node with no carried-over position.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            position: None,
        }
    }
}

/// An edge endpoint: either a bare id string or an object carrying an `id`.
///
/// The explorer emits both forms depending on which API produced the
/// statement, so the engine must accept both.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EdgeEndpoint {
    /// Raw node id.
    Id(String),
    /// Inlined node object; everything but the id is ignored.
    Node {
        id: String,
    },
}

impl EdgeEndpoint {
    /// The referenced node id, whichever form was used.
    pub fn id(&self) -> &str {
        match self {
            EdgeEndpoint::Id(id) => id,
            EdgeEndpoint::Node { id } => id,
        }
    }
}

impl From<&str> for EdgeEndpoint {
    fn from(id: &str) -> Self {
        EdgeEndpoint::Id(id.to_owned())
    }
}

/// A graph edge as received from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Edge identifier; informational only.
    #[serde(default)]
    pub id: String,
    /// Source endpoint.
    pub source: EdgeEndpoint,
    /// Target endpoint.
    pub target: EdgeEndpoint,
}

impl GraphEdge {
    /// Create an edge between two node ids.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            source: EdgeEndpoint::Id(source.into()),
            target: EdgeEndpoint::Id(target.into()),
        }
    }
}

/// The input graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphData {
    /// Node list. May be empty, in which case every layout yields `{}`.
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    /// Edge list. Edges referencing unknown node ids are dropped silently.
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    /// Target box width; defaults to 800 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// Target box height; defaults to 600 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
}

/// Default target box width.
pub const DEFAULT_WIDTH: f32 = 800.0;

/// Default target box height.
pub const DEFAULT_HEIGHT: f32 = 600.0;

impl GraphData {
    /// Target box width, falling back to the default.
    pub fn width(&self) -> f32 {
        match self.width {
            Some(w) if w.is_finite() && w > 0.0 => w,
            _ => DEFAULT_WIDTH,
        }
    }

    /// Target box height, falling back to the default.
    pub fn height(&self) -> f32 {
        match self.height {
            Some(h) if h.is_finite() && h > 0.0 => h,
            _ => DEFAULT_HEIGHT,
        }
    }
}
