//! Deterministic 2D layout engine for biological knowledge graphs.
//!
//! Takes a node/edge list plus a layout name and produces an absolute
//! position for every node. Same input, same seed, same output.
//!
//! # Architecture
//!
//! - `graph`: wire-format types and the simulation graph (petgraph
//!   StableGraph with structure-of-arrays position buffers)
//! - `spatial`: bucket grid for repulsion, R-tree for spacing repair
//! - `layout`: selector, force simulation, closed-form layouts, the
//!   large-graph spiral fallback, and output normalization
//!
//! The entry points never panic toward the caller and always return a map
//! covering exactly the surviving node ids. Cancellation through a
//! [`CancelToken`] yields the best positions computed so far.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

pub mod cancel;
pub mod error;
pub mod graph;
pub mod layout;
pub mod spatial;

pub use cancel::CancelToken;
pub use error::LayoutError;
pub use graph::{
    EdgeEndpoint, GraphData, GraphEdge, GraphNode, Point, PositionMap, DEFAULT_HEIGHT,
    DEFAULT_WIDTH,
};
pub use layout::{LayoutFamily, VERY_LARGE_THRESHOLD};

use graph::SimGraph;
use layout::{deterministic, force, large, postprocess, selector, Algorithm, PostProcessConfig};

/// Seed used when the request does not carry one.
pub const DEFAULT_SEED: u64 = 42;

/// Default padding kept inside the viewport, in layout units.
pub const DEFAULT_PADDING: f32 = 20.0;

/// A layout request as it arrives from a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRequest {
    /// Requested layout family name. Unknown names fall back to balanced.
    #[serde(default, alias = "layoutName")]
    pub layout: String,
    /// Minimum pairwise node distance to enforce after layout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_separation: Option<f32>,
    /// Viewport padding override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding: Option<f32>,
    /// Seed for initial placement. Reruns with the same seed reproduce the
    /// layout exactly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl LayoutRequest {
    pub fn new(layout: impl Into<String>) -> Self {
        Self {
            layout: layout.into(),
            min_separation: None,
            padding: None,
            seed: None,
        }
    }
}

impl Default for LayoutRequest {
    fn default() -> Self {
        Self::new("balanced")
    }
}

/// Compute positions for every node in `data`.
///
/// Never panics toward the caller: internal failures and contained panics
/// are logged and answered with an empty map, which the caller treats as
/// "no layout available".
pub fn compute_layout(data: &GraphData, request: &LayoutRequest) -> PositionMap {
    compute_layout_with_cancel(data, request, &CancelToken::new())
}

/// [`compute_layout`] with cooperative cancellation.
///
/// A cancelled run returns the positions computed up to the cancellation
/// point, normalized like a completed run.
pub fn compute_layout_with_cancel(
    data: &GraphData,
    request: &LayoutRequest,
    cancel: &CancelToken,
) -> PositionMap {
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| run_pipeline(data, request, cancel)));
    match result {
        Ok(positions) => positions,
        Err(_) => {
            error!(layout = %request.layout, "layout computation panicked");
            PositionMap::new()
        }
    }
}

/// Async variant that yields to the executor between refinement passes of
/// the large-graph fallback. Everything else runs inline.
pub async fn compute_layout_async(
    data: &GraphData,
    request: &LayoutRequest,
    cancel: &CancelToken,
) -> PositionMap {
    let result = AssertUnwindSafe(run_pipeline_async(data, request, cancel))
        .catch_unwind()
        .await;
    match result {
        Ok(positions) => positions,
        Err(_) => {
            error!(layout = %request.layout, "layout computation panicked");
            PositionMap::new()
        }
    }
}

fn run_pipeline(data: &GraphData, request: &LayoutRequest, cancel: &CancelToken) -> PositionMap {
    let mut sim = SimGraph::from_graph_data(data);
    let selection = selector::select(&request.layout, sim.node_count());
    let width = data.width();
    let height = data.height();

    info!(
        layout = selection.family.as_str(),
        nodes = sim.node_count(),
        edges = sim.edge_count(),
        "computing layout"
    );

    let outcome = match &selection.algorithm {
        Algorithm::Force(config) => {
            force::run(&mut sim, config, request.seed.unwrap_or(DEFAULT_SEED), cancel)
                .map(|()| Stage::Raw)
        }
        Algorithm::LargeGraph(config) => large::run(&mut sim, config, cancel).map(|()| Stage::Raw),
        _ => {
            run_deterministic(&mut sim, &selection.algorithm, width, height);
            Ok(Stage::InBox)
        }
    };

    finish(sim, outcome, request, width, height)
}

async fn run_pipeline_async(
    data: &GraphData,
    request: &LayoutRequest,
    cancel: &CancelToken,
) -> PositionMap {
    let mut sim = SimGraph::from_graph_data(data);
    let selection = selector::select(&request.layout, sim.node_count());
    let width = data.width();
    let height = data.height();

    info!(
        layout = selection.family.as_str(),
        nodes = sim.node_count(),
        edges = sim.edge_count(),
        "computing layout (async)"
    );

    let outcome = match &selection.algorithm {
        Algorithm::Force(config) => {
            force::run(&mut sim, config, request.seed.unwrap_or(DEFAULT_SEED), cancel)
                .map(|()| Stage::Raw)
        }
        Algorithm::LargeGraph(config) => large::run_async(&mut sim, config, cancel)
            .await
            .map(|()| Stage::Raw),
        _ => {
            run_deterministic(&mut sim, &selection.algorithm, width, height);
            Ok(Stage::InBox)
        }
    };

    finish(sim, outcome, request, width, height)
}

/// Which coordinate space the algorithm left its positions in.
enum Stage {
    /// Simulation space; needs fitting into the viewport.
    Raw,
    /// Already placed inside the viewport.
    InBox,
}

fn run_deterministic(sim: &mut SimGraph, algorithm: &Algorithm, width: f32, height: f32) {
    match algorithm {
        Algorithm::Circular => deterministic::circular_layout(sim, width, height),
        Algorithm::Grid => deterministic::grid_layout(sim, width, height),
        Algorithm::Concentric => deterministic::concentric_layout(sim, width, height),
        Algorithm::Tree => deterministic::tree_layout(sim, width, height),
        Algorithm::Force(_) | Algorithm::LargeGraph(_) => unreachable!("handled by the caller"),
    }
}

fn finish(
    mut sim: SimGraph,
    outcome: Result<Stage, LayoutError>,
    request: &LayoutRequest,
    width: f32,
    height: f32,
) -> PositionMap {
    let stage = match outcome {
        Ok(stage) => stage,
        Err(LayoutError::Cancelled) => {
            debug!("returning partial layout after cancellation");
            Stage::Raw
        }
        Err(err) => {
            error!(error = %err, "layout failed");
            return PositionMap::new();
        }
    };

    let normalized = match stage {
        Stage::Raw => {
            let config = PostProcessConfig {
                width,
                height,
                padding: request.padding.unwrap_or(DEFAULT_PADDING),
                min_separation: request.min_separation,
            };
            postprocess::normalize(&mut sim, &config)
        }
        Stage::InBox => {
            if let Some(min_separation) = request.min_separation {
                postprocess::enforce_min_separation(&mut sim, min_separation);
            }
            Ok(())
        }
    };

    if let Err(err) = normalized {
        error!(error = %err, "normalization failed");
        return PositionMap::new();
    }

    sim.into_positions(Point::new(width / 2.0, height / 2.0))
}
