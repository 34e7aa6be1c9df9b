//! Spiral fallback for very large graphs.
//!
//! Past the very-large threshold, even the grid-bounded force simulation is
//! too expensive, so this path does near-constant work per node: seed every
//! node on an expanding spiral, run a fixed number of attraction-only
//! refinement passes (no repulsion at this scale, an explicit accuracy
//! trade), then rescale the result into the target box. The async driver
//! yields between passes so the host keeps serving other requests.

use std::f32::consts::TAU;

use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::LayoutError;
use crate::graph::SimGraph;
use crate::layout::selector::LargeGraphConfig;

/// Initial spiral radius.
const INITIAL_RADIUS: f32 = 150.0;

/// Radius increment per completed layer.
const RADIUS_STEP: f32 = 100.0;

/// Layer growth factor per completed layer.
const LAYER_GROWTH: f32 = 1.5;

/// Margin kept around the rescaled layout, as a fraction of the box.
const RESCALE_MARGIN: f32 = 0.1;

/// Run the whole fallback synchronously.
pub fn run(
    sim: &mut SimGraph,
    config: &LargeGraphConfig,
    cancel: &CancelToken,
) -> Result<(), LayoutError> {
    seed_spiral(sim, config);
    let edges: Vec<(u32, u32)> = sim.edges().to_vec();
    for pass in 0..config.refinement_passes {
        if cancel.is_cancelled() {
            debug!(pass, "large-graph refinement cancelled");
            rescale(sim, config)?;
            return Err(LayoutError::Cancelled);
        }
        refine_pass(sim, &edges, config);
    }
    rescale(sim, config)
}

/// Run the fallback, yielding to the scheduler between refinement passes.
pub async fn run_async(
    sim: &mut SimGraph,
    config: &LargeGraphConfig,
    cancel: &CancelToken,
) -> Result<(), LayoutError> {
    seed_spiral(sim, config);
    let edges: Vec<(u32, u32)> = sim.edges().to_vec();
    for pass in 0..config.refinement_passes {
        if cancel.is_cancelled() {
            debug!(pass, "large-graph refinement cancelled");
            rescale(sim, config)?;
            return Err(LayoutError::Cancelled);
        }
        refine_pass(sim, &edges, config);
        tokio::task::yield_now().await;
    }
    rescale(sim, config)
}

/// Seed positions on an expanding spiral: the angle sweeps within a layer,
/// and each filled layer grows 1.5× larger and 100 units further out.
fn seed_spiral(sim: &mut SimGraph, config: &LargeGraphConfig) {
    let n = sim.node_count();
    if n == 0 {
        return;
    }

    let cx = config.width / 2.0;
    let cy = config.height / 2.0;

    let mut layer_size = (((n as f32).sqrt() / 4.0).ceil() as usize).max(1);
    let mut placed_in_layer = 0usize;
    let mut radius = INITIAL_RADIUS;

    for slot in 0..n {
        if placed_in_layer >= layer_size {
            layer_size = ((layer_size as f32 * LAYER_GROWTH).ceil() as usize).max(layer_size + 1);
            radius += RADIUS_STEP;
            placed_in_layer = 0;
        }

        let angle = TAU * placed_in_layer as f32 / layer_size as f32;
        sim.set_position(slot, cx + radius * angle.cos(), cy + radius * angle.sin());
        placed_in_layer += 1;
    }
}

/// Attraction-only correction: pull the endpoints of over-stretched edges a
/// small fixed fraction closer.
fn refine_pass(sim: &mut SimGraph, edges: &[(u32, u32)], config: &LargeGraphConfig) {
    for &(source, target) in edges {
        let (s, t) = (source as usize, target as usize);
        let dx = sim.pos_x[t] - sim.pos_x[s];
        let dy = sim.pos_y[t] - sim.pos_y[s];
        let distance = (dx * dx + dy * dy).sqrt();
        if distance <= config.attraction_threshold {
            continue;
        }

        let move_x = dx * config.attraction_fraction;
        let move_y = dy * config.attraction_fraction;
        sim.pos_x[s] += move_x;
        sim.pos_y[s] += move_y;
        sim.pos_x[t] -= move_x;
        sim.pos_y[t] -= move_y;
    }
}

/// Uniform scale + translate so the layout fills the box with a 10% margin.
fn rescale(sim: &mut SimGraph, config: &LargeGraphConfig) -> Result<(), LayoutError> {
    let n = sim.node_count();
    if n == 0 {
        return Ok(());
    }

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for slot in 0..n {
        min_x = min_x.min(sim.pos_x[slot]);
        min_y = min_y.min(sim.pos_y[slot]);
        max_x = max_x.max(sim.pos_x[slot]);
        max_y = max_y.max(sim.pos_y[slot]);
    }

    if !min_x.is_finite() || !min_y.is_finite() || !max_x.is_finite() || !max_y.is_finite() {
        return Err(LayoutError::NonFiniteGeometry { stage: "rescale" });
    }

    // Zero-extent boxes scale as if they were one unit wide.
    let extent_x = if max_x > min_x { max_x - min_x } else { 1.0 };
    let extent_y = if max_y > min_y { max_y - min_y } else { 1.0 };
    let scale = (config.width / extent_x).min(config.height / extent_y) * (1.0 - 2.0 * RESCALE_MARGIN);

    for slot in 0..n {
        sim.pos_x[slot] = (sim.pos_x[slot] - min_x) * scale + config.width * RESCALE_MARGIN;
        sim.pos_y[slot] = (sim.pos_y[slot] - min_y) * scale + config.height * RESCALE_MARGIN;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphData, GraphEdge, GraphNode};
    use crate::layout::selector::{Algorithm, VERY_LARGE_THRESHOLD, select};

    fn fallback_config(n: usize) -> LargeGraphConfig {
        match select("balanced", n).algorithm {
            Algorithm::LargeGraph(config) => config,
            other => panic!("expected fallback config, got {other:?}"),
        }
    }

    fn sim_chain(n: usize) -> SimGraph {
        SimGraph::from_graph_data(&GraphData {
            nodes: (0..n).map(|i| GraphNode::new(format!("n{i}"))).collect(),
            edges: (1..n)
                .map(|i| GraphEdge::new(format!("n{}", i - 1), format!("n{i}")))
                .collect(),
            width: None,
            height: None,
        })
    }

    #[test]
    fn test_spiral_layers_grow_outward() {
        let config = fallback_config(VERY_LARGE_THRESHOLD + 1);
        let mut sim = sim_chain(100);
        seed_spiral(&mut sim, &config);

        let cx = config.width / 2.0;
        let cy = config.height / 2.0;
        let radius = |slot: usize| {
            ((sim.pos_x[slot] - cx).powi(2) + (sim.pos_y[slot] - cy).powi(2)).sqrt()
        };

        // First node sits on the innermost layer, last node well outside it.
        assert!((radius(0) - INITIAL_RADIUS).abs() < 1.0);
        assert!(radius(99) > radius(0) + RADIUS_STEP);

        // Radii are non-decreasing along the placement order.
        for slot in 1..100 {
            assert!(radius(slot) + 0.5 >= radius(slot - 1), "slot {slot}");
        }
    }

    #[test]
    fn test_refine_contracts_only_stretched_edges() {
        let config = fallback_config(6000);
        let mut sim = sim_chain(3);

        // Edge 0-1 is stretched past the threshold, edge 1-2 is short.
        sim.set_position(0, 0.0, 0.0);
        sim.set_position(1, 1000.0, 0.0);
        sim.set_position(2, 1100.0, 0.0);

        let edges: Vec<(u32, u32)> = sim.edges().to_vec();
        refine_pass(&mut sim, &edges, &config);

        let long = sim.pos_x[1] - sim.pos_x[0];
        assert!(long < 1000.0, "stretched edge should contract, got {long}");

        // The short edge applies no correction: node 2 does not move.
        assert_eq!(sim.pos_x[2], 1100.0);
    }

    #[test]
    fn test_rescale_fits_box_with_margin() {
        let config = fallback_config(6000);
        let mut sim = sim_chain(50);
        seed_spiral(&mut sim, &config);
        rescale(&mut sim, &config).unwrap();

        for slot in 0..50 {
            assert!(sim.pos_x[slot] >= 0.0 && sim.pos_x[slot] <= config.width);
            assert!(sim.pos_y[slot] >= 0.0 && sim.pos_y[slot] <= config.height);
        }
    }

    #[test]
    fn test_rescale_handles_coincident_nodes() {
        let config = fallback_config(6000);
        let mut sim = sim_chain(3);
        for slot in 0..3 {
            sim.set_position(slot, 500.0, 500.0);
        }

        rescale(&mut sim, &config).unwrap();
        for slot in 0..3 {
            assert!(sim.pos_x[slot].is_finite());
            assert!(sim.pos_y[slot].is_finite());
        }
    }

    #[test]
    fn test_full_run_finite() {
        let n = 6000;
        let config = fallback_config(n);
        let mut sim = sim_chain(n);
        run(&mut sim, &config, &CancelToken::new()).unwrap();

        for slot in 0..n {
            assert!(sim.pos_x[slot].is_finite(), "slot {slot}");
            assert!(sim.pos_y[slot].is_finite(), "slot {slot}");
        }
    }

    #[tokio::test]
    async fn test_async_run_matches_sync() {
        let config = fallback_config(6000);

        let mut sync_sim = sim_chain(500);
        run(&mut sync_sim, &config, &CancelToken::new()).unwrap();

        let mut async_sim = sim_chain(500);
        run_async(&mut async_sim, &config, &CancelToken::new())
            .await
            .unwrap();

        assert_eq!(sync_sim.pos_x, async_sim.pos_x);
        assert_eq!(sync_sim.pos_y, async_sim.pos_y);
    }

    #[test]
    fn test_cancelled_run_still_rescales() {
        let config = fallback_config(6000);
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut sim = sim_chain(100);
        let result = run(&mut sim, &config, &cancel);
        assert!(matches!(result, Err(LayoutError::Cancelled)));

        // Positions computed so far are still normalized and finite.
        for slot in 0..100 {
            assert!(sim.pos_x[slot].is_finite());
            assert!(sim.pos_x[slot] >= 0.0 && sim.pos_x[slot] <= config.width);
        }
    }
}
