//! Fruchterman-Reingold style force simulation, the "balanced" family.
//!
//! Repulsion is bounded by a bucket grid (same + 8 neighboring cells, hard
//! distance cutoff at 3·k) so the per-iteration cost stays near O(n) instead
//! of O(n²). The trade-off is long-range accuracy: distant clusters stop
//! pushing each other apart, which the final aeration expansion compensates
//! for by scaling every node away from the centroid.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::cancel::CancelToken;
use crate::error::LayoutError;
use crate::graph::SimGraph;
use crate::layout::selector::LayoutConfig;
use crate::spatial::SpatialGrid;

/// Post-simulation expansion from the centroid, and the extra push applied
/// to every repulsive force.
pub const AERATION_FACTOR: f32 = 1.5;

/// The bucket grid is rebuilt every this many iterations; in between it goes
/// slightly stale, which is acceptable given the displacement cap.
const GRID_REBUILD_INTERVAL: u32 = 5;

/// Cancellation is polled every this many iterations.
const CANCEL_CHECK_INTERVAL: u32 = 10;

/// Repulsion cutoff in multiples of the ideal distance.
const REPULSION_CUTOFF_FACTOR: f32 = 3.0;

/// Damping on edge attraction, from production tuning.
const ATTRACTION_DAMPING: f32 = 0.8;

/// Damping on center gravity, from production tuning.
const GRAVITY_DAMPING: f32 = 0.8;

/// Above this node count the simulation stops at half the configured
/// iteration budget. A performance ceiling, not a convergence criterion.
const EARLY_STOP_NODE_COUNT: usize = 1000;

/// Run the force simulation, writing final positions into `sim`.
///
/// Positions already present in the input are reused as seeds; everything
/// else is seeded from `seed` so reruns are reproducible. On cancellation
/// the positions computed so far are left in `sim` and `Err(Cancelled)` is
/// returned for the caller to decide what to do with them.
pub fn run(
    sim: &mut SimGraph,
    config: &LayoutConfig,
    seed: u64,
    cancel: &CancelToken,
) -> Result<(), LayoutError> {
    let n = sim.node_count();
    let cx = config.width / 2.0;
    let cy = config.height / 2.0;

    if n == 0 {
        return Ok(());
    }
    if n == 1 {
        sim.set_position(0, cx, cy);
        return Ok(());
    }

    seed_positions(sim, config, seed);

    let k = config.ideal_distance.max(1.0);
    let cutoff = k * REPULSION_CUTOFF_FACTOR;
    let cell_size = config.width.max(config.height) / 10.0;
    let mut temperature = config.initial_temperature * config.width.max(config.height);
    let mut grid = SpatialGrid::build(&sim.pos_x, &sim.pos_y, cell_size);

    for iteration in 0..config.iterations {
        if iteration % CANCEL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            debug!(iteration, "force simulation cancelled");
            return Err(LayoutError::Cancelled);
        }
        if iteration > 0 && iteration % GRID_REBUILD_INTERVAL == 0 {
            grid = SpatialGrid::build(&sim.pos_x, &sim.pos_y, cell_size);
        }

        // Repulsion against grid neighbors, plus gravity toward the center.
        for slot in 0..n {
            let x = sim.pos_x[slot];
            let y = sim.pos_y[slot];
            let mut fx = 0.0f32;
            let mut fy = 0.0f32;

            let pos_x = &sim.pos_x;
            let pos_y = &sim.pos_y;
            grid.visit_neighborhood(x, y, |other| {
                let other = other as usize;
                if other == slot {
                    return;
                }
                let dx = x - pos_x[other];
                let dy = y - pos_y[other];
                let mut distance = (dx * dx + dy * dy).sqrt();
                if distance == 0.0 {
                    distance = 1.0;
                }
                if distance > cutoff {
                    return;
                }
                let force = k * k / distance * AERATION_FACTOR;
                fx += dx / distance * force;
                fy += dy / distance * force;
            });

            fx -= (x - cx) * config.gravity * GRAVITY_DAMPING;
            fy -= (y - cy) * config.gravity * GRAVITY_DAMPING;

            sim.vel_x[slot] += fx;
            sim.vel_y[slot] += fy;
        }

        // Attraction along edges, proportional to how stretched they are.
        for edge_idx in 0..sim.edges().len() {
            let (source, target) = sim.edges()[edge_idx];
            let (s, t) = (source as usize, target as usize);
            let dx = sim.pos_x[t] - sim.pos_x[s];
            let dy = sim.pos_y[t] - sim.pos_y[s];
            let mut distance = (dx * dx + dy * dy).sqrt();
            if distance == 0.0 {
                distance = 1.0;
            }

            let force = distance / k * ATTRACTION_DAMPING;
            let fx = dx / distance * force;
            let fy = dy / distance * force;

            sim.vel_x[s] += fx;
            sim.vel_y[s] += fy;
            sim.vel_x[t] -= fx;
            sim.vel_y[t] -= fy;
        }

        // Integrate with the temperature cap, then reset accumulators.
        for slot in 0..n {
            let vx = sim.vel_x[slot];
            let vy = sim.vel_y[slot];
            let displacement = (vx * vx + vy * vy).sqrt();
            if displacement > 0.0 {
                let limited = displacement.min(temperature);
                let x = sim.pos_x[slot] + vx / displacement * limited;
                let y = sim.pos_y[slot] + vy / displacement * limited;
                sim.pos_x[slot] = x.clamp(-config.width * 0.2, config.width * 1.2);
                sim.pos_y[slot] = y.clamp(-config.height * 0.2, config.height * 1.2);
            }
            sim.vel_x[slot] = 0.0;
            sim.vel_y[slot] = 0.0;
        }

        temperature *= config.cooling_factor.max(0.97);

        if n > EARLY_STOP_NODE_COUNT && iteration >= config.iterations / 2 {
            debug!(iteration, n, "early stop for large graph");
            break;
        }
    }

    apply_aeration(sim);
    Ok(())
}

/// Seed each node inside the central 80% of the box, preferring carried-over
/// positions from the input.
fn seed_positions(sim: &mut SimGraph, config: &LayoutConfig, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    for slot in 0..sim.node_count() {
        if let Some(p) = sim.seed_position(slot) {
            sim.set_position(slot, p.x, p.y);
        } else {
            let x = rng.gen_range(0.1f32..0.9f32) * config.width;
            let y = rng.gen_range(0.1f32..0.9f32) * config.height;
            sim.set_position(slot, x, y);
        }
    }
}

/// Scale every node's offset from the centroid to counteract the clustering
/// left behind by the repulsion cutoff.
fn apply_aeration(sim: &mut SimGraph) {
    let n = sim.node_count();
    if n == 0 {
        return;
    }

    let centroid_x: f32 = sim.pos_x.iter().sum::<f32>() / n as f32;
    let centroid_y: f32 = sim.pos_y.iter().sum::<f32>() / n as f32;

    for slot in 0..n {
        let dx = sim.pos_x[slot] - centroid_x;
        let dy = sim.pos_y[slot] - centroid_y;
        sim.pos_x[slot] = centroid_x + dx * AERATION_FACTOR;
        sim.pos_y[slot] = centroid_y + dy * AERATION_FACTOR;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphData, GraphEdge, GraphNode, Point};
    use crate::layout::selector::{Algorithm, select};

    fn balanced_config(n: usize) -> LayoutConfig {
        match select("balanced", n).algorithm {
            Algorithm::Force(config) => config,
            other => panic!("expected force config, got {other:?}"),
        }
    }

    fn sim_with(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> SimGraph {
        SimGraph::from_graph_data(&GraphData {
            nodes,
            edges,
            width: None,
            height: None,
        })
    }

    fn sim_n(n: usize) -> SimGraph {
        sim_with((0..n).map(|i| GraphNode::new(format!("n{i}"))).collect(), vec![])
    }

    #[test]
    fn test_trivial_sizes() {
        let cancel = CancelToken::new();

        let mut empty = sim_n(0);
        run(&mut empty, &balanced_config(0), 1, &cancel).unwrap();

        let mut single = sim_n(1);
        let config = balanced_config(1);
        run(&mut single, &config, 1, &cancel).unwrap();
        assert_eq!(single.pos_x[0], config.width / 2.0);
        assert_eq!(single.pos_y[0], config.height / 2.0);
    }

    #[test]
    fn test_output_finite_and_total() {
        let n = 50;
        let mut sim = sim_with(
            (0..n).map(|i| GraphNode::new(format!("n{i}"))).collect(),
            (1..n).map(|i| GraphEdge::new(format!("n{}", i / 2), format!("n{i}"))).collect(),
        );
        run(&mut sim, &balanced_config(n), 7, &CancelToken::new()).unwrap();

        for slot in 0..n {
            assert!(sim.pos_x[slot].is_finite(), "slot {slot}");
            assert!(sim.pos_y[slot].is_finite(), "slot {slot}");
        }
    }

    #[test]
    fn test_same_seed_reproduces_layout() {
        let config = balanced_config(20);
        let cancel = CancelToken::new();

        let mut a = sim_n(20);
        let mut b = sim_n(20);
        run(&mut a, &config, 42, &cancel).unwrap();
        run(&mut b, &config, 42, &cancel).unwrap();
        assert_eq!(a.pos_x, b.pos_x);
        assert_eq!(a.pos_y, b.pos_y);

        let mut c = sim_n(20);
        run(&mut c, &config, 43, &cancel).unwrap();
        assert_ne!(a.pos_x, c.pos_x, "different seeds should differ");
    }

    #[test]
    fn test_carried_positions_used_as_seeds() {
        // Two distant nodes, no edges: beyond the repulsion cutoff, so the
        // only force is gravity pulling both toward the box center.
        let mut far_a = GraphNode::new("A");
        far_a.position = Some(Point::new(0.0, 0.0));
        let mut far_b = GraphNode::new("B");
        far_b.position = Some(Point::new(5000.0, 3000.0));

        let config = balanced_config(2);
        let center = Point::new(config.width / 2.0, config.height / 2.0);
        let dist = |x: f32, y: f32| ((x - center.x).powi(2) + (y - center.y).powi(2)).sqrt();
        let initial = dist(0.0, 0.0);

        let mut sim = sim_with(vec![far_a, far_b], vec![]);
        run(&mut sim, &config, 0, &CancelToken::new()).unwrap();

        assert!(dist(sim.pos_x[0], sim.pos_y[0]) < initial);
        assert!(dist(sim.pos_x[1], sim.pos_y[1]) < initial);
    }

    #[test]
    fn test_edge_attraction_shrinks_stretched_edges() {
        let mut a = GraphNode::new("A");
        a.position = Some(Point::new(1000.0, 1500.0));
        let mut b = GraphNode::new("B");
        b.position = Some(Point::new(4000.0, 1500.0));

        let mut sim = sim_with(vec![a, b], vec![GraphEdge::new("A", "B")]);
        run(&mut sim, &balanced_config(2), 0, &CancelToken::new()).unwrap();

        let gap = ((sim.pos_x[1] - sim.pos_x[0]).powi(2)
            + (sim.pos_y[1] - sim.pos_y[0]).powi(2))
        .sqrt();
        assert!(gap < 3000.0, "edge should contract, got {gap}");
    }

    #[test]
    fn test_pre_cancelled_token_stops_immediately() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut sim = sim_n(10);
        let result = run(&mut sim, &balanced_config(10), 1, &cancel);
        assert!(matches!(result, Err(LayoutError::Cancelled)));
    }

    #[test]
    fn test_coincident_nodes_produce_no_nan() {
        // All nodes seeded on the same point: the distance=0 guard must keep
        // every coordinate finite.
        let nodes = (0..4)
            .map(|i| {
                let mut n = GraphNode::new(format!("n{i}"));
                n.position = Some(Point::new(2500.0, 1500.0));
                n
            })
            .collect();

        let mut sim = sim_with(nodes, vec![]);
        run(&mut sim, &balanced_config(4), 0, &CancelToken::new()).unwrap();

        for slot in 0..4 {
            assert!(sim.pos_x[slot].is_finite());
            assert!(sim.pos_y[slot].is_finite());
        }
    }
}
