//! Normalization of raw layout output.
//!
//! Every algorithm hands its raw positions to this stage, which guarantees
//! the caller-visible contract: the layout fits the requested box (minus
//! padding) and is centered in it. Scaling is shrink-only so closed-form
//! layouts that already fit — the fixed-radius circle in particular — pass
//! through untouched and stay exact. An optional repair pass pushes apart
//! node pairs that ended up closer than a minimum distance.

use tracing::debug;

use crate::error::LayoutError;
use crate::graph::SimGraph;
use crate::spatial::SeparationIndex;

/// Number of minimum-separation repair passes.
const REPAIR_PASSES: u32 = 4;

/// Synthetic offset substituted for a zero-length separation vector.
const ZERO_DISTANCE_NUDGE: f32 = 0.5;

/// Target box for normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessConfig {
    /// Target box width.
    pub width: f32,
    /// Target box height.
    pub height: f32,
    /// Margin kept inside the box on every side.
    pub padding: f32,
    /// When set, pairs closer than this are pushed apart after fitting.
    pub min_separation: Option<f32>,
}

impl PostProcessConfig {
    /// Config for a box with the default padding and no spacing repair.
    pub fn fit(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            padding: 20.0,
            min_separation: None,
        }
    }
}

/// Scale (down only), center, and optionally repair spacing.
pub fn normalize(sim: &mut SimGraph, config: &PostProcessConfig) -> Result<(), LayoutError> {
    let n = sim.node_count();
    if n == 0 {
        return Ok(());
    }

    let (min_x, min_y, max_x, max_y) = bounding_box(sim)?;

    let extent_x = max_x - min_x;
    let extent_y = max_y - min_y;
    let usable_w = (config.width - 2.0 * config.padding).max(1.0);
    let usable_h = (config.height - 2.0 * config.padding).max(1.0);

    // Degenerate extents (all nodes coincide on an axis) skip scaling
    // entirely; shrink-only otherwise.
    let scale = if extent_x > 0.0 && extent_y > 0.0 {
        ((usable_w / extent_x).min(usable_h / extent_y)).min(1.0)
    } else {
        1.0
    };

    let box_cx = config.width / 2.0;
    let box_cy = config.height / 2.0;
    let layout_cx = (min_x + max_x) / 2.0;
    let layout_cy = (min_y + max_y) / 2.0;

    for slot in 0..n {
        sim.pos_x[slot] = (sim.pos_x[slot] - layout_cx) * scale + box_cx;
        sim.pos_y[slot] = (sim.pos_y[slot] - layout_cy) * scale + box_cy;
    }

    if let Some(min_separation) = config.min_separation {
        enforce_min_separation(sim, min_separation);
    }

    Ok(())
}

fn bounding_box(sim: &SimGraph) -> Result<(f32, f32, f32, f32), LayoutError> {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;

    for slot in 0..sim.node_count() {
        min_x = min_x.min(sim.pos_x[slot]);
        min_y = min_y.min(sim.pos_y[slot]);
        max_x = max_x.max(sim.pos_x[slot]);
        max_y = max_y.max(sim.pos_y[slot]);
    }

    if !min_x.is_finite() || !min_y.is_finite() || !max_x.is_finite() || !max_y.is_finite() {
        return Err(LayoutError::NonFiniteGeometry { stage: "normalize" });
    }
    Ok((min_x, min_y, max_x, max_y))
}

/// Push apart pairs closer than `min_separation`, half the deficit each way.
///
/// Each pass bulk-loads a fresh R-tree over the current snapshot; pairs at
/// exactly zero distance get a synthetic offset so the push direction is
/// defined.
pub fn enforce_min_separation(sim: &mut SimGraph, min_separation: f32) {
    let n = sim.node_count();
    if min_separation <= 0.0 || n < 2 {
        return;
    }

    for pass in 0..REPAIR_PASSES {
        let index = SeparationIndex::build(&sim.pos_x, &sim.pos_y);
        let mut moved = 0usize;

        for slot in 0..n as u32 {
            let x = sim.pos_x[slot as usize];
            let y = sim.pos_y[slot as usize];
            for other in index.within_radius(slot, x, y, min_separation) {
                // Each pair is handled once, from its lower slot.
                if other.slot < slot {
                    continue;
                }

                let (s, t) = (slot as usize, other.slot as usize);
                let mut dx = sim.pos_x[t] - sim.pos_x[s];
                let mut dy = sim.pos_y[t] - sim.pos_y[s];
                let mut distance = (dx * dx + dy * dy).sqrt();

                if distance == 0.0 {
                    dx = ZERO_DISTANCE_NUDGE;
                    dy = ZERO_DISTANCE_NUDGE;
                    distance = (dx * dx + dy * dy).sqrt();
                }
                if distance >= min_separation {
                    continue;
                }

                let push = (min_separation - distance) / 2.0;
                let ux = dx / distance;
                let uy = dy / distance;
                sim.pos_x[s] -= ux * push;
                sim.pos_y[s] -= uy * push;
                sim.pos_x[t] += ux * push;
                sim.pos_y[t] += uy * push;
                moved += 1;
            }
        }

        if moved == 0 {
            break;
        }
        debug!(pass, moved, "separation repair pass");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphData, GraphNode};

    const EPS: f32 = 1e-2;

    fn sim_at(points: &[(f32, f32)]) -> SimGraph {
        let mut sim = SimGraph::from_graph_data(&GraphData {
            nodes: (0..points.len())
                .map(|i| GraphNode::new(format!("n{i}")))
                .collect(),
            edges: vec![],
            width: None,
            height: None,
        });
        for (slot, &(x, y)) in points.iter().enumerate() {
            sim.set_position(slot, x, y);
        }
        sim
    }

    fn bbox(sim: &SimGraph) -> (f32, f32, f32, f32) {
        bounding_box(sim).unwrap()
    }

    #[test]
    fn test_oversized_layout_shrinks_into_box() {
        let mut sim = sim_at(&[(0.0, 0.0), (4000.0, 0.0), (0.0, 2500.0), (4000.0, 2500.0)]);
        let config = PostProcessConfig::fit(800.0, 600.0);
        normalize(&mut sim, &config).unwrap();

        let (min_x, min_y, max_x, max_y) = bbox(&sim);
        assert!(min_x >= config.padding - EPS);
        assert!(min_y >= config.padding - EPS);
        assert!(max_x <= 800.0 - config.padding + EPS);
        assert!(max_y <= 600.0 - config.padding + EPS);
    }

    #[test]
    fn test_fitting_layout_only_recenters() {
        // A 100×100 layout already fits 800×600; its shape must not change.
        let mut sim = sim_at(&[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]);
        normalize(&mut sim, &PostProcessConfig::fit(800.0, 600.0)).unwrap();

        let (min_x, min_y, max_x, max_y) = bbox(&sim);
        assert!((max_x - min_x - 100.0).abs() < EPS, "width preserved");
        assert!((max_y - min_y - 100.0).abs() < EPS, "height preserved");
        assert!(((min_x + max_x) / 2.0 - 400.0).abs() < EPS, "centered x");
        assert!(((min_y + max_y) / 2.0 - 300.0).abs() < EPS, "centered y");
    }

    #[test]
    fn test_idempotent() {
        let mut sim = sim_at(&[(12.0, -40.0), (90.0, 310.0), (-55.0, 120.0), (700.0, 5.0)]);
        let config = PostProcessConfig::fit(800.0, 600.0);

        normalize(&mut sim, &config).unwrap();
        let first = (sim.pos_x.clone(), sim.pos_y.clone());

        normalize(&mut sim, &config).unwrap();
        for slot in 0..4 {
            assert!((sim.pos_x[slot] - first.0[slot]).abs() < EPS);
            assert!((sim.pos_y[slot] - first.1[slot]).abs() < EPS);
        }
    }

    #[test]
    fn test_degenerate_bbox_recenters_without_scaling() {
        // All nodes coincide: zero-extent box must not divide by zero.
        let mut sim = sim_at(&[(9999.0, -9999.0), (9999.0, -9999.0)]);
        normalize(&mut sim, &PostProcessConfig::fit(800.0, 600.0)).unwrap();

        for slot in 0..2 {
            assert!((sim.pos_x[slot] - 400.0).abs() < EPS);
            assert!((sim.pos_y[slot] - 300.0).abs() < EPS);
        }
    }

    #[test]
    fn test_empty_graph_is_noop() {
        let mut sim = sim_at(&[]);
        normalize(&mut sim, &PostProcessConfig::fit(800.0, 600.0)).unwrap();
        assert_eq!(sim.node_count(), 0);
    }

    #[test]
    fn test_min_separation_repair() {
        let mut sim = sim_at(&[(400.0, 300.0), (402.0, 300.0), (500.0, 300.0)]);
        let config = PostProcessConfig {
            min_separation: Some(30.0),
            ..PostProcessConfig::fit(800.0, 600.0)
        };
        normalize(&mut sim, &config).unwrap();

        let gap = ((sim.pos_x[1] - sim.pos_x[0]).powi(2)
            + (sim.pos_y[1] - sim.pos_y[0]).powi(2))
        .sqrt();
        assert!(gap >= 30.0 - EPS, "pair should be pushed apart, got {gap}");
    }

    #[test]
    fn test_repair_separates_coincident_pair() {
        let mut sim = sim_at(&[(400.0, 300.0), (400.0, 300.0)]);
        let config = PostProcessConfig {
            min_separation: Some(10.0),
            ..PostProcessConfig::fit(800.0, 600.0)
        };
        normalize(&mut sim, &config).unwrap();

        let gap = ((sim.pos_x[1] - sim.pos_x[0]).powi(2)
            + (sim.pos_y[1] - sim.pos_y[0]).powi(2))
        .sqrt();
        assert!(gap > 0.0, "synthetic offset should break the tie");
        assert!(sim.pos_x.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_non_finite_positions_rejected() {
        let mut sim = sim_at(&[(0.0, 0.0), (f32::NAN, 10.0)]);
        let result = normalize(&mut sim, &PostProcessConfig::fit(800.0, 600.0));
        assert!(matches!(
            result,
            Err(LayoutError::NonFiniteGeometry { stage: "normalize" })
        ));
    }
}
