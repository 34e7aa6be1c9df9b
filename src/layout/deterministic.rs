//! Closed-form layouts: circle, grid, concentric-by-degree, BFS tree.
//!
//! All four are pure functions of the graph topology and the target box, no
//! randomness and no iteration cap, which makes them suitable as golden
//! outputs in tests and as cheap retry targets when the force simulation is
//! too expensive for the caller's deadline.

use std::collections::VecDeque;
use std::f32::consts::TAU;

use crate::graph::SimGraph;

/// Fraction of the smaller box dimension used as the circle radius.
const CIRCLE_RADIUS_FACTOR: f32 = 0.4;

/// Fraction of each box dimension occupied by the grid.
const GRID_FILL_FACTOR: f32 = 0.7;

/// Place node `i` of `n` at angle `2π·i/n` on a fixed-radius circle.
pub fn circular_layout(sim: &mut SimGraph, width: f32, height: f32) {
    let n = sim.node_count();
    let cx = width / 2.0;
    let cy = height / 2.0;

    if n == 0 {
        return;
    }
    if n == 1 {
        sim.set_position(0, cx, cy);
        return;
    }

    let radius = CIRCLE_RADIUS_FACTOR * width.min(height);
    for slot in 0..n {
        let angle = TAU * slot as f32 / n as f32;
        sim.set_position(slot, cx + radius * angle.cos(), cy + radius * angle.sin());
    }
}

/// Row-major placement on a `ceil(√n) × ceil(√n)` grid centered in the box.
pub fn grid_layout(sim: &mut SimGraph, width: f32, height: f32) {
    let n = sim.node_count();
    if n == 0 {
        return;
    }
    if n == 1 {
        sim.set_position(0, width / 2.0, height / 2.0);
        return;
    }

    let cols = (n as f32).sqrt().ceil() as usize;
    let rows = n.div_ceil(cols);

    let cell_w = width * GRID_FILL_FACTOR / cols as f32;
    let cell_h = height * GRID_FILL_FACTOR / rows as f32;
    let start_x = width / 2.0 - cell_w * (cols as f32 - 1.0) / 2.0;
    let start_y = height / 2.0 - cell_h * (rows as f32 - 1.0) / 2.0;

    for slot in 0..n {
        let row = slot / cols;
        let col = slot % cols;
        sim.set_position(
            slot,
            start_x + col as f32 * cell_w,
            start_y + row as f32 * cell_h,
        );
    }
}

/// Concentric rings by undirected degree: high-degree nodes sit on the
/// innermost ring.
pub fn concentric_layout(sim: &mut SimGraph, width: f32, height: f32) {
    let n = sim.node_count();
    let cx = width / 2.0;
    let cy = height / 2.0;

    if n == 0 {
        return;
    }
    if n == 1 {
        sim.set_position(0, cx, cy);
        return;
    }

    // Sort slots by descending degree; ties break on slot order so the
    // layout is stable across runs.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by_key(|&slot| std::cmp::Reverse(sim.undirected_degree(slot)));

    let levels = ((n as f32 / 2.0).sqrt().ceil() as usize).clamp(1, 5);
    let per_level = n.div_ceil(levels);
    let radius_step = CIRCLE_RADIUS_FACTOR * width.min(height) / levels as f32;

    for (rank, &slot) in order.iter().enumerate() {
        let level = rank / per_level;
        let index_in_level = rank % per_level;
        let nodes_in_level = per_level.min(n - level * per_level);

        let radius = radius_step * (level + 1) as f32;
        let angle = TAU * index_in_level as f32 / nodes_in_level as f32;
        sim.set_position(slot, cx + radius * angle.cos(), cy + radius * angle.sin());
    }
}

/// BFS tree: levels are hop distances from the root with the most outgoing
/// edges; disconnected nodes land on one extra level below the tree.
pub fn tree_layout(sim: &mut SimGraph, width: f32, height: f32) {
    let n = sim.node_count();
    if n == 0 {
        return;
    }
    if n == 1 {
        sim.set_position(0, width / 2.0, height / 2.0);
        return;
    }

    let levels = bfs_levels(sim);
    let max_level = levels.iter().copied().flatten().max().unwrap_or(0);
    let overflow_level = max_level + 1;

    // Group slots per level, keeping slot order within a level.
    let mut by_level: Vec<Vec<usize>> = vec![Vec::new(); overflow_level + 1];
    for (slot, level) in levels.iter().enumerate() {
        by_level[level.unwrap_or(overflow_level)].push(slot);
    }

    let used_levels = by_level.iter().filter(|l| !l.is_empty()).count();
    let v_step = height / (used_levels as f32 + 1.0);

    let mut y = v_step;
    for level_slots in by_level.iter().filter(|l| !l.is_empty()) {
        let h_step = width / (level_slots.len() as f32 + 1.0);
        for (i, &slot) in level_slots.iter().enumerate() {
            sim.set_position(slot, h_step * (i as f32 + 1.0), y);
        }
        y += v_step;
    }
}

/// Hop distance per slot from the chosen root, `None` for unreached nodes.
fn bfs_levels(sim: &SimGraph) -> Vec<Option<usize>> {
    let n = sim.node_count();

    // Root: maximum outgoing-edge count, first occurrence on ties.
    let root = (0..n)
        .max_by_key(|&slot| (sim.out_degree(slot), std::cmp::Reverse(slot)))
        .unwrap_or(0);

    let mut levels: Vec<Option<usize>> = vec![None; n];
    levels[root] = Some(0);

    let mut queue = VecDeque::from([(root, 0usize)]);
    while let Some((slot, level)) = queue.pop_front() {
        for neighbor in sim.undirected_neighbors(slot) {
            let neighbor = neighbor as usize;
            if levels[neighbor].is_none() {
                levels[neighbor] = Some(level + 1);
                queue.push_back((neighbor, level + 1));
            }
        }
    }

    levels
}
