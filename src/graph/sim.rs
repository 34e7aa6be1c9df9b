//! Per-invocation simulation graph.
//!
//! `SimGraph` is built fresh from the caller's [`GraphData`] at the start of
//! every layout call and discarded at the end; nothing is cached across
//! invocations. Topology lives in petgraph's `StableGraph`; positions and
//! velocities live in SoA (Structure of Arrays) buffers indexed by slot so
//! the force loop stays cache-friendly.

use std::collections::HashMap;

use petgraph::Directed;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use tracing::debug;

use super::model::{GraphData, Point, PositionMap};

/// Mutable simulation state for one layout invocation.
///
/// Slot `i` everywhere refers to the `i`-th unique node id in input order.
pub struct SimGraph {
    /// Topology. Node weight is the slot index, edge weight is unused spring
    /// weight (always 1.0 for now).
    graph: StableGraph<u32, f32, Directed>,

    /// Petgraph index per slot.
    indices: Vec<NodeIndex>,

    /// Node ids in slot order.
    ids: Vec<String>,

    /// Seed position carried over from the input, if any.
    seeds: Vec<Option<Point>>,

    /// Resolved edge endpoints as (source_slot, target_slot), duplicates and
    /// self-loops preserved as sent.
    edges: Vec<(u32, u32)>,

    /// X positions (SoA layout).
    pub pos_x: Vec<f32>,

    /// Y positions (SoA layout).
    pub pos_y: Vec<f32>,

    /// X velocities (SoA layout).
    pub vel_x: Vec<f32>,

    /// Y velocities (SoA layout).
    pub vel_y: Vec<f32>,
}

impl SimGraph {
    /// Build the simulation graph from caller input.
    ///
    /// Duplicate node ids keep their first occurrence; edges whose endpoints
    /// are missing from the node set are dropped silently per the input
    /// contract.
    pub fn from_graph_data(data: &GraphData) -> Self {
        let mut graph = StableGraph::with_capacity(data.nodes.len(), data.edges.len());
        let mut slot_by_id: HashMap<&str, u32> = HashMap::with_capacity(data.nodes.len());
        let mut indices = Vec::with_capacity(data.nodes.len());
        let mut ids = Vec::with_capacity(data.nodes.len());
        let mut seeds = Vec::with_capacity(data.nodes.len());

        let mut duplicates = 0usize;
        for node in &data.nodes {
            if slot_by_id.contains_key(node.id.as_str()) {
                duplicates += 1;
                continue;
            }
            let slot = ids.len() as u32;
            slot_by_id.insert(node.id.as_str(), slot);
            indices.push(graph.add_node(slot));
            ids.push(node.id.clone());
            seeds.push(node.position.filter(|p| p.is_finite()));
        }

        let mut edges = Vec::with_capacity(data.edges.len());
        let mut dropped = 0usize;
        for edge in &data.edges {
            let source = slot_by_id.get(edge.source.id());
            let target = slot_by_id.get(edge.target.id());
            match (source, target) {
                (Some(&s), Some(&t)) => {
                    graph.add_edge(indices[s as usize], indices[t as usize], 1.0);
                    edges.push((s, t));
                }
                _ => dropped += 1,
            }
        }

        if duplicates > 0 || dropped > 0 {
            debug!(duplicates, dropped, "ignored malformed graph entries");
        }

        let n = ids.len();
        Self {
            graph,
            indices,
            ids,
            seeds,
            edges,
            pos_x: vec![0.0; n],
            pos_y: vec![0.0; n],
            vel_x: vec![0.0; n],
            vel_y: vec![0.0; n],
        }
    }

    /// Number of unique nodes.
    pub fn node_count(&self) -> usize {
        self.ids.len()
    }

    /// Number of retained edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Node ids in slot order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Resolved edge endpoints as (source_slot, target_slot).
    pub fn edges(&self) -> &[(u32, u32)] {
        &self.edges
    }

    /// Carried-over seed position for a slot, if the input had one.
    pub fn seed_position(&self, slot: usize) -> Option<Point> {
        self.seeds.get(slot).copied().flatten()
    }

    /// Undirected degree: edges touching the node in either direction.
    ///
    /// This definition is shared by the concentric and tree layouts; the two
    /// must never diverge on it.
    pub fn undirected_degree(&self, slot: usize) -> usize {
        let ix = self.indices[slot];
        self.graph
            .edges_directed(ix, petgraph::Direction::Outgoing)
            .count()
            + self
                .graph
                .edges_directed(ix, petgraph::Direction::Incoming)
                .count()
    }

    /// Outgoing edge count, used only for BFS root selection.
    pub fn out_degree(&self, slot: usize) -> usize {
        self.graph
            .edges_directed(self.indices[slot], petgraph::Direction::Outgoing)
            .count()
    }

    /// Neighbor slots in both edge directions, duplicates included.
    pub fn undirected_neighbors(&self, slot: usize) -> Vec<u32> {
        let ix = self.indices[slot];
        let out = self
            .graph
            .edges_directed(ix, petgraph::Direction::Outgoing)
            .map(|e| self.graph[e.target()]);
        let inc = self
            .graph
            .edges_directed(ix, petgraph::Direction::Incoming)
            .map(|e| self.graph[e.source()]);
        out.chain(inc).collect()
    }

    /// Set a slot's position.
    #[inline]
    pub fn set_position(&mut self, slot: usize, x: f32, y: f32) {
        self.pos_x[slot] = x;
        self.pos_y[slot] = y;
    }

    /// Consume the simulation state into the output position map.
    ///
    /// Non-finite coordinates (which should never survive the pipeline, but
    /// the output invariant is absolute) are replaced by the given fallback.
    pub fn into_positions(self, fallback: Point) -> PositionMap {
        let mut positions = PositionMap::with_capacity(self.ids.len());
        for (slot, id) in self.ids.into_iter().enumerate() {
            let p = Point::new(self.pos_x[slot], self.pos_y[slot]);
            positions.insert(id, if p.is_finite() { p } else { fallback });
        }
        positions
    }
}
