//! Coarse bucket grid for repulsion lookups.
//!
//! The force simulator only computes repulsion between nodes that fall in the
//! same or adjacent grid cells, turning the O(n²) all-pairs pass into near
//! O(n) for well-spread layouts. The grid is a plain value: built from a
//! position snapshot, queried immutably during one force step, and thrown
//! away when the simulator rebuilds it a few iterations later.

use std::collections::HashMap;

/// Disposable bucket index over node positions.
///
/// Cells are keyed by integer coordinates `(floor(x / cell), floor(y / cell))`.
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<u32>>,
}

impl SpatialGrid {
    /// Build a fresh grid from position snapshots.
    ///
    /// `cell_size` must be positive; non-finite positions are skipped so a
    /// corrupted coordinate cannot poison the whole index.
    pub fn build(pos_x: &[f32], pos_y: &[f32], cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            1.0
        };

        let mut cells: HashMap<(i32, i32), Vec<u32>> = HashMap::new();
        for (slot, (&x, &y)) in pos_x.iter().zip(pos_y).enumerate() {
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            cells
                .entry(Self::key(x, y, cell_size))
                .or_default()
                .push(slot as u32);
        }

        Self { cell_size, cells }
    }

    #[inline]
    fn key(x: f32, y: f32, cell_size: f32) -> (i32, i32) {
        ((x / cell_size).floor() as i32, (y / cell_size).floor() as i32)
    }

    /// Visit every node in the cell containing `(x, y)` and its 8 neighbors.
    ///
    /// The visited set includes the querying node itself when it was indexed;
    /// callers filter it out.
    pub fn visit_neighborhood(&self, x: f32, y: f32, mut visit: impl FnMut(u32)) {
        let (cx, cy) = Self::key(x, y, self.cell_size);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    for &slot in bucket {
                        visit(slot);
                    }
                }
            }
        }
    }

    /// Number of occupied cells.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Total number of indexed nodes.
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    /// True when no node was indexed.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
