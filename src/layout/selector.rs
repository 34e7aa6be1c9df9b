//! Layout family selection and parameter tables.
//!
//! Pure mapping from `(layout name, node count)` to a concrete algorithm and
//! its tuning parameters. The numeric bands follow the production tuning of
//! the explorer: more nodes get a proportionally larger simulation box and a
//! bounded iteration count, the compact family tightens `k` and raises
//! gravity, the spread families do the opposite.

use tracing::debug;

/// Node count above which a graph is "very large": the family set narrows to
/// `{balanced, grid, circle}` and balanced routes to the spiral fallback.
pub const VERY_LARGE_THRESHOLD: usize = 5000;

/// Named layout families accepted from callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutFamily {
    /// Force-directed, the default.
    Balanced,
    /// Force-directed with tighter ideal distance and stronger gravity.
    Compact,
    /// Force-directed with generous spacing.
    Spread,
    /// Spread, pushed further.
    UltraSpread,
    /// Fixed-radius circle.
    Circle,
    /// Row-major square grid.
    Grid,
    /// Degree-ranked concentric rings.
    Concentric,
    /// BFS tree by hop distance from the best root.
    Tree,
}

impl LayoutFamily {
    /// Parse a requested layout name; unknown names fall back to `Balanced`.
    pub fn parse(name: &str) -> Self {
        match name {
            "balanced" => Self::Balanced,
            "compact" => Self::Compact,
            "spread" => Self::Spread,
            "ultra-spread" => Self::UltraSpread,
            "circle" => Self::Circle,
            "grid" => Self::Grid,
            "concentric" => Self::Concentric,
            "tree" => Self::Tree,
            _ => Self::Balanced,
        }
    }

    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Compact => "compact",
            Self::Spread => "spread",
            Self::UltraSpread => "ultra-spread",
            Self::Circle => "circle",
            Self::Grid => "grid",
            Self::Concentric => "concentric",
            Self::Tree => "tree",
        }
    }

    fn is_force_directed(self) -> bool {
        matches!(
            self,
            Self::Balanced | Self::Compact | Self::Spread | Self::UltraSpread
        )
    }
}

/// Tuning parameters for one force-directed invocation. Chosen by the
/// selector, never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    /// Simulation box width.
    pub width: f32,
    /// Simulation box height.
    pub height: f32,
    /// Iteration budget.
    pub iterations: u32,
    /// Ideal edge length `k`.
    pub ideal_distance: f32,
    /// Pull toward the box center per unit offset.
    pub gravity: f32,
    /// Starting displacement cap, as a fraction of the larger box dimension.
    pub initial_temperature: f32,
    /// Per-iteration temperature multiplier, floored at 0.97 when applied.
    pub cooling_factor: f32,
}

/// Tuning parameters for the very-large spiral fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct LargeGraphConfig {
    /// Target box width.
    pub width: f32,
    /// Target box height.
    pub height: f32,
    /// Number of attraction-only refinement passes.
    pub refinement_passes: u32,
    /// Edge length above which endpoints are pulled together.
    pub attraction_threshold: f32,
    /// Fraction of the edge vector each endpoint moves per pass.
    pub attraction_fraction: f32,
}

/// The concrete algorithm chosen for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum Algorithm {
    /// Iterative force simulation.
    Force(LayoutConfig),
    /// Closed-form circle.
    Circular,
    /// Closed-form grid.
    Grid,
    /// Closed-form concentric-by-degree.
    Concentric,
    /// Closed-form BFS tree.
    Tree,
    /// Spiral seeding plus bounded refinement.
    LargeGraph(LargeGraphConfig),
}

/// The selector's decision for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// The family that will actually run (may differ from the requested one
    /// for very large graphs).
    pub family: LayoutFamily,
    /// Algorithm plus parameters.
    pub algorithm: Algorithm,
}

/// Map a requested layout name and node count to an algorithm.
pub fn select(layout_name: &str, node_count: usize) -> Selection {
    let requested = LayoutFamily::parse(layout_name);

    // Very large graphs only get the cheap families; everything else is
    // forced back to balanced, which in turn runs the spiral fallback.
    let family = if node_count > VERY_LARGE_THRESHOLD
        && !matches!(
            requested,
            LayoutFamily::Balanced | LayoutFamily::Grid | LayoutFamily::Circle
        ) {
        LayoutFamily::Balanced
    } else {
        requested
    };

    if family != requested {
        debug!(
            requested = requested.as_str(),
            resolved = family.as_str(),
            node_count,
            "narrowed layout family for very large graph"
        );
    }

    let algorithm = match family {
        LayoutFamily::Circle => Algorithm::Circular,
        LayoutFamily::Grid => Algorithm::Grid,
        LayoutFamily::Concentric => Algorithm::Concentric,
        LayoutFamily::Tree => Algorithm::Tree,
        LayoutFamily::Balanced if node_count > VERY_LARGE_THRESHOLD => {
            Algorithm::LargeGraph(large_graph_config(node_count))
        }
        _ => Algorithm::Force(force_config(family, node_count)),
    };

    Selection { family, algorithm }
}

/// Iteration budget per node count band.
fn iterations_for(node_count: usize) -> u32 {
    if node_count > VERY_LARGE_THRESHOLD {
        (10_000 / node_count.max(1) as u32).clamp(20, 50)
    } else if node_count > 1000 {
        100
    } else if node_count > 500 {
        200
    } else {
        300
    }
}

/// Parameter table for the force-directed families.
fn force_config(family: LayoutFamily, node_count: usize) -> LayoutConfig {
    debug_assert!(family.is_force_directed());
    let large = node_count > 1000;

    let (ideal_distance, gravity, width, height) = match family {
        LayoutFamily::Compact => {
            if large {
                (120.0, 0.2, 3500.0, 2500.0)
            } else {
                (150.0, 0.15, 2800.0, 1800.0)
            }
        }
        LayoutFamily::Spread => {
            if large {
                (400.0, 0.04, 8000.0, 5000.0)
            } else {
                (500.0, 0.02, 7000.0, 4000.0)
            }
        }
        LayoutFamily::UltraSpread => {
            if large {
                (500.0, 0.01, 10_000.0, 6000.0)
            } else {
                (600.0, 0.02, 9000.0, 5500.0)
            }
        }
        _ => {
            if large {
                (180.0, 0.12, 6000.0, 3600.0)
            } else {
                (280.0, 0.06, 5000.0, 3000.0)
            }
        }
    };

    LayoutConfig {
        width,
        height,
        iterations: iterations_for(node_count),
        ideal_distance,
        gravity,
        initial_temperature: 0.8,
        cooling_factor: 0.98,
    }
}

/// Parameter table for the very-large fallback: the box keeps growing with
/// the node count so spiral layers do not pile up.
fn large_graph_config(node_count: usize) -> LargeGraphConfig {
    let n = node_count as f32;
    LargeGraphConfig {
        width: n.clamp(6000.0, 12_000.0),
        height: (n * 0.8).clamp(4000.0, 9000.0),
        refinement_passes: 20,
        attraction_threshold: 400.0,
        attraction_fraction: 0.05,
    }
}
