//! Layout algorithms and the shared pipeline stages around them.

pub mod deterministic;
pub mod force;
pub mod large;
pub mod postprocess;
pub mod selector;

pub use postprocess::{enforce_min_separation, normalize, PostProcessConfig};
pub use selector::{
    select, Algorithm, LargeGraphConfig, LayoutConfig, LayoutFamily, Selection,
    VERY_LARGE_THRESHOLD,
};
