//! Internal error taxonomy.
//!
//! Errors never escape the public entry points: `compute_layout` and friends
//! contain every fault and degrade to an empty position map. The variants
//! here exist so internal stages can report *why* a computation stopped and
//! so the entry point can decide whether partial output is still usable.

use thiserror::Error;

/// Failure modes of a single layout invocation.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The caller's cancellation token was flipped mid-computation.
    /// Positions accumulated so far are still finite and may be returned.
    #[error("layout computation cancelled by caller")]
    Cancelled,

    /// A geometric quantity (bounding box, distance, scale factor) came out
    /// NaN or infinite and could not be repaired with a safe default.
    #[error("non-finite geometry in {stage}")]
    NonFiniteGeometry {
        /// Pipeline stage that detected the bad value.
        stage: &'static str,
    },
}
