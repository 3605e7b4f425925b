//! Grid pathfinding for tile maps.
//!
//! This crate provides the grid search used when the navigation mesh cannot
//! answer a query: **Jump Point Search** over a binary walkability mask
//! ([`PathRange::jps_path`]), exposed through the index-based
//! [`GridSearch`] engine contract.
//!
//! [`PathRange`] owns and reuses its node array so that repeated queries
//! incur zero allocations after warm-up.

mod distance;
mod jps;
mod pathrange;
mod traits;

pub use distance::chebyshev;
pub use pathrange::PathRange;
pub use traits::GridSearch;
