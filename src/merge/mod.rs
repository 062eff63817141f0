//! Layer merge engine
//!
//! Reconciles alternate layers of a staff into one layer when their visible
//! contents do not overlap in time, and reports whether a compared document
//! has been fully resolved.

pub mod layers;
pub mod resolve;

pub use layers::{max_compatible_subset, merge_layers, merge_measure_layers};
pub use resolve::is_resolved;
