//! MEI Comparison WASM Module
//!
//! Compares two versions of an MEI score and produces an edit script, a
//! colorized composite tree for track-changes rendering, and a way to merge
//! two alternate layers of a measure once their contents no longer overlap.

pub mod api;
pub mod compare;
pub mod converters;
pub mod diff;
pub mod errors;
pub mod merge;
pub mod models;
pub mod transform;

// Re-export commonly used types
pub use compare::{CompareConfig, ComparisonResult, ComparisonStrategy, TreeComparison};
pub use diff::{DiffOptions, DiffOracle, EditAction};
pub use errors::{CompareError, MeiError, MergeError, PatchError, RepresentationError};
pub use merge::{is_resolved, merge_layers, merge_measure_layers};
pub use models::{MeiTree, NodeId};
pub use transform::{IdMap, IdScheme, MeiTransformer};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    if console_log::init_with_level(log::Level::Debug).is_err() {
        return;
    }

    log::info!("MEI comparison WASM module initialized");
}
