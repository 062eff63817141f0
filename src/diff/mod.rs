//! Edit scripts and their tracked application
//!
//! The edit script itself comes from an external [`DiffOracle`]; this module
//! defines its vocabulary, resolves its paths and applies it while recording
//! which node every action touched.

pub mod actions;
pub mod oracle;
pub mod patcher;
pub mod path;

// Re-export for convenience
pub use actions::{ChangeKind, EditAction};
pub use oracle::{DiffOptions, DiffOracle, RatioMode};
pub use patcher::{patch, CorrespondenceTable, TrackedNode, TrackedPatcher};
pub use path::{path_of, resolve, resolve_one};
