//! Format converters
//!
//! XML text ↔ [`MeiTree`](crate::models::MeiTree), and plain ↔ intermediate
//! representation of a tree.

pub mod intermediate;
pub mod xml;

// Re-export for convenience
pub use intermediate::{is_intermediate, to_intermediate, to_plain, COMPOSITE_PITCH};
pub use xml::{parse_mei, write_mei};
