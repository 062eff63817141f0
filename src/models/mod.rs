//! Models module for MEI comparison
//!
//! This module contains the document tree and the timing model
//! used to schedule the events of a layer.

pub mod events;
pub mod tree;

// Re-export commonly used types
pub use events::{Rational, TimedEvent};
pub use tree::{Element, MeiTree, NodeId, NodeKind};

/// MEI namespace
pub const MEI_NS: &str = "http://www.music-encoding.org/ns/mei";

/// XML namespace, home of `xml:id`
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Identifier attribute, as stored on elements
pub const XML_ID: &str = "xml:id";
