//! Error types for MEI comparison and merging
//!
//! Every condition reported to the calling layer has its own variant so the
//! caller can tell precondition violations, script mismatches, structural
//! mismatches and scheduling conflicts apart.

use thiserror::Error;

/// Fatal XML parsing errors
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// XML is malformed (not well-formed)
    #[error("Invalid XML: {0}")]
    InvalidXml(String),
}

/// Conversion between plain and intermediate representation failed.
///
/// The document is left unmodified whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepresentationError {
    #[error("MEI is already in intermediate representation")]
    AlreadyIntermediate,

    #[error("MEI is not in intermediate representation")]
    NotIntermediate,

    #[error("Composite pitch value '{value}' is not of the form octave:pname")]
    MalformedComposite { value: String },
}

/// The edit script does not match the tree it is applied to
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("Path '{path}' is not a supported path expression")]
    InvalidPath { path: String },

    #[error("Path '{path}' does not resolve to any node")]
    PathNotFound { path: String },

    #[error("Node at '{path}' is not an element")]
    NotAnElement { path: String },

    #[error("Attribute '{name}' already exists on node at '{path}'")]
    AttributeExists { path: String, name: String },

    #[error("Attribute '{name}' does not exist on node at '{path}'")]
    AttributeMissing { path: String, name: String },
}

/// Error reported by an external diff oracle
#[derive(Debug, Clone, Error)]
#[error("Diff oracle failed: {0}")]
pub struct OracleError(pub String);

/// Which structural level did not line up during a structural merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureLevel {
    Staff,
    Layer,
}

impl std::fmt::Display for StructureLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StructureLevel::Staff => write!(f, "staff"),
            StructureLevel::Layer => write!(f, "layer"),
        }
    }
}

/// Comparison of two documents failed; no partial result is produced
#[derive(Debug, Clone, Error)]
pub enum CompareError {
    #[error(transparent)]
    Representation(#[from] RepresentationError),

    #[error("Edit script does not match source tree: {0}")]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Oracle(#[from] OracleError),

    #[error(
        "Measure {measure}: unequal {level} count ({expected} in original, {found} in modified){}",
        .staff.as_ref().map(|s| format!(" in staff {}", s)).unwrap_or_default()
    )]
    StructuralMismatch {
        measure: usize,
        staff: Option<String>,
        level: StructureLevel,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Merging the layers of a measure failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("Expected a measure element, found '{found}'")]
    NotAMeasure { found: String },

    #[error("Merging more than two layers is not currently supported (staff {staff}, group '{group}' has {count})")]
    UnsupportedLayerCount {
        staff: String,
        group: String,
        count: usize,
    },

    #[error("Could not merge layers, since they had overlaps (staff {staff}, group '{group}', conflicting: {})", .conflicting.join(", "))]
    LayersOverlap {
        staff: String,
        group: String,
        conflicting: Vec<String>,
    },

    #[error("Visible event '{event}' has no resolvable duration (staff {staff}, group '{group}')")]
    UnknownDuration {
        staff: String,
        group: String,
        event: String,
    },
}

/// File-level errors for the transformer helpers
#[derive(Debug, Error)]
pub enum MeiError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Representation(#[from] RepresentationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML write error: {0}")]
    Write(String),
}
