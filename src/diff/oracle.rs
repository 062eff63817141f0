//! The external diff oracle
//!
//! Computing a tree edit script is delegated: any type that turns two trees
//! into an ordered [`EditAction`] list can drive the comparison. Closures with
//! the right signature are oracles too.

use crate::diff::actions::EditAction;
use crate::errors::OracleError;
use crate::models::MeiTree;
use serde::{Deserialize, Serialize};

/// Trade-off between matching accuracy and speed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatioMode {
    Fast,
    #[default]
    Accurate,
    Faster,
}

/// Options handed to the oracle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffOptions {
    /// Minimum similarity for two nodes to be matched
    pub similarity_threshold: f64,
    pub ratio_mode: RatioMode,
    /// Attributes that identify a node on their own. Empty, so stale
    /// identifiers never decide a match.
    pub unique_attributes: Vec<String>,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.5,
            ratio_mode: RatioMode::Accurate,
            unique_attributes: Vec::new(),
        }
    }
}

/// Produces an edit script transforming `a` into `b`
pub trait DiffOracle {
    fn diff(&self, a: &MeiTree, b: &MeiTree, options: &DiffOptions) -> Result<Vec<EditAction>, OracleError>;
}

impl<F> DiffOracle for F
where
    F: Fn(&MeiTree, &MeiTree, &DiffOptions) -> Result<Vec<EditAction>, OracleError>,
{
    fn diff(&self, a: &MeiTree, b: &MeiTree, options: &DiffOptions) -> Result<Vec<EditAction>, OracleError> {
        self(a, b, options)
    }
}
