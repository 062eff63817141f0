//! Score comparison
//!
//! # Overview
//!
//! [`TreeComparison`] runs one comparison as a fixed pipeline:
//! 1. **Intermediate**: both (already normalized) documents are converted so
//!    pitch changes are atomic and identifiers cannot bias matching
//! 2. **Diff**: the external oracle produces an edit script from A to B
//! 3. **Patch**: the script is applied to a clone of A with change tracking
//! 4. **Colorize**: changed nodes are highlighted on the side they belong to
//! 5. **Structural merge**: both sides are combined, layer by layer
//! 6. **Re-identify**: the diff tree and both source trees get identifiers
//!
//! Nothing is kept between calls; a comparator can serve any number of them.

pub mod colorize;
pub mod structural;

pub use colorize::{colorize, hide_layer_content};
pub use structural::{structural_merge, MODIFIED_LAYER_PREFIX, ORIGINAL_LAYER_PREFIX, RESOLVED_PREFIX};

use crate::converters::intermediate::{is_intermediate, to_intermediate, to_plain};
use crate::converters::xml::parse_mei;
use crate::diff::{patch, DiffOptions, DiffOracle, EditAction};
use crate::errors::{CompareError, RepresentationError};
use crate::models::MeiTree;
use crate::transform::{generate_identifiers, IdScheme};
use serde::{Deserialize, Serialize};

/// Highlighting and diff configuration for a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Color of deleted and updated content on the original side
    pub original_color: String,
    /// Color of inserted and updated content on the modified side
    pub modified_color: String,
    pub diff: DiffOptions,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            original_color: "red".to_string(),
            modified_color: "green".to_string(),
            diff: DiffOptions::default(),
        }
    }
}

/// Output of one comparison
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    /// Composite track-changes tree
    pub diff: MeiTree,
    /// Canonicalized original document
    pub a: MeiTree,
    /// Canonicalized modified document
    pub b: MeiTree,
    /// Edit script the oracle produced
    pub script: Vec<EditAction>,
}

/// A way of comparing two MEI documents
pub trait ComparisonStrategy {
    fn compare_trees(&self, a: &MeiTree, b: &MeiTree) -> Result<ComparisonResult, CompareError>;

    /// Parse both documents and compare them
    fn compare_xml(&self, a: &str, b: &str) -> Result<ComparisonResult, CompareError> {
        let a = parse_mei(a)?;
        let b = parse_mei(b)?;
        self.compare_trees(&a, &b)
    }
}

/// Diff-oracle based comparison producing a colorized composite tree
#[derive(Debug, Clone)]
pub struct TreeComparison<O> {
    oracle: O,
    config: CompareConfig,
}

impl<O: DiffOracle> TreeComparison<O> {
    pub fn new(oracle: O) -> Self {
        Self::with_config(oracle, CompareConfig::default())
    }

    pub fn with_config(oracle: O, config: CompareConfig) -> Self {
        Self { oracle, config }
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }
}

fn ensure_plain(tree: &mut MeiTree) -> Result<(), RepresentationError> {
    if is_intermediate(tree) {
        to_plain(tree)?;
    }
    Ok(())
}

/// Back to plain form with fresh identifiers
fn canonicalize(mut tree: MeiTree) -> Result<MeiTree, RepresentationError> {
    ensure_plain(&mut tree)?;
    generate_identifiers(&mut tree, false, &IdScheme::default());
    Ok(tree)
}

impl<O: DiffOracle> ComparisonStrategy for TreeComparison<O> {
    fn compare_trees(&self, a: &MeiTree, b: &MeiTree) -> Result<ComparisonResult, CompareError> {
        let mut a = a.clone();
        let mut b = b.clone();
        to_intermediate(&mut a)?;
        to_intermediate(&mut b)?;

        let script = self.oracle.diff(&a, &b, &self.config.diff)?;
        log::info!("diff oracle produced {} edit actions", script.len());

        let mut original = a.clone();
        let (mut modified, table) = patch(&script, &a)?;

        hide_layer_content(&mut modified);
        colorize(&mut original, &mut modified, &table, &self.config);
        ensure_plain(&mut original)?;
        ensure_plain(&mut modified)?;

        let mut diff = structural_merge(&original, &modified)?;
        generate_identifiers(&mut diff, true, &IdScheme::default());

        Ok(ComparisonResult {
            diff,
            a: canonicalize(a)?,
            b: canonicalize(b)?,
            script,
        })
    }
}
