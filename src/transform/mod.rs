//! MEI normalization
//!
//! Every stored document goes through [`normalize`] first: metadata, MIDI data
//! and presentation attributes are removed and identifiers are regenerated.
//! [`MeiTransformer`] wraps a tree with value semantics: [`MeiTransformer::tree`]
//! hands out an independent copy, [`MeiTransformer::view`] a read-only borrow.

pub mod identifiers;

pub use identifiers::{generate_identifiers, IdMap, IdScheme, REFERENCE_ATTRIBUTES};

use crate::converters::{intermediate, xml};
use crate::errors::{MeiError, RepresentationError};
use crate::models::{MeiTree, NodeId};
use std::path::Path;

/// Attributes that only matter for MIDI playback
pub const MIDI_ATTRIBUTES: &[&str] = &["pnum"];

/// Elements that only matter for MIDI playback
pub const MIDI_ELEMENTS: &[&str] = &["instrDef"];

/// Presentation attributes; the comparison sets these itself
pub const PRESENTATION_ATTRIBUTES: &[&str] = &["color", "visible"];

/// Header/metadata element
pub const HEADER_ELEMENT: &str = "meiHead";

/// Remove the named attributes from every element
pub fn strip_attributes(tree: &mut MeiTree, names: &[&str]) {
    let elements: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&id| tree.is_element(id))
        .collect();
    for id in elements {
        for name in names {
            tree.remove_attribute(id, name);
        }
    }
}

/// Detach every element with one of the given names
fn remove_elements(tree: &mut MeiTree, names: &[&str]) -> usize {
    let doomed: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&id| id != tree.root())
        .filter(|&id| tree.name(id).is_some_and(|n| names.contains(&n)))
        .collect();
    for &id in &doomed {
        tree.detach(id);
    }
    doomed.len()
}

/// Strip header, MIDI data and presentation attributes, then regenerate identifiers
pub fn normalize(tree: &mut MeiTree, keep_existing: bool, scheme: &IdScheme) -> IdMap {
    let headers = remove_elements(tree, &[HEADER_ELEMENT]);
    let instruments = remove_elements(tree, MIDI_ELEMENTS);
    let notes = tree.find_all("note");
    for note in notes {
        for name in MIDI_ATTRIBUTES {
            tree.remove_attribute(note, name);
        }
    }
    strip_attributes(tree, PRESENTATION_ATTRIBUTES);
    log::debug!(
        "normalize: removed {} header(s), {} instrument definition(s)",
        headers,
        instruments
    );

    generate_identifiers(tree, keep_existing, scheme)
}

/// An MEI document plus the identifier map of its last regeneration
#[derive(Debug, Clone)]
pub struct MeiTransformer {
    tree: MeiTree,
    id_map: IdMap,
    scheme: IdScheme,
}

impl MeiTransformer {
    pub fn new(tree: MeiTree) -> Self {
        Self {
            tree,
            id_map: IdMap::default(),
            scheme: IdScheme::default(),
        }
    }

    /// Use a different identifier prefix (e.g. for dual-source merges)
    pub fn with_scheme(mut self, scheme: IdScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn from_xml_str(xml: &str) -> Result<Self, MeiError> {
        Ok(Self::new(xml::parse_mei(xml)?))
    }

    pub fn from_xml_file(path: impl AsRef<Path>) -> Result<Self, MeiError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_xml_str(&text)
    }

    /// Independent copy of the document
    pub fn tree(&self) -> MeiTree {
        self.tree.clone()
    }

    /// Read-only view of the document
    pub fn view(&self) -> &MeiTree {
        &self.tree
    }

    pub fn into_tree(self) -> MeiTree {
        self.tree
    }

    /// Identifier map produced by the last regeneration
    pub fn id_map(&self) -> &IdMap {
        &self.id_map
    }

    pub fn is_intermediate(&self) -> bool {
        intermediate::is_intermediate(&self.tree)
    }

    pub fn normalize(&mut self, keep_existing: bool) -> &IdMap {
        self.id_map = normalize(&mut self.tree, keep_existing, &self.scheme);
        &self.id_map
    }

    pub fn strip_attributes(&mut self, names: &[&str]) {
        strip_attributes(&mut self.tree, names);
    }

    pub fn generate_identifiers(&mut self, keep_existing: bool) -> &IdMap {
        self.id_map = generate_identifiers(&mut self.tree, keep_existing, &self.scheme);
        &self.id_map
    }

    pub fn to_intermediate(&mut self) -> Result<(), RepresentationError> {
        intermediate::to_intermediate(&mut self.tree)
    }

    pub fn to_plain(&mut self) -> Result<(), RepresentationError> {
        intermediate::to_plain(&mut self.tree)
    }

    pub fn to_xml_string(&self) -> Result<String, MeiError> {
        xml::write_mei(&self.tree)
    }

    pub fn save_xml_file(&self, path: impl AsRef<Path>) -> Result<(), MeiError> {
        std::fs::write(path, self.to_xml_string()?)?;
        Ok(())
    }
}
