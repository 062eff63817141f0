//! Identifier generation
//!
//! Two passes: the first walks the tree in document order and assigns
//! `prefix + index` identifiers, recording old → new; the second rewrites
//! every attribute that points at another element by identifier.

use crate::models::{MeiTree, NodeId, XML_ID};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Attributes whose values are `#id` references (or whitespace-separated lists of them)
pub const REFERENCE_ATTRIBUTES: &[&str] = &[
    "startid", "endid", "plist", "corresp", "sameas", "copyof", "next", "prev", "follows",
    "precedes", "synch",
];

/// Naming scheme for generated identifiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdScheme {
    pub prefix: String,
}

impl Default for IdScheme {
    fn default() -> Self {
        Self {
            prefix: "m-".to_string(),
        }
    }
}

impl IdScheme {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn make(&self, index: usize) -> String {
        format!("{}{}", self.prefix, index)
    }
}

/// Previous identifier → regenerated identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdMap(HashMap<String, String>);

impl IdMap {
    /// New identifier for an element that used to be called `old`
    pub fn rekey(&self, old: &str) -> Option<&str> {
        self.0.get(old).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn record(&mut self, old: String, new: String) {
        if old != new {
            self.0.entry(old).or_insert(new);
        }
    }

    /// Rewrite a reference value (`#id`, bare id, or a list of either)
    fn rewrite(&self, value: &str) -> String {
        value
            .split_whitespace()
            .map(|token| match token.strip_prefix('#') {
                Some(id) => match self.rekey(id) {
                    Some(new) => format!("#{}", new),
                    None => token.to_string(),
                },
                None => self.rekey(token).unwrap_or(token).to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Give every element a unique identifier.
///
/// With `keep_existing`, elements that already have an identifier keep it
/// (only the first holder of a duplicated identifier keeps it) and generated
/// identifiers skip values already in use. Comments never get identifiers.
pub fn generate_identifiers(tree: &mut MeiTree, keep_existing: bool, scheme: &IdScheme) -> IdMap {
    let elements: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&id| tree.is_element(id))
        .collect();

    let taken: HashSet<String> = if keep_existing {
        elements
            .iter()
            .filter_map(|&id| tree.attribute(id, XML_ID).map(str::to_string))
            .collect()
    } else {
        HashSet::new()
    };

    let mut map = IdMap::default();
    let mut kept = HashSet::new();
    let mut index = 0;

    for &id in &elements {
        let old = tree.attribute(id, XML_ID).map(str::to_string);
        if keep_existing {
            if let Some(old) = &old {
                if kept.insert(old.clone()) {
                    continue;
                }
            }
        }

        let new = loop {
            let candidate = scheme.make(index);
            index += 1;
            if !taken.contains(&candidate) {
                break candidate;
            }
        };
        tree.set_attribute(id, XML_ID, new.clone());
        if let Some(old) = old {
            if !keep_existing {
                map.record(old, new);
            }
        }
    }

    if !map.is_empty() {
        rewrite_references(tree, &elements, &map);
    }
    log::debug!(
        "generated identifiers for {} elements ({} remapped)",
        elements.len() - kept.len(),
        map.len()
    );
    map
}

fn rewrite_references(tree: &mut MeiTree, elements: &[NodeId], map: &IdMap) {
    for &id in elements {
        for &name in REFERENCE_ATTRIBUTES {
            let Some(value) = tree.attribute(id, name) else {
                continue;
            };
            let rewritten = map.rewrite(value);
            if rewritten != value {
                tree.set_attribute(id, name, rewritten);
            }
        }
    }
}
