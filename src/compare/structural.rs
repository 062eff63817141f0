//! Structural merge of the two highlighted trees
//!
//! The composite tree starts as the original side. For every
//! measure/staff/layer triple the modified layer is added as a sibling layer
//! rather than interleaved; combining the contents is left to the layer merge
//! once the differences are resolved. A modified layer with nothing visible
//! carries no difference, so the original layer stays alone, tagged resolved.
//!
//! Elements pointing at other elements by identifier (trills, slurs, ...)
//! are not relocated and are dropped from the composite.

use crate::compare::colorize::is_hidden;
use crate::errors::{CompareError, StructureLevel};
use crate::models::{MeiTree, NodeId, XML_ID};
use std::collections::HashSet;

/// Identifier prefix of a layer that needs no further resolution
pub const RESOLVED_PREFIX: &str = "m-r";
/// Identifier prefix of the original layer of an unresolved pair
pub const ORIGINAL_LAYER_PREFIX: &str = "m-a";
/// Identifier prefix of the modified layer of an unresolved pair
pub const MODIFIED_LAYER_PREFIX: &str = "m-b";

/// Attributes that tie an element to another element's identifier
const ANCHOR_ATTRIBUTES: &[&str] = &["startid", "endid"];

struct LayerCounter(usize);

impl LayerCounter {
    fn next(&mut self) -> usize {
        self.0 += 1;
        self.0
    }
}

/// Combine the original and modified trees into one diff tree.
///
/// `modified` must be the patched clone of `original`'s source: nodes they
/// share keep the same [`NodeId`] in both.
pub fn structural_merge(original: &MeiTree, modified: &MeiTree) -> Result<MeiTree, CompareError> {
    let mut merged = original.clone();
    let original_measures = original.find_all("measure");
    let known: HashSet<NodeId> = original.descendants(original.root()).collect();
    let mut counter = LayerCounter(0);

    for (index, &measure) in original_measures.iter().enumerate() {
        // Measures removed on the modified side stay as they are
        if modified.is_attached(measure) && modified.is(measure, "measure") {
            merge_measure(&mut merged, modified, measure, index + 1, &mut counter)?;
        }
    }

    // Measures only the modified side has go in after their preceding measure
    let mut previous: Option<NodeId> = None;
    for measure in modified.find_all("measure") {
        if known.contains(&measure) {
            previous = Some(measure).filter(|m| merged.is_attached(*m));
            continue;
        }
        let copy = merged.import(modified, measure);
        match previous.and_then(|p| Some((merged.parent(p)?, merged.position(p)?))) {
            Some((parent, position)) => merged.insert_child(parent, position + 1, copy),
            None => {
                let parent = modified
                    .parent(measure)
                    .filter(|p| known.contains(p) && merged.is_attached(*p))
                    .unwrap_or(merged.root());
                merged.insert_child(parent, 0, copy);
            }
        }
        previous = Some(copy);
    }

    drop_anchored_elements(&mut merged);
    Ok(merged)
}

fn staff_label(tree: &MeiTree, staff: NodeId, index: usize) -> String {
    tree.attribute(staff, "n")
        .map(str::to_string)
        .unwrap_or_else(|| (index + 1).to_string())
}

fn merge_measure(
    merged: &mut MeiTree,
    modified: &MeiTree,
    measure: NodeId,
    ordinal: usize,
    counter: &mut LayerCounter,
) -> Result<(), CompareError> {
    let original_staves: Vec<NodeId> = merged.children_named(measure, "staff").collect();
    let modified_staves: Vec<NodeId> = modified.children_named(measure, "staff").collect();
    if original_staves.len() != modified_staves.len() {
        return Err(CompareError::StructuralMismatch {
            measure: ordinal,
            staff: None,
            level: StructureLevel::Staff,
            expected: original_staves.len(),
            found: modified_staves.len(),
        });
    }

    for (index, (&staff, &modified_staff)) in original_staves.iter().zip(&modified_staves).enumerate() {
        let original_layers: Vec<NodeId> = merged.children_named(staff, "layer").collect();
        let modified_layers: Vec<NodeId> = modified.children_named(modified_staff, "layer").collect();
        if original_layers.len() != modified_layers.len() {
            return Err(CompareError::StructuralMismatch {
                measure: ordinal,
                staff: Some(staff_label(merged, staff, index)),
                level: StructureLevel::Layer,
                expected: original_layers.len(),
                found: modified_layers.len(),
            });
        }

        for (&layer, &modified_layer) in original_layers.iter().zip(&modified_layers) {
            let group = counter.next();
            if is_hidden(modified, modified_layer) {
                merged.set_attribute(layer, XML_ID, format!("{}{}", RESOLVED_PREFIX, group));
                continue;
            }

            merged.set_attribute(layer, XML_ID, format!("{}{}", ORIGINAL_LAYER_PREFIX, group));
            let copy = merged.import(modified, modified_layer);
            merged.set_attribute(copy, XML_ID, format!("{}{}", MODIFIED_LAYER_PREFIX, group));
            let position = merged.position(layer).map_or(0, |p| p + 1);
            merged.insert_child(staff, position, copy);
        }
    }
    Ok(())
}

fn drop_anchored_elements(tree: &mut MeiTree) {
    let anchored: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&id| ANCHOR_ATTRIBUTES.iter().any(|a| tree.has_attribute(id, a)))
        .collect();
    for &id in &anchored {
        log::debug!(
            "dropping {} from diff tree: its anchor cannot be relocated",
            tree.name(id).unwrap_or("element")
        );
        tree.detach(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::colorize::hide_layer_content;
    use crate::converters::xml::parse_mei;
    use crate::diff::{patch, EditAction};

    const SOURCE: &str = r##"<section>
        <measure><staff n="1"><layer><note dur="2"/><note dur="2"/></layer></staff>
                 <trill startid="#m-3"/></measure>
        <measure><staff n="1"><layer><rest dur="1"/></layer></staff></measure>
      </section>"##;

    fn run(script: &[EditAction]) -> Result<MeiTree, CompareError> {
        let source = parse_mei(SOURCE).unwrap();
        let (mut modified, _) = patch(script, &source).unwrap();
        hide_layer_content(&mut modified);
        structural_merge(&source, &modified)
    }

    fn layer_ids(tree: &MeiTree) -> Vec<String> {
        tree.find_all("layer")
            .into_iter()
            .map(|l| tree.attribute(l, XML_ID).unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_unchanged_layers_are_resolved() {
        let merged = run(&[]).unwrap();
        assert_eq!(layer_ids(&merged), vec!["m-r1", "m-r2"]);
        assert!(merged.find_first("trill").is_none());
    }

    #[test]
    fn test_changed_layer_is_paired() {
        let source = parse_mei(SOURCE).unwrap();
        let (mut modified, _) = patch(
            &[EditAction::InsertNode {
                target: "/section/measure[2]/staff/layer".into(),
                tag: "note".into(),
                position: 1,
            }],
            &source,
        )
        .unwrap();
        hide_layer_content(&mut modified);
        let inserted = modified.find_all("note")[2];
        modified.set_attribute(inserted, "visible", "true");
        let merged = structural_merge(&source, &modified).unwrap();
        assert_eq!(layer_ids(&merged), vec!["m-r1", "m-a2", "m-b2"]);
        let staff = merged.find_all("staff")[1];
        assert_eq!(merged.children_named(staff, "layer").count(), 2);
    }

    #[test]
    fn test_layer_count_mismatch() {
        let err = run(&[EditAction::InsertNode {
            target: "/section/measure[2]/staff".into(),
            tag: "layer".into(),
            position: 1,
        }])
        .unwrap_err();
        assert!(matches!(
            err,
            CompareError::StructuralMismatch {
                measure: 2,
                level: StructureLevel::Layer,
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_inserted_measure_follows_its_predecessor() {
        let merged = run(&[EditAction::InsertNode {
            target: "/section".into(),
            tag: "measure".into(),
            position: 1,
        }])
        .unwrap();
        let section = merged.root();
        let measures: Vec<_> = merged.children_named(section, "measure").collect();
        assert_eq!(measures.len(), 3);
        assert_eq!(merged.element_children(measures[1]).count(), 0);
    }
}
