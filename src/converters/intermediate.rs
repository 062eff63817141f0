//! Plain ↔ intermediate representation
//!
//! A pitch is spread over two attributes (`pname`, `oct`), so a pitch change
//! would show up as two unrelated attribute edits in a diff. The intermediate
//! form folds both into one composite attribute, `octname="4:c"`, and drops
//! every identifier so stale ids cannot bias the diff.
//!
//! Identifiers are not restored by [`to_plain`]; they are regenerated
//! downstream.

use crate::errors::RepresentationError;
use crate::models::{MeiTree, NodeId, XML_ID};
use crate::transform::strip_attributes;

/// Composite pitch attribute of the intermediate form
pub const COMPOSITE_PITCH: &str = "octname";

/// True iff any note carries the composite pitch attribute
pub fn is_intermediate(tree: &MeiTree) -> bool {
    tree.descendants(tree.root())
        .any(|id| tree.is(id, "note") && tree.has_attribute(id, COMPOSITE_PITCH))
}

/// Fold `pname`/`oct` into the composite attribute and strip identifiers
pub fn to_intermediate(tree: &mut MeiTree) -> Result<(), RepresentationError> {
    if is_intermediate(tree) {
        return Err(RepresentationError::AlreadyIntermediate);
    }

    let notes: Vec<NodeId> = tree
        .find_all("note")
        .into_iter()
        .filter(|&n| tree.has_attribute(n, "pname") && tree.has_attribute(n, "oct"))
        .collect();

    for &note in &notes {
        let pname = tree.remove_attribute(note, "pname").unwrap_or_default();
        let octave = tree.remove_attribute(note, "oct").unwrap_or_default();
        tree.set_attribute(note, COMPOSITE_PITCH, format!("{}:{}", octave, pname));
    }
    strip_attributes(tree, &[XML_ID]);

    log::debug!("converted {} notes to intermediate pitch form", notes.len());
    Ok(())
}

/// Split the composite attribute back into `pname` and `oct`.
///
/// All composite values are checked before anything is changed, so a
/// malformed value leaves the tree untouched.
pub fn to_plain(tree: &mut MeiTree) -> Result<(), RepresentationError> {
    if !is_intermediate(tree) {
        return Err(RepresentationError::NotIntermediate);
    }

    let mut split = Vec::new();
    for note in tree.find_all("note") {
        let Some(value) = tree.attribute(note, COMPOSITE_PITCH) else {
            continue;
        };
        let (octave, pname) = value
            .split_once(':')
            .ok_or_else(|| RepresentationError::MalformedComposite {
                value: value.to_string(),
            })?;
        split.push((note, octave.to_string(), pname.to_string()));
    }

    for (note, octave, pname) in split {
        tree.remove_attribute(note, COMPOSITE_PITCH);
        tree.set_attribute(note, "pname", pname);
        tree.set_attribute(note, "oct", octave);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::xml::parse_mei;

    fn sample() -> MeiTree {
        parse_mei(
            r#"<layer xml:id="l1">
                 <note xml:id="n1" pname="c" oct="4" dur="4"/>
                 <note xml:id="n2" pname="e" dur="4"/>
                 <rest xml:id="r1" dur="4"/>
               </layer>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_to_intermediate_folds_pitch_and_strips_ids() {
        let mut tree = sample();
        to_intermediate(&mut tree).unwrap();

        assert!(is_intermediate(&tree));
        let notes = tree.find_all("note");
        assert_eq!(tree.attribute(notes[0], COMPOSITE_PITCH), Some("4:c"));
        assert_eq!(tree.attribute(notes[0], "pname"), None);
        // Only notes with both halves are folded
        assert_eq!(tree.attribute(notes[1], "pname"), Some("e"));
        assert!(tree
            .descendants(tree.root())
            .all(|id| !tree.has_attribute(id, XML_ID)));
    }

    #[test]
    fn test_double_conversion_is_rejected() {
        let mut tree = sample();
        to_intermediate(&mut tree).unwrap();
        assert_eq!(
            to_intermediate(&mut tree),
            Err(RepresentationError::AlreadyIntermediate)
        );

        let mut plain = sample();
        assert_eq!(to_plain(&mut plain), Err(RepresentationError::NotIntermediate));
    }

    #[test]
    fn test_round_trip_restores_pitch() {
        let mut tree = sample();
        to_intermediate(&mut tree).unwrap();
        to_plain(&mut tree).unwrap();

        assert!(!is_intermediate(&tree));
        let note = tree.find_first("note").unwrap();
        assert_eq!(tree.attribute(note, "pname"), Some("c"));
        assert_eq!(tree.attribute(note, "oct"), Some("4"));
        assert_eq!(tree.attribute(note, "dur"), Some("4"));
        assert_eq!(tree.attribute(note, XML_ID), None);
    }

    #[test]
    fn test_malformed_composite_leaves_tree_untouched() {
        let mut tree = parse_mei(r#"<layer><note octname="4:c"/><note octname="bogus"/></layer>"#).unwrap();
        let before = tree.clone();
        assert_eq!(
            to_plain(&mut tree),
            Err(RepresentationError::MalformedComposite { value: "bogus".to_string() })
        );
        assert_eq!(tree, before);
    }
}
