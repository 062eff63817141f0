//! Layer merge by interval scheduling
//!
//! Layers of a staff are grouped by the digits of their identifiers
//! (`m-a3`/`m-b3` form group "3"). Each pair is merged when its visible
//! events never overlap in time: a greedy earliest-finish selection over the
//! pooled events must keep all of them. The merged layer holds copies of the
//! visible events ordered by start time and replaces the pair.

use crate::compare::RESOLVED_PREFIX;
use crate::errors::MergeError;
use crate::models::events::{is_visible, timed_events, TimedEvent};
use crate::models::{MeiTree, NodeId, XML_ID};

/// Largest subset of mutually non-overlapping events (earliest finish first).
///
/// Events without a known start or duration are skipped.
pub fn max_compatible_subset(events: &[TimedEvent]) -> Vec<TimedEvent> {
    let mut sorted: Vec<TimedEvent> = events
        .iter()
        .copied()
        .filter(|e| e.finish().is_some())
        .collect();
    sorted.sort_by_key(|e| e.finish());

    let mut selected: Vec<TimedEvent> = Vec::new();
    for event in sorted {
        let compatible = match selected.last().and_then(|last| last.finish()) {
            None => true,
            Some(finish) => event.start.is_some_and(|start| start >= finish),
        };
        if compatible {
            selected.push(event);
        }
    }
    selected
}

fn group_key(tree: &MeiTree, layer: NodeId) -> String {
    tree.attribute(layer, XML_ID)
        .unwrap_or("")
        .chars()
        .filter(char::is_ascii_digit)
        .collect()
}

fn event_label(tree: &MeiTree, event: &TimedEvent) -> String {
    match tree.attribute(event.node, XML_ID) {
        Some(id) => id.to_string(),
        None => {
            let name = tree.name(event.node).unwrap_or("event");
            match event.start {
                Some(start) => format!("{}@{}", name, start),
                None => name.to_string(),
            }
        }
    }
}

/// Merge one pair of layers into a new, detached layer
fn merge_pair(tree: &mut MeiTree, staff: &str, group: &str, layers: &[NodeId]) -> Result<NodeId, MergeError> {
    let mut visible = Vec::new();
    for &layer in layers {
        for event in timed_events(tree, layer) {
            if !is_visible(tree, event.node) {
                continue;
            }
            if event.finish().is_none() {
                return Err(MergeError::UnknownDuration {
                    staff: staff.to_string(),
                    group: group.to_string(),
                    event: event_label(tree, &event),
                });
            }
            visible.push(event);
        }
    }

    let mut selected = max_compatible_subset(&visible);
    if selected.len() != visible.len() {
        let conflicting = visible
            .iter()
            .filter(|e| !selected.iter().any(|s| s.node == e.node))
            .map(|e| event_label(tree, e))
            .collect();
        return Err(MergeError::LayersOverlap {
            staff: staff.to_string(),
            group: group.to_string(),
            conflicting,
        });
    }
    selected.sort_by_key(|e| e.start);

    let namespace = tree.namespace(layers[0]).map(str::to_string);
    let merged = tree.create_element("layer", namespace.as_deref());
    if !group.is_empty() {
        tree.set_attribute(merged, XML_ID, format!("{}{}", RESOLVED_PREFIX, group));
    }
    if let Some(n) = tree.attribute(layers[0], "n").map(str::to_string) {
        tree.set_attribute(merged, "n", n);
    }
    for event in &selected {
        let copy = tree.duplicate(event.node);
        tree.append_child(merged, copy);
    }

    log::debug!(
        "merged layer group '{}' of staff {}: {} events",
        group,
        staff,
        selected.len()
    );
    Ok(merged)
}

/// Merge the layer groups of every staff of `measure`, in place.
///
/// Every staff is merged before any is changed, so on error the measure is
/// left as it was. Groups with a single layer are kept as they are.
pub fn merge_measure_layers(tree: &mut MeiTree, measure: NodeId) -> Result<(), MergeError> {
    if !tree.is(measure, "measure") {
        return Err(MergeError::NotAMeasure {
            found: tree.name(measure).unwrap_or("comment").to_string(),
        });
    }

    let staves: Vec<NodeId> = tree.children_named(measure, "staff").collect();
    let mut plans: Vec<(NodeId, Vec<NodeId>, Vec<NodeId>)> = Vec::new();

    for (index, &staff) in staves.iter().enumerate() {
        let label = tree
            .attribute(staff, "n")
            .map(str::to_string)
            .unwrap_or_else(|| (index + 1).to_string());
        let layers: Vec<NodeId> = tree.children_named(staff, "layer").collect();

        let mut groups: Vec<(String, Vec<NodeId>)> = Vec::new();
        for &layer in &layers {
            let key = group_key(tree, layer);
            match groups.iter_mut().find(|(k, _)| *k == key) {
                Some((_, members)) => members.push(layer),
                None => groups.push((key, vec![layer])),
            }
        }

        let mut replacements = Vec::new();
        for (key, members) in &groups {
            match members.len() {
                1 => replacements.push(members[0]),
                2 => replacements.push(merge_pair(tree, &label, key, members)?),
                count => {
                    return Err(MergeError::UnsupportedLayerCount {
                        staff: label,
                        group: key.clone(),
                        count,
                    })
                }
            }
        }
        plans.push((staff, layers, replacements));
    }

    for (staff, layers, replacements) in plans {
        // Replacements take the place of the first replaced layer
        let anchor = layers
            .first()
            .and_then(|&layer| tree.position(layer))
            .unwrap_or_else(|| tree.children(staff).len());
        for layer in layers {
            tree.detach(layer);
        }
        for (offset, layer) in replacements.into_iter().enumerate() {
            tree.insert_child(staff, anchor + offset, layer);
        }
    }
    Ok(())
}

/// Merge the layers of a standalone measure
pub fn merge_layers(mut measure: MeiTree) -> Result<MeiTree, MergeError> {
    let root = measure.root();
    merge_measure_layers(&mut measure, root)?;
    Ok(measure)
}
