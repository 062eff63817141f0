//! Track-changes highlighting
//!
//! Each changed node is classified by its first recorded action. Insertions
//! are shown on the modified side, deletions on the original side, and
//! updates on both. Highlighting a member of a chord or beam highlights the
//! whole group.

use crate::compare::CompareConfig;
use crate::diff::{ChangeKind, CorrespondenceTable};
use crate::models::events::is_group;
use crate::models::{MeiTree, NodeId};

/// Hide everything inside every layer so only highlighted nodes show
pub fn hide_layer_content(tree: &mut MeiTree) {
    let hidden: Vec<NodeId> = tree
        .find_all("layer")
        .into_iter()
        .flat_map(|layer| tree.descendants(layer).skip(1).collect::<Vec<_>>())
        .filter(|&id| tree.is_element(id))
        .collect();
    for id in hidden {
        tree.set_attribute(id, "visible", "false");
    }
}

/// True if no element inside `layer` is visible
pub fn is_hidden(tree: &MeiTree, layer: NodeId) -> bool {
    tree.descendants(layer)
        .skip(1)
        .filter(|&id| tree.is_element(id))
        .all(|id| tree.attribute(id, "visible") == Some("false"))
}

/// The outermost chord or beam containing a node, the node itself included.
/// Layer scheduling treats that group as one event.
fn enclosing_group(tree: &MeiTree, id: NodeId) -> Option<NodeId> {
    std::iter::once(id)
        .chain(tree.ancestors(id))
        .filter(|&n| is_group(tree, n))
        .last()
}

fn highlight(tree: &mut MeiTree, id: NodeId, color: &str) {
    if !tree.is_element(id) {
        return;
    }
    let targets: Vec<NodeId> = match enclosing_group(tree, id) {
        Some(group) => tree.descendants(group).filter(|&n| tree.is_element(n)).collect(),
        None => vec![id],
    };
    for target in targets {
        tree.set_attribute(target, "color", color);
        tree.set_attribute(target, "visible", "true");
    }
}

/// Highlight every tracked change. Returns how many changes were highlighted.
pub fn colorize(
    original: &mut MeiTree,
    modified: &mut MeiTree,
    table: &CorrespondenceTable,
    config: &CompareConfig,
) -> usize {
    let mut count = 0;
    for node in table.changed() {
        let Some(first) = node.first_action() else {
            continue;
        };
        let kind = first.kind();

        if matches!(kind, ChangeKind::Insertion | ChangeKind::Update) && modified.is_attached(node.modified) {
            highlight(modified, node.modified, &config.modified_color);
        }
        if matches!(kind, ChangeKind::Deletion | ChangeKind::Update) {
            if let Some(original_id) = node.original {
                highlight(original, original_id, &config.original_color);
            }
        }
        count += 1;
    }
    log::debug!("colorized {} changed nodes", count);
    count
}
