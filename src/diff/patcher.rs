//! Edit-script application with per-node change tracking
//!
//! The source tree is cloned and every source node is paired with its clone
//! before any edit runs. Each applied action is then recorded against the
//! node it touched on the modified side. Nodes created by the script get an
//! entry with no original; deleted nodes keep theirs, so the deletion can be
//! marked on the original side.

use crate::diff::actions::{attribute_key, split_clark, EditAction};
use crate::diff::path::resolve_one;
use crate::errors::PatchError;
use crate::models::{MeiTree, NodeId};
use std::collections::HashMap;

/// A node of the modified tree, its source counterpart and the edits applied to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedNode {
    /// `None` for nodes the script inserted
    pub original: Option<NodeId>,
    pub modified: NodeId,
    pub actions: Vec<EditAction>,
}

impl TrackedNode {
    pub fn first_action(&self) -> Option<&EditAction> {
        self.actions.first()
    }
}

/// Correspondence between original and modified nodes for one patch run
#[derive(Debug, Clone, Default)]
pub struct CorrespondenceTable {
    nodes: Vec<TrackedNode>,
    by_modified: HashMap<NodeId, usize>,
}

impl CorrespondenceTable {
    fn track(&mut self, original: Option<NodeId>, modified: NodeId) {
        self.by_modified.insert(modified, self.nodes.len());
        self.nodes.push(TrackedNode {
            original,
            modified,
            actions: Vec::new(),
        });
    }

    fn register(&mut self, modified: NodeId, action: EditAction) {
        if !self.by_modified.contains_key(&modified) {
            self.track(None, modified);
        }
        let index = self.by_modified[&modified];
        self.nodes[index].actions.push(action);
    }

    pub fn get(&self, modified: NodeId) -> Option<&TrackedNode> {
        self.by_modified.get(&modified).map(|&i| &self.nodes[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedNode> {
        self.nodes.iter()
    }

    /// Entries that had at least one action applied
    pub fn changed(&self) -> impl Iterator<Item = &TrackedNode> {
        self.nodes.iter().filter(|n| !n.actions.is_empty())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Applies edit actions to a private clone of a source tree
pub struct TrackedPatcher {
    tree: MeiTree,
    table: CorrespondenceTable,
}

impl TrackedPatcher {
    pub fn new(source: &MeiTree) -> Self {
        let tree = source.clone();
        let mut table = CorrespondenceTable::default();

        // A clone preserves order and shape, so a lockstep walk pairs each node with its copy
        for (original, modified) in source
            .descendants(source.root())
            .zip(tree.descendants(tree.root()))
        {
            table.track(Some(original), modified);
        }

        Self { tree, table }
    }

    /// Modified tree as it stands
    pub fn view(&self) -> &MeiTree {
        &self.tree
    }

    pub fn finish(self) -> (MeiTree, CorrespondenceTable) {
        (self.tree, self.table)
    }

    fn element_at(&self, path: &str) -> Result<NodeId, PatchError> {
        let id = resolve_one(&self.tree, path)?;
        if self.tree.is_element(id) {
            Ok(id)
        } else {
            Err(PatchError::NotAnElement {
                path: path.to_string(),
            })
        }
    }

    /// Apply one action and record it. Returns the node it was recorded against.
    pub fn apply(&mut self, action: &EditAction) -> Result<NodeId, PatchError> {
        log::debug!("apply {:?}", action);
        let touched = match action {
            EditAction::DeleteNode { node } => {
                let id = resolve_one(&self.tree, node)?;
                if id == self.tree.root() {
                    return Err(PatchError::InvalidPath { path: node.clone() });
                }
                self.tree.detach(id);
                id
            }
            EditAction::InsertNode { target, tag, position } => {
                let parent = self.element_at(target)?;
                let (namespace, local) = split_clark(tag);
                let namespace = namespace
                    .map(str::to_string)
                    .or_else(|| self.tree.namespace(parent).map(str::to_string));
                let id = self.tree.create_element(local, namespace.as_deref());
                self.tree.insert_child(parent, *position, id);
                id
            }
            EditAction::RenameNode { node, tag } => {
                let id = self.element_at(node)?;
                let (namespace, local) = split_clark(tag);
                self.tree.rename(id, local);
                if let (Some(ns), Some(element)) = (namespace, self.tree.element_mut(id)) {
                    element.namespace = Some(ns.to_string());
                }
                id
            }
            EditAction::MoveNode { node, target, position } => {
                let id = resolve_one(&self.tree, node)?;
                if id == self.tree.root() {
                    return Err(PatchError::InvalidPath { path: node.clone() });
                }
                // The target path is evaluated with the node already taken out
                self.tree.detach(id);
                let parent = self.element_at(target)?;
                self.tree.insert_child(parent, *position, id);
                id
            }
            EditAction::UpdateTextIn { node, text } => {
                let id = resolve_one(&self.tree, node)?;
                if self.tree.is_comment(id) {
                    self.tree.set_comment_text(id, text.as_deref().unwrap_or(""));
                } else {
                    self.tree.set_text(id, text.clone());
                }
                id
            }
            EditAction::UpdateTextAfter { node, text } => {
                let id = resolve_one(&self.tree, node)?;
                self.tree.set_tail(id, text.clone());
                id
            }
            EditAction::UpdateAttrib { node, name, value } => {
                let id = self.element_at(node)?;
                let key = attribute_key(name);
                self.require_attribute(id, node, &key)?;
                self.tree.set_attribute(id, &key, value.as_str());
                id
            }
            EditAction::DeleteAttrib { node, name } => {
                let id = self.element_at(node)?;
                let key = attribute_key(name);
                self.require_attribute(id, node, &key)?;
                self.tree.remove_attribute(id, &key);
                id
            }
            EditAction::InsertAttrib { node, name, value } => {
                let id = self.element_at(node)?;
                let key = attribute_key(name);
                self.forbid_attribute(id, node, &key)?;
                self.tree.set_attribute(id, &key, value.as_str());
                id
            }
            EditAction::RenameAttrib { node, oldname, newname } => {
                let id = self.element_at(node)?;
                let (old, new) = (attribute_key(oldname), attribute_key(newname));
                self.require_attribute(id, node, &old)?;
                self.forbid_attribute(id, node, &new)?;
                let value = self.tree.remove_attribute(id, &old).unwrap_or_default();
                self.tree.set_attribute(id, &new, value);
                id
            }
            EditAction::InsertComment { target, position, text } => {
                let parent = self.element_at(target)?;
                let id = self.tree.create_comment(text);
                self.tree.insert_child(parent, *position, id);
                id
            }
        };

        self.table.register(touched, action.clone());
        Ok(touched)
    }

    fn require_attribute(&self, id: NodeId, path: &str, name: &str) -> Result<(), PatchError> {
        if self.tree.has_attribute(id, name) {
            Ok(())
        } else {
            Err(PatchError::AttributeMissing {
                path: path.to_string(),
                name: name.to_string(),
            })
        }
    }

    fn forbid_attribute(&self, id: NodeId, path: &str, name: &str) -> Result<(), PatchError> {
        if self.tree.has_attribute(id, name) {
            Err(PatchError::AttributeExists {
                path: path.to_string(),
                name: name.to_string(),
            })
        } else {
            Ok(())
        }
    }
}

/// Apply `actions` in order to a clone of `source`
pub fn patch(actions: &[EditAction], source: &MeiTree) -> Result<(MeiTree, CorrespondenceTable), PatchError> {
    let mut patcher = TrackedPatcher::new(source);
    for action in actions {
        patcher.apply(action)?;
    }
    Ok(patcher.finish())
}
