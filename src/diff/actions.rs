//! Edit actions produced by a diff oracle
//!
//! Paths are evaluated against the tree as it stands when the action is
//! applied, so an action may address nodes created earlier in the same script.

use crate::models::{XLINK_NS, XML_NS};
use serde::{Deserialize, Serialize};

/// One step of an edit script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum EditAction {
    InsertNode {
        target: String,
        tag: String,
        position: usize,
    },
    DeleteNode {
        node: String,
    },
    RenameNode {
        node: String,
        tag: String,
    },
    MoveNode {
        node: String,
        target: String,
        position: usize,
    },
    UpdateTextIn {
        node: String,
        text: Option<String>,
    },
    UpdateTextAfter {
        node: String,
        text: Option<String>,
    },
    UpdateAttrib {
        node: String,
        name: String,
        value: String,
    },
    DeleteAttrib {
        node: String,
        name: String,
    },
    InsertAttrib {
        node: String,
        name: String,
        value: String,
    },
    RenameAttrib {
        node: String,
        oldname: String,
        newname: String,
    },
    InsertComment {
        target: String,
        position: usize,
        text: String,
    },
}

/// How an action shows up in a track-changes rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Insertion,
    Deletion,
    Update,
}

impl EditAction {
    pub fn kind(&self) -> ChangeKind {
        match self {
            EditAction::InsertNode { .. } | EditAction::InsertComment { .. } => ChangeKind::Insertion,
            EditAction::DeleteNode { .. } => ChangeKind::Deletion,
            _ => ChangeKind::Update,
        }
    }

    /// Path of the node the action reads or writes first
    pub fn path(&self) -> &str {
        match self {
            EditAction::InsertNode { target, .. } | EditAction::InsertComment { target, .. } => target,
            EditAction::DeleteNode { node }
            | EditAction::RenameNode { node, .. }
            | EditAction::MoveNode { node, .. }
            | EditAction::UpdateTextIn { node, .. }
            | EditAction::UpdateTextAfter { node, .. }
            | EditAction::UpdateAttrib { node, .. }
            | EditAction::DeleteAttrib { node, .. }
            | EditAction::InsertAttrib { node, .. }
            | EditAction::RenameAttrib { node, .. } => node,
        }
    }
}

/// Split a Clark-notation name `{uri}local` into namespace and local name
pub fn split_clark(name: &str) -> (Option<&str>, &str) {
    if let Some(rest) = name.strip_prefix('{') {
        if let Some((uri, local)) = rest.split_once('}') {
            return (Some(uri), local);
        }
    }
    (None, name)
}

/// Attribute key as stored on elements (`xml:id`, `xlink:href`, or a plain name)
pub fn attribute_key(name: &str) -> String {
    match split_clark(name) {
        (Some(XML_NS), local) => format!("xml:{}", local),
        (Some(XLINK_NS), local) => format!("xlink:{}", local),
        (_, local) => local.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        let insert = EditAction::InsertNode {
            target: "/mei".into(),
            tag: "note".into(),
            position: 0,
        };
        let delete = EditAction::DeleteNode { node: "/mei/note".into() };
        let moved = EditAction::MoveNode {
            node: "/mei/note".into(),
            target: "/mei".into(),
            position: 1,
        };
        assert_eq!(insert.kind(), ChangeKind::Insertion);
        assert_eq!(delete.kind(), ChangeKind::Deletion);
        assert_eq!(moved.kind(), ChangeKind::Update);
        assert_eq!(insert.path(), "/mei");
    }

    #[test]
    fn test_clark_names() {
        assert_eq!(
            split_clark("{http://www.music-encoding.org/ns/mei}note"),
            (Some("http://www.music-encoding.org/ns/mei"), "note")
        );
        assert_eq!(split_clark("note"), (None, "note"));
        assert_eq!(attribute_key("{http://www.w3.org/XML/1998/namespace}id"), "xml:id");
        assert_eq!(attribute_key("dur"), "dur");
    }

    #[test]
    fn test_json_shape() {
        let action: EditAction = serde_json::from_str(
            r#"{"action":"UpdateAttrib","node":"/mei/note[2]","name":"octname","value":"4:d"}"#,
        )
        .unwrap();
        assert_eq!(
            action,
            EditAction::UpdateAttrib {
                node: "/mei/note[2]".into(),
                name: "octname".into(),
                value: "4:d".into(),
            }
        );
    }
}
