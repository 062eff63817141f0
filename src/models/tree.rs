//! Arena-backed MEI document tree
//!
//! Nodes live in a `Vec` and are addressed by [`NodeId`]. The tree owns its
//! nodes top-down; the parent link is only a navigation aid. Removing a node
//! detaches it without freeing its slot, so a `NodeId` stays valid (and keeps
//! naming the same node) for the lifetime of the tree. Cloning a tree copies
//! the arena, so a node and its counterpart in the clone share a `NodeId`.

use std::fmt;

/// Handle to a node inside a [`MeiTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An element: local name, namespace URI and ordered attributes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub namespace: Option<String>,
    attributes: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
            attributes: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Set an attribute, keeping its position if it already exists
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) -> Option<String> {
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.attributes.push((name.to_string(), value));
                None
            }
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(pos).1)
    }
}

/// What a node is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Element(Element),
    /// XML comment; carries no attributes and never receives an identifier
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    /// Text before the first child
    text: Option<String>,
    /// Text after this node's end tag, before the next sibling
    tail: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            text: None,
            tail: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// An ordered tree of MEI elements and comments
#[derive(Debug, Clone)]
pub struct MeiTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl MeiTree {
    /// Create a tree holding a single root element
    pub fn new(root_name: &str, namespace: Option<&str>) -> Self {
        let root = NodeData::new(NodeKind::Element(Element::new(
            root_name,
            namespace.map(str::to_string),
        )));
        Self {
            nodes: vec![root],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Comment(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].kind {
            NodeKind::Element(element) => Some(element),
            NodeKind::Comment(_) => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].kind, NodeKind::Comment(_))
    }

    /// Local name of an element, `None` for comments
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.name.as_str())
    }

    /// True if `id` is an element with local name `name`
    pub fn is(&self, id: NodeId, name: &str) -> bool {
        self.name(id) == Some(name)
    }

    pub fn namespace(&self, id: NodeId) -> Option<&str> {
        self.element(id).and_then(|e| e.namespace.as_deref())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attribute(name))
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        self.element(id).map(Element::attributes).unwrap_or(&[])
    }

    /// Set an attribute on an element. Comments are left alone.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) -> Option<String> {
        self.element_mut(id).and_then(|e| e.set_attribute(name, value))
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id).and_then(|e| e.remove_attribute(name))
    }

    pub fn rename(&mut self, id: NodeId, name: &str) {
        if let Some(element) = self.element_mut(id) {
            element.name = name.to_string();
        }
    }

    pub fn comment_text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].kind {
            NodeKind::Comment(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    pub fn set_comment_text(&mut self, id: NodeId, text: &str) {
        if let NodeKind::Comment(existing) = &mut self.nodes[id.0].kind {
            *existing = text.to_string();
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].text.as_deref()
    }

    pub fn set_text(&mut self, id: NodeId, text: Option<String>) {
        self.nodes[id.0].text = text;
    }

    pub fn tail(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].tail.as_deref()
    }

    pub fn set_tail(&mut self, id: NodeId, tail: Option<String>) {
        self.nodes[id.0].tail = tail;
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Element children of `id` in document order
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id).iter().copied().filter(move |&c| self.is_element(c))
    }

    /// Element children of `id` with the given local name
    pub fn children_named<'a>(&'a self, id: NodeId, name: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.children(id).iter().copied().filter(move |&c| self.is(c, name))
    }

    /// Index of `id` among its parent's children
    pub fn position(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Pre-order traversal of the subtree rooted at `id`, `id` included
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// Ancestors of `id`, nearest first, `id` excluded
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |&p| self.parent(p))
    }

    /// True if `id` is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        id == self.root || self.ancestors(id).any(|a| a == self.root)
    }

    /// All elements reachable from the root with the given local name
    pub fn find_all(&self, name: &str) -> Vec<NodeId> {
        self.descendants(self.root).filter(|&n| self.is(n, name)).collect()
    }

    pub fn find_first(&self, name: &str) -> Option<NodeId> {
        self.descendants(self.root).find(|&n| self.is(n, name))
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: &str, namespace: Option<&str>) -> NodeId {
        self.push(NodeData::new(NodeKind::Element(Element::new(
            name,
            namespace.map(str::to_string),
        ))))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::new(NodeKind::Comment(text.to_string())))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(data);
        NodeId(self.nodes.len() - 1)
    }

    /// Insert `child` under `parent` at `index` (clamped to the child count).
    /// `child` is detached from its current parent first.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    /// Unlink `id` from its parent. The node and its subtree stay addressable.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    /// Deep-copy the subtree rooted at `id` of `other` into this tree, detached
    pub fn import(&mut self, other: &MeiTree, id: NodeId) -> NodeId {
        let source = &other.nodes[id.0];
        let copy = self.push(NodeData {
            kind: source.kind.clone(),
            text: source.text.clone(),
            tail: source.tail.clone(),
            parent: None,
            children: Vec::new(),
        });
        for &child in &source.children {
            let child_copy = self.import(other, child);
            self.nodes[child_copy.0].parent = Some(copy);
            self.nodes[copy.0].children.push(child_copy);
        }
        copy
    }

    /// Independent tree whose root is a deep copy of `id`
    pub fn subtree(&self, id: NodeId) -> MeiTree {
        let mut tree = MeiTree {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        tree.root = tree.import(self, id);
        tree.nodes[tree.root.0].tail = None;
        tree
    }

    /// Deep copy of `id` inside this same tree, detached
    pub fn duplicate(&mut self, id: NodeId) -> NodeId {
        let snapshot = self.subtree(id);
        self.import(&snapshot, snapshot.root())
    }

    /// Number of nodes reachable from the root
    pub fn node_count(&self) -> usize {
        self.descendants(self.root).count()
    }

    fn subtree_eq(&self, id: NodeId, other: &MeiTree, other_id: NodeId) -> bool {
        let (a, b) = (&self.nodes[id.0], &other.nodes[other_id.0]);
        a.kind == b.kind
            && a.text == b.text
            && a.tail == b.tail
            && a.children.len() == b.children.len()
            && a.children
                .iter()
                .zip(&b.children)
                .all(|(&x, &y)| self.subtree_eq(x, other, y))
    }
}

/// Structural equality of the attached trees, independent of arena layout
impl PartialEq for MeiTree {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

/// Pre-order iterator over a subtree
pub struct Descendants<'a> {
    tree: &'a MeiTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (MeiTree, NodeId, NodeId, NodeId) {
        let mut tree = MeiTree::new("layer", None);
        let root = tree.root();
        let a = tree.create_element("note", None);
        let b = tree.create_element("rest", None);
        let c = tree.create_comment("hello");
        tree.append_child(root, a);
        tree.append_child(root, b);
        tree.append_child(a, c);
        (tree, a, b, c)
    }

    #[test]
    fn test_descendants_are_document_order() {
        let (tree, a, b, c) = sample();
        let order: Vec<_> = tree.descendants(tree.root()).collect();
        assert_eq!(order, vec![tree.root(), a, c, b]);
    }

    #[test]
    fn test_detach_keeps_node_addressable() {
        let (mut tree, a, _, c) = sample();
        tree.detach(a);
        assert!(!tree.is_attached(a));
        assert!(!tree.is_attached(c));
        assert_eq!(tree.name(a), Some("note"));
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_clone_shares_node_ids_but_not_storage() {
        let (tree, a, _, _) = sample();
        let mut copy = tree.clone();
        copy.set_attribute(a, "dur", "4");
        assert_eq!(copy.attribute(a, "dur"), Some("4"));
        assert_eq!(tree.attribute(a, "dur"), None);
    }

    #[test]
    fn test_set_attribute_keeps_order() {
        let (mut tree, a, _, _) = sample();
        tree.set_attribute(a, "pname", "c");
        tree.set_attribute(a, "oct", "4");
        tree.set_attribute(a, "pname", "d");
        let names: Vec<_> = tree.attributes(a).iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, vec!["pname", "oct"]);
        assert_eq!(tree.attribute(a, "pname"), Some("d"));
    }

    #[test]
    fn test_insert_child_clamps_index() {
        let (mut tree, a, b, _) = sample();
        let d = tree.create_element("space", None);
        tree.insert_child(tree.root(), 99, d);
        assert_eq!(tree.children(tree.root()), &[a, b, d]);
        assert_eq!(tree.position(d), Some(2));
    }

    #[test]
    fn test_subtree_equality_ignores_arena_layout() {
        let (tree, a, _, _) = sample();
        let sub = tree.subtree(a);
        let mut rebuilt = MeiTree::new("note", None);
        let comment = rebuilt.create_comment("hello");
        let root = rebuilt.root();
        rebuilt.append_child(root, comment);
        assert_eq!(sub, rebuilt);
    }
}
