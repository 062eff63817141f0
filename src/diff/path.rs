//! Absolute path expressions over a [`MeiTree`]
//!
//! The subset of XPath that diff oracles emit for node addressing:
//! `/step/step[n]/...` where a step is a name (`note`, `mei:note`,
//! `{uri}note`), `*`, or `comment()`, optionally followed by a 1-based
//! position among the siblings matching the same test.

use crate::diff::actions::split_clark;
use crate::errors::PatchError;
use crate::models::{MeiTree, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeTest<'a> {
    AnyElement,
    Comment,
    Named {
        namespace: Option<&'a str>,
        local: &'a str,
    },
}

impl NodeTest<'_> {
    fn matches(&self, tree: &MeiTree, id: NodeId) -> bool {
        match self {
            NodeTest::AnyElement => tree.is_element(id),
            NodeTest::Comment => tree.is_comment(id),
            NodeTest::Named { namespace, local } => {
                tree.is(id, local) && namespace.map_or(true, |ns| tree.namespace(id) == Some(ns))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step<'a> {
    test: NodeTest<'a>,
    position: Option<usize>,
}

/// Split on `/` outside of `{...}` and `[...]`
fn split_steps(path: &str) -> Vec<&str> {
    let mut steps = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in path.char_indices() {
        match c {
            '{' | '[' => depth += 1,
            '}' | ']' => depth -= 1,
            '/' if depth == 0 => {
                steps.push(&path[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    steps.push(&path[start..]);
    steps
}

fn parse_step<'a>(step: &'a str, path: &str) -> Result<Step<'a>, PatchError> {
    let invalid = || PatchError::InvalidPath {
        path: path.to_string(),
    };

    let (test, position) = match step.strip_suffix(']') {
        Some(rest) => {
            let open = rest.rfind('[').ok_or_else(invalid)?;
            let n: usize = rest[open + 1..].trim().parse().map_err(|_| invalid())?;
            if n == 0 {
                return Err(invalid());
            }
            (&rest[..open], Some(n))
        }
        None => (step, None),
    };

    let test = match test {
        "" => return Err(invalid()),
        "*" => NodeTest::AnyElement,
        "comment()" => NodeTest::Comment,
        name if name.starts_with('{') => {
            let (namespace, local) = split_clark(name);
            NodeTest::Named { namespace, local }
        }
        name if name.contains('(') => return Err(invalid()),
        name => NodeTest::Named {
            namespace: None,
            local: name.rsplit(':').next().unwrap_or(name),
        },
    };
    Ok(Step { test, position })
}

fn parse(path: &str) -> Result<Vec<Step<'_>>, PatchError> {
    let rest = path.strip_prefix('/').ok_or_else(|| PatchError::InvalidPath {
        path: path.to_string(),
    })?;
    split_steps(rest).into_iter().map(|s| parse_step(s, path)).collect()
}

/// Every node the path selects, in document order
pub fn resolve(tree: &MeiTree, path: &str) -> Result<Vec<NodeId>, PatchError> {
    let steps = parse(path)?;

    // The first step is evaluated against the document node, whose only child is the root
    let mut context: Vec<NodeId> = Vec::new();
    for (i, step) in steps.iter().enumerate() {
        let candidates: Vec<Vec<NodeId>> = if i == 0 {
            vec![vec![tree.root()]]
        } else {
            context.iter().map(|&id| tree.children(id).to_vec()).collect()
        };

        context = candidates
            .into_iter()
            .flat_map(|siblings| {
                let matching: Vec<NodeId> = siblings
                    .into_iter()
                    .filter(|&c| step.test.matches(tree, c))
                    .collect();
                match step.position {
                    Some(n) => matching.get(n - 1).copied().into_iter().collect(),
                    None => matching,
                }
            })
            .collect();

        if context.is_empty() {
            break;
        }
    }
    Ok(context)
}

/// First node the path selects
pub fn resolve_one(tree: &MeiTree, path: &str) -> Result<NodeId, PatchError> {
    resolve(tree, path)?
        .into_iter()
        .next()
        .ok_or_else(|| PatchError::PathNotFound {
            path: path.to_string(),
        })
}

/// Canonical path of an attached node. The position predicate is omitted
/// when the node is the only sibling matching its test.
pub fn path_of(tree: &MeiTree, id: NodeId) -> String {
    let mut steps = Vec::new();
    let mut current = id;
    loop {
        let step_name = match tree.name(current) {
            Some(name) => name.to_string(),
            None => "comment()".to_string(),
        };
        match tree.parent(current) {
            None => {
                steps.push(step_name);
                break;
            }
            Some(parent) => {
                let same: Vec<NodeId> = tree
                    .children(parent)
                    .iter()
                    .copied()
                    .filter(|&c| match tree.name(current) {
                        Some(name) => tree.is(c, name),
                        None => tree.is_comment(c),
                    })
                    .collect();
                if same.len() > 1 {
                    let index = same.iter().position(|&c| c == current).unwrap_or(0) + 1;
                    steps.push(format!("{}[{}]", step_name, index));
                } else {
                    steps.push(step_name);
                }
                current = parent;
            }
        }
    }
    steps.reverse();
    format!("/{}", steps.join("/"))
}
