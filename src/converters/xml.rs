//! XML serialization boundary
//!
//! Reading uses roxmltree (zero-copy parse, then copied into an owned
//! [`MeiTree`]); writing uses quick-xml. Whitespace-only text is dropped on
//! read, so documents survive a write/read cycle unchanged.

use crate::errors::{MeiError, ParseError};
use crate::models::tree::{MeiTree, NodeId, NodeKind};
use crate::models::{XLINK_NS, XML_NS};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use roxmltree::{Document, Node};

/// Parse an MEI document (or any fragment with a single root element)
pub fn parse_mei(xml: &str) -> Result<MeiTree, ParseError> {
    // roxmltree rejects DTDs, and the DOCTYPE carries nothing we keep
    let stripped;
    let xml = if xml.contains("<!DOCTYPE") {
        stripped = xml
            .lines()
            .filter(|line| !line.trim_start().starts_with("<!DOCTYPE"))
            .collect::<Vec<_>>()
            .join("\n");
        stripped.as_str()
    } else {
        xml
    };

    let doc = Document::parse(xml)
        .map_err(|e| ParseError::InvalidXml(format!("XML parse error: {}", e)))?;
    let root = doc.root_element();

    let mut tree = MeiTree::new(root.tag_name().name(), root.tag_name().namespace());
    let tree_root = tree.root();
    copy_attributes(&mut tree, tree_root, root);
    copy_children(&mut tree, tree_root, root);

    log::debug!("parsed MEI document with {} nodes", tree.node_count());
    Ok(tree)
}

fn copy_attributes(tree: &mut MeiTree, id: NodeId, node: Node) {
    for attr in node.attributes() {
        let name = match attr.namespace() {
            Some(XML_NS) => format!("xml:{}", attr.name()),
            Some(uri) => match node.lookup_prefix(uri) {
                Some(prefix) if !prefix.is_empty() => format!("{}:{}", prefix, attr.name()),
                _ => attr.name().to_string(),
            },
            None => attr.name().to_string(),
        };
        tree.set_attribute(id, &name, attr.value());
    }
}

fn copy_children(tree: &mut MeiTree, parent: NodeId, node: Node) {
    let mut previous: Option<NodeId> = None;

    for child in node.children() {
        if child.is_element() {
            let id = tree.create_element(child.tag_name().name(), child.tag_name().namespace());
            copy_attributes(tree, id, child);
            tree.append_child(parent, id);
            copy_children(tree, id, child);
            previous = Some(id);
        } else if child.is_comment() {
            let id = tree.create_comment(child.text().unwrap_or(""));
            tree.append_child(parent, id);
            previous = Some(id);
        } else if child.is_text() {
            let text = child.text().unwrap_or("");
            if text.trim().is_empty() {
                continue;
            }
            // Text after a child belongs to that child's tail
            match previous {
                Some(prev) => {
                    let tail = format!("{}{}", tree.tail(prev).unwrap_or(""), text);
                    tree.set_tail(prev, Some(tail));
                }
                None => {
                    let own = format!("{}{}", tree.text(parent).unwrap_or(""), text);
                    tree.set_text(parent, Some(own));
                }
            }
        }
    }
}

fn write_error(e: impl std::fmt::Display) -> MeiError {
    MeiError::Write(e.to_string())
}

/// Serialize a tree to an XML string with declaration
pub fn write_mei(tree: &MeiTree) -> Result<String, MeiError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_error)?;

    let uses_xlink = tree
        .descendants(tree.root())
        .any(|id| tree.attributes(id).iter().any(|(k, _)| k.starts_with("xlink:")));
    let root_declarations: &[(&str, &str)] = if uses_xlink {
        &[("xmlns:xlink", XLINK_NS)]
    } else {
        &[]
    };

    write_node(&mut writer, tree, tree.root(), None, root_declarations)?;

    String::from_utf8(writer.into_inner()).map_err(write_error)
}

fn write_node(
    writer: &mut Writer<Vec<u8>>,
    tree: &MeiTree,
    id: NodeId,
    parent_namespace: Option<&str>,
    declarations: &[(&str, &str)],
) -> Result<(), MeiError> {
    match tree.kind(id) {
        NodeKind::Comment(text) => {
            writer
                .write_event(Event::Comment(BytesText::from_escaped(text.as_str())))
                .map_err(write_error)?;
        }
        NodeKind::Element(element) => {
            let namespace = element.namespace.as_deref();
            let mut start = BytesStart::new(element.name.as_str());
            if namespace != parent_namespace {
                start.push_attribute(("xmlns", namespace.unwrap_or("")));
            }
            for &declaration in declarations {
                start.push_attribute(declaration);
            }
            for (name, value) in element.attributes() {
                start.push_attribute((name.as_str(), value.as_str()));
            }

            let children = tree.children(id);
            if children.is_empty() && tree.text(id).is_none() {
                writer.write_event(Event::Empty(start)).map_err(write_error)?;
            } else {
                writer.write_event(Event::Start(start)).map_err(write_error)?;
                if let Some(text) = tree.text(id) {
                    writer
                        .write_event(Event::Text(BytesText::new(text)))
                        .map_err(write_error)?;
                }
                for &child in children {
                    write_node(writer, tree, child, namespace, &[])?;
                }
                writer
                    .write_event(Event::End(BytesEnd::new(element.name.as_str())))
                    .map_err(write_error)?;
            }
        }
    }

    if let Some(tail) = tree.tail(id) {
        writer
            .write_event(Event::Text(BytesText::new(tail)))
            .map_err(write_error)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MEI_NS, XML_ID};

    const SAMPLE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE mei>
<mei xmlns="http://www.music-encoding.org/ns/mei" xmlns:xlink="http://www.w3.org/1999/xlink">
  <music>
    <!-- first measure -->
    <measure xml:id="m1">
      <staff n="1">
        <layer n="1">
          <note pname="c" oct="4" dur="4"/>
          <verse><syl>la</syl> tail</verse>
          <ref xlink:href="#m1"/>
        </layer>
      </staff>
    </measure>
  </music>
</mei>"##;

    #[test]
    fn test_parse_keeps_structure_namespaces_and_prefixes() {
        let tree = parse_mei(SAMPLE).unwrap();
        assert_eq!(tree.name(tree.root()), Some("mei"));
        assert_eq!(tree.namespace(tree.root()), Some(MEI_NS));

        let measure = tree.find_first("measure").unwrap();
        assert_eq!(tree.attribute(measure, XML_ID), Some("m1"));

        let music = tree.find_first("music").unwrap();
        assert!(tree.is_comment(tree.children(music)[0]));

        let syl = tree.find_first("syl").unwrap();
        assert_eq!(tree.text(syl), Some("la"));
        assert_eq!(tree.tail(syl), Some(" tail"));

        let reference = tree.find_first("ref").unwrap();
        assert_eq!(tree.attribute(reference, "xlink:href"), Some("#m1"));
    }

    #[test]
    fn test_write_then_parse_is_stable() {
        let tree = parse_mei(SAMPLE).unwrap();
        let xml = write_mei(&tree).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("xmlns:xlink"));
        let reparsed = parse_mei(&xml).unwrap();
        assert_eq!(tree, reparsed);
    }

    #[test]
    fn test_invalid_xml_is_reported() {
        let err = parse_mei("<mei><music></mei>").unwrap_err();
        assert!(matches!(err, ParseError::InvalidXml(_)));
    }
}
