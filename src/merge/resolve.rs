//! Resolution state of a compared document

use crate::models::{MeiTree, XML_ID};
use once_cell::sync::Lazy;
use regex::Regex;

static RESOLVED_LAYER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^m-r[0-9]+").expect("static regex is valid"));

/// True once every layer of the document has been resolved or merged
pub fn is_resolved(tree: &MeiTree) -> bool {
    let resolved = tree.find_all("layer").into_iter().all(|layer| {
        tree.attribute(layer, XML_ID)
            .is_some_and(|id| RESOLVED_LAYER_ID.is_match(id))
    });
    log::debug!("document resolved: {}", resolved);
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::xml::parse_mei;

    #[test]
    fn test_resolved_layers() {
        let tree = parse_mei(
            r#"<measure><staff><layer xml:id="m-r1"/></staff><staff><layer xml:id="m-r12"/></staff></measure>"#,
        )
        .unwrap();
        assert!(is_resolved(&tree));
    }

    #[test]
    fn test_unresolved_layers() {
        let pair = parse_mei(
            r#"<measure><staff><layer xml:id="m-a1"/><layer xml:id="m-b1"/></staff></measure>"#,
        )
        .unwrap();
        assert!(!is_resolved(&pair));

        let missing = parse_mei(r#"<measure><staff><layer/></staff></measure>"#).unwrap();
        assert!(!is_resolved(&missing));
    }
}
