use mei_compare::compare::{ComparisonStrategy, TreeComparison};
use mei_compare::diff::{path_of, DiffOptions, EditAction};
use mei_compare::errors::{CompareError, MergeError, OracleError, StructureLevel};
use mei_compare::merge::{is_resolved, merge_measure_layers};
use mei_compare::models::{MeiTree, NodeId, XML_ID};

/// Oracle for trees of identical shape: walks both in lockstep and reports
/// attribute differences only
fn attribute_oracle(a: &MeiTree, b: &MeiTree, _: &DiffOptions) -> Result<Vec<EditAction>, OracleError> {
    let mut script = Vec::new();
    walk(a, b, a.root(), b.root(), &mut script)?;
    Ok(script)
}

fn walk(a: &MeiTree, b: &MeiTree, x: NodeId, y: NodeId, script: &mut Vec<EditAction>) -> Result<(), OracleError> {
    if a.name(x) != b.name(y) {
        return Err(OracleError(format!("shape differs at {}", path_of(a, x))));
    }
    let node = path_of(a, x);
    for (name, value) in b.attributes(y) {
        match a.attribute(x, name) {
            None => script.push(EditAction::InsertAttrib {
                node: node.clone(),
                name: name.clone(),
                value: value.clone(),
            }),
            Some(old) if old != value => script.push(EditAction::UpdateAttrib {
                node: node.clone(),
                name: name.clone(),
                value: value.clone(),
            }),
            Some(_) => {}
        }
    }
    for (name, _) in a.attributes(x) {
        if !b.has_attribute(y, name) {
            script.push(EditAction::DeleteAttrib {
                node: node.clone(),
                name: name.clone(),
            });
        }
    }

    let left: Vec<NodeId> = a.element_children(x).collect();
    let right: Vec<NodeId> = b.element_children(y).collect();
    if left.len() != right.len() {
        return Err(OracleError(format!("child count differs at {}", node)));
    }
    for (&l, &r) in left.iter().zip(&right) {
        walk(a, b, l, r, script)?;
    }
    Ok(())
}

fn score(first_pitch: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<mei xmlns="http://www.music-encoding.org/ns/mei" meiversion="4.0.1">
  <music><body><mdiv><score><section>
    <measure n="1">
      <staff n="1">
        <layer n="1">
          <note pname="{}" oct="4" dur="2"/>
          <note pname="d" oct="4" dur="2"/>
        </layer>
      </staff>
    </measure>
    <measure n="2">
      <staff n="1">
        <layer n="1"><rest dur="1"/></layer>
      </staff>
    </measure>
  </section></score></mdiv></body></music>
</mei>"#,
        first_pitch
    )
}

fn layers_of(tree: &MeiTree, measure: NodeId) -> Vec<(NodeId, String)> {
    let staff = tree.find_all("staff").into_iter().find(|&s| tree.parent(s) == Some(measure)).unwrap();
    tree.children_named(staff, "layer")
        .map(|l| (l, tree.attribute(l, XML_ID).unwrap_or("").to_string()))
        .collect()
}

#[test]
fn test_pitch_change_produces_paired_layers() {
    let comparison = TreeComparison::new(attribute_oracle);
    let result = comparison.compare_xml(&score("c"), &score("e")).unwrap();

    assert_eq!(
        result.script,
        vec![EditAction::UpdateAttrib {
            node: "/mei/music/body/mdiv/score/section/measure[1]/staff/layer/note[1]".into(),
            name: "octname".into(),
            value: "4:e".into(),
        }]
    );

    let diff = &result.diff;
    let measures = diff.find_all("measure");
    assert_eq!(measures.len(), 2);

    let changed = layers_of(diff, measures[0]);
    assert_eq!(changed.len(), 2);
    assert_eq!(changed[0].1, "m-a1");
    assert_eq!(changed[1].1, "m-b1");

    let original_notes: Vec<NodeId> = diff.children_named(changed[0].0, "note").collect();
    assert_eq!(diff.attribute(original_notes[0], "pname"), Some("c"));
    assert_eq!(diff.attribute(original_notes[0], "color"), Some("red"));
    assert_eq!(diff.attribute(original_notes[1], "color"), None);

    let modified_notes: Vec<NodeId> = diff.children_named(changed[1].0, "note").collect();
    assert_eq!(diff.attribute(modified_notes[0], "pname"), Some("e"));
    assert_eq!(diff.attribute(modified_notes[0], "color"), Some("green"));
    assert_eq!(diff.attribute(modified_notes[0], "visible"), Some("true"));
    assert_eq!(diff.attribute(modified_notes[1], "visible"), Some("false"));

    let unchanged = layers_of(diff, measures[1]);
    assert_eq!(unchanged.len(), 1);
    assert_eq!(unchanged[0].1, "m-r2");

    assert!(!is_resolved(diff));
    assert!(diff
        .descendants(diff.root())
        .filter(|&id| diff.is(id, "note"))
        .all(|id| !diff.has_attribute(id, "octname")));
}

#[test]
fn test_unresolved_pair_conflicts_until_one_side_is_hidden() {
    let comparison = TreeComparison::new(attribute_oracle);
    let mut diff = comparison.compare_xml(&score("c"), &score("e")).unwrap().diff;
    let measure = diff.find_first("measure").unwrap();

    let err = merge_measure_layers(&mut diff, measure).unwrap_err();
    match err {
        MergeError::LayersOverlap { group, conflicting, .. } => {
            assert_eq!(group, "1");
            assert_eq!(conflicting.len(), 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    // Nothing changed on failure
    assert_eq!(layers_of(&diff, measure).len(), 2);

    // Accept the modified pitch by hiding the original one
    let original_layer = layers_of(&diff, measure)[0].0;
    let rejected = diff.children_named(original_layer, "note").next().unwrap();
    diff.set_attribute(rejected, "visible", "false");

    merge_measure_layers(&mut diff, measure).unwrap();
    let merged = layers_of(&diff, measure);
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].1, "m-r1");
    let pitches: Vec<&str> = diff
        .children_named(merged[0].0, "note")
        .filter_map(|n| diff.attribute(n, "pname"))
        .collect();
    assert_eq!(pitches, vec!["e", "d"]);
    assert!(is_resolved(&diff));
}

#[test]
fn test_identical_scores_are_resolved_immediately() {
    let comparison = TreeComparison::new(attribute_oracle);
    let result = comparison.compare_xml(&score("c"), &score("c")).unwrap();

    assert!(result.script.is_empty());
    assert!(is_resolved(&result.diff));
    assert!(result
        .diff
        .descendants(result.diff.root())
        .all(|id| !result.diff.has_attribute(id, "color")));
}

#[test]
fn test_canonical_sides_are_plain_and_identified() {
    let comparison = TreeComparison::new(attribute_oracle);
    let result = comparison.compare_xml(&score("c"), &score("e")).unwrap();

    for side in [&result.a, &result.b] {
        assert!(side
            .descendants(side.root())
            .filter(|&id| side.is_element(id))
            .all(|id| side.attribute(id, XML_ID).is_some_and(|v| v.starts_with("m-"))));
        assert!(side.find_all("note").iter().all(|&n| side.has_attribute(n, "pname")));
    }
    let first = result.b.find_first("note").unwrap();
    assert_eq!(result.b.attribute(first, "pname"), Some("e"));
}

#[test]
fn test_custom_colors() {
    let config = mei_compare::compare::CompareConfig {
        original_color: "#c00".into(),
        modified_color: "#0a0".into(),
        ..Default::default()
    };
    let comparison = TreeComparison::with_config(attribute_oracle, config);
    let diff = comparison.compare_xml(&score("c"), &score("e")).unwrap().diff;
    let colors: Vec<&str> = diff
        .find_all("note")
        .into_iter()
        .filter_map(|n| diff.attribute(n, "color"))
        .collect();
    assert_eq!(colors, vec!["#c00", "#0a0"]);
}

#[test]
fn test_layer_count_mismatch_is_reported() {
    let a = score("c");
    let b = a.replace(
        r#"<layer n="1"><rest dur="1"/></layer>"#,
        r#"<layer n="1"><rest dur="1"/></layer><layer n="2"><space dur="1"/></layer>"#,
    );
    let oracle = |_: &MeiTree, _: &MeiTree, _: &DiffOptions| -> Result<Vec<EditAction>, OracleError> {
        Ok(vec![
            EditAction::InsertNode {
                target: "/mei/music/body/mdiv/score/section/measure[2]/staff".into(),
                tag: "layer".into(),
                position: 1,
            },
        ])
    };
    let err = TreeComparison::new(oracle).compare_xml(&a, &b).unwrap_err();
    match err {
        CompareError::StructuralMismatch {
            measure,
            staff,
            level,
            expected,
            found,
        } => {
            assert_eq!(measure, 2);
            assert_eq!(staff.as_deref(), Some("1"));
            assert_eq!(level, StructureLevel::Layer);
            assert_eq!((expected, found), (1, 2));
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn beamed_score(first_pitch: &str) -> String {
    format!(
        r#"<mei xmlns="http://www.music-encoding.org/ns/mei"><music><body><mdiv><score><section>
    <measure n="1"><staff n="1"><layer n="1">
      <beam>
        <chord dur="4"><note pname="{}" oct="4"/><note pname="e" oct="4"/></chord>
        <note pname="g" oct="4" dur="4"/>
      </beam>
      <rest dur="2"/>
    </layer></staff></measure>
  </section></score></mdiv></body></music></mei>"#,
        first_pitch
    )
}

#[test]
fn test_accepted_change_inside_nested_group_survives_merge() {
    let comparison = TreeComparison::new(attribute_oracle);
    let mut diff = comparison.compare_xml(&beamed_score("c"), &beamed_score("d")).unwrap().diff;
    let measure = diff.find_first("measure").unwrap();
    let layers = layers_of(&diff, measure);
    assert_eq!(layers.len(), 2);

    let modified_beam = diff.children_named(layers[1].0, "beam").next().unwrap();
    assert_eq!(diff.attribute(modified_beam, "visible"), Some("true"));

    // Accept the modified chord by hiding the original beam
    let original_beam = diff.children_named(layers[0].0, "beam").next().unwrap();
    diff.set_attribute(original_beam, "visible", "false");

    merge_measure_layers(&mut diff, measure).unwrap();
    let merged = layers_of(&diff, measure);
    assert_eq!(merged.len(), 1);
    let pitches: Vec<&str> = diff
        .descendants(merged[0].0)
        .filter(|&n| diff.is(n, "note"))
        .filter_map(|n| diff.attribute(n, "pname"))
        .collect();
    assert_eq!(pitches, vec!["d", "e", "g"]);
    let children: Vec<&str> = diff.element_children(merged[0].0).filter_map(|n| diff.name(n)).collect();
    assert_eq!(children, vec!["beam", "rest"]);
}
