use serde_json::json;

use super::*;
use crate::error::Error;
use crate::host::DetachedHost;
use crate::node::LineLevel;
use crate::node::SerializedNode;
use crate::reflect::Reflect;
use crate::reflect::TypeName;

/// Surface finish of a paint swatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(namespace = "paint", default)]
enum Finish {
    #[default]
    Matte,
    Gloss,
}

/// A named paint sample
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(namespace = "paint", default, rename_all = "camelCase")]
struct Swatch {
    /// Display label
    label:       String,
    finish:      Finish,
    layer_count: i32,
    tags:        Vec<String>,
    /// 0 is transparent
    #[reflect(prop)]
    opacity:     f32,
}

fn reflector() -> Reflector { Reflector::builder().register_type::<Swatch>().build() }

fn sample() -> Swatch {
    Swatch {
        label:       "Ocean".to_string(),
        finish:      Finish::Gloss,
        layer_count: 3,
        tags:        vec!["blue".to_string(), "cold".to_string()],
        opacity:     0.75,
    }
}

fn serialize(reflector: &Reflector, swatch: &Swatch, recursive: bool) -> SerializedNode {
    let mut transcript = reflector.transcript();
    reflector.serialize(
        &DetachedHost,
        Some(swatch),
        &TypeName::from("paint::Swatch"),
        Some("swatch"),
        recursive,
        &mut transcript,
    )
}

fn populate(reflector: &Reflector, swatch: &mut Swatch, node: &mut SerializedNode) -> (bool, Transcript) {
    let mut transcript = reflector.transcript();
    let applied = reflector.populate(&mut DetachedHost, swatch, node, &mut transcript);
    (applied, transcript)
}

#[test]
fn test_composite_round_trip() {
    let reflector = reflector();
    let node = serialize(&reflector, &sample(), true);

    assert_eq!(node.type_name.as_str(), "paint::Swatch");
    assert_eq!(node.field("finish").and_then(|f| f.value.clone()), Some(json!("Gloss")));
    assert_eq!(node.field("layerCount").and_then(|f| f.value.clone()), Some(json!(3)));
    assert_eq!(node.prop("opacity").and_then(|p| p.value.clone()), Some(json!(0.75)));
    assert_eq!(node.field("tags").map(|t| t.fields.len()), Some(2));

    // through JSON, as a caller would send it back
    let json = serde_json::to_value(&node).unwrap_or_default();
    let mut node: SerializedNode = serde_json::from_value(json).unwrap_or_default();
    let mut copy = Swatch::default();
    let (applied, transcript) = populate(&reflector, &mut copy, &mut node);

    assert!(applied);
    assert!(!transcript.has_errors(), "{transcript}");
    assert_eq!(copy, sample());
}

#[test]
fn test_non_recursive_is_a_leaf_preview() {
    let reflector = reflector();
    let node = serialize(&reflector, &sample(), false);
    assert!(node.is_leaf());
    assert_eq!(
        node.value,
        Some(json!({
            "label": "Ocean",
            "finish": "Gloss",
            "layerCount": 3,
            "tags": ["blue", "cold"],
            "opacity": 0.75
        }))
    );
}

#[test]
fn test_missing_object_is_a_null_leaf() {
    let reflector = reflector();
    let mut transcript = reflector.transcript();
    let node = reflector.serialize(
        &DetachedHost,
        None,
        &TypeName::from("paint::Swatch"),
        None,
        true,
        &mut transcript,
    );
    assert!(node.is_explicit_null());
    assert_eq!(node.type_name.as_str(), "paint::Swatch");
}

#[test]
fn test_one_bad_entry_does_not_stop_the_others() {
    let reflector = reflector();
    let mut node: SerializedNode = serde_json::from_value(json!({
        "typeName": "paint::Swatch",
        "fields": [
            { "name": "label", "value": "Dune" },
            { "name": "varnish", "value": true },
            { "name": "finish", "value": "gloss" }
        ],
        "props": [{ "name": "opacity", "value": 0.5 }]
    }))
    .unwrap_or_default();

    let mut swatch = Swatch::default();
    let (applied, transcript) = populate(&reflector, &mut swatch, &mut node);

    assert!(applied);
    assert_eq!(transcript.count(LineLevel::Success), 3, "{transcript}");
    assert_eq!(transcript.count(LineLevel::Error), 1, "{transcript}");
    assert!(transcript.render().contains("[Error] Field 'varnish' not found"));
    assert_eq!(swatch.label, "Dune");
    assert_eq!(swatch.finish, Finish::Gloss);
    assert!((swatch.opacity - 0.5).abs() < f32::EPSILON);
}

#[test]
fn test_member_keys_in_value_are_relocated() {
    let reflector = reflector();
    let mut node = SerializedNode::leaf(
        "paint::Swatch",
        None,
        json!({ "props": [{ "name": "opacity", "value": 1.0 }], "label": "Moss", "opacity": 0.25 }),
    );
    let mut swatch = Swatch::default();
    let (applied, transcript) = populate(&reflector, &mut swatch, &mut node);

    assert!(applied, "{transcript}");
    assert!(!transcript.has_errors(), "{transcript}");
    assert_eq!(swatch.label, "Moss");
    // the explicit entry wins over the member key
    assert!((swatch.opacity - 1.0).abs() < f32::EPSILON);
    assert_eq!(node.value, None);
}

#[test]
fn test_malformed_structural_key_leaves_target_untouched() {
    let reflector = reflector();
    let mut node = SerializedNode::leaf(
        "paint::Swatch",
        None,
        json!({ "label": "Rust", "fields": "not a list" }),
    );
    let mut swatch = sample();
    let (applied, transcript) = populate(&reflector, &mut swatch, &mut node);

    assert!(!applied);
    assert_eq!(transcript.count(LineLevel::Error), 1);
    assert!(transcript.render().contains("Restricted property 'fields'"));
    assert_eq!(swatch, sample());
}

#[test]
fn test_sequence_population() {
    let reflector = reflector();
    let mut swatch = sample();

    let mut node: SerializedNode = serde_json::from_value(json!({
        "fields": [{
            "name": "tags",
            "fields": [
                { "name": "[0]", "value": "navy" },
                { "name": "[2]", "value": "deep" },
                { "name": "[7]", "value": "lost" }
            ]
        }]
    }))
    .unwrap_or_default();
    let (applied, transcript) = populate(&reflector, &mut swatch, &mut node);
    assert!(applied);
    assert_eq!(transcript.count(LineLevel::Error), 1, "{transcript}");
    assert_eq!(swatch.tags, ["navy", "cold", "deep"]);

    let mut node: SerializedNode = serde_json::from_value(json!({
        "fields": [{ "name": "tags", "value": ["one"] }]
    }))
    .unwrap_or_default();
    let (applied, _) = populate(&reflector, &mut swatch, &mut node);
    assert!(applied);
    assert_eq!(swatch.tags, ["one"]);
}

#[test]
fn test_enum_accepts_names_and_indices() {
    let reflector = reflector();
    let mut swatch = Swatch::default();
    for (value, expected, ok) in [
        (json!("GLOSS"), Finish::Gloss, true),
        (json!(0), Finish::Matte, true),
        (json!("Satin"), Finish::Matte, false),
    ] {
        let mut node = SerializedNode::default()
            .with_field(SerializedNode::leaf("paint::Finish", Some("finish"), value));
        let (applied, transcript) = populate(&reflector, &mut swatch, &mut node);
        assert_eq!(applied, ok, "{transcript}");
        assert_eq!(swatch.finish, expected);
    }
}

#[test]
fn test_type_mismatch_is_rejected() {
    let reflector = reflector();
    let mut node = SerializedNode::composite("paint::Finish", None)
        .with_field(SerializedNode::leaf("String", Some("label"), json!("Nope")));
    let mut swatch = Swatch::default();
    let (applied, transcript) = populate(&reflector, &mut swatch, &mut node);
    assert!(!applied);
    assert!(transcript.render().starts_with("[Error] Type mismatch"));
    assert!(swatch.label.is_empty());
}

#[test]
fn test_deserialize_builds_fresh_values() {
    let reflector = reflector();
    let declared = TypeName::from("paint::Swatch");
    let mut transcript = reflector.transcript();

    let node = SerializedNode::leaf("", None, json!({ "label": "Sand", "layerCount": 2 }));
    let built = reflector
        .deserialize(&mut DetachedHost, &node, &declared, &mut transcript)
        .ok()
        .flatten()
        .and_then(|obj| obj.downcast_ref::<Swatch>().cloned());
    assert_eq!(built.map(|s| (s.label, s.layer_count)), Some(("Sand".to_string(), 2)));

    let null = SerializedNode::leaf("", None, serde_json::Value::Null);
    let built = reflector.deserialize(&mut DetachedHost, &null, &declared, &mut transcript);
    assert!(matches!(built, Ok(None)));

    let bad = SerializedNode::default()
        .with_field(SerializedNode::leaf("i32", Some("layerCount"), json!("many")));
    let built = reflector.deserialize(&mut DetachedHost, &bad, &declared, &mut transcript);
    assert!(built.is_err_and(
        |report| matches!(report.current_context(), Error::UnsupportedConversion { .. })
    ));
}

#[test]
fn test_unknown_type_is_type_not_found() {
    let reflector = reflector();
    let mut transcript = reflector.transcript();
    let node = SerializedNode::default();
    let built = reflector.deserialize(
        &mut DetachedHost,
        &node,
        &TypeName::from("paint::Canvas"),
        &mut transcript,
    );
    assert!(built.is_err_and(|report| matches!(report.current_context(), Error::TypeNotFound(_))));
}
