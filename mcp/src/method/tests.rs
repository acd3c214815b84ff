use serde_json::json;

use super::*;
use crate::error::Error;
use crate::host::DetachedHost;
use crate::marshal::Reflector;
use crate::node::SerializedNode;
use crate::reflect::Reflect;

/// Point in the plane
#[derive(Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(namespace = "geometry", default)]
struct Point {
    x: f32,
    y: f32,
}

fn reflector() -> Reflector {
    Reflector::builder()
        .method(
            MethodBuilder::instance::<Point>("Scale")
                .param::<f32>("factor")
                .returns::<Point>()
                .build_on(|_cx, point: &mut Point, args| {
                    let factor = *args.get::<f32>(0)?;
                    Ok(Some(Box::new(Point {
                        x: point.x * factor,
                        y: point.y * factor,
                    })))
                }),
        )
        .method(
            MethodBuilder::instance::<Point>("Scale")
                .param::<f32>("x")
                .param::<f32>("y")
                .returns::<Point>()
                .build_on(|_cx, point: &mut Point, args| {
                    Ok(Some(Box::new(Point {
                        x: point.x * *args.get::<f32>(0)?,
                        y: point.y * *args.get::<f32>(1)?,
                    })))
                }),
        )
        .method(
            MethodBuilder::instance::<Point>("ScaleUniform")
                .param::<f32>("factor")
                .build_on(|_cx, _point: &mut Point, _args| Ok(None)),
        )
        .method(
            MethodBuilder::static_on::<Point>("Distance")
                .describe("Euclidean distance between two points")
                .param::<Point>("a")
                .param_with_default::<Point>("b", json!({"x": 0.0, "y": 0.0}))
                .returns::<f32>()
                .build(|_cx, _target, args| {
                    let a = args.get::<Point>(0)?;
                    let b = args.get::<Point>(1)?;
                    Ok(Some(Box::new((a.x - b.x).hypot(a.y - b.y))))
                }),
        )
        .method(
            MethodBuilder::instance::<Point>("Explode")
                .build_on(|_cx, _point: &mut Point, _args| {
                    Err(Error::InvocationFault("point exploded".to_string()))
                }),
        )
        .build()
}

fn point_node(x: f32, y: f32) -> SerializedNode {
    SerializedNode::composite("geometry::Point", None)
        .with_field(SerializedNode::leaf("f32", Some("x"), json!(x)))
        .with_field(SerializedNode::leaf("f32", Some("y"), json!(y)))
}

fn names(methods: &[&MethodInfo]) -> Vec<String> { methods.iter().map(|m| m.signature()).collect() }

#[test]
fn test_find_ranks_exact_matches_first() {
    let reflector = reflector();
    let found = reflector.find_methods(
        &MethodDescriptor::named("Point", "Scale"),
        MatchLevels::default(),
        None,
    );
    let found = names(&found);
    assert_eq!(found.len(), 3, "{found:?}");
    assert!(found[2].contains("ScaleUniform"), "{found:?}");

    let exact = reflector.find_methods(
        &MethodDescriptor::named("Point", "Scale"),
        MatchLevels::new(1, 6, 0),
        None,
    );
    assert_eq!(exact.len(), 2);
}

#[test]
fn test_find_respects_namespaces() {
    let reflector = reflector();
    let descriptor = MethodDescriptor {
        method_name: Some("Distance".to_string()),
        ..MethodDescriptor::default()
    };
    assert_eq!(reflector.find_methods(&descriptor, MatchLevels::default(), Some("geometry")).len(), 1);
    assert!(reflector.find_methods(&descriptor, MatchLevels::default(), Some("scene")).is_empty());

    let wrong_namespace = MethodDescriptor {
        namespace: Some("physics".to_string()),
        ..descriptor
    };
    assert!(reflector.find_methods(&wrong_namespace, MatchLevels::default(), None).is_empty());
}

#[test]
fn test_renamed_parameters_still_match_by_arity() {
    let reflector = reflector();
    let renamed = MethodDescriptor::named("Point", "Distance").with_parameters(vec![
        ParameterShape::new(Some("p"), None),
        ParameterShape::new(Some("q"), None),
    ]);
    assert_eq!(reflector.find_methods(&renamed, MatchLevels::new(1, 1, 1), None).len(), 1);
    assert!(reflector.find_methods(&renamed, MatchLevels::new(1, 1, 2), None).is_empty());
}

#[test]
fn test_undescribed_parameters_skip_the_criterion() {
    let reflector = reflector();
    let bare = MethodDescriptor::named("Point", "Distance");
    assert_eq!(reflector.find_methods(&bare, MatchLevels::new(1, 1, 2), None).len(), 1);
}

#[test]
fn test_resolve_reports_ambiguity_unless_shapes_disambiguate() {
    let reflector = reflector();
    let bare = MethodDescriptor::named("Point", "Scale");
    let error = reflector
        .resolve_method(&bare, MatchLevels::default(), None)
        .map(|_| ());
    assert!(matches!(
        error.map_err(|report| report.current_context().to_string()),
        Err(message) if message.contains("Found more than one method")
    ));

    let shaped = bare.with_parameters(vec![ParameterShape::new(Some("factor"), None)]);
    let resolved = reflector
        .resolve_method(&shaped, MatchLevels::for_call(), None)
        .ok()
        .flatten()
        .map(MethodInfo::signature);
    assert_eq!(
        resolved.as_deref(),
        Some("geometry::Point.Scale(factor: f32) -> geometry::Point")
    );

    let missing = MethodDescriptor::named("Point", "Rotate");
    assert!(matches!(reflector.resolve_method(&missing, MatchLevels::default(), None), Ok(None)));
}

#[test]
fn test_missing_arguments_use_defaults() {
    let reflector = reflector();
    let distance = reflector
        .resolve_method(&MethodDescriptor::named("Point", "Distance"), MatchLevels::default(), None)
        .ok()
        .flatten()
        .expect("Distance should resolve");

    let mut host = DetachedHost;
    let mut transcript = reflector.transcript();
    let result = reflector.invoke(
        &mut host,
        None,
        distance,
        None,
        &[point_node(3.0, 4.0)],
        &mut transcript,
    );
    assert!(matches!(result, Ok(InvocationResult::Value(ref v)) if v == "5.0"), "{result:?}");
}

#[test]
fn test_value_target_and_structured_result() {
    let reflector = reflector();
    let scale = reflector
        .resolve_method(
            &MethodDescriptor::named("Point", "Scale").with_parameters(vec![
                ParameterShape::new(Some("factor"), Some("f32")),
            ]),
            MatchLevels::for_call(),
            None,
        )
        .ok()
        .flatten()
        .expect("Scale should resolve");

    let mut host = DetachedHost;
    let mut transcript = reflector.transcript();
    let target = SerializedNode::leaf("geometry::Point", None, json!({"x": 1.0, "y": 2.0}));
    let factor = SerializedNode::leaf("f32", Some("factor"), json!(2.0));
    let result = reflector.invoke(&mut host, None, scale, Some(&target), &[factor], &mut transcript);

    let Ok(InvocationResult::Structured(node)) = result else {
        panic!("expected a structured result");
    };
    assert_eq!(node.type_name.as_str(), "geometry::Point");
    assert_eq!(node.value, Some(json!({"x": 2.0, "y": 4.0})));
}

#[test]
fn test_binding_errors() {
    let reflector = reflector();
    let scale = reflector
        .find_methods(&MethodDescriptor::named("Point", "ScaleUniform"), MatchLevels::default(), None)
        .into_iter()
        .next()
        .expect("ScaleUniform should be found");
    let mut host = DetachedHost;
    let mut transcript = reflector.transcript();

    let too_many = [
        SerializedNode::leaf("f32", None, json!(1.0)),
        SerializedNode::leaf("f32", None, json!(2.0)),
    ];
    let result = reflector.invoke(&mut host, None, scale, None, &too_many, &mut transcript);
    assert!(result.is_err_and(
        |report| matches!(report.current_context(), Error::ParameterCountMismatch(_))
    ));

    let unknown = [SerializedNode::leaf("f32", Some("scale"), json!(1.0))];
    let result = reflector.invoke(&mut host, None, scale, None, &unknown, &mut transcript);
    assert!(result.is_err_and(
        |report| matches!(report.current_context(), Error::ParameterCountMismatch(_))
    ));

    // no default for factor, so the zero value of f32 is bound
    let result = reflector.invoke(&mut host, None, scale, None, &[], &mut transcript);
    assert!(matches!(result, Ok(InvocationResult::Empty)));
}

#[test]
fn test_method_errors_become_faults() {
    let reflector = reflector();
    let explode = reflector
        .find_methods(&MethodDescriptor::named("Point", "Explode"), MatchLevels::default(), None)
        .into_iter()
        .next()
        .expect("Explode should be found");
    let mut host = DetachedHost;
    let mut transcript = reflector.transcript();
    let result = reflector.invoke(&mut host, None, explode, None, &[], &mut transcript);
    let message = result
        .err()
        .map(|report| report.current_context().to_string())
        .unwrap_or_default();
    assert_eq!(message, "Invocation failed: point exploded");
}

#[test]
fn test_method_data_lists_parameters() {
    let reflector = reflector();
    let distance = reflector
        .find_methods(&MethodDescriptor::named("Point", "Distance"), MatchLevels::default(), None)
        .into_iter()
        .next()
        .expect("Distance should be found");
    let data = serde_json::to_value(reflector.method_data(distance)).unwrap_or_default();
    assert_eq!(data["namespace"], json!("geometry"));
    assert_eq!(data["isStatic"], json!(true));
    assert_eq!(data["returnType"], json!("f32"));
    assert_eq!(data["parameters"][1]["name"], json!("b"));
    assert_eq!(data["parameters"][1]["default"], json!({"x": 0.0, "y": 0.0}));
    assert_eq!(data["parameters"][0]["schema"]["type"], json!("object"));
}
