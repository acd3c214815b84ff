//! Value-body reconciliation
//!
//! Callers frequently put structural keys inside `value` (`{"value": {"fields": [...]}}`) or
//! address members directly (`{"value": {"intensity": 2.0}}`). Before population such keys are
//! moved into the node's `fields` / `props` so that every convertor sees one canonical shape.

use serde_json::Map;
use serde_json::Value;

use crate::constants::NODE_FIELDS;
use crate::constants::NODE_PROPS;
use crate::error::Error;
use crate::node::SerializedNode;
use crate::node::Transcript;
use crate::reflect::MemberKind;
use crate::reflect::TypeInfo;

/// Outcome of validating a value body before anything is moved
enum Plan {
    /// `value` is not an object or holds nothing to relocate
    Untouched,
    /// Relocation can proceed
    Relocate(Map<String, Value>),
}

fn is_structural(key: &str) -> bool { key == NODE_FIELDS || key == NODE_PROPS }

/// Check every key first so that a rejected body leaves the node exactly as it was
fn plan(
    node: &SerializedNode,
    info: &TypeInfo,
    restricted: &[String],
) -> Result<Plan, Error> {
    let Some(Value::Object(body)) = node.value.as_ref() else {
        return Ok(Plan::Untouched);
    };
    let relevant = body.keys().any(|key| {
        is_structural(key) || info.member(key).is_some() || restricted.iter().any(|r| r == key)
    });
    if !relevant {
        return Ok(Plan::Untouched);
    }

    for (key, value) in body {
        if is_structural(key) {
            if serde_json::from_value::<Vec<SerializedNode>>(value.clone()).is_err() {
                return Err(Error::RestrictedFieldConflict(key.clone()));
            }
        } else if info.member(key).is_none() && restricted.iter().any(|r| r == key) {
            return Err(Error::RestrictedFieldConflict(key.clone()));
        }
    }
    Ok(Plan::Relocate(body.clone()))
}

/// Append `entry` unless an entry with the same name already exists, which wins
fn merge_entry(
    entries: &mut Vec<SerializedNode>,
    entry: SerializedNode,
    info: &TypeInfo,
    depth: usize,
    transcript: &mut Transcript,
) {
    let duplicate = entry
        .name
        .as_deref()
        .is_some_and(|name| entries.iter().any(|e| e.name.as_deref() == Some(name)));
    if duplicate {
        transcript.warning(
            depth,
            format!(
                "'{}' of '{}' is given both in 'value' and as an entry, keeping the entry.",
                entry.name.as_deref().unwrap_or_default(),
                info.name
            ),
        );
        return;
    }
    entries.push(entry);
}

/// Move structural and member keys out of `node.value` into `fields` / `props`
///
/// Returns false, with an error in the transcript and the node untouched, when a key cannot be
/// relocated. Keys that are neither structural nor members stay in `value`; when nothing remains
/// `value` becomes absent.
pub(crate) fn reconcile(
    node: &mut SerializedNode,
    info: &TypeInfo,
    restricted: &[String],
    warn: bool,
    depth: usize,
    transcript: &mut Transcript,
) -> bool {
    let body = match plan(node, info, restricted) {
        Ok(Plan::Untouched) => return true,
        Ok(Plan::Relocate(body)) => body,
        Err(error) => {
            transcript.error(depth, error.to_string());
            return false;
        },
    };

    let mut remaining = Map::new();
    for (key, value) in body {
        let relocated = if is_structural(&key) {
            let kind = if key == NODE_FIELDS {
                MemberKind::Field
            } else {
                MemberKind::Property
            };
            let entries: Vec<SerializedNode> = serde_json::from_value(value).unwrap_or_default();
            for entry in entries {
                merge_entry(node.entries_mut(kind), entry, info, depth, transcript);
            }
            true
        } else if let Some(member) = info.member(&key) {
            let entry = SerializedNode::leaf(member.type_name.clone(), Some(&key), value);
            merge_entry(node.entries_mut(member.kind), entry, info, depth, transcript);
            true
        } else {
            remaining.insert(key.clone(), value);
            false
        };

        if relocated && warn {
            transcript.warning(
                depth,
                format!("'{key}' should be moved from 'value'. Fixing the hierarchy automatically."),
            );
        }
    }

    node.value = (!remaining.is_empty()).then_some(Value::Object(remaining));
    true
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::reflect::MemberInfo;
    use crate::reflect::TypeName;

    fn light() -> TypeInfo {
        TypeInfo::composite("scene::Light", vec![
            MemberInfo::field("intensity", TypeName::from("f32")),
            MemberInfo::property("enabled", TypeName::from("bool")),
        ])
    }

    #[test]
    fn test_member_keys_move_into_entries() {
        let mut node = SerializedNode::leaf(
            "scene::Light",
            None,
            json!({"intensity": 2.0, "enabled": false, "extra": 1}),
        );
        let mut transcript = Transcript::new(2);

        assert!(reconcile(&mut node, &light(), &[], true, 0, &mut transcript));
        assert_eq!(node.field("intensity").and_then(|f| f.value.clone()), Some(json!(2.0)));
        assert_eq!(node.prop("enabled").and_then(|p| p.value.clone()), Some(json!(false)));
        assert_eq!(node.value, Some(json!({"extra": 1})));
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_structural_keys_are_appended() {
        let mut node = SerializedNode::leaf(
            "scene::Light",
            None,
            json!({"fields": [{"name": "intensity", "value": 3.0}]}),
        );
        let mut transcript = Transcript::new(2);

        assert!(reconcile(&mut node, &light(), &[], false, 0, &mut transcript));
        assert_eq!(node.fields.len(), 1);
        assert_eq!(node.value, None);
        assert!(transcript.is_empty());
    }

    #[test]
    fn test_existing_entry_wins() {
        let mut node = SerializedNode::leaf("scene::Light", None, json!({"intensity": 9.0}))
            .with_field(SerializedNode::leaf("f32", Some("intensity"), json!(1.0)));
        let mut transcript = Transcript::new(2);

        assert!(reconcile(&mut node, &light(), &[], false, 0, &mut transcript));
        assert_eq!(node.fields.len(), 1);
        assert_eq!(node.fields[0].value, Some(json!(1.0)));
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_rejected_body_is_left_untouched() {
        let original = SerializedNode::leaf(
            "scene::Light",
            None,
            json!({"intensity": 2.0, "fields": "not a list"}),
        );
        let mut node = original.clone();
        let mut transcript = Transcript::new(2);

        assert!(!reconcile(&mut node, &light(), &[], true, 0, &mut transcript));
        assert_eq!(node, original);
        assert!(transcript.has_errors());
    }

    #[test]
    fn test_restricted_key_conflicts() {
        let mut node = SerializedNode::leaf("scene::Light", None, json!({"handle": 3}));
        let mut transcript = Transcript::new(2);
        let restricted = vec!["handle".to_string()];

        assert!(!reconcile(&mut node, &light(), &restricted, true, 0, &mut transcript));
        assert!(transcript.render().contains("Restricted property 'handle'"));
    }

    #[test]
    fn test_scalar_value_is_untouched() {
        let mut node = SerializedNode::leaf("f32", None, json!(4.0));
        let mut transcript = Transcript::new(2);
        assert!(reconcile(&mut node, &light(), &[], true, 0, &mut transcript));
        assert_eq!(node.value, Some(json!(4.0)));
    }
}
