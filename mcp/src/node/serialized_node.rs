use schemars::JsonSchema;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

use crate::constants::COMPONENT_NAME_PREFIX;
use crate::reflect::MemberKind;
use crate::reflect::ObjectRef;
use crate::reflect::TypeName;

/// Uniform tree used both as serialization output and as population input
///
/// A node is either a leaf (`value`) or a composite (`fields` / `props`). When both are present
/// the structural entries win and conflicting keys inside `value` are migrated out before
/// population.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SerializedNode {
    /// Member name, absent for roots and positional elements supplied without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name:      Option<String>,
    /// Fully qualified or short type name; empty means "use the declared type"
    #[serde(default)]
    pub type_name: TypeName,
    /// Declared fields, plus synthetic `component_<i>` nodes for container entities
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields:    Vec<SerializedNode>,
    /// Declared properties
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub props:     Vec<SerializedNode>,
    /// Raw JSON for leaves; an explicit `null` is kept distinct from an absent value
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value:     Option<Value>,
}

/// Maps a present key to `Some`, including `Some(Value::Null)`; absence stays `None` via
/// `#[serde(default)]`
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl SerializedNode {
    /// Leaf node carrying `value`
    pub fn leaf(type_name: impl Into<TypeName>, name: Option<&str>, value: Value) -> Self {
        Self {
            name: name.map(ToString::to_string),
            type_name: type_name.into(),
            value: Some(value),
            ..Self::default()
        }
    }

    /// Composite node without entries yet
    pub fn composite(type_name: impl Into<TypeName>, name: Option<&str>) -> Self {
        Self {
            name: name.map(ToString::to_string),
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    /// Set the name
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a field entry
    #[must_use]
    pub fn with_field(mut self, field: Self) -> Self {
        self.fields.push(field);
        self
    }

    /// Append a property entry
    #[must_use]
    pub fn with_prop(mut self, prop: Self) -> Self {
        self.props.push(prop);
        self
    }

    /// Set the leaf value
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    /// Entries of one member kind
    pub fn entries(&self, kind: MemberKind) -> &[Self] {
        match kind {
            MemberKind::Field => &self.fields,
            MemberKind::Property => &self.props,
        }
    }

    /// Mutable entries of one member kind
    pub fn entries_mut(&mut self, kind: MemberKind) -> &mut Vec<Self> {
        match kind {
            MemberKind::Field => &mut self.fields,
            MemberKind::Property => &mut self.props,
        }
    }

    /// Find a field entry by name
    pub fn field(&self, name: &str) -> Option<&Self> {
        self.fields.iter().find(|f| f.name.as_deref() == Some(name))
    }

    /// Find a property entry by name
    pub fn prop(&self, name: &str) -> Option<&Self> {
        self.props.iter().find(|p| p.name.as_deref() == Some(name))
    }

    /// True when the node carries no structural entries
    pub fn is_leaf(&self) -> bool { self.fields.is_empty() && self.props.is_empty() }

    /// True when the node carries nothing to apply
    pub fn is_empty(&self) -> bool { self.is_leaf() && self.value.is_none() }

    /// True when `value` is present and explicitly `null`
    pub fn is_explicit_null(&self) -> bool { matches!(self.value, Some(Value::Null)) }

    /// Opaque reference embedded in `value`, if it parses as one
    pub fn object_ref(&self) -> Option<ObjectRef> {
        self.value.as_ref().and_then(ObjectRef::from_value)
    }

    /// Index from positional shorthand names: `component_<i>`, `[i]`, or a bare integer
    pub fn positional_index(&self) -> Option<usize> {
        let name = self.name.as_deref()?.trim();
        if let Some(index) = name.strip_prefix(COMPONENT_NAME_PREFIX) {
            return index.parse().ok();
        }
        if let Some(inner) = name.strip_prefix('[').and_then(|n| n.strip_suffix(']')) {
            return inner.trim().parse().ok();
        }
        name.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::reflect::Handle;

    #[test]
    fn test_explicit_null_is_distinct_from_absent() {
        let explicit: SerializedNode =
            serde_json::from_value(json!({"typeName": "scene::Light", "value": null}))
                .unwrap_or_default();
        let absent: SerializedNode =
            serde_json::from_value(json!({"typeName": "scene::Light"})).unwrap_or_default();

        assert!(explicit.is_explicit_null());
        assert_eq!(absent.value, None);
        assert!(absent.is_empty());
    }

    #[test]
    fn test_serializes_only_present_parts() {
        let node = SerializedNode::composite("scene::Vec3", Some("position"))
            .with_field(SerializedNode::leaf("f32", Some("x"), json!(1.0)));
        let value = serde_json::to_value(&node).unwrap_or_default();
        assert_eq!(
            value,
            json!({
                "name": "position",
                "typeName": "scene::Vec3",
                "fields": [{ "name": "x", "typeName": "f32", "value": 1.0 }]
            })
        );

        let null_leaf = SerializedNode::leaf("scene::Light", None, Value::Null);
        assert_eq!(
            serde_json::to_value(&null_leaf).unwrap_or_default(),
            json!({ "typeName": "scene::Light", "value": null })
        );
    }

    #[test]
    fn test_positional_index_forms() {
        let with_name = |name: &str| SerializedNode::default().named(name);
        assert_eq!(with_name("component_2").positional_index(), Some(2));
        assert_eq!(with_name("[4]").positional_index(), Some(4));
        assert_eq!(with_name("7").positional_index(), Some(7));
        assert_eq!(with_name("position").positional_index(), None);
        assert_eq!(SerializedNode::default().positional_index(), None);
    }

    #[test]
    fn test_object_ref_from_value() {
        let node = SerializedNode::leaf("scene::Light", None, json!({"handle": 9}));
        assert_eq!(node.object_ref().map(|r| r.handle), Some(Handle::new(9)));
        let node = SerializedNode::leaf("scene::Light", None, json!("nine"));
        assert!(node.object_ref().is_none());
    }
}
