//! Static descriptions of reflected types
//!
//! A `TypeInfo` is produced once per type at registration and drives convertor selection,
//! schema generation and value-body reconciliation.

use serde::Serialize;
use strum::AsRefStr;
use strum::Display;
use strum::EnumIter;

use super::TypeName;
use crate::constants::NODE_FIELDS;
use crate::constants::NODE_PROPS;

/// JSON primitive a leaf type maps onto
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    /// Signed or unsigned integers
    Integer,
    /// Floating point numbers
    Number,
    /// Text
    String,
    /// `true` / `false`
    Boolean,
}

/// Whether a member is exposed under `fields` or `props`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    /// Stored data member, serialized under `fields`
    Field,
    /// Accessor-style member, serialized under `props`
    Property,
}

impl MemberKind {
    /// Node key entries of this kind are listed under
    pub const fn node_key(self) -> &'static str {
        match self {
            Self::Field => NODE_FIELDS,
            Self::Property => NODE_PROPS,
        }
    }
}

/// One declared member of a composite type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    /// Member name as it appears in serialized nodes
    pub name:        String,
    /// `fields` or `props`
    pub kind:        MemberKind,
    /// Declared type of the member
    pub type_name:   TypeName,
    /// Doc comment of the member, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl MemberInfo {
    /// Describe a field member
    pub fn field(name: impl Into<String>, type_name: TypeName) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Field,
            type_name,
            description: None,
        }
    }

    /// Describe a property member
    pub fn property(name: impl Into<String>, type_name: TypeName) -> Self {
        Self {
            kind: MemberKind::Property,
            ..Self::field(name, type_name)
        }
    }

    /// Attach a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !description.is_empty() {
            self.description = Some(description);
        }
        self
    }
}

/// Structural category of a type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum TypeKind {
    /// Single JSON scalar
    Primitive {
        /// Scalar flavor
        primitive: Primitive,
    },
    /// Closed set of named variants, serialized as strings
    Enum {
        /// Variant names in declaration order
        variants: Vec<String>,
    },
    /// Ordered elements of one item type
    Sequence {
        /// Declared element type
        item: TypeName,
    },
    /// Named members split into fields and properties
    Composite {
        /// Declared members in declaration order
        members: Vec<MemberInfo>,
    },
    /// Opaque reference to a host-owned object
    Reference,
    /// Either absent (`null`) or a value of the inner type
    Optional {
        /// Type of the present value
        inner: TypeName,
    },
}

/// Who owns instances of a type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Ownership {
    /// Plain values owned by whoever holds them
    #[default]
    Value,
    /// Live objects owned by the host and addressed through handles
    Host,
    /// Host-owned entities that carry attached components
    HostContainer,
}

/// Static description of one reflected type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInfo {
    /// Fully qualified name
    pub name:        TypeName,
    /// Doc comment of the type, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Structural category
    #[serde(flatten)]
    pub kind:        TypeKind,
    /// Declared base types, nearest first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bases:       Vec<TypeName>,
    /// Value or host-owned
    pub ownership:   Ownership,
}

impl TypeInfo {
    fn new(name: impl Into<TypeName>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            bases: Vec::new(),
            ownership: Ownership::Value,
        }
    }

    /// Describe a primitive leaf
    pub fn primitive(name: impl Into<TypeName>, primitive: Primitive) -> Self {
        Self::new(name, TypeKind::Primitive { primitive })
    }

    /// Describe an enumeration
    pub fn enumeration(name: impl Into<TypeName>, variants: Vec<String>) -> Self {
        Self::new(name, TypeKind::Enum { variants })
    }

    /// Describe a sequence of `item`
    pub fn sequence(name: impl Into<TypeName>, item: TypeName) -> Self {
        Self::new(name, TypeKind::Sequence { item })
    }

    /// Describe a composite with the given members
    pub fn composite(name: impl Into<TypeName>, members: Vec<MemberInfo>) -> Self {
        Self::new(name, TypeKind::Composite { members })
    }

    /// Describe an opaque reference type
    pub fn reference(name: impl Into<TypeName>) -> Self { Self::new(name, TypeKind::Reference) }

    /// Describe an optional `inner`
    pub fn optional(name: impl Into<TypeName>, inner: TypeName) -> Self {
        Self::new(name, TypeKind::Optional { inner })
    }

    /// Attach a description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !description.is_empty() {
            self.description = Some(description);
        }
        self
    }

    /// Declare base types, nearest first
    #[must_use]
    pub fn with_bases(mut self, bases: impl IntoIterator<Item = TypeName>) -> Self {
        self.bases.extend(bases);
        self
    }

    /// Set the ownership model
    #[must_use]
    pub const fn with_ownership(mut self, ownership: Ownership) -> Self {
        self.ownership = ownership;
        self
    }

    /// True for host-owned types, containers included
    pub const fn is_host_owned(&self) -> bool {
        matches!(self.ownership, Ownership::Host | Ownership::HostContainer)
    }

    /// True for leaf kinds whose whole value is one JSON scalar
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Primitive { .. } | TypeKind::Enum { .. }
        )
    }

    /// Declared members, empty for non-composites
    pub fn members(&self) -> &[MemberInfo] {
        match &self.kind {
            TypeKind::Composite { members } => members,
            _ => &[],
        }
    }

    /// Declared members of one kind
    pub fn members_of(&self, kind: MemberKind) -> impl Iterator<Item = &MemberInfo> {
        self.members().iter().filter(move |m| m.kind == kind)
    }

    /// Look up a member by exact name
    pub fn member(&self, name: &str) -> Option<&MemberInfo> {
        self.members().iter().find(|m| m.name == name)
    }

    /// Inheritance distance to `target`: `0` for the type itself, `n` for the n-th declared base
    pub fn distance_to(&self, target: &str) -> Option<usize> {
        if self.name.as_str() == target {
            return Some(0);
        }
        self.bases
            .iter()
            .position(|base| base.as_str() == target)
            .map(|index| index + 1)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn transform() -> TypeInfo {
        TypeInfo::composite(
            "scene::Transform",
            vec![
                MemberInfo::property("position", TypeName::from("scene::Vec3")),
                MemberInfo::field("parent", TypeName::from("reflect_mcp::ObjectRef"))
                    .with_description("Parent transform"),
            ],
        )
        .with_bases([TypeName::from("scene::Component"), TypeName::from("scene::Object")])
        .with_ownership(Ownership::Host)
    }

    #[test]
    fn test_members_by_kind() {
        let info = transform();
        let props: Vec<_> = info
            .members_of(MemberKind::Property)
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(props, vec!["position"]);
        assert!(info.member("parent").is_some());
        assert!(info.member("rotation").is_none());
    }

    #[test]
    fn test_distance_to_bases() {
        let info = transform();
        assert_eq!(info.distance_to("scene::Transform"), Some(0));
        assert_eq!(info.distance_to("scene::Component"), Some(1));
        assert_eq!(info.distance_to("scene::Object"), Some(2));
        assert_eq!(info.distance_to("scene::Light"), None);
    }

    #[test]
    fn test_serializes_flat_kind_tag() {
        let info = TypeInfo::enumeration("scene::LightKind", vec!["Point".to_string()]);
        let value = serde_json::to_value(&info).unwrap_or_default();
        assert_eq!(value["kind"], json!("enum"));
        assert_eq!(value["variants"], json!(["Point"]));
        assert_eq!(value["ownership"], json!("value"));
    }
}
