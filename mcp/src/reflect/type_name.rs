//! A newtype wrapper for fully qualified type names
//!
//! Names look like `scene::Transform`; the segment before the last `::` is the namespace and the
//! final segment is the short name.

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// Fully qualified name of a reflected type
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default, PartialOrd, Ord, JsonSchema,
)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Create a `TypeName` representing an unknown type
    pub fn unknown() -> Self { Self("unknown".to_string()) }

    /// Get the underlying string reference
    pub fn as_str(&self) -> &str { &self.0 }

    /// True when no name was supplied
    pub const fn is_empty(&self) -> bool { self.0.is_empty() }

    /// Extract the base type name by stripping generic parameters
    /// For example: `Vec<String>` returns `Vec`
    pub fn base_type(&self) -> &str { self.0.split('<').next().unwrap_or(&self.0) }

    /// Namespace part of the name, empty for names without `::`
    /// For example: `scene::Transform` returns `scene`
    pub fn namespace(&self) -> &str {
        self.base_type()
            .rsplit_once("::")
            .map_or("", |(namespace, _)| namespace)
    }

    /// Get the short name (last segment after ::)
    /// For example: `scene::Transform` returns `Transform`
    /// For generic types: `Vec<scene::Vec3>` returns `Vec<Vec3>`
    pub fn short_name(&self) -> String {
        if let Some(angle_pos) = self.0.find('<') {
            let base = &self.0[..angle_pos];
            let short_base = base.rsplit("::").next().unwrap_or(base);
            let inner = self.0[angle_pos + 1..].trim_end_matches('>');
            return format!("{short_base}<{}>", Self::from(inner).short_name());
        }
        self.0.rsplit("::").next().unwrap_or(&self.0).to_string()
    }

    /// True when `candidate` names this type either fully or by its short name
    pub fn matches(&self, candidate: &str) -> bool {
        self.0 == candidate || self.short_name() == candidate
    }
}

impl From<&str> for TypeName {
    fn from(s: &str) -> Self { Self(s.to_string()) }
}

impl From<String> for TypeName {
    fn from(s: String) -> Self { Self(s) }
}

impl From<&String> for TypeName {
    fn from(s: &String) -> Self { Self(s.clone()) }
}

impl From<TypeName> for String {
    fn from(type_name: TypeName) -> Self { type_name.0 }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

impl From<TypeName> for Value {
    fn from(type_name: TypeName) -> Self { Self::String(type_name.0) }
}

impl From<&TypeName> for Value {
    fn from(type_name: &TypeName) -> Self { Self::String(type_name.0.clone()) }
}

impl AsRef<str> for TypeName {
    fn as_ref(&self) -> &str { &self.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name_and_namespace() {
        let name = TypeName::from("scene::components::Transform");
        assert_eq!(name.short_name(), "Transform");
        assert_eq!(name.namespace(), "scene::components");
        assert!(name.matches("Transform"));
        assert!(name.matches("scene::components::Transform"));
        assert!(!name.matches("transform"));
    }

    #[test]
    fn test_generic_short_name() {
        let name = TypeName::from("Vec<scene::Vec3>");
        assert_eq!(name.short_name(), "Vec<Vec3>");
        assert_eq!(name.namespace(), "");
        assert_eq!(name.base_type(), "Vec");
    }

    #[test]
    fn test_primitive_has_no_namespace() {
        let name = TypeName::from("f32");
        assert_eq!(name.short_name(), "f32");
        assert_eq!(name.namespace(), "");
    }
}
