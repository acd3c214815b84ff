use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

use crate::reflect::TypeName;

/// Requested name and type of one parameter; either part may be left out
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParameterShape {
    /// Parameter name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name:      Option<String>,
    /// Full or short parameter type name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<TypeName>,
}

impl ParameterShape {
    /// Shape with an optional name and type; empty strings count as unspecified
    pub fn new(name: Option<&str>, type_name: Option<&str>) -> Self {
        Self {
            name:      name.filter(|n| !n.is_empty()).map(ToString::to_string),
            type_name: type_name.filter(|t| !t.is_empty()).map(TypeName::from),
        }
    }
}

/// Partial description of a method, used as a search filter
///
/// Every part is optional. An absent or empty part does not constrain the search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    /// Namespace of the declaring type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace:   Option<String>,
    /// Declaring type, full or short name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name:   Option<String>,
    /// Method name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
    /// Parameter shapes in declaration order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters:  Option<Vec<ParameterShape>>,
}

impl MethodDescriptor {
    /// Descriptor naming a type and a method
    pub fn named(type_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            method_name: Some(method_name.into()),
            ..Self::default()
        }
    }

    /// Set the parameter shapes
    #[must_use]
    pub fn with_parameters(mut self, parameters: Vec<ParameterShape>) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

impl std::fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let namespace = self
            .namespace
            .as_deref()
            .filter(|namespace| !namespace.is_empty());
        if let Some(namespace) = namespace {
            write!(f, "{namespace}::")?;
        }
        write!(
            f,
            "{}.{}",
            self.type_name.as_deref().unwrap_or("*"),
            self.method_name.as_deref().unwrap_or("*")
        )?;
        if let Some(parameters) = &self.parameters {
            let rendered: Vec<String> = parameters
                .iter()
                .map(|p| {
                    format!(
                        "{}: {}",
                        p.name.as_deref().unwrap_or("_"),
                        p.type_name.as_ref().map_or("_", TypeName::as_str)
                    )
                })
                .collect();
            write!(f, "({})", rendered.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_all_parts_are_optional() {
        let descriptor: MethodDescriptor =
            serde_json::from_value(json!({"methodName": "LookAt"})).unwrap_or_default();
        assert_eq!(descriptor.method_name.as_deref(), Some("LookAt"));
        assert!(descriptor.type_name.is_none());
        assert!(descriptor.parameters.is_none());
        assert_eq!(descriptor.to_string(), "*.LookAt");
    }

    #[test]
    fn test_display_with_parameters() {
        let descriptor = MethodDescriptor::named("Transform", "LookAt").with_parameters(vec![
            ParameterShape::new(Some("target"), Some("scene::Vec3")),
            ParameterShape::new(None, None),
        ]);
        assert_eq!(descriptor.to_string(), "Transform.LookAt(target: scene::Vec3, _: _)");
    }
}
