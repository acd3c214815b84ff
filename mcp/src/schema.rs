//! Type descriptor builder: JSON Schema for any registered type
//!
//! Nested member types are described inline. A type that refers back to itself is cut off with
//! a plain object schema at the point of recursion.

use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use tracing::warn;

use crate::constants::REF_HANDLE;
use crate::constants::REF_KIND;
use crate::error::Result;
use crate::json_object::JsonObjectAccess;
use crate::json_schema::JsonSchemaType;
use crate::json_schema::SchemaField;
use crate::marshal::Reflector;
use crate::reflect::TypeInfo;
use crate::reflect::TypeKind;
use crate::reflect::TypeName;

fn typed(schema_type: JsonSchemaType) -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert_field(SchemaField::Type, schema_type);
    schema
}

fn with_description(mut schema: Map<String, Value>, description: Option<&str>) -> Value {
    if let Some(description) = description {
        schema.insert_field(SchemaField::Description, description);
    }
    Value::Object(schema)
}

fn reference_schema() -> Map<String, Value> {
    let mut schema = typed(JsonSchemaType::Object);
    schema.insert_field(
        SchemaField::Properties,
        json!({
            REF_HANDLE: { "type": JsonSchemaType::Integer },
            REF_KIND: { "type": JsonSchemaType::String },
        }),
    );
    schema.insert_field(SchemaField::Required, json!([REF_HANDLE]));
    schema
}

struct SchemaBuilder<'a> {
    reflector: &'a Reflector,
    stack:     Vec<TypeName>,
}

impl SchemaBuilder<'_> {
    fn build(&mut self, info: &TypeInfo) -> Value {
        if info.is_host_owned() {
            return with_description(reference_schema(), info.description.as_deref());
        }
        let schema = match &info.kind {
            TypeKind::Primitive { primitive } => typed((*primitive).into()),
            TypeKind::Enum { variants } => {
                let mut schema = typed(JsonSchemaType::String);
                schema.insert_field(SchemaField::Enum, variants.clone());
                schema
            },
            TypeKind::Sequence { item } => {
                let mut schema = typed(JsonSchemaType::Array);
                let items = self.nested(item);
                schema.insert_field(SchemaField::Items, items);
                schema
            },
            TypeKind::Composite { members } => {
                self.stack.push(info.name.clone());
                let mut properties = Map::new();
                for member in members {
                    let mut member_schema = self.nested(&member.type_name);
                    if let (Some(description), Some(object)) =
                        (&member.description, member_schema.as_object_mut())
                    {
                        object.insert_field(SchemaField::Description, description.as_str());
                    }
                    properties.insert(member.name.clone(), member_schema);
                }
                self.stack.pop();
                let mut schema = typed(JsonSchemaType::Object);
                schema.insert_field(SchemaField::Properties, properties);
                schema
            },
            TypeKind::Reference => reference_schema(),
            TypeKind::Optional { inner } => match self.nested(inner) {
                Value::Object(schema) => schema,
                _ => typed(JsonSchemaType::Object),
            },
        };
        with_description(schema, info.description.as_deref())
    }

    fn nested(&mut self, type_name: &TypeName) -> Value {
        if self.stack.contains(type_name) {
            return with_description(
                typed(JsonSchemaType::Object),
                Some(format!("Recursive reference to '{type_name}'.").as_str()),
            );
        }
        let reflector = self.reflector;
        match reflector.types().get(type_name.as_str()) {
            Some(registration) => self.build(registration.info()),
            None => {
                warn!(type_name = %type_name, "Describing unregistered member type as an object");
                with_description(
                    typed(JsonSchemaType::Object),
                    Some(format!("Type '{type_name}' is not registered.").as_str()),
                )
            },
        }
    }
}

impl Reflector {
    /// JSON Schema describing values of `type_name`
    pub fn schema_of(&self, type_name: &str) -> Result<Value> {
        let info = self.types().info(type_name)?;
        let mut builder = SchemaBuilder {
            reflector: self,
            stack:     Vec::new(),
        };
        Ok(builder.build(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::MemberInfo;
    use crate::reflect::Ownership;
    use crate::reflect::TypeRegistration;

    fn reflector() -> Reflector {
        Reflector::builder()
            .register_registration(TypeRegistration::new(
                TypeInfo::composite("scene::Vec3", vec![
                    MemberInfo::field("x", TypeName::from("f32")),
                    MemberInfo::field("y", TypeName::from("f32")),
                ])
                .with_description("Vector"),
            ))
            .register_registration(TypeRegistration::new(TypeInfo::enumeration(
                "scene::LightKind",
                vec!["Point".to_string(), "Spot".to_string()],
            )))
            .register_registration(TypeRegistration::new(
                TypeInfo::composite("scene::Light", vec![
                    MemberInfo::property("kind", TypeName::from("scene::LightKind")),
                    MemberInfo::field("target", TypeName::from("scene::Transform"))
                        .with_description("Followed transform"),
                    MemberInfo::field("path", TypeName::from("Vec<scene::Vec3>")),
                    MemberInfo::field("next", TypeName::from("scene::Light")),
                ]),
            ))
            .register_registration(TypeRegistration::new(
                TypeInfo::composite("scene::Transform", vec![])
                    .with_ownership(Ownership::Host),
            ))
            .register_registration(TypeRegistration::new(TypeInfo::sequence(
                "Vec<scene::Vec3>",
                TypeName::from("scene::Vec3"),
            )))
            .build()
    }

    #[test]
    fn test_primitive_and_enum_schemas() {
        let reflector = reflector();
        assert_eq!(reflector.schema_of("f32").ok(), Some(json!({"type": "number"})));
        assert_eq!(
            reflector.schema_of("LightKind").ok(),
            Some(json!({"type": "string", "enum": ["Point", "Spot"]}))
        );
    }

    #[test]
    fn test_composite_schema_nests_members() {
        let schema = reflector().schema_of("scene::Light").unwrap_or_default();
        let properties = &schema["properties"];
        assert_eq!(properties["kind"]["enum"], json!(["Point", "Spot"]));
        assert_eq!(properties["target"]["required"], json!(["handle"]));
        assert_eq!(properties["target"]["description"], json!("Followed transform"));
        assert_eq!(properties["path"]["type"], json!("array"));
        assert_eq!(properties["path"]["items"]["properties"]["x"], json!({"type": "number"}));
        assert_eq!(properties["next"]["type"], json!("object"));
        assert!(properties["next"].get("properties").is_none());
    }

    #[test]
    fn test_unknown_type_is_an_error() {
        let error = reflector().schema_of("scene::Camera");
        assert!(error.is_err_and(|report| matches!(
            report.current_context(),
            crate::error::Error::TypeNotFound(_)
        )));
    }
}
