//! JSON schema vocabulary used by the type descriptor builder
//!
//! Type names and field names are enums so the builder never spells a schema keyword by hand.

use serde::Serialize;
use serde_json::Value;
use strum::AsRefStr;
use strum::Display;
use strum::EnumString;

use crate::reflect::Primitive;

/// JSON schema type names for type schema generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, Serialize, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JsonSchemaType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
}

impl From<JsonSchemaType> for Value {
    fn from(schema_type: JsonSchemaType) -> Self { Self::String(schema_type.as_ref().to_string()) }
}

impl From<Primitive> for JsonSchemaType {
    fn from(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Integer => Self::Integer,
            Primitive::Number => Self::Number,
            Primitive::String => Self::String,
            Primitive::Boolean => Self::Boolean,
        }
    }
}

/// Schema field names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum SchemaField {
    /// Human readable description
    Description,
    /// Allowed values of an enumeration
    Enum,
    /// Element schema of an array
    Items,
    /// Member schemas of an object
    Properties,
    /// Names of members that must be present
    Required,
    /// The JSON type of the node
    Type,
}

impl From<SchemaField> for String {
    fn from(field: SchemaField) -> Self { field.as_ref().to_string() }
}
