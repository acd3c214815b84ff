//! Extension trait for JSON field access keyed by anything that is `AsRef<str>`

use serde_json::Map;
use serde_json::Value;

/// Extension trait for type-safe JSON field access
pub trait JsonObjectAccess {
    /// Get field value using any type that can be a string reference
    fn get_field<T: AsRef<str>>(&self, field: T) -> Option<&Value>;

    /// Get field value as string
    fn get_field_str<T: AsRef<str>>(&self, field: T) -> Option<&str>;

    /// Insert field with value using any type that converts to String and any value that can become
    /// JSON
    fn insert_field<F, V>(&mut self, field: F, value: V)
    where
        F: Into<String>,
        V: Into<Value>;

    /// Remove a field, returning its value
    fn take_field<T: AsRef<str>>(&mut self, field: T) -> Option<Value>;
}

impl JsonObjectAccess for Value {
    fn get_field<T: AsRef<str>>(&self, field: T) -> Option<&Self> { self.get(field.as_ref()) }

    fn get_field_str<T: AsRef<str>>(&self, field: T) -> Option<&str> {
        self.get(field.as_ref()).and_then(Self::as_str)
    }

    fn insert_field<F, V>(&mut self, field: F, value: V)
    where
        F: Into<String>,
        V: Into<Self>,
    {
        if let Some(obj) = self.as_object_mut() {
            obj.insert(field.into(), value.into());
        }
    }

    fn take_field<T: AsRef<str>>(&mut self, field: T) -> Option<Self> {
        self.as_object_mut()
            .and_then(|obj| obj.shift_remove(field.as_ref()))
    }
}

impl JsonObjectAccess for Map<String, Value> {
    fn get_field<T: AsRef<str>>(&self, field: T) -> Option<&Value> { self.get(field.as_ref()) }

    fn get_field_str<T: AsRef<str>>(&self, field: T) -> Option<&str> {
        self.get(field.as_ref()).and_then(Value::as_str)
    }

    fn insert_field<F, V>(&mut self, field: F, value: V)
    where
        F: Into<String>,
        V: Into<Value>,
    {
        self.insert(field.into(), value.into());
    }

    fn take_field<T: AsRef<str>>(&mut self, field: T) -> Option<Value> {
        self.shift_remove(field.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::json_schema::SchemaField;

    #[test]
    fn test_field_access_by_enum() {
        let mut schema = json!({ "type": "object" });
        schema.insert_field(SchemaField::Description, "a vector");

        assert_eq!(schema.get_field_str(SchemaField::Type), Some("object"));
        assert_eq!(
            schema.get_field_str(SchemaField::Description),
            Some("a vector")
        );
    }

    #[test]
    fn test_take_field_preserves_order_of_rest() {
        let mut value = json!({ "a": 1, "b": 2, "c": 3 });
        assert_eq!(value.take_field("b"), Some(json!(2)));
        let keys: Vec<_> = value
            .as_object()
            .map(|obj| obj.keys().cloned().collect())
            .unwrap_or_default();
        assert_eq!(keys, vec!["a".to_string(), "c".to_string()]);
    }
}
