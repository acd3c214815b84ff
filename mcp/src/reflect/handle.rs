//! Opaque references to host-owned objects

use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::constants::REF_HANDLE;
use crate::constants::REF_KIND;
use crate::json_object::JsonObjectAccess;

/// Integer identifier of a host-owned object, stable only within one host session
///
/// `0` is the null sentinel.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(transparent)]
pub struct Handle(i64);

impl Handle {
    /// The null handle
    pub const NULL: Self = Self(0);

    /// Wrap a raw id
    pub const fn new(id: i64) -> Self { Self(id) }

    /// The raw id
    pub const fn id(self) -> i64 { self.0 }

    /// True for the null sentinel
    pub const fn is_null(self) -> bool { self.0 == 0 }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// `(handle, kind)` pair standing in for a host-owned object inside a serialized tree
///
/// Two references are equal when their handles are equal; `kind` is descriptive only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ObjectRef {
    /// Host handle, `0` for null
    #[serde(default)]
    pub handle: Handle,
    /// Short type name of the referenced object
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind:   String,
}

impl ObjectRef {
    /// A reference to nothing
    pub const fn null() -> Self {
        Self {
            handle: Handle::NULL,
            kind:   String::new(),
        }
    }

    /// Reference a host object
    pub fn new(handle: Handle, kind: impl Into<String>) -> Self {
        Self {
            handle,
            kind: kind.into(),
        }
    }

    /// True when the handle is the null sentinel
    pub const fn is_null(&self) -> bool { self.handle.is_null() }

    /// Read a reference from a JSON `value`
    ///
    /// Accepts `{"handle": n, "kind": "..."}`, a bare integer, or `null` (the null reference).
    /// Anything else is not a reference.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::null()),
            Value::Number(n) => n.as_i64().map(|id| Self::new(Handle::new(id), "")),
            Value::Object(_) => {
                let handle = value.get_field(REF_HANDLE)?.as_i64()?;
                let kind = value.get_field_str(REF_KIND).unwrap_or_default();
                Some(Self::new(Handle::new(handle), kind))
            },
            _ => None,
        }
    }

    /// Render as the JSON form used in node values
    pub fn to_value(&self) -> Value {
        if self.kind.is_empty() {
            json!({ REF_HANDLE: self.handle.id() })
        } else {
            json!({ REF_HANDLE: self.handle.id(), REF_KIND: self.kind })
        }
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool { self.handle == other.handle }
}

impl Eq for ObjectRef {}

impl From<Handle> for ObjectRef {
    fn from(handle: Handle) -> Self { Self::new(handle, "") }
}
