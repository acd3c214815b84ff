//! Request surface: one tool per engine operation
//!
//! A caller sends a [`ToolName`] plus JSON arguments to [`Tools::handle`] and always gets a
//! [`ToolResponse`] back. Failures never escape as `Err`; they are rendered as `[Error] ...`
//! messages.

mod method_call;
mod method_find;
mod object_populate;
mod object_serialize;
mod response;
mod type_schema;

use std::str::FromStr;
use std::sync::Arc;

use error_stack::Report;
use futures::future::BoxFuture;
pub use method_call::MethodCallParams;
pub use method_find::MethodFindParams;
pub use object_populate::PopulateBatchParams;
pub use object_populate::PopulateParams;
pub use object_serialize::SerializeParams;
pub use response::ToolResponse;
pub use response::ToolStatus;
use schemars::JsonSchema;
use schemars::schema_for;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::AsRefStr;
use strum::Display;
use strum::EnumIter;
use strum::EnumString;
use strum::IntoEnumIterator;
use strum::IntoStaticStr;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;
pub use type_schema::TypeListParams;
pub use type_schema::TypeSchemaParams;

use crate::error::Error;
use crate::error::Result;
use crate::host::HostThread;
use crate::host::PendingOperations;
use crate::marshal::Reflector;

/// Tool names with automatic `snake_case` serialization
#[derive(
    AsRefStr, Clone, Copy, Debug, Display, EnumIter, EnumString, Eq, IntoStaticStr, PartialEq,
)]
#[strum(serialize_all = "snake_case")]
pub enum ToolName {
    /// `object_serialize` - Serialize a host object or a plain value into a node tree
    ObjectSerialize,
    /// `object_populate` - Apply a node diff to a host object
    ObjectPopulate,
    /// `object_populate_batch` - Apply several node diffs to several host objects
    ObjectPopulateBatch,
    /// `method_find` - Search registered methods
    MethodFind,
    /// `method_call` - Resolve and invoke one registered method
    MethodCall,
    /// `type_schema` - JSON schema of a registered type
    TypeSchema,
    /// `type_list` - Names of the registered types
    TypeList,
}

impl ToolName {
    /// Help text published with the tool
    pub const fn description(self) -> &'static str {
        match self {
            Self::ObjectSerialize => {
                "Serialize an object into a node tree with 'typeName', 'fields', 'props' and \
                 'value'. Pass {\"handle\": <id>} to read a live host object, or a plain JSON \
                 value together with its 'typeName'. With 'recursive' false the object is \
                 returned as a single JSON value."
            },
            Self::ObjectPopulate => {
                "Apply a node diff to a live host object. Only the entries present in the diff \
                 are changed. Every entry reports its own [Success], [Warning] or [Error] line; \
                 a failing entry does not stop its siblings."
            },
            Self::ObjectPopulateBatch => {
                "Apply one node diff per target. 'targets' and 'diffs' must have the same \
                 length; the diff at index i is applied to the target at index i."
            },
            Self::MethodFind => {
                "Find registered methods by namespace, type name, method name and parameters. \
                 Match levels: 0 ignore, 1 contains ignoring case, 2 contains, 3 starts with \
                 ignoring case, 4 starts with, 5 equals ignoring case, 6 equals. Parameter \
                 levels: 0 ignore, 1 same count, 2 same names and types."
            },
            Self::MethodCall => {
                "Call exactly one registered method. The filter must resolve to a single \
                 method; input parameters are bound by name when all of them are named, \
                 otherwise by position. Missing parameters use their defaults."
            },
            Self::TypeSchema => "Get the JSON schema of a registered type.",
            Self::TypeList => {
                "List registered types, optionally filtered by a case-insensitive substring."
            },
        }
    }

    /// JSON schema of the tool's parameters
    pub fn input_schema(self) -> Value {
        match self {
            Self::ObjectSerialize => schema_for!(SerializeParams).to_value(),
            Self::ObjectPopulate => schema_for!(PopulateParams).to_value(),
            Self::ObjectPopulateBatch => schema_for!(PopulateBatchParams).to_value(),
            Self::MethodFind => schema_for!(MethodFindParams).to_value(),
            Self::MethodCall => schema_for!(MethodCallParams).to_value(),
            Self::TypeSchema => schema_for!(TypeSchemaParams).to_value(),
            Self::TypeList => schema_for!(TypeListParams).to_value(),
        }
    }
}

/// Published description of one tool
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    /// Tool name
    pub name:         &'static str,
    /// Help text
    pub description:  &'static str,
    /// JSON schema of the parameters
    pub input_schema: Value,
}

/// Every tool with its help text and parameter schema
pub fn tool_definitions() -> Vec<ToolDefinition> {
    ToolName::iter()
        .map(|tool| ToolDefinition {
            name:         tool.into(),
            description:  tool.description(),
            input_schema: tool.input_schema(),
        })
        .collect()
}

/// One tool implementation
trait ToolFn: Sync {
    type Params: DeserializeOwned + JsonSchema + Send + 'static;

    fn call(
        &self,
        tools: &Tools,
        params: Self::Params,
        cancel: &CancellationToken,
    ) -> BoxFuture<'static, Result<ToolResponse>>;
}

/// Shared state every tool runs against
#[derive(Debug, Clone)]
pub struct Tools {
    reflector:  Arc<Reflector>,
    host:       Arc<HostThread>,
    operations: PendingOperations,
}

impl Tools {
    /// Serve requests against `reflector`, touching live objects only on `host`
    pub fn new(reflector: Arc<Reflector>, host: HostThread) -> Self {
        Self {
            reflector,
            host: Arc::new(host),
            operations: PendingOperations::new(),
        }
    }

    /// The engine the tools run against
    pub fn reflector(&self) -> &Reflector { &self.reflector }

    /// Two-phase operations started by method calls; subscribe here for completion notices
    pub const fn operations(&self) -> &PendingOperations { &self.operations }

    /// Handle a request addressed by tool name
    pub async fn handle_named(
        &self,
        tool: &str,
        args: Value,
        cancel: CancellationToken,
    ) -> ToolResponse {
        match ToolName::from_str(tool) {
            Ok(tool) => self.handle(tool, args, cancel).await,
            Err(_) => ToolResponse::from_error(&Error::invalid("tool", format!("'{tool}' is not a tool"))),
        }
    }

    /// Handle one request
    pub async fn handle(&self, tool: ToolName, args: Value, cancel: CancellationToken) -> ToolResponse {
        debug!(%tool, "Handling tool call");
        let outcome = match tool {
            ToolName::ObjectSerialize => {
                self.dispatch(&object_serialize::ObjectSerialize, args, &cancel).await
            },
            ToolName::ObjectPopulate => {
                self.dispatch(&object_populate::ObjectPopulate, args, &cancel).await
            },
            ToolName::ObjectPopulateBatch => {
                self.dispatch(&object_populate::ObjectPopulateBatch, args, &cancel).await
            },
            ToolName::MethodFind => self.dispatch(&method_find::MethodFind, args, &cancel).await,
            ToolName::MethodCall => self.dispatch(&method_call::MethodCall, args, &cancel).await,
            ToolName::TypeSchema => self.dispatch(&type_schema::TypeSchema, args, &cancel).await,
            ToolName::TypeList => self.dispatch(&type_schema::TypeList, args, &cancel).await,
        };
        outcome.unwrap_or_else(|report| {
            warn!(%tool, error = ?report, "Tool call failed");
            ToolResponse::from_report(&report)
        })
    }

    async fn dispatch<T: ToolFn>(
        &self,
        tool: &T,
        args: Value,
        cancel: &CancellationToken,
    ) -> Result<ToolResponse> {
        let args = if args.is_null() { Value::Object(serde_json::Map::new()) } else { args };
        let params: T::Params = serde_json::from_value(args)
            .map_err(|e| Report::new(Error::invalid("parameters", e)))?;
        tool.call(self, params, cancel).await
    }
}
