//! # Reflect MCP
//!
//! Reflection-driven object marshalling and remote method invocation.
//!
//! Types opt in with `#[derive(Reflect)]` and are registered on a [`Reflector`]. The reflector
//! turns live values into [`SerializedNode`] trees, applies node diffs back onto them, describes
//! every registered type with a JSON schema and resolves loosely specified method calls against
//! the registered methods. Objects owned by the embedding application are reached through a
//! [`Host`] that lives on its own thread ([`HostThread`]); [`Tools`] is the JSON request surface
//! on top of all of it.
//!
//! Every diagnostic is a line beginning with `[Success]`, `[Warning]` or `[Error]`.

// lets `#[derive(Reflect)]` refer to `::reflect_mcp` from inside this crate too
extern crate self as reflect_mcp;

pub mod config;
pub mod constants;
pub mod convertor;
pub mod error;
pub mod host;
pub mod json_object;
pub mod json_schema;
pub mod log_tools;
pub mod marshal;
pub mod method;
pub mod node;
pub mod reflect;
pub mod schema;
pub mod tools;

pub use config::BridgeConfig;
pub use error::Error;
pub use error::Result;
pub use host::Host;
pub use host::HostThread;
pub use marshal::Reflector;
pub use method::MethodBuilder;
pub use node::SerializedNode;
pub use node::Transcript;
pub use reflect::Handle;
pub use reflect::ObjectRef;
pub use reflect::Reflect;
pub use tools::ToolName;
pub use tools::ToolResponse;
pub use tools::Tools;

/// Items the derive macro expands to; not public API
#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
