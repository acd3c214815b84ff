//! Constants for node keys, tool parameters, environment variables and defaults

// ============================================================================
// SERIALIZED NODE KEYS
// ============================================================================

/// Reserved structural key for declared fields
pub const NODE_FIELDS: &str = "fields";
/// Reserved structural key for declared properties
pub const NODE_PROPS: &str = "props";

/// Prefix for synthetic nodes describing components attached to a container entity
pub const COMPONENT_NAME_PREFIX: &str = "component_";

// ============================================================================
// OPAQUE REFERENCE KEYS
// ============================================================================

/// Key holding the integer handle of an opaque reference
pub const REF_HANDLE: &str = "handle";
/// Key holding the kind (short type name) of an opaque reference
pub const REF_KIND: &str = "kind";

// ============================================================================
// ENVIRONMENT
// ============================================================================

/// Environment variable overriding the initial tracing level
pub const ENV_TRACE_LEVEL: &str = "REFLECT_MCP_TRACE_LEVEL";
/// Environment variable overriding the default `recursive` flag of serialize requests
pub const ENV_RECURSIVE: &str = "REFLECT_MCP_RECURSIVE";

/// File name of the trace log written into the temp directory
pub const TRACE_LOG_FILE_NAME: &str = "reflect_mcp_trace.log";

// ============================================================================
// DEFAULTS
// ============================================================================

/// Indentation width, in spaces, per transcript depth level
pub const DEFAULT_PADDING_WIDTH: usize = 2;

/// Name of the dedicated host thread
pub const HOST_THREAD_NAME: &str = "reflect-mcp-host";

/// Capacity of the completion notice broadcast channel
pub const COMPLETION_CHANNEL_CAPACITY: usize = 64;
