use thiserror::Error;

use crate::node::LineLevel;

// Error message prefixes
const MSG_FAILED_TO_PREFIX: &str = "Failed to";
const MSG_INVALID_PREFIX: &str = "Invalid";
const MSG_MISSING_PREFIX: &str = "Missing";

/// Result type for the `reflect_mcp` library
pub type Result<T> = std::result::Result<T, error_stack::Report<Error>>;

/// Failure categories reported by the marshalling engine and the request surface
#[derive(Error)]
pub enum Error {
    /// A type name did not resolve to a registered type
    #[error("Type '{0}' not found.")]
    TypeNotFound(String),

    /// More than one method matched and parameter shapes did not disambiguate
    #[error("Found more than one method matching the request:\n{candidates}")]
    AmbiguousMatch {
        /// Rendered signatures of every remaining candidate
        candidates: String,
    },

    /// An opaque reference did not resolve to a live host object
    #[error("Object with handle '{0}' not found.")]
    ReferenceNotFound(i64),

    /// A reserved key inside `value` could not be relocated into `fields`/`props`
    #[error("Restricted property '{0}' found in 'value'.")]
    RestrictedFieldConflict(String),

    /// The JSON shape cannot be converted into the target type
    #[error("Cannot convert {found} into '{type_name}'.")]
    UnsupportedConversion {
        /// Target type name
        type_name: String,
        /// Short description of the offending input
        found: String,
    },

    /// Supplied arguments do not fit the resolved method's parameter list
    #[error("Parameter count mismatch: {0}")]
    ParameterCountMismatch(String),

    /// The invoked method failed or panicked
    #[error("Invocation failed: {0}")]
    InvocationFault(String),

    /// Malformed request input
    #[error("{0}")]
    InvalidArgument(String),

    /// The host rejected or could not perform an operation
    #[error("Host operation failed: {0}")]
    HostOperation(String),

    /// The unit of work was cancelled before it ran
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TypeNotFound(s) => f.debug_tuple("TypeNotFound").field(s).finish(),
            Self::AmbiguousMatch { candidates } => f
                .debug_struct("AmbiguousMatch")
                .field("candidates", candidates)
                .finish(),
            Self::ReferenceNotFound(h) => f.debug_tuple("ReferenceNotFound").field(h).finish(),
            Self::RestrictedFieldConflict(s) => {
                f.debug_tuple("RestrictedFieldConflict").field(s).finish()
            },
            Self::UnsupportedConversion { type_name, found } => f
                .debug_struct("UnsupportedConversion")
                .field("type_name", type_name)
                .field("found", found)
                .finish(),
            Self::ParameterCountMismatch(s) => {
                f.debug_tuple("ParameterCountMismatch").field(s).finish()
            },
            Self::InvocationFault(s) => f.debug_tuple("InvocationFault").field(s).finish(),
            Self::InvalidArgument(s) => f.debug_tuple("InvalidArgument").field(s).finish(),
            Self::HostOperation(s) => f.debug_tuple("HostOperation").field(s).finish(),
            Self::Cancelled(s) => f.debug_tuple("Cancelled").field(s).finish(),
            Self::Json(s) => f.debug_tuple("Json").field(s).finish(),
        }
    }
}

impl Error {
    /// Create a "Failed to X" host error
    pub fn failed_to(action: &str, details: impl std::fmt::Display) -> Self {
        Self::HostOperation(format!("{MSG_FAILED_TO_PREFIX} {action}: {details}"))
    }

    /// Create an "Invalid X" error
    pub fn invalid(what: &str, details: impl std::fmt::Display) -> Self {
        Self::InvalidArgument(format!("{MSG_INVALID_PREFIX} {what}: {details}"))
    }

    /// Create a "Missing X" error
    pub fn missing(what: &str) -> Self {
        Self::InvalidArgument(format!("{MSG_MISSING_PREFIX} {what}"))
    }

    /// Create a conversion error describing the offending JSON value
    pub fn unsupported(type_name: impl std::fmt::Display, found: &serde_json::Value) -> Self {
        let found = match found {
            serde_json::Value::Null => "null".to_string(),
            serde_json::Value::Bool(_) => "a boolean".to_string(),
            serde_json::Value::Number(n) => format!("number {n}"),
            serde_json::Value::String(s) => format!("string \"{s}\""),
            serde_json::Value::Array(_) => "an array".to_string(),
            serde_json::Value::Object(_) => "an object".to_string(),
        };
        Self::UnsupportedConversion {
            type_name: type_name.to_string(),
            found,
        }
    }

    /// Render as a single `[Error] ...` response line
    pub fn to_response(&self) -> String { format!("[{}] {self}", LineLevel::Error) }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self { Self::Json(error.to_string()) }
}

/// Render a report as an `[Error] ...` line followed by its attached context
pub fn report_to_response(report: &error_stack::Report<Error>) -> String {
    let mut message = report.current_context().to_response();
    for attachment in report.frames().filter_map(|frame| {
        frame
            .downcast_ref::<String>()
            .cloned()
            .or_else(|| frame.downcast_ref::<&str>().map(ToString::to_string))
    }) {
        message.push('\n');
        message.push_str(&attachment);
    }
    message
}
