use error_stack::Report;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::error::Result;
use crate::error::report_to_response;
use crate::node::LineLevel;

/// Outcome category of a tool call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolStatus {
    /// The request completed
    Success,
    /// The request failed as a whole
    Error,
    /// A two-phase host operation was started; a completion notice follows
    Processing,
}

/// Standard response of every tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    /// Outcome category
    pub status:  ToolStatus,
    /// Line-prefixed human readable message
    pub message: String,
    /// Structured result, when the tool has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl ToolResponse {
    const fn new(status: ToolStatus, message: String) -> Self {
        Self {
            status,
            message,
            payload: None,
        }
    }

    /// `[Success] message`
    pub fn success(message: impl std::fmt::Display) -> Self {
        Self::new(ToolStatus::Success, format!("[{}] {message}", LineLevel::Success))
    }

    /// `[Error] message`
    pub fn error(message: impl std::fmt::Display) -> Self {
        Self::new(ToolStatus::Error, format!("[{}] {message}", LineLevel::Error))
    }

    /// `[Success] message` for an operation that completes later
    pub fn processing(message: impl std::fmt::Display) -> Self {
        Self::new(ToolStatus::Processing, format!("[{}] {message}", LineLevel::Success))
    }

    /// A message that already carries its line prefixes, such as a rendered transcript
    pub const fn prefixed(status: ToolStatus, message: String) -> Self { Self::new(status, message) }

    /// Error response for a failed request, including attached context
    pub fn from_report(report: &Report<Error>) -> Self {
        Self::new(ToolStatus::Error, report_to_response(report))
    }

    /// Error response for a single error
    pub fn from_error(error: &Error) -> Self { Self::new(ToolStatus::Error, error.to_response()) }

    /// Attach a structured payload
    pub fn with_payload(mut self, payload: impl Serialize) -> Result<Self> {
        self.payload = Some(serde_json::to_value(payload).map_err(|e| Report::new(Error::from(e)))?);
        Ok(self)
    }

    /// True for [`ToolStatus::Success`]
    pub fn is_success(&self) -> bool { self.status == ToolStatus::Success }
}
