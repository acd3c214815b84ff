//! Bridge configuration

use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use tracing::warn;

use crate::constants::DEFAULT_PADDING_WIDTH;
use crate::constants::ENV_RECURSIVE;
use crate::constants::ENV_TRACE_LEVEL;
use crate::log_tools::TracingLevel;

/// Behavior switches of the request surface and the marshalling engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// `recursive` used by serialize requests that do not specify one
    pub default_recursive:  bool,
    /// Run method calls on the host thread unless the request says otherwise
    pub run_on_host_thread: bool,
    /// Transcript indentation per depth level
    pub padding_width:      usize,
    /// Initial trace log level
    pub trace_level:        TracingLevel,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_recursive:  true,
            run_on_host_thread: true,
            padding_width:      DEFAULT_PADDING_WIDTH,
            trace_level:        TracingLevel::Warn,
        }
    }
}

impl BridgeConfig {
    /// Defaults overridden by `REFLECT_MCP_TRACE_LEVEL` and `REFLECT_MCP_RECURSIVE`
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_TRACE_LEVEL) {
            match TracingLevel::from_str(raw.trim()) {
                Ok(level) => self.trace_level = level,
                Err(_) => warn!(value = %raw, "Ignoring invalid {ENV_TRACE_LEVEL}"),
            }
        }
        if let Some(raw) = lookup(ENV_RECURSIVE) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.default_recursive = true,
                "0" | "false" | "no" => self.default_recursive = false,
                _ => warn!(value = %raw, "Ignoring invalid {ENV_RECURSIVE}"),
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_missing_keys_use_defaults() {
        let config: BridgeConfig =
            serde_json::from_value(json!({"paddingWidth": 4})).unwrap_or_default();
        assert_eq!(config.padding_width, 4);
        assert!(config.default_recursive);
        assert!(config.run_on_host_thread);
        assert_eq!(config.trace_level, TracingLevel::Warn);
    }

    #[test]
    fn test_environment_overrides() {
        let config = BridgeConfig::default().with_overrides(|key| match key {
            ENV_TRACE_LEVEL => Some("Debug".to_string()),
            ENV_RECURSIVE => Some("false".to_string()),
            _ => None,
        });
        assert_eq!(config.trace_level, TracingLevel::Debug);
        assert!(!config.default_recursive);
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let config = BridgeConfig::default().with_overrides(|key| match key {
            ENV_TRACE_LEVEL => Some("loud".to_string()),
            ENV_RECURSIVE => Some("maybe".to_string()),
            _ => None,
        });
        assert_eq!(config, BridgeConfig::default());
    }
}
