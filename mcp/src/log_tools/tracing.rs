use std::path::PathBuf;
use std::sync::atomic::AtomicU8;
use std::sync::atomic::Ordering;

use serde::Deserialize;
use serde::Serialize;
use strum::AsRefStr;
use strum::Display;
use strum::EnumString;
use tracing::Level;
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::lazy_file_writer::LazyFileWriter;
use crate::constants::TRACE_LOG_FILE_NAME;

// warn
static CURRENT_LEVEL: AtomicU8 = AtomicU8::new(1);

/// Layer that consults the runtime-adjustable level on every event
#[derive(Clone, Copy)]
pub struct DynamicFilter;

impl<S> Layer<S> for DynamicFilter
where
    S: Subscriber,
{
    fn enabled(
        &self,
        metadata: &tracing::Metadata<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> bool {
        TracingLevel::from_level(*metadata.level()).as_u8() <= CURRENT_LEVEL.load(Ordering::Relaxed)
    }
}

/// Verbosity of the trace log, adjustable while running
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Default,
    Display,
    AsRefStr,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum TracingLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl TracingLevel {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Error => 0,
            Self::Warn => 1,
            Self::Info => 2,
            Self::Debug => 3,
            Self::Trace => 4,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Error,
            2 => Self::Info,
            3 => Self::Debug,
            4 => Self::Trace,
            _ => Self::Warn,
        }
    }

    fn from_level(level: Level) -> Self {
        match level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO => Self::Info,
            Level::DEBUG => Self::Debug,
            Level::TRACE => Self::Trace,
        }
    }

    /// Level currently applied by [`DynamicFilter`]
    pub fn current() -> Self { Self::from_u8(CURRENT_LEVEL.load(Ordering::Relaxed)) }

    /// Change the level applied by [`DynamicFilter`]
    pub fn apply(self) {
        CURRENT_LEVEL.store(self.as_u8(), Ordering::Relaxed);
        tracing::info!(level = %self, "Tracing level changed");
    }
}

/// Location of the trace log file in the temp directory
pub fn trace_log_path() -> PathBuf { std::env::temp_dir().join(TRACE_LOG_FILE_NAME) }

/// Install the global subscriber writing to [`trace_log_path`] at `level`
///
/// The file is only created once something is logged at the active level.
pub fn init_file_tracing(level: TracingLevel) {
    CURRENT_LEVEL.store(level.as_u8(), Ordering::Relaxed);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(LazyFileWriter::new(trace_log_path()))
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    // a subscriber may already be installed by the embedding application
    let _ = Registry::default()
        .with(DynamicFilter)
        .with(file_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(TracingLevel::from_str("DEBUG").ok(), Some(TracingLevel::Debug));
        assert_eq!(TracingLevel::from_str("warn").ok(), Some(TracingLevel::Warn));
        assert!(TracingLevel::from_str("verbose").is_err());
    }

    #[test]
    fn test_level_ordering_matches_verbosity() {
        assert!(TracingLevel::Error < TracingLevel::Trace);
        assert_eq!(TracingLevel::from_level(Level::INFO), TracingLevel::Info);
        assert_eq!(TracingLevel::from_u8(TracingLevel::Debug.as_u8()), TracingLevel::Debug);
        assert_eq!(TracingLevel::Trace.to_string(), "trace");
    }

    #[test]
    fn test_trace_log_lives_in_temp_dir() {
        assert!(trace_log_path().starts_with(std::env::temp_dir()));
        assert!(trace_log_path().ends_with(TRACE_LOG_FILE_NAME));
    }
}
