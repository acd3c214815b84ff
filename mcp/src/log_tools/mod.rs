//! File-based tracing with a level that can be changed at runtime

mod lazy_file_writer;
mod tracing;

pub use tracing::TracingLevel;
pub use tracing::init_file_tracing;
pub use tracing::trace_log_path;
