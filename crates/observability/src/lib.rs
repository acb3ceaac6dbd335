//! Tracing and logging setup shared by every binary and test harness.

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use crate::tracing::{LogFormat, LogSettings, UnknownLogFormat, init, init_for_tests};
