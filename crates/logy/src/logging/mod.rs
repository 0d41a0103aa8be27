//! Request logging with query/view timing breakdown.
//!
//! For every request the logger writes an audit trail like:
//!
//! ```text
//!
//! Started GET "/widgets/1" at 2024-05-01 10:00:00 +0200
//! Processing by Api/widgets/:id
//!   Parameters: {"id":"1"}
//!   Headers: {"X-Request-Id":"abc"}
//!
//!
//! Completed 200 in 0.0153 s (ActiveRecord: 0.0021 s | View: 0.0132 s)
//!
//! ```
//!
//! Errors add a `💥 Kind: message` warning before the completed line, and
//! query time above the slow query threshold adds a warning after it.
//!
//! # Architecture
//!
//! - **types**: `RequestId`, `LogLevel`
//! - **constants**: markers, formats and defaults
//! - **sink**: `LogSink` trait and the stdout, tracing and memory sinks
//! - **filter**: `ParameterFilter` trait and `RedactionFilter`
//! - **format**: text of each log line
//! - **record**: per-request lifecycle state machine
//! - **middleware**: `RequestLogger`, the middleware itself
//! - **lifecycle**: setup diagnostics through `tracing`
//!
//! # Usage
//!
//! ```rust,ignore
//! use logy::logging::{RequestLogger, TracingSink};
//! use logy::{HeaderSelection, LogyConfig};
//!
//! let config = Arc::new(
//!     LogyConfig::new()
//!         .with_logger(TracingSink)
//!         .with_filter_parameters(["password", "token"])
//!         .with_headers(HeaderSelection::only(["X-Request-Id"])),
//! );
//!
//! let app = build_middleware_chain(
//!     vec![RequestLogger::new(config).into_middleware()],
//!     handler_fn(show_widget),
//! );
//! ```

// =============================================================================
// Submodules
// =============================================================================

mod constants;
mod filter;
mod format;
mod lifecycle;
mod middleware;
mod record;
mod sink;
mod types;

// =============================================================================
// Public API Re-exports
// =============================================================================

// Constants
pub use constants::{
    ALL_HEADERS, DEFAULT_FILTER_PARAMETERS, DEFAULT_FILTER_REPLACEMENT, FILTER_FAILED_REPLACEMENT,
    DEFAULT_SLOW_QUERY_THRESHOLD_SECS, ERROR_MARKER, QUERY_RUNTIME_LABEL, SHORT_ID_LENGTH,
    SLOW_QUERY_WARNING, START_TIME_FORMAT, START_TIME_OFFSET_FORMAT, UTC_LABEL,
};

// Core Types
pub use types::{LogLevel, RequestId};

// Sinks
pub use sink::{LogSink, MemorySink, StdoutSink, TracingSink};

// Filtering
pub use filter::{ParameterFilter, RedactionFilter};

// Formatting
pub use format::{
    Timings, completed_line, exception_line, failure_line, format_seconds, format_timestamp,
    headers_line, parameters_line, processing_line, started_line,
};

// Lifecycle
pub use record::{ErrorInfo, Outcome, Phase, RequestRecord, Timestamp};

// Middleware
pub use middleware::RequestLogger;

// Setup Logging
pub use lifecycle::{log_logger_init, log_query_runtime_subscribed, log_status_registered};
