#![warn(missing_docs)]
//! # Logy
//!
//! Request logging middleware with a timing breakdown per request.
//!
//! ## Overview
//!
//! Every request passing through a [`RequestLogger`] gets:
//! - a start line with method, path and start time, the handling endpoint,
//!   filtered parameters and, optionally, selected headers;
//! - exactly one `Completed` line with the total time split into query time
//!   (reported by instrumentation) and view time (the rest);
//! - a warning line for errors, framework failures and slow queries.
//!
//! The logger only observes: responses, errors and failures reach the caller
//! unchanged, and a failing sink never affects the request.
//!
//! ## Architecture
//!
//! ```text
//!   request ─▶ RequestLogger ─▶ … middleware … ─▶ handler
//!                  │                                  │
//!                  │ before / after*                  │ Notifier::instrument(QUERY_EVENT)
//!                  ▼                                  ▼
//!              LogSink                      subscribe_query_runtime
//!                                                     │
//!                  RequestTimer::read ◀── accumulate ─┘
//!                  (task-local per request)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use logy::prelude::*;
//! use std::sync::Arc;
//!
//! let notifier = Arc::new(Notifier::new());
//! subscribe_query_runtime(&notifier);
//!
//! let config = Arc::new(
//!     LogyConfig::new()
//!         .with_filter_parameters(["password", "token"])
//!         .with_headers(HeaderSelection::only(["X-Request-Id"]))
//!         .register_status_exceptions(|registry| {
//!             registry.register("Widgets::NotFound", 404);
//!         }),
//! );
//!
//! let db = notifier.clone();
//! let app = build_middleware_chain(
//!     vec![RequestLogger::new(config).into_middleware()],
//!     handler_fn(move |req: Request| {
//!         let db = db.clone();
//!         async move {
//!             let rows = db.instrument(QUERY_EVENT, json!({"sql": "SELECT 1"}), || 1);
//!             Ok(Response::ok(json!({ "rows": rows, "path": req.path })))
//!         }
//!     }),
//! );
//! ```
//!
//! ## Error Handling
//!
//! Handlers return [`HandlerResult`]. An [`ApiError`] is logged with the
//! status it declares, the status registered for its kind, or 500. A
//! [`Failure`] is logged with its own status.

pub mod config;
pub mod error;
pub mod instrumentation;
pub mod logging;
pub mod middleware;
pub mod registry;
pub mod request;
pub mod timer;

#[cfg(test)]
mod tests;

pub use config::{HeaderSelection, LoggerOptions, LogySettings, LogyConfig};
pub use error::{
    Abort, ApiError, ConfigError, Failure, HandlerResult, LogyError, LogyResult, PANIC_KIND,
    SinkError,
};
pub use instrumentation::{Event, Notifier, QUERY_EVENT, SubscriptionId, subscribe_query_runtime};
pub use logging::{
    LogLevel, LogSink, MemorySink, ParameterFilter, RedactionFilter, RequestId, RequestLogger,
    StdoutSink, TracingSink,
};
pub use middleware::{
    HandlerFuture, Middleware, MiddlewareFn, Next, build_middleware_chain, from_fn, handler_fn,
};
pub use registry::{DEFAULT_ERROR_STATUS, StatusExceptionRegistry};
pub use request::{Endpoint, Headers, Params, Request, Response};
pub use timer::RequestTimer;

/// Common imports for wiring the logger into an application.
pub mod prelude {
    pub use crate::{
        Abort, ApiError, Endpoint, Failure, HandlerResult, HeaderSelection, LogyConfig, Next,
        Notifier, QUERY_EVENT, Request, RequestLogger, RequestTimer, Response, build_middleware_chain,
        handler_fn, subscribe_query_runtime,
    };
    pub use serde_json::json;
}
