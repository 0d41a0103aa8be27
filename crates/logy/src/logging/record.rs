//! Per-request lifecycle of the request logger.
//!
//! ```text
//! Init ─before()─▶ BeforeLogged ─handler─▶ HandlerRunning
//!                                              │
//!          ┌──────────────────┬────────────────┴──────────────┐
//!       after()        after_exception()               after_failure()
//!          └──────────────────┴────────────────┬──────────────┘
//!                                              ▼
//!                                          AfterLogged
//! ```
//!
//! Start and stop times are set lazily and at most once. The terminal
//! `Completed` line is written exactly once; later `after*` calls are
//! ignored.

use crate::error::{ApiError, Failure};
use crate::logging::constants::SLOW_QUERY_WARNING;
use crate::logging::format::{self, Timings};
use crate::logging::middleware::RequestLogger;
use crate::logging::types::LogLevel;
use crate::request::Request;
use crate::timer::RequestTimer;
use chrono::{DateTime, Local};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

/// A point in time, as wall clock for display and monotonic for durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Wall-clock time
    pub wall: DateTime<Local>,
    /// Monotonic time
    pub instant: Instant,
}

impl Timestamp {
    /// The current time.
    pub fn now() -> Self {
        Self {
            wall: Local::now(),
            instant: Instant::now(),
        }
    }

    /// Milliseconds elapsed since `earlier`; zero if `earlier` is later.
    pub fn millis_since(&self, earlier: &Timestamp) -> f64 {
        self.instant
            .saturating_duration_since(earlier.instant)
            .as_secs_f64()
            * 1000.0
    }
}

/// Lifecycle phase of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing logged yet
    Init,
    /// Start lines written
    BeforeLogged,
    /// The wrapped handler is executing
    HandlerRunning,
    /// Terminal line written
    AfterLogged,
}

/// How the handler exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The handler returned a response
    Completed,
    /// The handler raised an error or panicked
    ExceptionHandled,
    /// The framework signalled a failure
    FailureHandled,
}

/// Error details recorded for a failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    /// Message of the error or failure
    pub message: Option<String>,
    /// Status logged for it
    pub status: u16,
}

/// State of one request as seen by a [`RequestLogger`].
pub struct RequestRecord<'a> {
    logger: &'a RequestLogger,
    start: Option<Timestamp>,
    stop: Option<Timestamp>,
    phase: Phase,
    outcome: Option<Outcome>,
    status: Option<u16>,
    error: Option<ErrorInfo>,
    timings: Option<Timings>,
}

impl<'a> RequestRecord<'a> {
    /// Creates a record in the `Init` phase.
    pub fn new(logger: &'a RequestLogger) -> Self {
        Self {
            logger,
            start: None,
            stop: None,
            phase: Phase::Init,
            outcome: None,
            status: None,
            error: None,
            timings: None,
        }
    }

    /// Start time, set on first access.
    pub fn start_time(&mut self) -> Timestamp {
        *self.start.get_or_insert_with(Timestamp::now)
    }

    /// Stop time, set on first access.
    pub fn stop_time(&mut self) -> Timestamp {
        *self.stop.get_or_insert_with(Timestamp::now)
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// How the handler exited, once known.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Status written in the terminal line.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Error details, for failed requests.
    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// Durations written in the terminal line.
    pub fn timings(&self) -> Option<Timings> {
        self.timings
    }

    fn is_finished(&self) -> bool {
        self.phase == Phase::AfterLogged
    }

    /// Marks the wrapped handler as executing.
    pub fn handler_started(&mut self) {
        if self.phase == Phase::BeforeLogged {
            self.phase = Phase::HandlerRunning;
        }
    }

    /// Writes one line, containing any sink error or panic.
    async fn emit(&self, level: LogLevel, line: &str) {
        let sink = self.logger.sink();
        match AssertUnwindSafe(sink.write(level, line)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                tracing::warn!(error = %error, level = %level, "Request log sink failed to write");
            }
            Err(_) => {
                tracing::warn!(level = %level, "Request log sink panicked");
            }
        }
    }

    /// Resets query time, records the start and writes the start lines.
    pub async fn before(&mut self, req: &Request) {
        RequestTimer::reset();
        let started = self.start_time();

        self.emit(LogLevel::Info, "").await;
        self.emit(
            LogLevel::Info,
            &format::started_line(&req.method, &req.path, &started.wall),
        )
        .await;
        self.emit(
            LogLevel::Info,
            &format::processing_line(&req.endpoint.processed_by()),
        )
        .await;
        self.emit(
            LogLevel::Info,
            &format::parameters_line(&self.logger.parameters(req)),
        )
        .await;
        if self.logger.header_selection().is_some() {
            self.emit(
                LogLevel::Info,
                &format::headers_line(&self.logger.headers(req)),
            )
            .await;
        }
        self.emit(LogLevel::Info, "").await;

        self.phase = Phase::BeforeLogged;
    }

    /// Logs a raised error and finishes with its status.
    ///
    /// The status is the one declared by the error, else the one registered
    /// for its kind, else 500.
    pub async fn after_exception(&mut self, error: &ApiError) {
        if self.is_finished() {
            tracing::debug!(kind = %error.kind, "Request already logged, ignoring error");
            return;
        }

        self.emit(
            LogLevel::Warn,
            &format::exception_line(&error.kind, &error.message),
        )
        .await;

        let status = error
            .status
            .unwrap_or_else(|| self.logger.status_exceptions().status_for(&error.kind));

        self.outcome = Some(Outcome::ExceptionHandled);
        self.error = Some(ErrorInfo {
            message: Some(error.message.clone()),
            status,
        });
        self.after(status).await;
    }

    /// Logs a handler panic as a raised error with status 500.
    pub async fn after_panic(&mut self, message: &str) {
        self.after_exception(&ApiError::panic(message)).await;
    }

    /// Logs a framework failure and finishes with its status.
    pub async fn after_failure(&mut self, failure: &Failure) {
        if self.is_finished() {
            tracing::debug!(status = %failure.status, "Request already logged, ignoring failure");
            return;
        }

        if let Some(message) = &failure.message {
            self.emit(LogLevel::Warn, &format::failure_line(message)).await;
        }

        self.outcome = Some(Outcome::FailureHandled);
        self.error = Some(ErrorInfo {
            message: failure.message.clone(),
            status: failure.status,
        });
        self.after(failure.status).await;
    }

    /// Records the stop time and writes the terminal lines.
    pub async fn after(&mut self, status: u16) {
        if self.is_finished() {
            tracing::debug!(status = %status, "Request already logged");
            return;
        }

        let stopped = self.stop_time();
        let started = self.start_time();

        let timings = Timings::from_millis(stopped.millis_since(&started), RequestTimer::read());

        self.emit(LogLevel::Info, "").await;
        self.emit(LogLevel::Info, &format::completed_line(status, &timings))
            .await;
        if timings.query_secs > self.logger.slow_query_threshold_secs() {
            self.emit(LogLevel::Warn, SLOW_QUERY_WARNING).await;
        }
        self.emit(LogLevel::Info, "").await;

        self.outcome.get_or_insert(Outcome::Completed);
        self.status = Some(status);
        self.timings = Some(timings);
        self.phase = Phase::AfterLogged;
    }
}
