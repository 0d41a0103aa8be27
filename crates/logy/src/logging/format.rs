//! Text of the request log lines.

use crate::logging::constants::{
    ERROR_MARKER, QUERY_RUNTIME_LABEL, START_TIME_FORMAT, START_TIME_OFFSET_FORMAT, UTC_LABEL,
};
use crate::timer::{RequestTimer, round_to};
use chrono::{DateTime, Local, Offset, TimeZone};
use serde::Serialize;
use std::fmt;

/// Durations of one request, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timings {
    /// Wall-clock time between start and stop
    pub total_secs: f64,
    /// Time reported by instrumented queries
    pub query_secs: f64,
    /// `total_secs - query_secs`; negative when queries overlapped
    pub view_secs: f64,
}

impl Timings {
    /// Converts a wall-clock total and a query total, both in milliseconds.
    pub fn from_millis(total_ms: f64, query_ms: f64) -> Self {
        let total_secs = RequestTimer::ms_to_seconds(total_ms);
        let query_secs = RequestTimer::ms_to_seconds(query_ms);
        Self {
            total_secs,
            query_secs,
            view_secs: round_to(total_secs - query_secs, 4),
        }
    }
}

/// Formats seconds the way the completed line shows them: `0.0123`, `1.0`.
pub fn format_seconds(secs: f64) -> String {
    if secs.is_finite() && secs.fract() == 0.0 {
        format!("{secs:.1}")
    } else {
        format!("{secs}")
    }
}

/// Formats the request start time, e.g. `2024-05-01 10:00:00 +0200`.
///
/// A zero offset prints as `UTC`: `2024-05-01 10:00:00 UTC`.
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let offset = if at.offset().fix().local_minus_utc() == 0 {
        UTC_LABEL.to_string()
    } else {
        at.format(START_TIME_OFFSET_FORMAT).to_string()
    };
    format!("{} {}", at.format(START_TIME_FORMAT), offset)
}

/// Compact JSON rendering of parameters and headers.
pub fn format_map<T: Serialize>(map: &T) -> String {
    serde_json::to_string(map).unwrap_or_else(|error| {
        tracing::warn!(error = %error, "failed to render map for request log");
        "{}".to_string()
    })
}

/// `Started GET "/widgets" at 2024-05-01 10:00:00 +0200`
pub fn started_line(method: &str, path: &str, at: &DateTime<Local>) -> String {
    format!(r#"Started {} "{}" at {}"#, method, path, format_timestamp(at))
}

/// `Processing by Api/widgets`
pub fn processing_line(processed_by: &str) -> String {
    format!("Processing by {processed_by}")
}

/// `  Parameters: {"id":"1"}`
pub fn parameters_line<T: Serialize>(params: &T) -> String {
    format!("  Parameters: {}", format_map(params))
}

/// `  Headers: {"X-Request-Id":"abc"}`
pub fn headers_line<T: Serialize>(headers: &T) -> String {
    format!("  Headers: {}", format_map(headers))
}

/// `💥 Widgets::NotFound: widget 1 not found`
pub fn exception_line(kind: &str, message: &str) -> String {
    format!("{ERROR_MARKER} {kind}: {message}")
}

/// `💥 Error: id is missing`
pub fn failure_line(message: &str) -> String {
    format!("{ERROR_MARKER} Error: {message}")
}

/// `Completed 200 in 0.0123 s (ActiveRecord: 0.002 s | View: 0.0103 s)`
pub fn completed_line(status: u16, timings: &Timings) -> String {
    format!(
        "Completed {} in {} s ({}: {} s | View: {} s)",
        status,
        format_seconds(timings.total_secs),
        QUERY_RUNTIME_LABEL,
        format_seconds(timings.query_secs),
        format_seconds(timings.view_secs),
    )
}
