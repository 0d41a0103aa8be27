//! Constants and default values for the logging module.

/// Query time, in seconds, above which the slow query warning is logged.
pub const DEFAULT_SLOW_QUERY_THRESHOLD_SECS: f64 = 2.0;

/// Prefix of warning lines for errors and failures.
pub const ERROR_MARKER: &str = "\u{1F4A5}";

/// Warning emitted after the completed line when queries were slow.
pub const SLOW_QUERY_WARNING: &str = "\u{1F525} Please refactor your query couse its too slow";

/// Label for query time in the completed line.
pub const QUERY_RUNTIME_LABEL: &str = "ActiveRecord";

/// `strftime` format of the request start time, without its offset.
pub const START_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// `strftime` format of a non-zero start time offset, e.g. `+0200`.
pub const START_TIME_OFFSET_FORMAT: &str = "%z";

/// Printed in place of a zero start time offset.
pub const UTC_LABEL: &str = "UTC";

/// Settings keyword selecting every request header.
pub const ALL_HEADERS: &str = "all";

/// Replacement for filtered parameter values.
pub const DEFAULT_FILTER_REPLACEMENT: &str = "[FILTERED]";

/// Replacement for every parameter value when the filter itself panics.
pub const FILTER_FAILED_REPLACEMENT: &str = "[FILTER FAILED]";

/// Parameter names filtered when a filter is built without an explicit list.
///
/// Matching is case-insensitive and by substring.
pub const DEFAULT_FILTER_PARAMETERS: &[&str] = &[
    "passw",
    "secret",
    "token",
    "_key",
    "crypt",
    "salt",
    "certificate",
    "otp",
    "ssn",
];

/// Length of the short request ID format (first N characters of UUID).
pub const SHORT_ID_LENGTH: usize = 8;
