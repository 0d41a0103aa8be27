//! Setup-time diagnostics, emitted through `tracing`.

/// Log request logger construction with a summary of its resolved options.
pub fn log_logger_init(config_summary: &str) {
    tracing::info!(
        config = %config_summary,
        "Request logger initialized"
    );
}

/// Log registration of a default status for an error kind. Logged at Trace level.
pub fn log_status_registered(kind: &str, status: u16) {
    tracing::trace!(
        kind = %kind,
        status = %status,
        "Status exception registered"
    );
}

/// Log subscription of the query runtime hook. Logged at Debug level.
pub fn log_query_runtime_subscribed(event: &str) {
    tracing::debug!(
        event = %event,
        "Query runtime subscribed"
    );
}
