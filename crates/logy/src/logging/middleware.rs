use crate::config::{HeaderSelection, LoggerOptions, LogyConfig};
use crate::error::{Abort, HandlerResult};
use crate::logging::constants::FILTER_FAILED_REPLACEMENT;
use crate::logging::filter::ParameterFilter;
use crate::logging::lifecycle::log_logger_init;
use crate::logging::record::RequestRecord;
use crate::logging::sink::{LogSink, StdoutSink};
use crate::logging::types::RequestId;
use crate::middleware::{MiddlewareFn, Next, from_fn};
use crate::registry::StatusExceptionRegistry;
use crate::request::{Headers, Params, Request};
use crate::timer::RequestTimer;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::Instrument;

// =============================================================================
// Helper Functions
// =============================================================================

/// Best-effort message of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Headers named in `names`, matched case-insensitively, keeping the request's casing.
fn select_headers(headers: &Headers, names: &[String]) -> Headers {
    headers
        .iter()
        .filter(|(key, _)| names.iter().any(|name| name.eq_ignore_ascii_case(key)))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

// =============================================================================
// RequestLogger
// =============================================================================

struct LoggerInner {
    config: Arc<LogyConfig>,
    sink: Arc<dyn LogSink>,
    filter: Option<Arc<dyn ParameterFilter>>,
    headers: Option<HeaderSelection>,
}

/// Middleware that writes a start and a completed line for every request.
///
/// Cloning is cheap; clones share the resolved options.
///
/// # Example
///
/// ```rust,ignore
/// use logy::{LogyConfig, RequestLogger, build_middleware_chain, handler_fn};
///
/// let config = Arc::new(LogyConfig::new().with_filter_parameters(["password"]));
/// let logger = RequestLogger::new(config);
///
/// let app = build_middleware_chain(vec![logger.into_middleware()], handler_fn(show_widget));
/// let response = app(request).await?;
/// ```
#[derive(Clone)]
pub struct RequestLogger {
    inner: Arc<LoggerInner>,
}

impl std::fmt::Debug for RequestLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLogger")
            .field("config", &self.inner.config)
            .field("filter", &self.inner.filter.as_ref().map(|_| "<filter>"))
            .field("headers", &self.inner.headers)
            .finish()
    }
}

impl RequestLogger {
    /// Creates a logger using the config's defaults.
    pub fn new(config: Arc<LogyConfig>) -> Self {
        Self::with_options(config, LoggerOptions::default())
    }

    /// Creates a logger; each option falls back to the config, then to the built-in default.
    pub fn with_options(config: Arc<LogyConfig>, options: LoggerOptions) -> Self {
        let sink = options
            .logger
            .or_else(|| config.logger.clone())
            .unwrap_or_else(|| Arc::new(StdoutSink::new()) as Arc<dyn LogSink>);
        let filter = options.filter.or_else(|| config.filter.clone());
        let headers = options.headers.or_else(|| config.headers.clone());

        log_logger_init(&format!(
            "filter: {}, headers: {:?}, status exceptions: {}, slow query threshold: {}s",
            if filter.is_some() { "enabled" } else { "disabled" },
            headers,
            config.status_exceptions.len(),
            config.slow_query_threshold_secs,
        ));

        Self {
            inner: Arc::new(LoggerInner {
                config,
                sink,
                filter,
                headers,
            }),
        }
    }

    /// Shared configuration.
    pub fn config(&self) -> &LogyConfig {
        &self.inner.config
    }

    /// Resolved sink.
    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.inner.sink
    }

    /// Resolved header selection.
    pub fn header_selection(&self) -> Option<&HeaderSelection> {
        self.inner.headers.as_ref()
    }

    /// Registry used for errors without a declared status.
    pub fn status_exceptions(&self) -> &StatusExceptionRegistry {
        &self.inner.config.status_exceptions
    }

    /// Slow query threshold in seconds.
    pub fn slow_query_threshold_secs(&self) -> f64 {
        self.inner.config.slow_query_threshold_secs
    }

    /// Merged query, form and body parameters, filtered if a filter is set.
    ///
    /// A panicking filter replaces every value with [`FILTER_FAILED_REPLACEMENT`],
    /// so unfiltered values never reach the log.
    pub fn parameters(&self, req: &Request) -> Params {
        let params = req.merged_params();
        let Some(filter) = &self.inner.filter else {
            return params;
        };

        let keys: Vec<String> = params.keys().cloned().collect();
        match std::panic::catch_unwind(AssertUnwindSafe(|| filter.filter(params))) {
            Ok(filtered) => filtered,
            Err(payload) => {
                tracing::warn!(
                    error = %panic_message(payload.as_ref()),
                    "parameter filter panicked"
                );
                keys.into_iter()
                    .map(|key| (key, Value::String(FILTER_FAILED_REPLACEMENT.to_string())))
                    .collect()
            }
        }
    }

    /// Request headers selected for logging, sorted by name.
    pub fn headers(&self, req: &Request) -> Headers {
        match &self.inner.headers {
            Some(HeaderSelection::All) => req.headers.clone(),
            Some(HeaderSelection::Only(names)) => select_headers(&req.headers, names),
            None => Headers::new(),
        }
    }

    /// Runs `next` for `req`, logging its lifecycle.
    ///
    /// The outcome is returned unchanged: responses pass through, errors and
    /// failures are returned as they were, and panics resume after logging.
    pub async fn call(&self, req: Request, next: Next) -> HandlerResult {
        let span = if self.inner.config.create_spans {
            let request_id = RequestId::new();
            tracing::info_span!(
                "request",
                request_id = %request_id,
                method = %req.method,
                path = %req.path,
            )
        } else {
            tracing::Span::none()
        };

        RequestTimer::scope(self.run(req, next))
            .instrument(span)
            .await
    }

    async fn run(&self, req: Request, next: Next) -> HandlerResult {
        let mut record = RequestRecord::new(self);
        record.before(&req).await;
        record.handler_started();

        // `next` may panic before handing back its future.
        match AssertUnwindSafe(async move { next(req).await })
            .catch_unwind()
            .await
        {
            Ok(Ok(response)) => {
                record.after(response.status).await;
                Ok(response)
            }
            Ok(Err(Abort::Error(error))) => {
                record.after_exception(&error).await;
                Err(Abort::Error(error))
            }
            Ok(Err(Abort::Failure(failure))) => {
                record.after_failure(&failure).await;
                Err(Abort::Failure(failure))
            }
            Err(payload) => {
                record.after_panic(&panic_message(payload.as_ref())).await;
                std::panic::resume_unwind(payload)
            }
        }
    }

    /// Wraps this logger as a [`MiddlewareFn`].
    pub fn into_middleware(self) -> MiddlewareFn {
        from_fn(move |req, next| {
            let logger = self.clone();
            async move { logger.call(req, next).await }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(payload.as_ref()), "kaboom");

        let payload: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }

    #[test]
    fn test_select_headers_case_insensitive() {
        let mut headers = Headers::new();
        headers.insert("x-request-id".into(), "abc".into());
        headers.insert("X-Other".into(), "y".into());

        let selected = select_headers(&headers, &["X-Request-Id".to_string()]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected["x-request-id"], "abc");
    }
}
