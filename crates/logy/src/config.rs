//! Configuration for the request logger.
//!
//! [`LogyConfig`] is built once at startup and shared behind an `Arc` by
//! every [`RequestLogger`](crate::RequestLogger). It holds the defaults a
//! logger falls back to and the [`StatusExceptionRegistry`].
//! [`LoggerOptions`] carries per-logger overrides.
//!
//! # Example
//! ```rust,ignore
//! use logy::{HeaderSelection, LogyConfig, RedactionFilter, TracingSink};
//!
//! let config = LogyConfig::new()
//!     .with_logger(TracingSink)
//!     .with_filter(RedactionFilter::new(["password", "token"]))
//!     .with_headers(HeaderSelection::only(["X-Request-Id"]))
//!     .register_status_exceptions(|registry| {
//!         registry
//!             .register("Widgets::NotFound", 404)
//!             .register("Widgets::Invalid", 422);
//!     });
//! ```
//!
//! The same configuration can come from application settings:
//!
//! ```rust,ignore
//! let config = LogyConfig::from_json(r#"{
//!     "headers": "all",
//!     "filter_parameters": ["password", "token"],
//!     "status_exceptions": { "Widgets::NotFound": 404 }
//! }"#)?;
//! ```

use crate::error::{ConfigError, LogyResult};
use crate::logging::{
    ALL_HEADERS, DEFAULT_SLOW_QUERY_THRESHOLD_SECS, LogSink, ParameterFilter, RedactionFilter,
};
use crate::registry::StatusExceptionRegistry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// HeaderSelection
// =============================================================================

/// Which request headers appear in the `Headers:` line.
///
/// Deserializes from the string `"all"` or from a list of header names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HeaderSetting", into = "HeaderSetting")]
pub enum HeaderSelection {
    /// Every request header
    All,
    /// Only the named headers, matched case-insensitively
    Only(Vec<String>),
}

impl HeaderSelection {
    /// Select every header.
    pub fn all() -> Self {
        Self::All
    }

    /// Select the named headers.
    pub fn only(names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Only(names.into_iter().map(Into::into).collect())
    }

    /// Rejects blank header names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Only(names) if names.iter().any(|name| name.trim().is_empty()) => {
                Err(ConfigError::BlankHeaderName)
            }
            _ => Ok(()),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum HeaderSetting {
    Keyword(String),
    Names(Vec<String>),
}

impl TryFrom<HeaderSetting> for HeaderSelection {
    type Error = ConfigError;

    fn try_from(setting: HeaderSetting) -> Result<Self, Self::Error> {
        match setting {
            HeaderSetting::Keyword(keyword) if keyword.eq_ignore_ascii_case(ALL_HEADERS) => {
                Ok(Self::All)
            }
            HeaderSetting::Keyword(keyword) => Err(ConfigError::UnknownHeaderSetting(keyword)),
            HeaderSetting::Names(names) => Ok(Self::Only(names)),
        }
    }
}

impl From<HeaderSelection> for HeaderSetting {
    fn from(selection: HeaderSelection) -> Self {
        match selection {
            HeaderSelection::All => Self::Keyword(ALL_HEADERS.to_string()),
            HeaderSelection::Only(names) => Self::Names(names),
        }
    }
}

// =============================================================================
// LogyConfig
// =============================================================================

/// Process-wide logger configuration, set once before serving traffic.
#[derive(Clone)]
pub struct LogyConfig {
    /// Default sink; loggers fall back to [`StdoutSink`](crate::StdoutSink) without one
    pub logger: Option<Arc<dyn LogSink>>,
    /// Default parameter filter
    pub filter: Option<Arc<dyn ParameterFilter>>,
    /// Default header selection; no `Headers:` line without one
    pub headers: Option<HeaderSelection>,
    /// Statuses for errors that carry none
    pub status_exceptions: StatusExceptionRegistry,
    /// Query time above which the slow query warning is logged
    pub slow_query_threshold_secs: f64,
    /// Whether each request runs inside a `tracing` span
    pub create_spans: bool,
}

impl Default for LogyConfig {
    fn default() -> Self {
        Self {
            logger: None,
            filter: None,
            headers: None,
            status_exceptions: StatusExceptionRegistry::new(),
            slow_query_threshold_secs: DEFAULT_SLOW_QUERY_THRESHOLD_SECS,
            create_spans: true,
        }
    }
}

impl fmt::Debug for LogyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogyConfig")
            .field("logger", &self.logger.as_ref().map(|_| "<sink>"))
            .field("filter", &self.filter.as_ref().map(|_| "<filter>"))
            .field("headers", &self.headers)
            .field("status_exceptions", &self.status_exceptions)
            .field("slow_query_threshold_secs", &self.slow_query_threshold_secs)
            .field("create_spans", &self.create_spans)
            .finish()
    }
}

impl LogyConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default sink.
    pub fn with_logger(mut self, logger: impl LogSink + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Sets the default parameter filter.
    pub fn with_filter(mut self, filter: impl ParameterFilter + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Filters parameters whose names contain any of `fields`.
    pub fn with_filter_parameters(self, fields: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        self.with_filter(RedactionFilter::new(fields))
    }

    /// Sets the default header selection.
    pub fn with_headers(mut self, headers: HeaderSelection) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Populates the status registry.
    pub fn register_status_exceptions(
        mut self,
        register: impl FnOnce(&mut StatusExceptionRegistry),
    ) -> Self {
        register(&mut self.status_exceptions);
        self
    }

    /// Registers a single status.
    pub fn register_status_exception(mut self, kind: impl Into<String>, status: u16) -> Self {
        self.status_exceptions.register(kind, status);
        self
    }

    /// Sets the slow query threshold in seconds.
    pub fn with_slow_query_threshold(mut self, secs: f64) -> Self {
        self.slow_query_threshold_secs = secs;
        self
    }

    /// Enables or disables per-request tracing spans.
    pub fn with_spans(mut self, enabled: bool) -> Self {
        self.create_spans = enabled;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(headers) = &self.headers {
            headers.validate()?;
        }
        self.status_exceptions.validate()?;
        if !(self.slow_query_threshold_secs > 0.0) {
            return Err(ConfigError::InvalidSlowQueryThreshold(
                self.slow_query_threshold_secs,
            ));
        }
        Ok(())
    }

    /// Builds and validates a configuration from application settings.
    pub fn from_settings(settings: LogySettings) -> Result<Self, ConfigError> {
        let mut config = Self::new()
            .with_slow_query_threshold(settings.slow_query_threshold_secs)
            .with_spans(settings.create_spans);

        config.headers = settings.headers;

        if !settings.filter_parameters.is_empty() {
            let mut filter = RedactionFilter::new(&settings.filter_parameters);
            if let Some(replacement) = settings.filter_replacement {
                filter = filter.with_replacement(replacement);
            }
            config = config.with_filter(filter);
        }

        config.status_exceptions = settings.status_exceptions.into_iter().collect();

        config.validate()?;
        Ok(config)
    }

    /// Parses settings from JSON and builds a configuration.
    pub fn from_json(json: &str) -> LogyResult<Self> {
        let settings: LogySettings = serde_json::from_str(json)?;
        Ok(Self::from_settings(settings)?)
    }
}

// =============================================================================
// LogySettings
// =============================================================================

/// Serializable subset of [`LogyConfig`], as read from application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogySettings {
    /// `"all"` or a list of header names
    pub headers: Option<HeaderSelection>,
    /// Parameter names to filter
    pub filter_parameters: Vec<String>,
    /// Replacement for filtered values
    pub filter_replacement: Option<String>,
    /// Error kind to status
    pub status_exceptions: BTreeMap<String, u16>,
    /// Query time above which the slow query warning is logged
    pub slow_query_threshold_secs: f64,
    /// Whether each request runs inside a `tracing` span
    pub create_spans: bool,
}

impl Default for LogySettings {
    fn default() -> Self {
        Self {
            headers: None,
            filter_parameters: Vec::new(),
            filter_replacement: None,
            status_exceptions: BTreeMap::new(),
            slow_query_threshold_secs: DEFAULT_SLOW_QUERY_THRESHOLD_SECS,
            create_spans: true,
        }
    }
}

// =============================================================================
// LoggerOptions
// =============================================================================

/// Per-logger overrides of the [`LogyConfig`] defaults.
#[derive(Clone, Default)]
pub struct LoggerOptions {
    /// Sink for this logger
    pub logger: Option<Arc<dyn LogSink>>,
    /// Parameter filter for this logger
    pub filter: Option<Arc<dyn ParameterFilter>>,
    /// Header selection for this logger
    pub headers: Option<HeaderSelection>,
}

impl fmt::Debug for LoggerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerOptions")
            .field("logger", &self.logger.as_ref().map(|_| "<sink>"))
            .field("filter", &self.filter.as_ref().map(|_| "<filter>"))
            .field("headers", &self.headers)
            .finish()
    }
}

impl LoggerOptions {
    /// Creates empty options; everything falls back to the config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sink.
    pub fn with_logger(mut self, logger: impl LogSink + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Sets the parameter filter.
    pub fn with_filter(mut self, filter: impl ParameterFilter + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Sets the header selection.
    pub fn with_headers(mut self, headers: HeaderSelection) -> Self {
        self.headers = Some(headers);
        self
    }
}
