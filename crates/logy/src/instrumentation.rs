//! Instrumentation events for timed sub-operations.
//!
//! A data-access layer wraps each query in [`Notifier::instrument`] (or
//! [`Notifier::instrument_async`]); subscribers receive an [`Event`] with the
//! measured duration once the work finishes. Subscribers run synchronously
//! on the task that did the work, which is what lets
//! [`subscribe_query_runtime`] attribute query time to the right request.
//!
//! # Example
//! ```rust,ignore
//! use logy::instrumentation::{Notifier, QUERY_EVENT, subscribe_query_runtime};
//!
//! let notifier = Notifier::new();
//! subscribe_query_runtime(&notifier);
//!
//! let rows = notifier.instrument(QUERY_EVENT, json!({"sql": sql}), || db.query(sql));
//! ```

use crate::error::LogyResult;
use crate::logging::log_query_runtime_subscribed;
use crate::timer::RequestTimer;
use dashmap::DashMap;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Name of the event published for each completed database query.
pub const QUERY_EVENT: &str = "sql.query";

/// A completed, timed sub-operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    /// Event name, e.g. `sql.query`
    pub name: String,
    /// Duration in milliseconds
    pub duration_ms: f64,
    /// Event-specific data
    pub payload: Value,
}

impl Event {
    /// Creates an event.
    pub fn new(name: impl Into<String>, duration_ms: f64, payload: Value) -> Self {
        Self {
            name: name.into(),
            duration_ms,
            payload,
        }
    }
}

/// Callback invoked for matching events.
pub type Subscriber = Arc<dyn Fn(&Event) + Send + Sync>;

/// Handle returned by the subscribe methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

enum Matcher {
    Name(String),
    Pattern(Regex),
}

impl Matcher {
    fn matches(&self, name: &str) -> bool {
        match self {
            Self::Name(expected) => expected == name,
            Self::Pattern(pattern) => pattern.is_match(name),
        }
    }
}

struct Subscription {
    matcher: Matcher,
    callback: Subscriber,
}

/// Registry of event subscribers.
#[derive(Default)]
pub struct Notifier {
    subscriptions: DashMap<SubscriptionId, Subscription>,
    next_id: AtomicU64,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl Notifier {
    /// Creates a notifier with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, matcher: Matcher, callback: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions
            .insert(id, Subscription { matcher, callback });
        id
    }

    /// Subscribes to events named exactly `name`.
    pub fn subscribe<F>(&self, name: impl Into<String>, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.insert(Matcher::Name(name.into()), Arc::new(callback))
    }

    /// Subscribes to events whose name matches the regular expression `pattern`.
    pub fn subscribe_pattern<F>(&self, pattern: &str, callback: F) -> LogyResult<SubscriptionId>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let pattern = Regex::new(pattern)?;
        Ok(self.insert(Matcher::Pattern(pattern), Arc::new(callback)))
    }

    /// Removes a subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Delivers `event` to every matching subscriber on the calling task.
    pub fn publish(&self, event: &Event) {
        // Collect first so callbacks run without holding shard locks.
        let callbacks: Vec<Subscriber> = self
            .subscriptions
            .iter()
            .filter(|entry| entry.matcher.matches(&event.name))
            .map(|entry| Arc::clone(&entry.callback))
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }

    /// Runs `f`, then publishes an event with its duration.
    pub fn instrument<R>(&self, name: &str, payload: Value, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let result = f();
        self.publish(&Event::new(name, elapsed_ms(start), payload));
        result
    }

    /// Awaits `future`, then publishes an event with its duration.
    pub async fn instrument_async<F>(&self, name: &str, payload: Value, future: F) -> F::Output
    where
        F: Future,
    {
        let start = Instant::now();
        let result = future.await;
        self.publish(&Event::new(name, elapsed_ms(start), payload));
        result
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Adds the duration of every [`QUERY_EVENT`] to the current request's query time.
///
/// Subscribe once at startup, for each notifier the data-access layer reports to.
pub fn subscribe_query_runtime(notifier: &Notifier) -> SubscriptionId {
    log_query_runtime_subscribed(QUERY_EVENT);
    notifier.subscribe(QUERY_EVENT, |event| {
        RequestTimer::accumulate(event.duration_ms);
    })
}
