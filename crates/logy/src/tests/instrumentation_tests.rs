//! Instrumentation tests - subscriptions, event delivery and query runtime

use serde_json::json;
use std::sync::{Arc, Mutex};

use crate::error::LogyError;
use crate::instrumentation::{Event, Notifier, QUERY_EVENT, subscribe_query_runtime};
use crate::timer::RequestTimer;

/// Subscriber that records the names and durations it receives.
fn recorder() -> (Arc<Mutex<Vec<(String, f64)>>>, impl Fn(&Event) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let callback = move |event: &Event| {
        sink.lock()
            .unwrap()
            .push((event.name.clone(), event.duration_ms));
    };
    (seen, callback)
}

#[test]
fn test_exact_subscription() {
    let notifier = Notifier::new();
    let (seen, callback) = recorder();
    notifier.subscribe(QUERY_EVENT, callback);

    notifier.publish(&Event::new(QUERY_EVENT, 12.5, json!({ "sql": "SELECT 1" })));
    notifier.publish(&Event::new("render.template", 3.0, json!({})));

    assert_eq!(
        *seen.lock().unwrap(),
        vec![(QUERY_EVENT.to_string(), 12.5)]
    );
}

#[test]
fn test_pattern_subscription() {
    let notifier = Notifier::new();
    let (seen, callback) = recorder();
    notifier.subscribe_pattern(r"^sql\.", callback).unwrap();

    notifier.publish(&Event::new("sql.query", 1.0, json!({})));
    notifier.publish(&Event::new("sql.transaction", 2.0, json!({})));
    notifier.publish(&Event::new("cache.read", 3.0, json!({})));

    let names: Vec<String> = seen.lock().unwrap().iter().map(|(n, _)| n.clone()).collect();
    assert_eq!(names, vec!["sql.query", "sql.transaction"]);
}

#[test]
fn test_invalid_pattern() {
    let notifier = Notifier::new();
    let result = notifier.subscribe_pattern("sql.(", |_event: &Event| {});
    assert!(matches!(result, Err(LogyError::InvalidPattern(_))));
    assert_eq!(notifier.subscriber_count(), 0);
}

#[test]
fn test_unsubscribe() {
    let notifier = Notifier::new();
    let (seen, callback) = recorder();
    let id = notifier.subscribe(QUERY_EVENT, callback);
    assert_eq!(notifier.subscriber_count(), 1);

    assert!(notifier.unsubscribe(id));
    assert!(!notifier.unsubscribe(id));
    assert_eq!(notifier.subscriber_count(), 0);

    notifier.publish(&Event::new(QUERY_EVENT, 1.0, json!({})));
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn test_subscription_ids_are_distinct() {
    let notifier = Notifier::new();
    let first = notifier.subscribe(QUERY_EVENT, |_event: &Event| {});
    let second = notifier.subscribe(QUERY_EVENT, |_event: &Event| {});
    assert_ne!(first, second);
    assert_eq!(notifier.subscriber_count(), 2);
}

#[test]
fn test_instrument_returns_result_and_publishes() {
    let notifier = Notifier::new();
    let (seen, callback) = recorder();
    notifier.subscribe(QUERY_EVENT, callback);

    let rows = notifier.instrument(QUERY_EVENT, json!({ "sql": "SELECT 1" }), || vec![1, 2, 3]);

    assert_eq!(rows, vec![1, 2, 3]);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].1 >= 0.0);
}

#[tokio::test]
async fn test_instrument_async_measures_awaited_work() {
    let notifier = Notifier::new();
    let (seen, callback) = recorder();
    notifier.subscribe(QUERY_EVENT, callback);

    let value = notifier
        .instrument_async(QUERY_EVENT, json!({}), async {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            42
        })
        .await;

    assert_eq!(value, 42);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].1 >= 20.0);
}

#[test]
fn test_subscriber_may_subscribe_while_publishing() {
    let notifier = Arc::new(Notifier::new());
    let inner = notifier.clone();
    notifier.subscribe(QUERY_EVENT, move |_event: &Event| {
        inner.subscribe("late.event", |_event: &Event| {});
    });

    notifier.publish(&Event::new(QUERY_EVENT, 1.0, json!({})));
    assert_eq!(notifier.subscriber_count(), 2);
}

#[test]
fn test_query_runtime_accumulates_into_timer() {
    let notifier = Notifier::new();
    subscribe_query_runtime(&notifier);

    let read = RequestTimer::sync_scope(|| {
        RequestTimer::reset();
        notifier.publish(&Event::new(QUERY_EVENT, 150.0, json!({})));
        notifier.publish(&Event::new("cache.read", 999.0, json!({})));
        notifier.publish(&Event::new(QUERY_EVENT, 50.5, json!({})));
        RequestTimer::read()
    });

    assert_eq!(read, 200.5);
}

#[tokio::test]
async fn test_query_runtime_attributed_to_publishing_task() {
    let notifier = Arc::new(Notifier::new());
    subscribe_query_runtime(&notifier);

    let first = {
        let notifier = notifier.clone();
        RequestTimer::scope(async move {
            RequestTimer::reset();
            notifier.publish(&Event::new(QUERY_EVENT, 10.0, json!({})));
            tokio::task::yield_now().await;
            RequestTimer::read()
        })
    };
    let second = {
        let notifier = notifier.clone();
        RequestTimer::scope(async move {
            RequestTimer::reset();
            tokio::task::yield_now().await;
            notifier.publish(&Event::new(QUERY_EVENT, 30.0, json!({})));
            RequestTimer::read()
        })
    };

    assert_eq!(tokio::join!(first, second), (10.0, 30.0));
}
