//! Per-request accumulator for externally reported durations.
//!
//! Query time is reported by an instrumentation hook that fires deep inside
//! the data-access layer, far from the logging middleware. The only key the
//! hook has is "which unit of execution is running now", so the accumulator
//! lives in storage scoped to that unit:
//!
//! - inside [`RequestTimer::scope`] / [`RequestTimer::sync_scope`] it is a
//!   task-local slot, isolated from every other in-flight request even when
//!   tasks share an OS thread;
//! - outside any scope it falls back to a thread-local slot, which gives
//!   thread-per-request callers the same isolation.
//!
//! Work spawned onto another task does not see the caller's scope. Report
//! durations from the task that runs the request.

use std::cell::Cell;
use std::future::Future;

tokio::task_local! {
    static TASK_RUNTIME: Cell<f64>;
}

thread_local! {
    static THREAD_RUNTIME: Cell<f64> = const { Cell::new(0.0) };
}

/// Rounds `value` to `places` decimal places, halves away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Accessor for the current unit's external duration, in milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestTimer;

impl RequestTimer {
    /// Runs `future` with its own accumulator, starting at zero.
    pub fn scope<F>(future: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        TASK_RUNTIME.scope(Cell::new(0.0), future)
    }

    /// Runs `f` with its own accumulator, starting at zero.
    pub fn sync_scope<R>(f: impl FnOnce() -> R) -> R {
        TASK_RUNTIME.sync_scope(Cell::new(0.0), f)
    }

    /// Returns true when called inside a task-local scope.
    pub fn in_scope() -> bool {
        TASK_RUNTIME.try_with(|_| ()).is_ok()
    }

    fn with_runtime<R>(f: impl Fn(&Cell<f64>) -> R) -> R {
        match TASK_RUNTIME.try_with(|cell| f(cell)) {
            Ok(result) => result,
            Err(_) => THREAD_RUNTIME.with(|cell| f(cell)),
        }
    }

    /// Sets the current unit's accumulator to zero.
    pub fn reset() {
        Self::with_runtime(|cell| cell.set(0.0));
    }

    /// Adds `duration_ms` to the current unit's accumulator.
    pub fn accumulate(duration_ms: f64) {
        Self::with_runtime(|cell| cell.set(cell.get() + duration_ms));
    }

    /// Accumulated milliseconds for the current unit, rounded to 2 places.
    pub fn read() -> f64 {
        Self::with_runtime(|cell| round_to(cell.get(), 2))
    }

    /// Converts milliseconds to seconds, rounded to 4 places.
    pub fn ms_to_seconds(ms: f64) -> f64 {
        round_to(ms / 1000.0, 4)
    }
}
