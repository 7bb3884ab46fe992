//! Per-request `Server-Timing` accumulation.
//!
//! The HTTP layer wraps each request in [`scope`]; anything awaited inside it
//! can be measured with [`measure`] (or [`db`] for data-access calls). Calls
//! outside a scope are still awaited, just not recorded.

use std::{
    cell::RefCell,
    future::Future,
    time::{Duration, Instant},
};

tokio::task_local! {
    static TIMINGS: RefCell<Timings>;
}

/// Metric name used for data-access calls.
pub const DB_METRIC: &str = "db";

/// Durations collected for one request, summed per metric name.
#[derive(Debug, Default, Clone)]
pub struct Timings {
    entries: Vec<(&'static str, Duration)>,
}

impl Timings {
    pub fn record(&mut self, name: &'static str, elapsed: Duration) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, total)) => *total += elapsed,
            None => self.entries.push((name, elapsed)),
        }
    }

    pub fn get(&self, name: &str) -> Option<Duration> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, d)| *d)
    }

    /// Renders the header value, e.g. `db;dur=3.2, total;dur=4.0`.
    ///
    /// `db` is always present so clients can rely on it even for requests
    /// that never touched the database.
    pub fn header_value(&self, total: Duration) -> String {
        let mut parts = Vec::with_capacity(self.entries.len() + 2);
        if self.get(DB_METRIC).is_none() {
            parts.push(format_metric(DB_METRIC, Duration::ZERO));
        }
        for (name, elapsed) in &self.entries {
            parts.push(format_metric(name, *elapsed));
        }
        parts.push(format_metric("total", total));
        parts.join(", ")
    }
}

fn format_metric(name: &str, elapsed: Duration) -> String {
    format!("{name};dur={:.1}", elapsed.as_secs_f64() * 1000.0)
}

/// Runs `fut` with a fresh timing collector and returns what it recorded.
pub async fn scope<F: Future>(fut: F) -> (F::Output, Timings) {
    TIMINGS
        .scope(RefCell::new(Timings::default()), async move {
            let output = fut.await;
            let timings = TIMINGS.with(|t| t.borrow().clone());
            (output, timings)
        })
        .await
}

/// Adds `elapsed` to the metric `name` of the current request, if any.
pub fn record(name: &'static str, elapsed: Duration) {
    let _ = TIMINGS.try_with(|t| t.borrow_mut().record(name, elapsed));
}

/// Awaits `fut` and records its wall time under `name`.
pub async fn measure<F: Future>(name: &'static str, fut: F) -> F::Output {
    let start = Instant::now();
    let output = fut.await;
    record(name, start.elapsed());
    output
}

/// Shorthand for `measure(DB_METRIC, fut)`.
pub async fn db<F: Future>(fut: F) -> F::Output {
    measure(DB_METRIC, fut).await
}
