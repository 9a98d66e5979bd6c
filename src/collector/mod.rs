//! Collection engine.
//!
//! # Data Flow
//! ```text
//! scrape request
//!     → Collector::collect (single-flight guard)
//!     → for each PathMetric, in construction order:
//!         sleep(delay) unless first
//!         → RouteSource::fetch
//!         → ok: set gauges from first result / ko: keep gauges
//!         → api_calls{status} + time spent counters
//!     → registry rendered by the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Calls of one cycle never overlap; at most one cycle runs at a time
//! - A scrape arriving during a cycle waits for it and reuses its results
//! - Failures are isolated per path; gauges keep their previous value
//! - Only the first route of a response is published, alternatives are ignored
//! - Shutdown abandons the in-flight call or sleep
//! - A scrape that goes away mid-cycle does not: the cycle runs on its own task

pub mod path;

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{Counter, Gauge};
use tokio::sync::Mutex;
use tokio::task::JoinError;
use tokio::time::Instant;

use crate::lifecycle::Shutdown;
use crate::observability::{CallStatus, MetricsRegistry};
use crate::waze::{RouteQuery, RouteResult, WazeClient, WazeResult};

pub use path::{build_path_metrics, PathMetric};

/// Anything able to answer a routing query.
pub trait RouteSource: Send + Sync {
    fn fetch(&self, query: &RouteQuery) -> impl Future<Output = WazeResult<Vec<RouteResult>>> + Send;
}

impl RouteSource for WazeClient {
    fn fetch(&self, query: &RouteQuery) -> impl Future<Output = WazeResult<Vec<RouteResult>>> + Send {
        self.route(query)
    }
}

/// Summary of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub succeeded: usize,
    pub failed: usize,
    pub elapsed: Duration,
    /// Shutdown interrupted the cycle before every path was visited.
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// This call ran a cycle.
    Completed(CycleReport),
    /// Another cycle was in flight; its results are already published.
    Coalesced,
}

/// Drives the upstream calls of every path-metric, one cycle per scrape.
pub struct Collector<S> {
    source: S,
    paths: Vec<PathMetric>,
    delay: Duration,
    calls_ok: Counter,
    calls_ko: Counter,
    time_spent: Gauge,
    cycle_lock: Mutex<()>,
    cycles: AtomicU64,
    shutdown: Shutdown,
}

impl<S: RouteSource> Collector<S> {
    pub fn new(
        source: S,
        paths: Vec<PathMetric>,
        delay: Duration,
        registry: &MetricsRegistry,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            source,
            paths,
            delay,
            calls_ok: registry.calls_counter(CallStatus::Ok),
            calls_ko: registry.calls_counter(CallStatus::Ko),
            time_spent: registry.time_spent_gauge(),
            cycle_lock: Mutex::new(()),
            cycles: AtomicU64::new(0),
            shutdown,
        }
    }

    pub fn paths(&self) -> &[PathMetric] {
        &self.paths
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run one cycle, or wait for the one already in flight.
    pub async fn collect(&self) -> CycleOutcome {
        let seen = self.cycles.load(Ordering::Acquire);
        let _guard = self.cycle_lock.lock().await;

        if self.cycles.load(Ordering::Acquire) != seen {
            tracing::debug!("Reusing results of the cycle that was in flight");
            return CycleOutcome::Coalesced;
        }

        let report = self.run_cycle().await;
        self.cycles.fetch_add(1, Ordering::Release);
        CycleOutcome::Completed(report)
    }

    /// Like [`Collector::collect`], but on a spawned task.
    ///
    /// Dropping the returned future leaves the cycle running to completion.
    pub async fn collect_detached(self: Arc<Self>) -> Result<CycleOutcome, JoinError>
    where
        S: 'static,
    {
        tokio::spawn(async move { self.collect().await }).await
    }

    async fn run_cycle(&self) -> CycleReport {
        let started = Instant::now();
        let mut report = CycleReport::default();

        for (index, path) in self.paths.iter().enumerate() {
            if index > 0 {
                tokio::select! {
                    biased;
                    _ = self.shutdown.wait() => {
                        report.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }

            let call_started = Instant::now();
            let result = tokio::select! {
                biased;
                _ = self.shutdown.wait() => {
                    report.cancelled = true;
                    break;
                }
                result = self.source.fetch(path.query()) => result,
            };
            self.time_spent.increment(call_started.elapsed().as_secs_f64());

            match result {
                Ok(results) => {
                    self.calls_ok.increment(1);
                    report.succeeded += 1;
                    match results.first() {
                        Some(route) => {
                            tracing::debug!(
                                from = %path.from_name(),
                                to = %path.to_name(),
                                distance = route.distance,
                                duration_secs = route.duration.as_secs_f64(),
                                alternatives = results.len() - 1,
                                "Route updated"
                            );
                            path.record(route);
                        }
                        None => {
                            tracing::warn!(
                                from = %path.from_name(),
                                to = %path.to_name(),
                                "Upstream returned no route, keeping previous values"
                            );
                        }
                    }
                }
                Err(e) => {
                    self.calls_ko.increment(1);
                    report.failed += 1;
                    tracing::warn!(
                        from = %path.from_name(),
                        to = %path.to_name(),
                        error = %e,
                        "Route call failed, keeping previous values"
                    );
                }
            }
        }

        report.elapsed = started.elapsed();
        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Collection cycle finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::metrics::{API_CALLS, TIME_SPENT, TRAVEL_DISTANCE, TRAVEL_TIME};
    use crate::waze::{RouteOptions, Upstream, WazeError};
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Arc, Mutex as StdMutex};

    type Reply = WazeResult<Vec<RouteResult>>;

    /// Replays scripted replies and records when each query arrived.
    #[derive(Default)]
    struct ScriptedSource {
        replies: StdMutex<VecDeque<Reply>>,
        calls: StdMutex<Vec<(String, Instant)>>,
    }

    impl ScriptedSource {
        fn with_replies(replies: Vec<Reply>) -> Self {
            Self {
                replies: StdMutex::new(replies.into()),
                calls: StdMutex::default(),
            }
        }

        fn calls(&self) -> Vec<(String, Instant)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl RouteSource for ScriptedSource {
        fn fetch(&self, query: &RouteQuery) -> impl Future<Output = Reply> + Send {
            self.calls
                .lock()
                .unwrap()
                .push((query.from_coordinates().to_string(), Instant::now()));
            let reply = self.replies.lock().unwrap().pop_front().unwrap_or_else(|| Ok(Vec::new()));
            async move { reply }
        }
    }

    /// Takes a fixed time per call and tracks overlapping calls.
    #[derive(Default)]
    struct SlowSource {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        total: AtomicUsize,
    }

    impl RouteSource for SlowSource {
        fn fetch(&self, _query: &RouteQuery) -> impl Future<Output = Reply> + Send {
            async move {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_in_flight.fetch_max(now, Ordering::SeqCst);
                self.total.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(100)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(vec![route(100, 10.0)])
            }
        }
    }

    /// Never answers.
    struct StalledSource;

    impl RouteSource for StalledSource {
        fn fetch(&self, _query: &RouteQuery) -> impl Future<Output = Reply> + Send {
            std::future::pending()
        }
    }

    fn route(distance: u64, secs: f64) -> RouteResult {
        RouteResult {
            duration: Duration::from_secs_f64(secs),
            distance,
        }
    }

    fn paths(registry: &MetricsRegistry, names: &[(&str, &str)]) -> Vec<PathMetric> {
        let upstream = Upstream::parse("https://www.waze.com").unwrap();
        names
            .iter()
            .map(|(from, to)| {
                let query = RouteQuery::new(&upstream, from, to, RouteOptions::default());
                PathMetric::new(from, to, query, registry)
            })
            .collect()
    }

    fn completed(outcome: CycleOutcome) -> CycleReport {
        match outcome {
            CycleOutcome::Completed(report) => report,
            CycleOutcome::Coalesced => panic!("expected a completed cycle"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_only_between_calls() {
        let registry = MetricsRegistry::new();
        let source = ScriptedSource::default();
        let collector = Collector::new(
            source,
            paths(&registry, &[("A", "B"), ("B", "A"), ("A", "C")]),
            Duration::from_millis(500),
            &registry,
            Shutdown::new(),
        );

        let started = Instant::now();
        let report = completed(collector.collect().await);
        let calls = collector.source.calls();

        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].1, started);
        assert_eq!(calls[1].1 - calls[0].1, Duration::from_millis(500));
        assert_eq!(calls[2].1 - calls[1].1, Duration::from_millis(500));
        assert_eq!(report.elapsed, Duration::from_millis(1000));
        assert_eq!(report.succeeded, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_follow_construction_order() {
        let registry = MetricsRegistry::new();
        let collector = Collector::new(
            ScriptedSource::default(),
            paths(&registry, &[("C", "D"), ("A", "B"), ("B", "A")]),
            Duration::from_millis(10),
            &registry,
            Shutdown::new(),
        );

        collector.collect().await;
        collector.collect().await;

        let order: Vec<String> = collector.source.calls().into_iter().map(|(from, _)| from).collect();
        assert_eq!(order, vec!["C", "A", "B", "C", "A", "B"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_previous_values() {
        let registry = MetricsRegistry::new();
        let source = ScriptedSource::with_replies(vec![
            Ok(vec![route(1200, 95.4), route(5000, 300.0)]),
            Err(WazeError::UpstreamStatus { status: 500 }),
        ]);
        let collector = Collector::new(
            source,
            paths(&registry, &[("A", "B")]),
            Duration::from_millis(500),
            &registry,
            Shutdown::new(),
        );
        let labels = [("from", "A"), ("to", "B")];

        let first = completed(collector.collect().await);
        assert_eq!(first.succeeded, 1);
        assert_eq!(registry.sample(TRAVEL_DISTANCE, &labels), Some(1200.0));
        assert_eq!(registry.sample(TRAVEL_TIME, &labels), Some(95.0));

        let second = completed(collector.collect().await);
        assert_eq!(second.failed, 1);
        assert_eq!(registry.sample(TRAVEL_DISTANCE, &labels), Some(1200.0));
        assert_eq!(registry.sample(TRAVEL_TIME, &labels), Some(95.0));
        assert_eq!(registry.sample(API_CALLS, &[("status", "ok")]), Some(1.0));
        assert_eq!(registry.sample(API_CALLS, &[("status", "ko")]), Some(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_abort_cycle() {
        let registry = MetricsRegistry::new();
        let source = ScriptedSource::with_replies(vec![
            Err(WazeError::Decode("garbage".into())),
            Ok(vec![route(800, 60.0)]),
        ]);
        let collector = Collector::new(
            source,
            paths(&registry, &[("A", "B"), ("B", "A")]),
            Duration::from_millis(500),
            &registry,
            Shutdown::new(),
        );

        let report = completed(collector.collect().await);
        assert_eq!((report.succeeded, report.failed), (1, 1));
        assert_eq!(registry.sample(TRAVEL_DISTANCE, &[("from", "A"), ("to", "B")]), Some(0.0));
        assert_eq!(registry.sample(TRAVEL_DISTANCE, &[("from", "B"), ("to", "A")]), Some(800.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_response_counts_as_success() {
        let registry = MetricsRegistry::new();
        let source = ScriptedSource::with_replies(vec![Ok(vec![route(10, 1.0)]), Ok(Vec::new())]);
        let collector = Collector::new(
            source,
            paths(&registry, &[("A", "B")]),
            Duration::ZERO,
            &registry,
            Shutdown::new(),
        );

        collector.collect().await;
        collector.collect().await;

        assert_eq!(registry.sample(API_CALLS, &[("status", "ok")]), Some(2.0));
        assert_eq!(registry.sample(TRAVEL_DISTANCE, &[("from", "A"), ("to", "B")]), Some(10.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_scrapes_share_one_cycle() {
        let registry = MetricsRegistry::new();
        let collector = Arc::new(Collector::new(
            SlowSource::default(),
            paths(&registry, &[("A", "B"), ("B", "A")]),
            Duration::from_millis(50),
            &registry,
            Shutdown::new(),
        ));

        let (first, second) = tokio::join!(collector.collect(), collector.collect());

        let outcomes = [&first, &second];
        assert_eq!(outcomes.iter().filter(|o| matches!(o, CycleOutcome::Coalesced)).count(), 1);
        assert_eq!(collector.source.total.load(Ordering::SeqCst), 2);
        assert_eq!(collector.source.max_in_flight.load(Ordering::SeqCst), 1);

        // A later scrape starts a fresh cycle.
        assert!(matches!(collector.collect().await, CycleOutcome::Completed(_)));
        assert_eq!(collector.source.total.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_shutdown_abandons_in_flight_call() {
        let registry = MetricsRegistry::new();
        let shutdown = Shutdown::new();
        let collector = Arc::new(Collector::new(
            StalledSource,
            paths(&registry, &[("A", "B"), ("B", "A")]),
            Duration::from_millis(500),
            &registry,
            shutdown.clone(),
        ));

        let running = tokio::spawn({
            let collector = collector.clone();
            async move { collector.collect().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger();

        let outcome = tokio::time::timeout(Duration::from_secs(1), running)
            .await
            .expect("cycle should stop promptly")
            .unwrap();
        let report = completed(outcome);
        assert!(report.cancelled);
        assert_eq!(report.succeeded + report.failed, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_caller_does_not_cut_cycle_short() {
        let registry = MetricsRegistry::new();
        let collector = Arc::new(Collector::new(
            ScriptedSource::default(),
            paths(&registry, &[("A", "B"), ("B", "A"), ("A", "C")]),
            Duration::from_millis(500),
            &registry,
            Shutdown::new(),
        ));

        // The caller gives up while the cycle sleeps before its second call.
        let caller = tokio::spawn(collector.clone().collect_detached());
        tokio::time::sleep(Duration::from_millis(100)).await;
        caller.abort();
        assert!(caller.await.unwrap_err().is_cancelled());
        assert_eq!(collector.source.calls().len(), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        let order: Vec<String> = collector.source.calls().into_iter().map(|(from, _)| from).collect();
        assert_eq!(order, vec!["A", "B", "A"]);
        assert_eq!(registry.sample(API_CALLS, &[("status", "ok")]), Some(3.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_spent_sums_call_durations() {
        let registry = MetricsRegistry::new();
        let collector = Collector::new(
            SlowSource::default(),
            paths(&registry, &[("A", "B"), ("B", "A")]),
            Duration::from_millis(500),
            &registry,
            Shutdown::new(),
        );

        collector.collect().await;

        // Two calls of 100ms each; the sleep between them is not counted.
        assert_eq!(registry.sample(TIME_SPENT, &[]), Some(0.2));
    }
}
