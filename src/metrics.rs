//! Process-wide metric registry shared by every VU in a run.
//!
//! Registration is get-or-create: the first caller for a name materializes
//! the counter or trend, every later caller receives a handle to the same
//! instance. Handles are internally atomic, so operation code increments
//! and records without any external locking.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use metriken::{AtomicHistogram, Counter};
use once_cell::sync::Lazy;

/// The fixed observability surface: these names must match exactly for
/// downstream dashboards and exports.
pub const METRIC_NAMES: [&str; 12] = [
    "frostfs_obj_put_total",
    "frostfs_obj_put_fails",
    "frostfs_obj_put_duration",
    "frostfs_obj_get_total",
    "frostfs_obj_get_fails",
    "frostfs_obj_get_duration",
    "frostfs_obj_delete_total",
    "frostfs_obj_delete_fails",
    "frostfs_obj_delete_duration",
    "frostfs_cnr_put_total",
    "frostfs_cnr_put_fails",
    "frostfs_cnr_put_duration",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Trend,
}

/// A stable reference to one registered metric. Cloning is cheap and every
/// clone for a given name refers to the same underlying instance.
#[derive(Clone)]
pub enum Metric {
    Counter(Arc<Counter>),
    Trend(Arc<AtomicHistogram>),
}

impl Metric {
    pub fn as_counter(&self) -> Option<&Arc<Counter>> {
        match self {
            Metric::Counter(counter) => Some(counter),
            Metric::Trend(_) => None,
        }
    }

    pub fn as_trend(&self) -> Option<&Arc<AtomicHistogram>> {
        match self {
            Metric::Trend(trend) => Some(trend),
            Metric::Counter(_) => None,
        }
    }
}

#[derive(Default)]
pub struct Registry {
    metrics: RwLock<HashMap<String, Metric>>,
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::default);

pub fn registry() -> &'static Registry {
    &REGISTRY
}

impl Registry {
    /// Returns the metric registered under `name`, creating it on first use.
    ///
    /// Safe under concurrent first access: two VUs racing on the same name
    /// get handles to one instance, and a later registration pass never
    /// replaces a handle another VU already holds.
    pub fn get_or_create(&self, name: &str, kind: MetricKind) -> Metric {
        if let Some(existing) = self
            .metrics
            .read()
            .expect("metric registry lock poisoned")
            .get(name)
        {
            return existing.clone();
        }

        let mut metrics = self.metrics.write().expect("metric registry lock poisoned");
        metrics
            .entry(name.to_string())
            .or_insert_with(|| match kind {
                MetricKind::Counter => Metric::Counter(Arc::new(Counter::default())),
                MetricKind::Trend => Metric::Trend(Arc::new(AtomicHistogram::new(7, 64))),
            })
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Metric> {
        self.metrics
            .read()
            .expect("metric registry lock poisoned")
            .get(name)
            .cloned()
    }

    fn counter(&self, name: &str) -> Arc<Counter> {
        match self.get_or_create(name, MetricKind::Counter) {
            Metric::Counter(counter) => counter,
            Metric::Trend(_) => panic!("metric {name} already registered as a trend"),
        }
    }

    fn trend(&self, name: &str) -> Arc<AtomicHistogram> {
        match self.get_or_create(name, MetricKind::Trend) {
            Metric::Trend(trend) => trend,
            Metric::Counter(_) => panic!("metric {name} already registered as a counter"),
        }
    }
}

/// Outcome counters and latency trend for one class of storage operation.
/// All VUs in a run share the same underlying instances by reference.
#[derive(Clone)]
pub struct MetricSet {
    total: Arc<Counter>,
    fails: Arc<Counter>,
    duration: Arc<AtomicHistogram>,
}

impl MetricSet {
    fn new(prefix: &str) -> Self {
        let registry = registry();
        Self {
            total: registry.counter(&format!("{prefix}_total")),
            fails: registry.counter(&format!("{prefix}_fails")),
            duration: registry.trend(&format!("{prefix}_duration")),
        }
    }

    pub fn total(&self) -> &Counter {
        &self.total
    }

    pub fn fails(&self) -> &Counter {
        &self.fails
    }

    pub fn record_ok(&self, latency: Duration) {
        self.total.increment();
        let _ = self.duration.increment(latency.as_nanos() as u64);
    }

    pub fn record_fail(&self, latency: Duration) {
        self.total.increment();
        self.fails.increment();
        let _ = self.duration.increment(latency.as_nanos() as u64);
    }
}

/// The per-operation metric sets handed to every client. Idempotent: every
/// call resolves the same twelve registered metrics.
#[derive(Clone)]
pub struct OpMetrics {
    pub obj_put: MetricSet,
    pub obj_get: MetricSet,
    pub obj_delete: MetricSet,
    pub cnr_put: MetricSet,
}

pub fn ops() -> OpMetrics {
    OpMetrics {
        obj_put: MetricSet::new("frostfs_obj_put"),
        obj_get: MetricSet::new("frostfs_obj_get"),
        obj_delete: MetricSet::new("frostfs_obj_delete"),
        cnr_put: MetricSet::new("frostfs_cnr_put"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_is_idempotent() {
        let a = registry().get_or_create("test/idempotent", MetricKind::Counter);
        let b = registry().get_or_create("test/idempotent", MetricKind::Counter);

        let a = a.as_counter().unwrap();
        let b = b.as_counter().unwrap();
        assert!(Arc::ptr_eq(a, b));

        a.increment();
        b.increment();
        assert_eq!(a.value(), 2);
        assert_eq!(b.value(), 2);
    }

    #[test]
    fn concurrent_first_use_creates_one_instance() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    registry()
                        .get_or_create("test/concurrent", MetricKind::Counter)
                })
            })
            .collect();

        let metrics: Vec<Metric> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let first = metrics[0].as_counter().unwrap();
        for metric in &metrics[1..] {
            assert!(Arc::ptr_eq(first, metric.as_counter().unwrap()));
        }
    }

    #[test]
    fn ops_resolves_stable_sets() {
        let a = ops();
        let b = ops();
        assert!(Arc::ptr_eq(&a.obj_put.total, &b.obj_put.total));
        assert!(Arc::ptr_eq(&a.cnr_put.duration, &b.cnr_put.duration));

        for name in METRIC_NAMES {
            assert!(registry().get(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn record_updates_shared_counters() {
        let set = MetricSet::new("test/record");
        let peer = MetricSet::new("test/record");

        let before = set.total().value();
        set.record_ok(Duration::from_millis(5));
        peer.record_fail(Duration::from_millis(7));

        assert_eq!(set.total().value(), before + 2);
        assert_eq!(peer.fails().value(), set.fails().value());
    }
}
