//! Prometheus metrics for the recommendation engine
//!
//! Metrics live in the process-global registry; `EngineMetrics` is a
//! lightweight handle that registers them once on first use. Label tuples
//! are value-typed, so concurrent observations are safe.

use prometheus::{register_gauge_vec, register_histogram_vec, GaugeVec, HistogramVec};
use std::sync::OnceLock;

/// Latency buckets: the Prometheus defaults extended with coarse tails for
/// slow metric-source queries
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 20.0, 50.0, 100.0,
];

static GLOBAL_METRICS: OnceLock<EngineMetricsInner> = OnceLock::new();

struct EngineMetricsInner {
    reco_generation_latency_seconds: HistogramVec,
    cpu_utilization_query_latency_seconds: HistogramVec,
    datapoints_present: GaugeVec,
}

impl EngineMetricsInner {
    fn new() -> Self {
        Self {
            reco_generation_latency_seconds: register_histogram_vec!(
                "get_reco_generation_latency_seconds",
                "Time to generate recommendation in seconds",
                &["namespace", "policyreco", "workloadKind", "workload"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register get_reco_generation_latency_seconds"),

            cpu_utilization_query_latency_seconds: register_histogram_vec!(
                "get_avg_cpu_utilization_query_latency_seconds",
                "Time to execute utilization datapoint query in seconds",
                &["namespace", "policyreco", "workloadKind", "workload"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register get_avg_cpu_utilization_query_latency_seconds"),

            datapoints_present: register_gauge_vec!(
                "minimum_percentage_of_datapoints_present",
                "Whether enough datapoints were present to generate a recommendation",
                &["namespace", "workload"]
            )
            .expect("Failed to register minimum_percentage_of_datapoints_present"),
        }
    }
}

/// Engine metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share the
/// same underlying metrics.
#[derive(Clone)]
pub struct EngineMetrics {
    _private: (),
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(EngineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &EngineMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record how long one recommendation pass took
    pub fn observe_reco_generation_latency(
        &self,
        namespace: &str,
        policyreco: &str,
        workload_kind: &str,
        workload: &str,
        duration_secs: f64,
    ) {
        self.inner()
            .reco_generation_latency_seconds
            .with_label_values(&[namespace, policyreco, workload_kind, workload])
            .observe(duration_secs);
    }

    /// Record how long the utilization datapoint query took
    pub fn observe_cpu_query_latency(
        &self,
        namespace: &str,
        policyreco: &str,
        workload_kind: &str,
        workload: &str,
        duration_secs: f64,
    ) {
        self.inner()
            .cpu_utilization_query_latency_seconds
            .with_label_values(&[namespace, policyreco, workload_kind, workload])
            .observe(duration_secs);
    }

    /// Flag whether the workload had enough datapoints to recommend
    pub fn set_datapoints_present(&self, namespace: &str, workload: &str, present: bool) {
        self.inner()
            .datapoints_present
            .with_label_values(&[namespace, workload])
            .set(if present { 1.0 } else { 0.0 });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_metrics_observations() {
        let metrics = EngineMetrics::new();

        metrics.observe_reco_generation_latency("default", "checkout", "Deployment", "checkout", 0.2);
        metrics.observe_cpu_query_latency("default", "checkout", "Deployment", "checkout", 0.05);
        metrics.set_datapoints_present("default", "checkout", true);
        metrics.set_datapoints_present("default", "checkout", false);
    }
}
