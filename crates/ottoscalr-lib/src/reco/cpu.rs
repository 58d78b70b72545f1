//! CPU-utilization based recommendation
//!
//! Fetches the workload's demand history, gates on data sufficiency, runs
//! the configured transformers, and searches for the optimal scaling
//! configuration. Recoverable conditions (too few datapoints, no
//! configuration beating the baseline) degrade to a no-op recommendation
//! that keeps the workload pinned at its replica cap.

use super::search::find_optimal_configuration;
use super::simulator::HpaSimulator;
use super::Recommender;
use crate::error::RecoError;
use crate::metrics::{MetricsTransformer, Scraper};
use crate::models::{DataPoint, HpaConfiguration, WorkloadMeta};
use crate::observability::EngineMetrics;
use crate::registry::{ObjectClientRegistry, ScaledObjectLister};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Tuning for the CPU-utilization recommender
#[derive(Debug, Clone)]
pub struct RecommenderConfig {
    /// Fraction of ready capacity considered usable, in `(0, 1]`
    pub red_line_util: f64,
    /// How far back demand samples are fetched
    pub metric_window: Duration,
    /// Sample grid step
    pub metric_step: Duration,
    /// Target-utilization search bounds, percent
    pub min_target: i32,
    pub max_target: i32,
    /// Minimum share of expected datapoints required to recommend, percent
    pub metrics_percentage_threshold: i32,
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            red_line_util: 0.85,
            metric_window: Duration::from_secs(8 * 24 * 60 * 60),
            metric_step: Duration::from_secs(5 * 60),
            min_target: 10,
            max_target: 60,
            metrics_percentage_threshold: 30,
        }
    }
}

/// Recommends scaling configurations from historical CPU utilization
pub struct CpuUtilizationBasedRecommender {
    config: RecommenderConfig,
    simulator: HpaSimulator,
    scraper: Arc<dyn Scraper>,
    transformers: Vec<Arc<dyn MetricsTransformer>>,
    registry: ObjectClientRegistry,
    scaled_objects: Arc<dyn ScaledObjectLister>,
    metrics: EngineMetrics,
}

impl CpuUtilizationBasedRecommender {
    pub fn new(
        config: RecommenderConfig,
        scraper: Arc<dyn Scraper>,
        transformers: Vec<Arc<dyn MetricsTransformer>>,
        registry: ObjectClientRegistry,
        scaled_objects: Arc<dyn ScaledObjectLister>,
    ) -> Self {
        let simulator = HpaSimulator::new(config.red_line_util);
        Self {
            config,
            simulator,
            scraper,
            transformers,
            registry,
            scaled_objects,
            metrics: EngineMetrics::new(),
        }
    }

    /// Replica cap precedence: the max-pods annotation, then the first
    /// ScaledObject referencing the workload, then its current replica count
    async fn max_pods(&self, wm: &WorkloadMeta) -> Result<i32> {
        let client = self.registry.object_client(&wm.kind)?;

        if let Ok(max_pods) = client
            .max_replicas_from_annotation(&wm.namespace, &wm.name)
            .await
        {
            return Ok(max_pods);
        }

        let scaled_objects = self
            .scaled_objects
            .scaled_objects_for(&wm.namespace, &wm.name)
            .await
            .context("listing scaled objects")?;
        if let Some(max_pods) = scaled_objects.first().and_then(|so| so.max_replica_count) {
            return Ok(max_pods);
        }

        client.replica_count(&wm.namespace, &wm.name).await
    }

    /// Keeps the workload at its cap with the most conservative target
    fn no_op_config(&self, max_replicas: i32) -> HpaConfiguration {
        HpaConfiguration {
            min: max_replicas,
            max: max_replicas,
            target_metric_value: self.config.min_target,
        }
    }

    fn metrics_above_threshold(&self, series: &[DataPoint]) -> bool {
        let step_secs = self.config.metric_step.as_secs();
        if step_secs == 0 {
            return false;
        }
        let expected = self.config.metric_window.as_secs() / step_secs;
        if expected == 0 {
            return false;
        }
        let fetched_percentage = (series.len() as f64 / expected as f64) * 100.0;
        fetched_percentage as i32 >= self.config.metrics_percentage_threshold
    }
}

#[async_trait]
impl Recommender for CpuUtilizationBasedRecommender {
    async fn recommend(&self, wm: &WorkloadMeta) -> Result<HpaConfiguration> {
        let end = Utc::now();
        let start = end - self.config.metric_window;

        let query_started = Instant::now();
        let mut series = self
            .scraper
            .average_cpu_utilization(&wm.namespace, &wm.name, start, end, self.config.metric_step)
            .await
            .context("scraping average CPU utilization")?;
        self.metrics.observe_cpu_query_latency(
            &wm.namespace,
            &wm.name,
            &wm.kind,
            &wm.name,
            query_started.elapsed().as_secs_f64(),
        );

        let max_replicas = self
            .max_pods(wm)
            .await
            .context("resolving workload max pods")?;

        if !self.metrics_above_threshold(&series) {
            self.metrics
                .set_datapoints_present(&wm.namespace, &wm.name, false);
            warn!(
                namespace = %wm.namespace,
                workload = %wm.name,
                datapoints = series.len(),
                "Not enough datapoints to recommend, keeping the workload at its cap"
            );
            return Ok(self.no_op_config(max_replicas));
        }
        self.metrics
            .set_datapoints_present(&wm.namespace, &wm.name, true);

        for transformer in &self.transformers {
            series = transformer
                .transform(start, end, series)
                .await
                .context("transforming demand series")?;
        }

        let acl = self
            .scraper
            .autoscaling_cycle_lag(&wm.namespace, &wm.name)
            .await
            .context("fetching autoscaling cycle lag")?;

        let client = self.registry.object_client(&wm.kind)?;
        let per_pod_resources = client
            .container_resource_limits(&wm.namespace, &wm.name)
            .await
            .context("fetching container CPU limits")?;

        match find_optimal_configuration(
            &self.simulator,
            &series,
            acl,
            self.config.min_target,
            self.config.max_target,
            per_pod_resources,
            max_replicas,
        ) {
            Ok(optimal) => Ok(HpaConfiguration {
                min: optimal.min_replicas,
                max: optimal.max_replicas,
                target_metric_value: optimal.target_utilization,
            }),
            Err(RecoError::UnableToRecommend) => {
                debug!(
                    namespace = %wm.namespace,
                    workload = %wm.name,
                    "No configuration beats the baseline, keeping the workload at its cap"
                );
                Ok(self.no_op_config(max_replicas))
            }
            Err(e) => Err(e.into()),
        }
    }
}
