//! Metrics-source contracts for the engine
//!
//! The scraper is the engine's only view of historical utilization data.
//! Implementations must be deterministic for fixed inputs so that running
//! the workflow twice on the same window yields the same recommendation.

mod transformer;

pub use transformer::{MetricsTransformer, OutlierIntervalSource, OutlierIntervalTransformer};

use crate::models::DataPoint;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;

pub use async_trait::async_trait;

/// Source of utilization samples and the autoscaling cycle lag
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Aggregate CPU usage samples for a workload over `[start, end]` on a
    /// fixed `step` grid, in the same unit as the per-pod resource limits
    async fn average_cpu_utilization(
        &self,
        namespace: &str,
        workload: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        step: Duration,
    ) -> Result<Vec<DataPoint>>;

    /// Delay between a scaling decision for the workload and the resulting
    /// replicas being ready to serve
    async fn autoscaling_cycle_lag(&self, namespace: &str, workload: &str) -> Result<Duration>;
}
