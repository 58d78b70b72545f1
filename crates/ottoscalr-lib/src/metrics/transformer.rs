//! Demand-series transformers
//!
//! Transformers run in order between the scrape and the search; each may
//! trim or reshape the series. A failing transformer aborts the
//! recommendation with its error.

use crate::models::DataPoint;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A single stage of the demand-series pipeline
#[async_trait]
pub trait MetricsTransformer: Send + Sync {
    async fn transform(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        series: Vec<DataPoint>,
    ) -> Result<Vec<DataPoint>>;
}

/// Source of known outlier windows (sale events, load tests, incidents)
/// whose demand should not drive the recommendation
#[async_trait]
pub trait OutlierIntervalSource: Send + Sync {
    /// Outlier intervals overlapping `[start, end]`, as closed ranges
    async fn outlier_intervals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(DateTime<Utc>, DateTime<Utc>)>>;
}

/// Drops demand points falling inside known outlier intervals
pub struct OutlierIntervalTransformer {
    source: Arc<dyn OutlierIntervalSource>,
}

impl OutlierIntervalTransformer {
    pub fn new(source: Arc<dyn OutlierIntervalSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl MetricsTransformer for OutlierIntervalTransformer {
    async fn transform(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        series: Vec<DataPoint>,
    ) -> Result<Vec<DataPoint>> {
        let intervals = self.source.outlier_intervals(start, end).await?;
        if intervals.is_empty() {
            return Ok(series);
        }

        Ok(series
            .into_iter()
            .filter(|dp| {
                !intervals
                    .iter()
                    .any(|(from, to)| dp.timestamp >= *from && dp.timestamp <= *to)
            })
            .collect())
    }
}
