//! Recommendation engine core
//!
//! This module hosts the recommendation pipeline:
//! - Replaying demand under a simulated horizontal autoscaler
//! - Searching candidate configurations for the optimal one
//! - The CPU-utilization based recommender tying both to live data

mod cpu;
mod search;
mod simulator;


pub use cpu::{CpuUtilizationBasedRecommender, RecommenderConfig};
pub use search::{find_optimal_configuration, OptimalConfig};
pub use simulator::{HpaSimulator, SimulationOutcome};

use crate::models::{HpaConfiguration, WorkloadMeta};
use anyhow::Result;

pub use async_trait::async_trait;

/// Trait for recommendation implementations
#[async_trait]
pub trait Recommender: Send + Sync {
    /// Compute the target scaling configuration for a workload
    async fn recommend(&self, wm: &WorkloadMeta) -> Result<HpaConfiguration>;
}
