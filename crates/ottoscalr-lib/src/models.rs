//! Core data model for the recommendation engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a scaled workload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkloadMeta {
    pub namespace: String,
    pub kind: String,
    pub name: String,
}

impl WorkloadMeta {
    pub fn new(
        namespace: impl Into<String>,
        kind: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// One utilization sample: aggregate CPU usage across all replicas at
/// `timestamp`, in the same unit as the per-pod resource limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Horizontal-scaling configuration for a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HpaConfiguration {
    pub min: i32,
    pub max: i32,
    /// Target utilization percentage, 1..=100
    pub target_metric_value: i32,
}

/// A risk-graded scale-down policy from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    /// Ordering label over the catalog; lower sorts safer
    pub risk_index: String,
    /// Percentage of the (max - min) replica gap the policy cuts from the cap
    pub min_replica_percentage_cut: i32,
    pub target_utilization: i32,
}

/// Persisted record of the policy last applied to a workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRecommendationRecord {
    pub policy_name: String,
    pub transitioned_at: DateTime<Utc>,
}

/// KEDA-style scaled object referencing a workload through its scale target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaledObject {
    pub name: String,
    pub max_replica_count: Option<i32>,
}
