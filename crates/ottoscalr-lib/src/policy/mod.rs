//! Policy catalog and recommendation-record contracts
//!
//! Policies form a total order over their risk index; the catalog is a
//! read-only snapshot owned by the store. The engine never mutates
//! policies, it only walks the order.

mod iterators;

pub use iterators::{AgingPolicyIterator, DefaultPolicyIterator, PolicyIterator};

use crate::error::RecoError;
use crate::models::{Policy, PolicyRecommendationRecord, WorkloadMeta};
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::RwLock;

pub use async_trait::async_trait;

/// Read-only catalog of risk-ordered policies
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn default_policy(&self) -> Result<Policy>;

    /// The lowest-risk entry of the catalog
    async fn safest_policy(&self) -> Result<Policy>;

    async fn policy_by_name(&self, name: &str) -> Result<Policy>;

    /// The next riskier entry after `name`; the terminal entry is sticky
    async fn next_policy_by_name(&self, name: &str) -> Result<Policy>;

    /// The whole catalog, ascending by risk index
    async fn sorted_policies(&self) -> Result<Vec<Policy>>;
}

/// Persisted policy-recommendation records, one per workload
#[async_trait]
pub trait PolicyRecommendationStore: Send + Sync {
    /// The record of the policy last applied to the workload, if any
    async fn latest_record(&self, wm: &WorkloadMeta) -> Result<Option<PolicyRecommendationRecord>>;
}

/// Snapshot-backed catalog store
pub struct InMemoryPolicyStore {
    policies: Vec<Policy>,
    default_name: Option<String>,
}

impl InMemoryPolicyStore {
    /// Builds a store over a catalog snapshot, sorted ascending by risk index
    pub fn new(mut policies: Vec<Policy>) -> Self {
        policies.sort_by(|a, b| a.risk_index.cmp(&b.risk_index));
        Self {
            policies,
            default_name: None,
        }
    }

    /// Designates the catalog's default policy; without one the safest
    /// policy doubles as the default
    pub fn with_default(mut self, name: impl Into<String>) -> Self {
        self.default_name = Some(name.into());
        self
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.policies
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| RecoError::PolicyNotFound(name.to_string()).into())
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn default_policy(&self) -> Result<Policy> {
        match &self.default_name {
            Some(name) => Ok(self.policies[self.position(name)?].clone()),
            None => self.safest_policy().await,
        }
    }

    async fn safest_policy(&self) -> Result<Policy> {
        self.policies
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("policy catalog is empty"))
    }

    async fn policy_by_name(&self, name: &str) -> Result<Policy> {
        Ok(self.policies[self.position(name)?].clone())
    }

    async fn next_policy_by_name(&self, name: &str) -> Result<Policy> {
        let index = self.position(name)?;
        let next = (index + 1).min(self.policies.len() - 1);
        Ok(self.policies[next].clone())
    }

    async fn sorted_policies(&self) -> Result<Vec<Policy>> {
        Ok(self.policies.clone())
    }
}

/// Record store keeping the latest policy transition per workload
#[derive(Default)]
pub struct InMemoryRecommendationStore {
    records: RwLock<HashMap<WorkloadMeta, PolicyRecommendationRecord>>,
}

impl InMemoryRecommendationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, wm: WorkloadMeta, record: PolicyRecommendationRecord) {
        self.records
            .write()
            .expect("record lock poisoned")
            .insert(wm, record);
    }
}

#[async_trait]
impl PolicyRecommendationStore for InMemoryRecommendationStore {
    async fn latest_record(&self, wm: &WorkloadMeta) -> Result<Option<PolicyRecommendationRecord>> {
        Ok(self
            .records
            .read()
            .expect("record lock poisoned")
            .get(wm)
            .cloned())
    }
}

#[cfg(test)]
pub(crate) fn catalog() -> Vec<Policy> {
    vec![
        Policy {
            name: "no-scaling".to_string(),
            risk_index: "1".to_string(),
            min_replica_percentage_cut: 0,
            target_utilization: 10,
        },
        Policy {
            name: "conservative".to_string(),
            risk_index: "2".to_string(),
            min_replica_percentage_cut: 25,
            target_utilization: 30,
        },
        Policy {
            name: "moderate".to_string(),
            risk_index: "3".to_string(),
            min_replica_percentage_cut: 50,
            target_utilization: 45,
        },
        Policy {
            name: "aggressive".to_string(),
            risk_index: "4".to_string(),
            min_replica_percentage_cut: 100,
            target_utilization: 60,
        },
    ]
}
