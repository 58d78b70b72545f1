//! Policy progression rules
//!
//! Iterators decide the next policy for a workload from the catalog. The
//! default iterator always proposes the designated default; the aging
//! iterator advances one risk grade once the current policy has been in
//! place longer than the configured age.

use super::{PolicyRecommendationStore, PolicyStore};
use crate::models::{Policy, WorkloadMeta};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Rule advancing a workload through the policy catalog
#[async_trait]
pub trait PolicyIterator: Send + Sync {
    fn name(&self) -> &str;

    /// The next policy for the workload; `None` means no opinion
    async fn next_policy(&self, wm: &WorkloadMeta) -> Result<Option<Policy>>;
}

/// Always proposes the catalog's designated default policy
pub struct DefaultPolicyIterator {
    store: Arc<dyn PolicyStore>,
}

impl DefaultPolicyIterator {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PolicyIterator for DefaultPolicyIterator {
    fn name(&self) -> &str {
        "default-policy"
    }

    async fn next_policy(&self, _wm: &WorkloadMeta) -> Result<Option<Policy>> {
        Ok(Some(self.store.default_policy().await?))
    }
}

/// Advances one risk grade after the current policy has aged out.
///
/// A workload with no recorded policy starts at the safest entry. Once the
/// recorded transition is older than `age`, the iterator proposes the next
/// riskier entry; the terminal entry keeps proposing itself.
pub struct AgingPolicyIterator {
    store: Arc<dyn PolicyStore>,
    records: Arc<dyn PolicyRecommendationStore>,
    age: Duration,
}

impl AgingPolicyIterator {
    pub fn new(
        store: Arc<dyn PolicyStore>,
        records: Arc<dyn PolicyRecommendationStore>,
        age: Duration,
    ) -> Self {
        Self {
            store,
            records,
            age,
        }
    }
}

#[async_trait]
impl PolicyIterator for AgingPolicyIterator {
    fn name(&self) -> &str {
        "aging-policy"
    }

    async fn next_policy(&self, wm: &WorkloadMeta) -> Result<Option<Policy>> {
        let record = self.records.latest_record(wm).await?;

        let Some(record) = record.filter(|r| !r.policy_name.is_empty()) else {
            let safest = self.store.safest_policy().await?;
            debug!(
                workload = %wm.name,
                policy = %safest.name,
                "No policy on record, starting from the safest"
            );
            return Ok(Some(safest));
        };

        let expired = Utc::now() >= record.transitioned_at + self.age;
        if !expired {
            return Ok(Some(self.store.policy_by_name(&record.policy_name).await?));
        }

        let next = self.store.next_policy_by_name(&record.policy_name).await?;
        debug!(
            workload = %wm.name,
            from = %record.policy_name,
            to = %next.name,
            "Policy aged out, advancing"
        );
        Ok(Some(next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PolicyRecommendationRecord;
    use crate::policy::{catalog, InMemoryPolicyStore, InMemoryRecommendationStore};

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);
    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn workload() -> WorkloadMeta {
        WorkloadMeta::new("default", "Deployment", "checkout")
    }

    fn aging_iterator(
        records: Arc<InMemoryRecommendationStore>,
        age: Duration,
    ) -> AgingPolicyIterator {
        AgingPolicyIterator::new(Arc::new(InMemoryPolicyStore::new(catalog())), records, age)
    }

    fn record_aged(records: &InMemoryRecommendationStore, policy_name: &str, aged_by: Duration) {
        records.upsert(
            workload(),
            PolicyRecommendationRecord {
                policy_name: policy_name.to_string(),
                transitioned_at: Utc::now() - aged_by,
            },
        );
    }

    #[tokio::test]
    async fn test_default_iterator_ignores_the_workload() {
        let store = Arc::new(InMemoryPolicyStore::new(catalog()).with_default("conservative"));
        let iterator = DefaultPolicyIterator::new(store);

        let policy = iterator.next_policy(&workload()).await.unwrap().unwrap();
        assert_eq!(policy.name, "conservative");
    }

    #[tokio::test]
    async fn test_fresh_workload_starts_at_the_safest_policy() {
        let records = Arc::new(InMemoryRecommendationStore::new());
        let iterator = aging_iterator(records, WEEK);

        let policy = iterator.next_policy(&workload()).await.unwrap().unwrap();
        assert_eq!(policy.name, "no-scaling");
    }

    #[tokio::test]
    async fn test_empty_policy_name_counts_as_no_record() {
        let records = Arc::new(InMemoryRecommendationStore::new());
        record_aged(&records, "", WEEK * 2);
        let iterator = aging_iterator(records, WEEK);

        let policy = iterator.next_policy(&workload()).await.unwrap().unwrap();
        assert_eq!(policy.name, "no-scaling");
    }

    #[tokio::test]
    async fn test_unexpired_policy_is_kept() {
        let records = Arc::new(InMemoryRecommendationStore::new());
        record_aged(&records, "conservative", DAY);
        let iterator = aging_iterator(records, WEEK);

        let policy = iterator.next_policy(&workload()).await.unwrap().unwrap();
        assert_eq!(policy.name, "conservative");
    }

    #[tokio::test]
    async fn test_expired_policy_advances_one_grade() {
        let records = Arc::new(InMemoryRecommendationStore::new());
        record_aged(&records, "conservative", DAY * 8);
        let iterator = aging_iterator(records, WEEK);

        let policy = iterator.next_policy(&workload()).await.unwrap().unwrap();
        assert_eq!(policy.name, "moderate");
    }

    #[tokio::test]
    async fn test_expired_terminal_policy_stays_terminal() {
        let records = Arc::new(InMemoryRecommendationStore::new());
        record_aged(&records, "aggressive", DAY * 30);
        let iterator = aging_iterator(records, WEEK);

        let policy = iterator.next_policy(&workload()).await.unwrap().unwrap();
        assert_eq!(policy.name, "aggressive");
    }

    #[tokio::test]
    async fn test_recorded_policy_missing_from_catalog_is_an_error() {
        let records = Arc::new(InMemoryRecommendationStore::new());
        record_aged(&records, "retired", DAY);
        let iterator = aging_iterator(records, WEEK);

        let err = iterator.next_policy(&workload()).await.unwrap_err();
        assert!(err.to_string().contains("retired"));
    }
}
