//! Recommendation workflow
//!
//! Composes one recommender with any number of policy iterators. Iterator
//! outputs are merged by a safest-policy fold that is commutative and
//! associative with `None` as identity, so the map's iteration order never
//! affects the outcome.

use crate::error::RecoError;
use crate::models::{HpaConfiguration, Policy, WorkloadMeta};
use crate::observability::EngineMetrics;
use crate::policy::{PolicyIterator, PolicyStore};
use crate::reco::Recommender;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

const DEFAULT_MIN_REQUIRED_REPLICAS: i32 = 3;

/// Drives one recommendation pass for a workload
pub struct RecommendationWorkflow {
    recommender: Option<Arc<dyn Recommender>>,
    policy_iterators: HashMap<String, Arc<dyn PolicyIterator>>,
    policy_store: Option<Arc<dyn PolicyStore>>,
    min_required_replicas: i32,
    metrics: EngineMetrics,
}

impl RecommendationWorkflow {
    pub fn builder() -> RecommendationWorkflowBuilder {
        RecommendationWorkflowBuilder::new()
    }

    /// Returns the configuration to apply next, the raw recommendation
    /// (after the minimum-replica floor), and the policy credited with the
    /// applied configuration.
    pub async fn execute(
        &self,
        wm: &WorkloadMeta,
    ) -> Result<(HpaConfiguration, HpaConfiguration, Option<Policy>)> {
        let recommender = self
            .recommender
            .as_ref()
            .ok_or(RecoError::NoRecommenderConfigured)?;

        let generation_started = Instant::now();
        let target_reco = recommender.recommend(wm).await;
        self.metrics.observe_reco_generation_latency(
            &wm.namespace,
            &wm.name,
            &wm.kind,
            &wm.name,
            generation_started.elapsed().as_secs_f64(),
        );
        let target_reco =
            promote_min_replicas(target_reco.context("generating recommendation")?, self.min_required_replicas);

        let mut next_policy: Option<Policy> = None;
        for (name, iterator) in &self.policy_iterators {
            let proposed = iterator
                .next_policy(wm)
                .await
                .with_context(|| format!("running policy iterator {name}"))?;
            let Some(proposed) = proposed else {
                debug!(iterator = %name, "Iterator has no opinion, skipping");
                continue;
            };
            debug!(iterator = %name, policy = %proposed.name, "Iterator proposed a policy");
            next_policy = Some(pick_safest_policy(next_policy, proposed));
        }

        let (next_config, applied_policy) =
            self.next_configuration(&target_reco, next_policy).await;
        Ok((next_config, target_reco, applied_policy))
    }

    /// Chooses between the recommendation and the merged policy, and names
    /// the policy credited with the choice
    async fn next_configuration(
        &self,
        reco: &HpaConfiguration,
        policy: Option<Policy>,
    ) -> (HpaConfiguration, Option<Policy>) {
        match policy {
            Some(policy) if !should_apply_reco(reco, &policy) => {
                let derived = derive_from_policy(&policy, reco);
                (derived, Some(policy))
            }
            _ => {
                let credited = match &self.policy_store {
                    Some(store) => match store.sorted_policies().await {
                        Ok(sorted) => find_closest_safe_policy(reco, &sorted),
                        Err(e) => {
                            warn!(error = %e, "Could not load the catalog to credit the recommendation");
                            None
                        }
                    },
                    None => None,
                };
                (*reco, credited)
            }
        }
    }
}

/// Builder for the workflow. The recommender is single-assignment:
/// configuring a second one is an error rather than a silent overwrite.
#[derive(Default)]
pub struct RecommendationWorkflowBuilder {
    recommender: Option<Arc<dyn Recommender>>,
    policy_iterators: HashMap<String, Arc<dyn PolicyIterator>>,
    policy_store: Option<Arc<dyn PolicyStore>>,
    min_required_replicas: Option<i32>,
}

impl RecommendationWorkflowBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn Recommender>) -> Result<Self, RecoError> {
        if self.recommender.is_some() {
            return Err(RecoError::RecommenderAlreadyConfigured);
        }
        self.recommender = Some(recommender);
        Ok(self)
    }

    /// Registers an iterator under its name; the first registration wins
    pub fn with_policy_iterator(mut self, iterator: Arc<dyn PolicyIterator>) -> Self {
        self.policy_iterators
            .entry(iterator.name().to_string())
            .or_insert(iterator);
        self
    }

    pub fn with_policy_store(mut self, store: Arc<dyn PolicyStore>) -> Self {
        self.policy_store = Some(store);
        self
    }

    pub fn with_min_required_replicas(mut self, min_required_replicas: i32) -> Self {
        self.min_required_replicas = Some(min_required_replicas);
        self
    }

    pub fn build(self) -> Result<RecommendationWorkflow, RecoError> {
        if self.recommender.is_none() && self.policy_iterators.is_empty() {
            return Err(RecoError::EmptyWorkflow);
        }
        Ok(RecommendationWorkflow {
            recommender: self.recommender,
            policy_iterators: self.policy_iterators,
            policy_store: self.policy_store,
            min_required_replicas: self
                .min_required_replicas
                .unwrap_or(DEFAULT_MIN_REQUIRED_REPLICAS),
            metrics: EngineMetrics::new(),
        })
    }
}

/// Promotes the floor to `min_required` when the cap allows it
fn promote_min_replicas(config: HpaConfiguration, min_required: i32) -> HpaConfiguration {
    let mut config = config;
    if config.max >= min_required && config.min < min_required {
        config.min = min_required;
    }
    config
}

/// The recommendation takes precedence only when it is safer than the
/// policy: a full-cut policy whose target sits above the recommendation's.
/// Any partial-cut policy always wins.
fn should_apply_reco(config: &HpaConfiguration, policy: &Policy) -> bool {
    policy.min_replica_percentage_cut == 100
        && config.target_metric_value < policy.target_utilization
}

/// Lower risk index wins; on a tie the earlier policy is kept
fn pick_safest_policy(current: Option<Policy>, candidate: Policy) -> Policy {
    match current {
        Some(current) if current.risk_index <= candidate.risk_index => current,
        _ => candidate,
    }
}

/// Applies the policy's replica cut to the recommendation's replica range.
/// The cut is computed through a float so the ceiling survives the integer
/// arithmetic.
fn derive_from_policy(policy: &Policy, reco: &HpaConfiguration) -> HpaConfiguration {
    let cut = ((policy.min_replica_percentage_cut * (reco.max - reco.min)) as f64 / 100.0).ceil()
        as i32;
    HpaConfiguration {
        min: reco.max - cut,
        max: reco.max,
        target_metric_value: policy.target_utilization,
    }
}

/// The riskiest full-cut policy whose target does not exceed the
/// recommendation's; `None` when the catalog has no such entry
fn find_closest_safe_policy(config: &HpaConfiguration, sorted: &[Policy]) -> Option<Policy> {
    sorted
        .iter()
        .filter(|p| {
            p.min_replica_percentage_cut == 100
                && p.target_utilization <= config.target_metric_value
        })
        .last()
        .cloned()
}
