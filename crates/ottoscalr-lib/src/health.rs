//! Liveness and readiness signal for the operator
//!
//! Health is derived from what the engine actually does: whether its
//! collaborators (metric source, policy store, object registry) answered
//! their last call, and how recent recommendation passes fared. A failing
//! collaborator is an external outage, so it blocks readiness without
//! asking for a restart; a sustained run of failed passes is the operator's
//! own problem and eventually turns liveness unhealthy.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};

/// Failed passes in a row before liveness reports degraded
const DEGRADED_AFTER_FAILED_PASSES: u32 = 1;
/// Failed passes in a row before liveness reports unhealthy
const UNHEALTHY_AFTER_FAILED_PASSES: u32 = 5;

/// Engine collaborators whose last call outcome feeds the probes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collaborator {
    MetricsSource,
    PolicyStore,
    ObjectRegistry,
}

impl Collaborator {
    const ALL: [Collaborator; 3] = [
        Collaborator::MetricsSource,
        Collaborator::PolicyStore,
        Collaborator::ObjectRegistry,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Overall liveness verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Recommendation passes are failing but a retry may still clear it
    Degraded,
    Unhealthy,
}

/// Snapshot served by the liveness probe
#[derive(Debug, Clone, Serialize)]
pub struct LivenessSnapshot {
    pub status: HealthStatus,
    pub passes_completed: u64,
    pub consecutive_failed_passes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_pass_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub failing_collaborators: Vec<Collaborator>,
}

/// Snapshot served by the readiness probe
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessSnapshot {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Default)]
struct HealthState {
    started: bool,
    collaborator_errors: [Option<String>; 3],
    passes_completed: u64,
    consecutive_failed_passes: u32,
    last_pass_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Shared health signal; clones observe the same state
#[derive(Clone, Default)]
pub struct EngineHealth {
    state: Arc<RwLock<HealthState>>,
}

impl EngineHealth {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HealthState> {
        self.state.read().expect("health lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HealthState> {
        self.state.write().expect("health lock poisoned")
    }

    /// Flip once startup wiring is done; readiness stays false until then
    pub fn mark_started(&self) {
        self.write().started = true;
    }

    /// Record a recommendation pass that produced a configuration
    pub fn record_pass(&self) {
        let mut state = self.write();
        state.passes_completed += 1;
        state.consecutive_failed_passes = 0;
        state.last_pass_at = Some(Utc::now());
        state.last_error = None;
    }

    /// Record a recommendation pass that surfaced an error
    pub fn record_failed_pass(&self, error: impl Into<String>) {
        let mut state = self.write();
        state.consecutive_failed_passes += 1;
        state.last_error = Some(error.into());
    }

    /// Clear a collaborator's outage after a successful call
    pub fn collaborator_ok(&self, collaborator: Collaborator) {
        self.write().collaborator_errors[collaborator.index()] = None;
    }

    /// Flag a collaborator whose last call failed
    pub fn collaborator_failed(&self, collaborator: Collaborator, error: impl Into<String>) {
        self.write().collaborator_errors[collaborator.index()] = Some(error.into());
    }

    pub fn liveness(&self) -> LivenessSnapshot {
        let state = self.read();
        let failing: Vec<Collaborator> = Collaborator::ALL
            .into_iter()
            .filter(|c| state.collaborator_errors[c.index()].is_some())
            .collect();

        // A collaborator outage is not fixable by a restart, so it caps out
        // at degraded; only the engine's own failed passes go unhealthy.
        let status = if state.consecutive_failed_passes >= UNHEALTHY_AFTER_FAILED_PASSES {
            HealthStatus::Unhealthy
        } else if state.consecutive_failed_passes >= DEGRADED_AFTER_FAILED_PASSES
            || !failing.is_empty()
        {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        LivenessSnapshot {
            status,
            passes_completed: state.passes_completed,
            consecutive_failed_passes: state.consecutive_failed_passes,
            last_pass_at: state.last_pass_at,
            last_error: state.last_error.clone(),
            failing_collaborators: failing,
        }
    }

    pub fn readiness(&self) -> ReadinessSnapshot {
        let state = self.read();
        if !state.started {
            return ReadinessSnapshot {
                ready: false,
                reason: Some("operator still starting".to_string()),
            };
        }
        for collaborator in Collaborator::ALL {
            if let Some(error) = &state.collaborator_errors[collaborator.index()] {
                return ReadinessSnapshot {
                    ready: false,
                    reason: Some(format!("{collaborator:?} unavailable: {error}")),
                };
            }
        }
        ReadinessSnapshot {
            ready: true,
            reason: None,
        }
    }
}
