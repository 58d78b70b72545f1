//! Autoscaling recommendation engine
//!
//! This crate provides the core functionality for:
//! - Replaying demand series under a simulated horizontal autoscaler
//! - Searching for the optimal (target, floor, cap) scaling configuration
//! - CPU-utilization based recommendation generation
//! - Risk-graded policy progression and reconciliation
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod metrics;
pub mod models;
pub mod observability;
pub mod policy;
pub mod reco;
pub mod registry;
pub mod workflow;

pub use error::RecoError;
pub use health::{Collaborator, EngineHealth, HealthStatus};
pub use models::*;
pub use observability::EngineMetrics;
pub use workflow::{RecommendationWorkflow, RecommendationWorkflowBuilder};
