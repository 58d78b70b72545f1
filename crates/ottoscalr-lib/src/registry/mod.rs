//! Per-kind accessors for scaled workload objects
//!
//! The engine never talks to an API server directly; it resolves an
//! `ObjectClient` for the workload's kind and reads resource limits,
//! replica counts, and the replica-cap annotation through it.

use crate::error::RecoError;
use crate::models::ScaledObject;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

pub use async_trait::async_trait;

/// Annotation capping the replica count the engine may recommend
pub const MAX_PODS_ANNOTATION: &str = "ottoscalr.io/max-pods";

/// Field selector joining ScaledObjects to the workloads they scale
pub const SCALED_OBJECT_FIELD: &str = "spec.scaleTargetRef.name";

/// Accessor for one workload kind
#[async_trait]
pub trait ObjectClient: Send + Sync + std::fmt::Debug {
    /// Sum of per-container CPU limits for a single replica
    async fn container_resource_limits(&self, namespace: &str, name: &str) -> Result<f64>;

    /// Replica cap from the max-pods annotation; errors when the annotation
    /// is absent or malformed
    async fn max_replicas_from_annotation(&self, namespace: &str, name: &str) -> Result<i32>;

    /// Current replica count of the workload
    async fn replica_count(&self, namespace: &str, name: &str) -> Result<i32>;
}

/// Lists ScaledObjects whose scale-target name matches a workload
#[async_trait]
pub trait ScaledObjectLister: Send + Sync {
    async fn scaled_objects_for(&self, namespace: &str, workload: &str)
        -> Result<Vec<ScaledObject>>;
}

/// Registry yielding the accessor for a workload kind
#[derive(Clone, Default)]
pub struct ObjectClientRegistry {
    clients: HashMap<String, Arc<dyn ObjectClient>>,
}

impl ObjectClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(mut self, kind: impl Into<String>, client: Arc<dyn ObjectClient>) -> Self {
        self.clients.insert(kind.into(), client);
        self
    }

    /// The accessor for `kind`; unknown kinds are an error
    pub fn object_client(&self, kind: &str) -> Result<Arc<dyn ObjectClient>, RecoError> {
        self.clients
            .get(kind)
            .cloned()
            .ok_or_else(|| RecoError::UnsupportedObjectKind(kind.to_string()))
    }
}
