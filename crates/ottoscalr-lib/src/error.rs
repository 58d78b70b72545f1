//! Engine error types

use thiserror::Error;

/// Errors surfaced by the recommendation engine.
///
/// `UnableToRecommend` is the only recoverable kind: the recommender turns
/// it into the no-op configuration that keeps the workload at its cap.
/// Everything else surfaces to the caller with the original cause.
#[derive(Debug, Error)]
pub enum RecoError {
    #[error("unable to generate recommendation without any breaches")]
    UnableToRecommend,

    #[error("invalid value of target utilization: {0}, value should be between 1 and 100")]
    InvalidTargetUtilization(i32),

    #[error("unsupported object kind: {0}")]
    UnsupportedObjectKind(String),

    #[error("no policy named {0} in the catalog")]
    PolicyNotFound(String),

    #[error("no recommender configured in the workflow")]
    NoRecommenderConfigured,

    #[error("only one recommender can be configured in a workflow")]
    RecommenderAlreadyConfigured,

    #[error("a workflow needs a recommender or at least one policy iterator")]
    EmptyWorkflow,
}
