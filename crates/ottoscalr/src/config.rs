//! Operator configuration

use anyhow::Result;
use ottoscalr_lib::reco::RecommenderConfig;
use serde::Deserialize;
use std::time::Duration;

/// Operator configuration, sourced from `OTTOSCALR_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct OperatorConfig {
    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Demand history window in hours
    #[serde(default = "default_metric_window_hours")]
    pub metric_window_hours: u64,

    /// Sample grid step in seconds
    #[serde(default = "default_metric_step_secs")]
    pub metric_step_secs: u64,

    /// Usable fraction of ready capacity
    #[serde(default = "default_red_line_util")]
    pub red_line_util: f64,

    /// Target-utilization search bounds, percent
    #[serde(default = "default_min_target")]
    pub min_target: i32,
    #[serde(default = "default_max_target")]
    pub max_target: i32,

    /// Minimum share of expected datapoints required to recommend, percent
    #[serde(default = "default_metrics_percentage_threshold")]
    pub metrics_percentage_threshold: i32,

    /// Days a policy stays in place before the aging iterator advances it
    #[serde(default = "default_policy_age_days")]
    pub policy_age_days: u64,

    /// Floor every recommendation is promoted to when the cap allows
    #[serde(default = "default_min_required_replicas")]
    pub min_required_replicas: i32,
}

fn default_api_port() -> u16 {
    8080
}

fn default_metric_window_hours() -> u64 {
    8 * 24
}

fn default_metric_step_secs() -> u64 {
    5 * 60
}

fn default_red_line_util() -> f64 {
    0.85
}

fn default_min_target() -> i32 {
    10
}

fn default_max_target() -> i32 {
    60
}

fn default_metrics_percentage_threshold() -> i32 {
    30
}

fn default_policy_age_days() -> u64 {
    7
}

fn default_min_required_replicas() -> i32 {
    3
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            metric_window_hours: default_metric_window_hours(),
            metric_step_secs: default_metric_step_secs(),
            red_line_util: default_red_line_util(),
            min_target: default_min_target(),
            max_target: default_max_target(),
            metrics_percentage_threshold: default_metrics_percentage_threshold(),
            policy_age_days: default_policy_age_days(),
            min_required_replicas: default_min_required_replicas(),
        }
    }
}

impl OperatorConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("OTTOSCALR"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    /// The engine tuning this operator configuration describes
    pub fn recommender_config(&self) -> RecommenderConfig {
        RecommenderConfig {
            red_line_util: self.red_line_util,
            metric_window: Duration::from_secs(self.metric_window_hours * 60 * 60),
            metric_step: Duration::from_secs(self.metric_step_secs),
            min_target: self.min_target,
            max_target: self.max_target,
            metrics_percentage_threshold: self.metrics_percentage_threshold,
        }
    }

    pub fn policy_age(&self) -> Duration {
        Duration::from_secs(self.policy_age_days * 24 * 60 * 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_describe_a_usable_engine() {
        let config = OperatorConfig::default();
        let reco = config.recommender_config();

        assert_eq!(reco.metric_window, Duration::from_secs(8 * 24 * 60 * 60));
        assert_eq!(reco.metric_step, Duration::from_secs(300));
        assert!(reco.min_target < reco.max_target);
        assert_eq!(config.policy_age(), Duration::from_secs(7 * 24 * 60 * 60));
    }
}
