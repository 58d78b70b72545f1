//! Threshold-autoscaler replay
//!
//! Replays a demand series under a candidate (target, min, max) the way a
//! horizontal autoscaler with a delayed scale-up cycle would have served it.
//! Upscale decisions take effect only after the autoscaling cycle lag;
//! downscales are immediate and supersede any upscale still in flight.

use crate::error::RecoError;
use crate::models::DataPoint;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::time::Duration;

/// Headroom factor applied to the candidate target before the replay.
/// Models the threshold-crossing margin the autoscaler scales at, and is a
/// modeling constant rather than configuration.
const TARGET_HEADROOM: f64 = 1.1;

/// A pending upscale still waiting out the autoscaling cycle lag
#[derive(Debug, Clone, Copy)]
struct TimerEvent {
    fires_at: DateTime<Utc>,
    delta: f64,
}

/// Outcome of one replay
#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    /// Safe supply at each demand timestamp: ready capacity scaled by the
    /// red-line utilization ceiling
    pub supply: Vec<DataPoint>,
    /// Smallest replica requirement seen across the series, before clamping
    /// to the candidate bounds
    pub observed_min_replicas: i32,
}

/// Replays demand under candidate configurations
#[derive(Debug, Clone, Copy)]
pub struct HpaSimulator {
    red_line_util: f64,
}

impl HpaSimulator {
    /// `red_line_util` is the fraction of ready capacity considered usable,
    /// in `(0, 1]`
    pub fn new(red_line_util: f64) -> Self {
        Self { red_line_util }
    }

    pub fn red_line_util(&self) -> f64 {
        self.red_line_util
    }

    /// Replay `demand` with upscales delayed by `acl` and downscales applied
    /// immediately. The per-pod limit makes ready capacity a multiple of
    /// whole replicas, mirroring how the autoscaler provisions.
    pub fn simulate(
        &self,
        demand: &[DataPoint],
        acl: Duration,
        target_utilization: i32,
        per_pod_resources: f64,
        max_replicas: i32,
        min_replicas: i32,
    ) -> Result<SimulationOutcome, RecoError> {
        let effective_target = (target_utilization as f64 * TARGET_HEADROOM).floor() as i32;

        if demand.is_empty() {
            return Ok(SimulationOutcome {
                supply: Vec::new(),
                observed_min_replicas: 0,
            });
        }
        if !(1..=100).contains(&effective_target) {
            return Err(RecoError::InvalidTargetUtilization(effective_target));
        }

        let required =
            |value: f64| ((value * 100.0) / effective_target as f64 / per_pod_resources).ceil();
        let clamped = |replicas: f64| replicas.max(min_replicas as f64).min(max_replicas as f64);

        let mut supply = Vec::with_capacity(demand.len());

        let first_required = required(demand[0].value);
        let mut observed_min = first_required;
        let mut ready_resources = clamped(first_required) * per_pod_resources;
        supply.push(DataPoint {
            timestamp: demand[0].timestamp,
            value: ready_resources * self.red_line_util,
        });

        // Upscale decisions still waiting out the lag, in firing order. All
        // insertions carry the same lag, so consumption is FIFO.
        let mut timers: VecDeque<TimerEvent> = VecDeque::new();

        for dp in &demand[1..] {
            while let Some(timer) = timers.front() {
                if dp.timestamp < timer.fires_at {
                    break;
                }
                ready_resources += timer.delta;
                timers.pop_front();
            }

            let unclamped = required(dp.value);
            observed_min = observed_min.min(unclamped);
            let new_resources = clamped(unclamped) * per_pod_resources;

            if new_resources > ready_resources {
                // Only the portion not already in flight gets a new timer.
                let in_flight: f64 = timers.iter().map(|t| t.delta).sum();
                let delta = new_resources - ready_resources - in_flight;
                if delta > 0.0 {
                    timers.push_back(TimerEvent {
                        fires_at: dp.timestamp + acl,
                        delta,
                    });
                }
            } else {
                // Downscale is immediate and supersedes pending upscales.
                ready_resources = new_resources;
                timers.clear();
            }

            supply.push(DataPoint {
                timestamp: dp.timestamp,
                value: ready_resources * self.red_line_util,
            });
        }

        Ok(SimulationOutcome {
            supply,
            observed_min_replicas: observed_min as i32,
        })
    }
}
