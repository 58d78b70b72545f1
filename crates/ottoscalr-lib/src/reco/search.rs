//! Optimal-configuration search
//!
//! Nested search over candidate configurations: for every candidate
//! min-replica floor, a binary search finds the highest target utilization
//! whose replay never under-serves demand. Candidates are scored by the
//! average spare capacity they recover against a never-scaled baseline.

use super::simulator::{HpaSimulator, SimulationOutcome};
use crate::error::RecoError;
use crate::models::DataPoint;
use std::time::Duration;

/// A configuration selected by the search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimalConfig {
    pub target_utilization: i32,
    pub min_replicas: i32,
    pub max_replicas: i32,
}

/// Searches `[min_target, max_target]` for the highest target and the floor
/// that maximizes savings while never under-serving any demand point.
///
/// A floor is eligible only when the replay's unclamped minimum requirement
/// reaches it, so the floor discovery sees the true demand floor. Equal
/// savings keep the later candidate, so ties resolve toward the larger
/// floor; callers rely on that tie-break and it must not be reordered.
///
/// Fails with `UnableToRecommend` when no eligible candidate recovers any
/// capacity over the baseline.
pub fn find_optimal_configuration(
    simulator: &HpaSimulator,
    demand: &[DataPoint],
    acl: Duration,
    min_target: i32,
    max_target: i32,
    per_pod_resources: f64,
    max_replicas: i32,
) -> Result<OptimalConfig, RecoError> {
    let mut best_target = 0;
    let mut best_min = 0;
    let mut best_savings = 0.0_f64;

    for min_replicas in 1..=max_replicas {
        let mut low = min_target;
        let mut high = max_target;
        let mut passing: Option<SimulationOutcome> = None;

        while low <= high {
            let mid = low + (high - low) / 2;
            let outcome = simulator.simulate(
                demand,
                acl,
                mid,
                per_pod_resources,
                max_replicas,
                min_replicas,
            )?;

            if no_breach_occurred(demand, &outcome.supply) {
                // Successful probes move strictly upward, so the last one
                // kept here is the replay at the final `high`.
                passing = Some(outcome);
                low = mid + 1;
            } else {
                high = mid - 1;
            }
        }

        let Some(outcome) = passing else {
            continue;
        };
        if high < min_target
            || outcome.observed_min_replicas > min_replicas
            || outcome.supply.is_empty()
        {
            continue;
        }

        let savings = savings_percentage(
            max_replicas,
            &outcome.supply,
            per_pod_resources,
            simulator.red_line_util(),
        );
        if savings >= best_savings {
            best_min = min_replicas;
            best_target = high;
            best_savings = savings;
        }
    }

    if best_target < min_target || best_savings == 0.0 {
        return Err(RecoError::UnableToRecommend);
    }

    Ok(OptimalConfig {
        target_utilization: best_target,
        min_replicas: best_min,
        max_replicas,
    })
}

/// Supply equal to demand is not a breach; only strictly lower supply is
fn no_breach_occurred(demand: &[DataPoint], supply: &[DataPoint]) -> bool {
    demand
        .iter()
        .zip(supply)
        .all(|(d, s)| d.value <= s.value)
}

/// Average fractional spare capacity versus a never-scaled workload pinned
/// at `max_replicas`, as a percentage
fn savings_percentage(
    max_replicas: i32,
    supply: &[DataPoint],
    per_pod_resources: f64,
    red_line_util: f64,
) -> f64 {
    let baseline = max_replicas as f64 * per_pod_resources;
    let spare: f64 = supply
        .iter()
        .map(|dp| baseline - dp.value / red_line_util)
        .sum();
    spare / baseline / supply.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const STEP: Duration = Duration::from_secs(60);

    fn series(values: &[f64]) -> Vec<DataPoint> {
        let start = Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| DataPoint {
                timestamp: start + STEP * i as u32,
                value,
            })
            .collect()
    }

    fn search(
        demand: &[DataPoint],
        acl: Duration,
    ) -> Result<OptimalConfig, RecoError> {
        let simulator = HpaSimulator::new(0.8);
        find_optimal_configuration(&simulator, demand, acl, 10, 60, 1.0, 10)
    }

    #[test]
    fn test_flat_demand_picks_highest_target_and_reachable_floor() {
        // Flat 2.0 at effective target 66 needs 4 pods, so 4 is the lowest
        // reachable floor and the highest target survives the binary search.
        let demand = series(&vec![2.0; 60]);
        let optimal = search(&demand, Duration::ZERO).unwrap();

        assert_eq!(
            optimal,
            OptimalConfig {
                target_utilization: 60,
                min_replicas: 4,
                max_replicas: 10,
            }
        );
    }

    #[test]
    fn test_cycle_lag_lowers_the_target() {
        // A gradual ramp from 2.0 up to a sustained 5.0. With no extra lag,
        // capacity tracks the ramp step by step and the highest target
        // survives; a two-step lag makes capacity trail the ramp, so the
        // binary search has to back off the target until each ramp point is
        // covered by capacity provisioned two steps earlier.
        let mut values = vec![2.0; 20];
        values.extend([2.5, 3.0, 3.5, 4.0, 4.5, 5.0]);
        values.extend(vec![5.0; 10]);
        let demand = series(&values);

        let optimal = search(&demand, Duration::ZERO).unwrap();
        assert_eq!(
            optimal,
            OptimalConfig {
                target_utilization: 60,
                min_replicas: 4,
                max_replicas: 10,
            }
        );

        let optimal = search(&demand, STEP * 2).unwrap();
        assert_eq!(
            optimal,
            OptimalConfig {
                target_utilization: 57,
                min_replicas: 4,
                max_replicas: 10,
            }
        );
    }

    #[test]
    fn test_demand_beyond_capacity_is_unrecommendable() {
        // 10.0 aggregate needs more than 10 pods at every target, so every
        // replay breaches.
        let demand = series(&vec![10.0; 20]);
        let err = search(&demand, Duration::ZERO).unwrap_err();
        assert!(matches!(err, RecoError::UnableToRecommend));
    }

    #[test]
    fn test_zero_savings_is_unrecommendable() {
        // 6.0 aggregate needs the full 10 pods at every target: the only
        // eligible floor is the cap itself, which saves nothing.
        let demand = series(&vec![6.0; 20]);
        let err = search(&demand, Duration::ZERO).unwrap_err();
        assert!(matches!(err, RecoError::UnableToRecommend));
    }

    #[test]
    fn test_selected_configuration_dominates_demand() {
        let mut values = vec![1.0; 20];
        values.extend(vec![3.5; 5]);
        values.extend(vec![1.5; 20]);
        let demand = series(&values);

        let simulator = HpaSimulator::new(0.8);
        let optimal =
            find_optimal_configuration(&simulator, &demand, STEP * 3, 10, 60, 1.0, 10).unwrap();

        let outcome = simulator
            .simulate(
                &demand,
                STEP * 3,
                optimal.target_utilization,
                1.0,
                optimal.max_replicas,
                optimal.min_replicas,
            )
            .unwrap();
        for (d, s) in demand.iter().zip(outcome.supply.iter()) {
            assert!(
                d.value <= s.value,
                "demand {} exceeds supply {} at {}",
                d.value,
                s.value,
                d.timestamp
            );
        }
    }

    #[test]
    fn test_invalid_search_bounds_propagate_simulator_errors() {
        let demand = series(&[1.0, 1.0]);
        let simulator = HpaSimulator::new(0.8);
        // A max target of 95 inflates past 100 inside the replay.
        let err = find_optimal_configuration(&simulator, &demand, Duration::ZERO, 95, 95, 1.0, 10)
            .unwrap_err();
        assert!(matches!(err, RecoError::InvalidTargetUtilization(_)));
    }
}
