// Rule-based recommendations derived from the aggregated tables.
use crate::error::{InsightError, Result};
use crate::types::{ChargingRecord, CityCountRow};
use crate::util::average;
use std::collections::BTreeMap;

/// Mean demand index above which the fast-charging recommendation fires.
/// Strictly greater-than; a mean of exactly 15 stays on the moderate branch.
pub const DEMAND_MEAN_THRESHOLD: f64 = 15.0;
/// Default number of high-risk cities reported.
pub const DEFAULT_HIGH_RISK_CITIES: usize = 5;
/// Number of cities shown in the adoption table preview.
pub const TOP_CITIES_PREVIEW: usize = 10;

const FAST_CHARGING_RECOMMENDATION: &str =
    "High charging demand detected: install fast-charging stations.";
const STANDARD_EXPANSION_RECOMMENDATION: &str =
    "Moderate demand: expand standard public chargers.";

/// Applies fixed threshold rules to the demand-indexed sessions and the
/// sorted city counts. Stateless: every query recomputes from the borrowed
/// inputs.
pub struct DecisionEngine<'a> {
    demand: &'a [ChargingRecord],
    city_counts: &'a [CityCountRow],
}

impl<'a> DecisionEngine<'a> {
    pub fn new(demand: &'a [ChargingRecord], city_counts: &'a [CityCountRow]) -> Self {
        DecisionEngine {
            demand,
            city_counts,
        }
    }

    /// The first `n` cities by EV count, used as a proxy for congestion
    /// risk. Returns all cities when `n` exceeds the available rows.
    pub fn high_risk_cities(&self, n: usize) -> &[CityCountRow] {
        &self.city_counts[..n.min(self.city_counts.len())]
    }

    /// Infrastructure action chosen by comparing the mean demand index to
    /// the fixed threshold. An empty demand table is an error, never a NaN
    /// smuggled into the output string.
    pub fn infrastructure_recommendation(&self) -> Result<String> {
        if self.demand.is_empty() {
            return Err(InsightError::empty_table("charging sessions"));
        }
        let indices: Vec<f64> = self.demand.iter().map(|r| r.demand_index).collect();
        let avg_demand = average(&indices);
        if avg_demand > DEMAND_MEAN_THRESHOLD {
            Ok(FAST_CHARGING_RECOMMENDATION.to_string())
        } else {
            Ok(STANDARD_EXPANSION_RECOMMENDATION.to_string())
        }
    }

    /// Policy action naming the hour whose mean demand index peaks. Groups
    /// are walked in ascending hour order and the comparison is strict, so
    /// ties resolve to the lowest hour.
    pub fn policy_recommendation(&self) -> Result<String> {
        if self.demand.is_empty() {
            return Err(InsightError::empty_table("charging sessions"));
        }
        let mut sums: BTreeMap<u8, (f64, usize)> = BTreeMap::new();
        for r in self.demand {
            let entry = sums.entry(r.start_hour).or_insert((0.0, 0));
            entry.0 += r.demand_index;
            entry.1 += 1;
        }
        let mut peak_hour = 0u8;
        let mut peak_mean = f64::NEG_INFINITY;
        for (hour, (sum, count)) in sums {
            let mean = sum / count as f64;
            if mean > peak_mean {
                peak_mean = mean;
                peak_hour = hour;
            }
        }
        Ok(format!(
            "Peak charging demand occurs around hour {}. Introduce time-based incentives.",
            peak_hour
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demand::DemandForecaster;
    use crate::error::InsightError;

    fn session(energy: f64, duration: f64, hour: u8) -> ChargingRecord {
        ChargingRecord {
            energy_kwh: energy,
            duration_hours: duration,
            start_hour: hour,
            demand_index: energy + duration,
        }
    }

    fn city(name: &str, count: usize) -> CityCountRow {
        CityCountRow {
            city: name.to_string(),
            ev_count: count,
        }
    }

    #[test]
    fn high_risk_cities_is_a_prefix() {
        let counts = vec![city("A", 2), city("B", 1)];
        let demand = vec![session(10.0, 1.0, 8)];
        let engine = DecisionEngine::new(&demand, &counts);
        assert_eq!(engine.high_risk_cities(1), &counts[..1]);
        assert_eq!(engine.high_risk_cities(5), &counts[..]);
        assert!(engine.high_risk_cities(0).is_empty());
    }

    #[test]
    fn infrastructure_threshold_is_strict() {
        // Mean exactly 15 takes the moderate branch.
        let at_threshold = vec![session(14.0, 1.0, 8), session(13.0, 2.0, 9)];
        let counts = vec![city("A", 1)];
        let engine = DecisionEngine::new(&at_threshold, &counts);
        assert_eq!(
            engine.infrastructure_recommendation().unwrap(),
            STANDARD_EXPANSION_RECOMMENDATION
        );

        let above = vec![session(20.0, 2.0, 9)];
        let engine = DecisionEngine::new(&above, &counts);
        assert_eq!(
            engine.infrastructure_recommendation().unwrap(),
            FAST_CHARGING_RECOMMENDATION
        );
    }

    #[test]
    fn empty_demand_table_is_an_error() {
        let counts = vec![city("A", 1)];
        let engine = DecisionEngine::new(&[], &counts);
        assert!(matches!(
            engine.infrastructure_recommendation().unwrap_err(),
            InsightError::EmptyTable { .. }
        ));
        assert!(matches!(
            engine.policy_recommendation().unwrap_err(),
            InsightError::EmptyTable { .. }
        ));
    }

    #[test]
    fn policy_names_hour_with_highest_mean_index() {
        let demand = vec![session(10.0, 1.0, 8), session(20.0, 2.0, 9)];
        let counts = vec![city("A", 1)];
        let engine = DecisionEngine::new(&demand, &counts);
        let policy = engine.policy_recommendation().unwrap();
        assert_eq!(
            policy,
            "Peak charging demand occurs around hour 9. Introduce time-based incentives."
        );
    }

    #[test]
    fn policy_ties_go_to_lowest_hour() {
        // Hour 17 appears first in the data; with equal means the lower
        // hour must still win.
        let demand = vec![session(10.0, 2.0, 17), session(11.0, 1.0, 6)];
        let counts = vec![city("A", 1)];
        let engine = DecisionEngine::new(&demand, &counts);
        let policy = engine.policy_recommendation().unwrap();
        assert!(policy.contains("hour 6."));
    }

    #[test]
    fn worked_scenario_end_to_end() {
        let mut forecaster = DemandForecaster::new(vec![
            ChargingRecord {
                energy_kwh: 10.0,
                duration_hours: 1.0,
                start_hour: 8,
                demand_index: 0.0,
            },
            ChargingRecord {
                energy_kwh: 20.0,
                duration_hours: 2.0,
                start_hour: 9,
                demand_index: 0.0,
            },
        ]);
        let indexed = forecaster.compute_demand_index().to_vec();
        assert_eq!(indexed[0].demand_index, 11.0);
        assert_eq!(indexed[1].demand_index, 22.0);

        let counts = vec![city("A", 2), city("B", 1)];
        let engine = DecisionEngine::new(&indexed, &counts);
        // mean = 16.5 > 15
        assert_eq!(
            engine.infrastructure_recommendation().unwrap(),
            FAST_CHARGING_RECOMMENDATION
        );
        assert!(engine.policy_recommendation().unwrap().contains("hour 9."));
    }
}
