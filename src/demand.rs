// Charging demand aggregation.
use crate::types::{ChargingRecord, HourlyDemandRow};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Derives the per-session demand index and the per-hour energy summary.
/// Owns the charging records so the index can be written in place.
pub struct DemandForecaster {
    records: Vec<ChargingRecord>,
}

impl DemandForecaster {
    pub fn new(records: Vec<ChargingRecord>) -> Self {
        DemandForecaster { records }
    }

    /// Fill `demand_index = energy_kwh + duration_hours` for every record.
    ///
    /// The additive score is a fixed heuristic, not a calibrated model; it
    /// is kept exactly as-is for compatibility with the upstream dashboard.
    pub fn compute_demand_index(&mut self) -> &[ChargingRecord] {
        for r in &mut self.records {
            r.demand_index = r.energy_kwh + r.duration_hours;
        }
        &self.records
    }

    /// Mean energy per `start_hour`, sorted descending by mean. Groups keep
    /// their first-seen order, and the sort is stable, so equal means stay
    /// in insertion order.
    pub fn peak_charging_hour(&self) -> Vec<HourlyDemandRow> {
        let mut order: Vec<u8> = Vec::new();
        let mut sums: HashMap<u8, (f64, usize)> = HashMap::new();
        for r in &self.records {
            let entry = sums.entry(r.start_hour).or_insert_with(|| {
                order.push(r.start_hour);
                (0.0, 0)
            });
            entry.0 += r.energy_kwh;
            entry.1 += 1;
        }
        let mut rows: Vec<HourlyDemandRow> = order
            .into_iter()
            .map(|hour| {
                let (sum, count) = sums[&hour];
                HourlyDemandRow {
                    start_hour: hour,
                    avg_energy_kwh: sum / count as f64,
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.avg_energy_kwh
                .partial_cmp(&a.avg_energy_kwh)
                .unwrap_or(Ordering::Equal)
        });
        rows
    }

    pub fn records(&self) -> &[ChargingRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(energy: f64, duration: f64, hour: u8) -> ChargingRecord {
        ChargingRecord {
            energy_kwh: energy,
            duration_hours: duration,
            start_hour: hour,
            demand_index: 0.0,
        }
    }

    #[test]
    fn demand_index_is_energy_plus_duration_exactly() {
        let mut f = DemandForecaster::new(vec![record(10.0, 1.0, 8), record(20.0, 2.0, 9)]);
        let indexed = f.compute_demand_index();
        assert_eq!(indexed[0].demand_index, 11.0);
        assert_eq!(indexed[1].demand_index, 22.0);
    }

    #[test]
    fn peak_hour_sorts_means_descending() {
        let f = DemandForecaster::new(vec![
            record(10.0, 1.0, 8),
            record(20.0, 2.0, 9),
            record(30.0, 1.0, 8),
        ]);
        let rows = f.peak_charging_hour();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start_hour, 8);
        assert_eq!(rows[0].avg_energy_kwh, 20.0);
        assert_eq!(rows[1].start_hour, 9);
        assert_eq!(rows[1].avg_energy_kwh, 20.0 / 1.0);
        for pair in rows.windows(2) {
            assert!(pair[0].avg_energy_kwh >= pair[1].avg_energy_kwh);
        }
    }

    #[test]
    fn peak_hour_matches_worked_scenario() {
        let f = DemandForecaster::new(vec![record(10.0, 1.0, 8), record(20.0, 2.0, 9)]);
        let rows = f.peak_charging_hour();
        assert_eq!(rows[0].start_hour, 9);
        assert_eq!(rows[0].avg_energy_kwh, 20.0);
        assert_eq!(rows[1].start_hour, 8);
        assert_eq!(rows[1].avg_energy_kwh, 10.0);
    }

    #[test]
    fn peak_hour_ties_keep_first_seen_order() {
        let f = DemandForecaster::new(vec![record(15.0, 1.0, 7), record(15.0, 1.0, 3)]);
        let rows = f.peak_charging_hour();
        assert_eq!(rows[0].start_hour, 7);
        assert_eq!(rows[1].start_hour, 3);
    }

    #[test]
    fn peak_hour_of_empty_table_is_empty() {
        let f = DemandForecaster::new(Vec::new());
        assert!(f.peak_charging_hour().is_empty());
    }
}
