// Spatial aggregation over the EV registration table.
use crate::types::{CityCountRow, SpatialTable, StateCountRow};
use std::collections::HashMap;

/// Computes per-city and per-state EV counts from a loaded spatial table.
/// Borrows the table; never mutates it.
pub struct SpatialAnalyzer<'a> {
    table: &'a SpatialTable,
}

impl<'a> SpatialAnalyzer<'a> {
    pub fn new(table: &'a SpatialTable) -> Self {
        SpatialAnalyzer { table }
    }

    /// EV count per distinct city, sorted by count descending. Ties break on
    /// city name so the ordering is deterministic across runs.
    pub fn count_by_city(&self) -> Vec<CityCountRow> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for r in &self.table.records {
            *counts.entry(r.city.as_str()).or_insert(0) += 1;
        }
        let mut rows: Vec<CityCountRow> = counts
            .into_iter()
            .map(|(city, ev_count)| CityCountRow {
                city: city.to_string(),
                ev_count,
            })
            .collect();
        rows.sort_by(|a, b| b.ev_count.cmp(&a.ev_count).then_with(|| a.city.cmp(&b.city)));
        rows
    }

    /// EV count per one-hot `state_` column, labeled by the column suffix,
    /// sorted descending. Empty when the table carries no state columns.
    pub fn count_by_state(&self) -> Vec<StateCountRow> {
        let mut sums = vec![0u64; self.table.state_names.len()];
        for r in &self.table.records {
            for (i, flag) in r.state_flags.iter().enumerate() {
                sums[i] += u64::from(*flag);
            }
        }
        let mut rows: Vec<StateCountRow> = self
            .table
            .state_names
            .iter()
            .zip(sums)
            .map(|(state, ev_count)| StateCountRow {
                state: state.clone(),
                ev_count,
            })
            .collect();
        rows.sort_by(|a, b| b.ev_count.cmp(&a.ev_count).then_with(|| a.state.cmp(&b.state)));
        rows
    }
}
