use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// One EV charging session as it appears in the cleaned charging CSV.
///
/// All fields come in as raw strings so the loader owns every parse decision.
/// The alternately-cased `Energy Consumed (kWh)` column is the unscaled
/// source column, read only as the reference scale for the unit correction.
#[derive(Debug, Deserialize)]
pub struct RawChargingRow {
    #[serde(rename = "energy_consumed_(kwh)")]
    pub energy_consumed_kwh: Option<String>,
    #[serde(rename = "charging_duration_(hours)")]
    pub charging_duration_hours: Option<String>,
    #[serde(rename = "start_hour")]
    pub start_hour: Option<String>,
    #[serde(rename = "Energy Consumed (kWh)")]
    pub energy_consumed_reference: Option<String>,
}

/// A parsed charging session. `demand_index` starts at 0 and is filled in by
/// the demand forecaster; nothing reads it before that pass runs.
#[derive(Debug, Clone)]
pub struct ChargingRecord {
    pub energy_kwh: f64,
    pub duration_hours: f64,
    pub start_hour: u8,
    pub demand_index: f64,
}

/// One EV registration row. `state_flags` is parallel to the owning table's
/// `state_names`: one 0/1 indicator per one-hot state column.
#[derive(Debug, Clone)]
pub struct SpatialRecord {
    pub city: String,
    pub state_flags: Vec<u8>,
}

/// The spatial registration dataset together with its discovered
/// one-hot state columns (suffixes only, in header order).
#[derive(Debug, Clone)]
pub struct SpatialTable {
    pub state_names: Vec<String>,
    pub records: Vec<SpatialRecord>,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct CityCountRow {
    #[serde(rename = "city")]
    #[tabled(rename = "City")]
    pub city: String,
    #[serde(rename = "ev_count")]
    #[tabled(rename = "EVCount")]
    pub ev_count: usize,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq, Eq)]
pub struct StateCountRow {
    #[serde(rename = "state")]
    #[tabled(rename = "State")]
    pub state: String,
    #[serde(rename = "ev_count")]
    #[tabled(rename = "EVCount")]
    pub ev_count: u64,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct HourlyDemandRow {
    #[serde(rename = "start_hour")]
    #[tabled(rename = "StartHour")]
    pub start_hour: u8,
    #[serde(rename = "avg_energy_kwh")]
    #[tabled(rename = "AvgEnergyKwh")]
    pub avg_energy_kwh: f64,
}

/// Scalar metrics and recommendation strings written to `summary.json`.
#[derive(Debug, Serialize)]
pub struct InsightSummary {
    pub generated_at: String,
    pub total_ev: usize,
    pub peak_energy: f64,
    pub top_city: String,
    pub infrastructure_recommendation: String,
    pub policy_recommendation: String,
}
