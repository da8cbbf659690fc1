// Dataset loading.
//
// Both input files are pre-processed exports from the upstream pipeline, so
// the loader is strict: a missing required column or a malformed numeric
// cell aborts the load instead of skipping rows. The only data fix applied
// here is the one-time energy unit correction.
use crate::error::{InsightError, Result};
use crate::types::{ChargingRecord, RawChargingRow, SpatialRecord, SpatialTable};
use crate::util::{parse_f64_safe, parse_hour_safe};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CITY_COLUMN: &str = "city";
const STATE_PREFIX: &str = "state_";
const ENERGY_COLUMN: &str = "energy_consumed_(kwh)";
const DURATION_COLUMN: &str = "charging_duration_(hours)";
const HOUR_COLUMN: &str = "start_hour";
/// Alternately-cased raw column holding un-normalized kWh; only used as the
/// scale reference for the unit correction.
const ENERGY_REFERENCE_COLUMN: &str = "Energy Consumed (kWh)";

/// City label used for rows with a blank or missing `city` cell. They form
/// their own group rather than being dropped, so the per-city counts still
/// sum to the total row count.
pub const UNKNOWN_CITY: &str = "Unknown";

/// Open a file, transparently gunzipping when the path ends in `.gz`.
fn open_maybe_gzip(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path)?;
    if path.extension().map_or(false, |ext| ext == "gz") {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

fn malformed(column: &str, line: u64, value: &str) -> InsightError {
    InsightError::MalformedValue {
        column: column.to_string(),
        line,
        value: value.to_string(),
    }
}

/// Load the EV spatial registration table.
///
/// Requires a `city` column; discovers every `state_<name>` one-hot column
/// from the header. Indicator cells must be numeric (blank counts as 0).
pub fn load_spatial(path: &Path) -> Result<SpatialTable> {
    // Strict widths: the inputs are machine-generated exports, so a short
    // row is a broken file, not something to paper over.
    let mut rdr = ReaderBuilder::new().from_reader(open_maybe_gzip(path)?);

    let headers = rdr.headers()?.clone();
    let city_idx = headers
        .iter()
        .position(|h| h == CITY_COLUMN)
        .ok_or_else(|| InsightError::missing_column(CITY_COLUMN))?;

    let state_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| {
            h.strip_prefix(STATE_PREFIX)
                .map(|suffix| (i, suffix.to_string()))
        })
        .collect();

    let mut records = Vec::new();
    for result in rdr.records() {
        let rec = result?;
        let line = rec.position().map(|p| p.line()).unwrap_or(0);

        let city = match rec.get(city_idx).map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => UNKNOWN_CITY.to_string(),
        };

        let mut state_flags = Vec::with_capacity(state_cols.len());
        for (idx, name) in &state_cols {
            let cell = rec.get(*idx).unwrap_or("").trim();
            let flag = if cell.is_empty() {
                0
            } else {
                let v = parse_f64_safe(Some(cell))
                    .ok_or_else(|| malformed(&format!("{}{}", STATE_PREFIX, name), line, cell))?;
                if v != 0.0 {
                    1
                } else {
                    0
                }
            };
            state_flags.push(flag);
        }

        records.push(SpatialRecord { city, state_flags });
    }

    Ok(SpatialTable {
        state_names: state_cols.into_iter().map(|(_, n)| n).collect(),
        records,
    })
}

/// Rescale normalized energy values back to absolute kWh.
///
/// The upstream cleaning step sometimes leaves `energy_consumed_(kwh)` as a
/// [0, 1] fraction. When the observed maximum is <= 1.0 and a positive
/// reference scale is available, every value is multiplied by that scale.
/// The correction is not idempotent on its own, so the <= 1.0 guard is what
/// keeps a second call from double-rescaling. Returns whether it ran.
pub fn rescale_energy_units(records: &mut [ChargingRecord], reference_max: Option<f64>) -> bool {
    let max_energy = records
        .iter()
        .map(|r| r.energy_kwh)
        .fold(f64::NEG_INFINITY, f64::max);
    if records.is_empty() || max_energy > 1.0 {
        return false;
    }
    let Some(scale) = reference_max.filter(|s| *s > 0.0) else {
        return false;
    };
    for r in records.iter_mut() {
        r.energy_kwh *= scale;
    }
    true
}

/// Load the charging session table and apply the unit correction once.
pub fn load_charging(path: &Path) -> Result<Vec<ChargingRecord>> {
    let mut rdr = ReaderBuilder::new().from_reader(open_maybe_gzip(path)?);

    let headers = rdr.headers()?.clone();
    for required in [ENERGY_COLUMN, DURATION_COLUMN, HOUR_COLUMN] {
        if !headers.iter().any(|h| h == required) {
            return Err(InsightError::missing_column(required));
        }
    }
    let has_reference = headers.iter().any(|h| h == ENERGY_REFERENCE_COLUMN);

    let mut records = Vec::new();
    let mut reference_max: Option<f64> = None;
    for (i, result) in rdr.deserialize::<RawChargingRow>().enumerate() {
        // Header occupies line 1.
        let line = (i + 2) as u64;
        let row = result?;

        let energy_cell = row.energy_consumed_kwh.as_deref().unwrap_or("");
        let energy_kwh = parse_f64_safe(Some(energy_cell))
            .ok_or_else(|| malformed(ENERGY_COLUMN, line, energy_cell))?;

        let duration_cell = row.charging_duration_hours.as_deref().unwrap_or("");
        let duration_hours = parse_f64_safe(Some(duration_cell))
            .filter(|d| *d >= 0.0)
            .ok_or_else(|| malformed(DURATION_COLUMN, line, duration_cell))?;

        let hour_cell = row.start_hour.as_deref().unwrap_or("");
        let start_hour =
            parse_hour_safe(Some(hour_cell)).ok_or_else(|| malformed(HOUR_COLUMN, line, hour_cell))?;

        if has_reference {
            let cell = row.energy_consumed_reference.as_deref().unwrap_or("").trim();
            if !cell.is_empty() {
                let v = parse_f64_safe(Some(cell))
                    .ok_or_else(|| malformed(ENERGY_REFERENCE_COLUMN, line, cell))?;
                reference_max = Some(reference_max.map_or(v, |m: f64| m.max(v)));
            }
        }

        records.push(ChargingRecord {
            energy_kwh,
            duration_hours,
            start_hour,
            demand_index: 0.0,
        });
    }

    // Fraction-scale energies with no reference to rescale by would poison
    // every downstream demand figure, so that load must fail, not succeed.
    let max_energy = records
        .iter()
        .map(|r| r.energy_kwh)
        .fold(f64::NEG_INFINITY, f64::max);
    if !records.is_empty() && max_energy <= 1.0 && reference_max.is_none() {
        return Err(InsightError::missing_column(ENERGY_REFERENCE_COLUMN));
    }

    rescale_energy_units(&mut records, reference_max);
    Ok(records)
}
