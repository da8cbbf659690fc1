// Entry point and high-level CLI flow.
//
// - Option [1] loads both datasets (spatial registrations, charging
//   sessions) and caches them in memory.
// - Option [2] runs the full insights pipeline: spatial counts, demand
//   index, peak-hour summary, recommendations, and the report artifacts.
// - After generating insights, the user can go back to the menu or exit.
mod decision;
mod demand;
mod error;
mod loader;
mod output;
mod spatial;
mod types;
mod util;

use chrono::Local;
use decision::{DecisionEngine, DEFAULT_HIGH_RISK_CITIES, TOP_CITIES_PREVIEW};
use demand::DemandForecaster;
use error::{InsightError, Result};
use once_cell::sync::Lazy;
use spatial::SpatialAnalyzer;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use types::{ChargingRecord, InsightSummary, SpatialTable};
use util::{format_int, format_number, round2};

const SPATIAL_PATH: &str = "data/ev_spatial_preprocessed.csv.gz";
const CHARGING_PATH: &str = "data/cleaned_charging_patterns.csv";

const TOP_CITIES_FILE: &str = "top_cities.csv";
const PEAK_DEMAND_FILE: &str = "peak_demand.csv";
const SUMMARY_FILE: &str = "summary.json";

// Simple in-memory app state so we only load the datasets once but can
// generate insights multiple times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        spatial: None,
        charging: None,
    })
});

struct AppState {
    spatial: Option<SpatialTable>,
    charging: Option<Vec<ChargingRecord>>,
}

/// Read a single line of input after printing the common "Enter choice:"
/// prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Ask the user whether to go back to the menu after generating insights.
///
/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Menu (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok();
        let resp = buf.trim().to_uppercase();
        match resp.as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load both datasets into `APP_STATE`.
fn handle_load() {
    let spatial = match loader::load_spatial(Path::new(SPATIAL_PATH)) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Failed to load {}: {}\n", SPATIAL_PATH, e);
            return;
        }
    };
    let charging = match loader::load_charging(Path::new(CHARGING_PATH)) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to load {}: {}\n", CHARGING_PATH, e);
            return;
        }
    };
    println!(
        "Loaded {} EV registrations ({} state columns) and {} charging sessions.\n",
        format_int(spatial.records.len() as i64),
        format_int(spatial.state_names.len() as i64),
        format_int(charging.len() as i64)
    );
    let mut state = APP_STATE.lock().unwrap();
    state.spatial = Some(spatial);
    state.charging = Some(charging);
}

/// Run the whole pipeline and render everything, or nothing on error.
///
/// All aggregates and both recommendation strings are computed before the
/// first line of output, so a failure never leaves a half-rendered report.
fn generate_insights(spatial: &SpatialTable, charging: Vec<ChargingRecord>) -> Result<()> {
    let analyzer = SpatialAnalyzer::new(spatial);
    let city_counts = analyzer.count_by_city();
    let state_counts = analyzer.count_by_state();

    let mut forecaster = DemandForecaster::new(charging);
    forecaster.compute_demand_index();
    let peak_hours = forecaster.peak_charging_hour();

    let engine = DecisionEngine::new(forecaster.records(), &city_counts);
    let infra = engine.infrastructure_recommendation()?;
    let policy = engine.policy_recommendation()?;
    let high_risk = engine.high_risk_cities(DEFAULT_HIGH_RISK_CITIES);

    let top = city_counts
        .first()
        .ok_or_else(|| InsightError::empty_table("EV registrations"))?;
    let peak = peak_hours
        .first()
        .ok_or_else(|| InsightError::empty_table("charging sessions"))?;
    let total_ev: usize = city_counts.iter().map(|r| r.ev_count).sum();
    let peak_energy = round2(peak.avg_energy_kwh);

    println!("Key Metrics");
    println!("  Total EVs monitored: {}", format_int(total_ev as i64));
    println!("  Peak hour demand (kWh): {}", format_number(peak_energy, 2));
    println!("  Top EV city: {} ({} EVs)\n", top.city, format_int(top.ev_count as i64));

    println!("Top {} Cities by EV Adoption", TOP_CITIES_PREVIEW);
    output::preview_table_rows(&city_counts, TOP_CITIES_PREVIEW);
    output::write_csv(TOP_CITIES_FILE, &city_counts)?;
    println!("(Full table exported to {})\n", TOP_CITIES_FILE);

    println!("Average Charging Demand by Hour");
    output::preview_table_rows(&peak_hours, peak_hours.len());
    output::write_csv(PEAK_DEMAND_FILE, &peak_hours)?;
    println!("(Full table exported to {})\n", PEAK_DEMAND_FILE);

    if !state_counts.is_empty() {
        println!("EV Registrations by State");
        output::preview_table_rows(&state_counts, state_counts.len());
    }

    println!(
        "High-Risk Cities (top {} by EV concentration)",
        DEFAULT_HIGH_RISK_CITIES
    );
    output::preview_table_rows(high_risk, high_risk.len());

    println!("Infrastructure: {}", infra);
    println!("Policy: {}\n", policy);

    println!("Summary");
    println!("  High EV concentration cities may face charging congestion.");
    println!("  Peak charging hours indicate grid stress periods.\n");

    let summary = InsightSummary {
        generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        total_ev,
        peak_energy,
        top_city: top.city.clone(),
        infrastructure_recommendation: infra,
        policy_recommendation: policy,
    };
    output::write_json(SUMMARY_FILE, &summary)?;
    println!("(Metrics and recommendations saved to {})\n", SUMMARY_FILE);

    Ok(())
}

/// Handle option [2]: generate insights from the cached datasets.
fn handle_generate_insights() {
    let (spatial, charging) = {
        let state = APP_STATE.lock().unwrap();
        (state.spatial.clone(), state.charging.clone())
    };
    let (Some(spatial), Some(charging)) = (spatial, charging) else {
        println!("Error: No data loaded. Please load the datasets first (option 1).\n");
        return;
    };

    println!("Generating insights...\n");
    if let Err(e) = generate_insights(&spatial, charging) {
        eprintln!("Insight generation halted: {}\n", e);
    }
}

fn main() {
    loop {
        println!("EV Adoption & Charging Demand Insights");
        println!("[1] Load the datasets");
        println!("[2] Generate Insights\n");
        match read_choice().as_str() {
            "1" => {
                handle_load();
            }
            "2" => {
                println!("");
                handle_generate_insights();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => {
                println!("Invalid choice. Please enter 1 or 2.\n");
            }
        }
    }
}
