//! Run a multi-device end-device PHY scenario and print the report.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin phy-sim                    # built-in scenario
//! cargo run --bin phy-sim -- scenario.json   # scenario from file
//! RUST_LOG=debug cargo run --bin phy-sim     # per-transmission logging
//! ```

use log::{error, info};
use lora_ed_phy::{Scenario, ScenarioConfig};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => match ScenarioConfig::load(&path) {
            Ok(config) => {
                info!("Loaded scenario from {}", path);
                config
            }
            Err(e) => {
                error!("Failed to load {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => {
            info!("No scenario file given, using the built-in scenario");
            ScenarioConfig::default()
        }
    };

    let report = match Scenario::new(config).and_then(Scenario::run) {
        Ok(report) => report,
        Err(e) => {
            error!("Scenario failed: {}", e);
            std::process::exit(1);
        }
    };

    match report.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize report: {}", e);
            std::process::exit(1);
        }
    }
}
