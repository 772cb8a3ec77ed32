//! Discrete-event simulation around the end-device PHY.

mod clock;
mod queue;
mod scenario;

pub use clock::SimClock;
pub use queue::EventQueue;
pub use scenario::{DeviceConfig, DeviceReport, Scenario, ScenarioConfig, ScenarioReport};

use crate::lora::ConfigError;
use crate::phy::PhyError;
use crate::time::SimTime;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("clock cannot move back from {now} to {target}")]
    TimeWentBackwards { now: SimTime, target: SimTime },

    #[error("PHY error: {0}")]
    Phy(#[from] PhyError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}
