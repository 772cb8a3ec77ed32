//! LoRa radio parameters and channel access.
//!
//! This module contains:
//! - [`config`]: Region channel plans, [`PhyConfig`] and [`ConfigError`]
//! - [`airtime`]: Time-on-air calculation for LoRa packets
//! - [`csma`]: Listen-before-talk decisions with exponential backoff

mod airtime;
mod config;
mod csma;

pub use airtime::{calculate_airtime, LoRaParams};
pub use config::{ConfigError, PhyConfig, Region};
pub use csma::{AccessDecision, ChannelAccess, ChannelAccessConfig};
