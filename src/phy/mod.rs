//! End-device physical layer.
//!
//! This module contains:
//! - [`sensitivity`]: Spreading factor type and per-SF receiver sensitivity
//! - [`state`]: Radio states, the transition table and [`PhyError`]
//! - [`listener`]: Ordered transition observers
//! - [`occupancy`]: Clear channel assessment against an interference ledger
//! - [`end_device`]: The PHY itself, tying the pieces together
//! - [`stats`]: Reception loss reasons and counters

mod end_device;
mod listener;
mod occupancy;
mod sensitivity;
mod state;
mod stats;

pub use crate::interference::InterferenceEvent;
pub use end_device::{EndDevicePhy, DEFAULT_FREQUENCY_MHZ};
pub use listener::{ListenerRegistry, PhyListener, TransitionRecorder};
pub use occupancy::{ChannelOccupancy, ClearChannelGap, DEFAULT_SENSING_DURATION};
pub use sensitivity::{SensitivityTable, SpreadingFactor, END_DEVICE_SENSITIVITY};
pub use state::{PhyError, PhyOperation, PhyState, Transition};
pub use stats::{LossReason, PhyStats, PhyStatsSnapshot};
