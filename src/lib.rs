//! LoRa end-device PHY model.
//!
//! The core is [`phy::EndDevicePhy`]: a four-state radio (sleep, standby,
//! TX, RX) with a transition contract, ordered transition listeners and
//! clear channel assessment against a shared interference ledger.
//!
//! Around it sit the pieces needed to run it: LoRa airtime and channel access
//! in [`lora`], application traffic in [`traffic`] and a discrete-event
//! scenario runner in [`sim`].

pub mod interference;
pub mod lora;
pub mod phy;
pub mod sim;
pub mod time;
pub mod traffic;

pub use interference::{InterferenceEvent, InterferenceLedger, InterferenceTracker};
pub use lora::{calculate_airtime, ConfigError, LoRaParams, PhyConfig, Region};
pub use phy::{EndDevicePhy, PhyError, PhyListener, PhyState, SpreadingFactor, Transition};
pub use sim::{Scenario, ScenarioConfig, ScenarioReport, SimError};
pub use time::SimTime;
