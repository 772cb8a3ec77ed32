//! Interference tracking.
//!
//! The PHY never owns transmission events. It asks an [`InterferenceLedger`]
//! for a snapshot and reads it. [`InterferenceTracker`] is the in-memory
//! ledger that the simulation's channel owner writes to.

use crate::phy::SpreadingFactor;
use crate::time::SimTime;
use serde::{Deserialize, Serialize};

/// One transmission as heard at a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterferenceEvent {
    pub frequency_mhz: f64,
    pub spreading_factor: SpreadingFactor,
    pub start: SimTime,
    pub end: SimTime,
    pub rx_power_dbm: f64,
}

impl InterferenceEvent {
    /// Event starting at `start` and lasting `duration`.
    pub fn new(
        frequency_mhz: f64,
        spreading_factor: SpreadingFactor,
        start: SimTime,
        duration: SimTime,
        rx_power_dbm: f64,
    ) -> Self {
        Self {
            frequency_mhz,
            spreading_factor,
            start,
            end: start + duration,
            rx_power_dbm,
        }
    }

    pub fn duration(&self) -> SimTime {
        self.end - self.start
    }

    /// Whether the event is still on air at `now`.
    pub fn is_active_at(&self, now: SimTime) -> bool {
        self.start <= now && now < self.end
    }
}

/// Read-only source of interference events.
pub trait InterferenceLedger {
    /// Snapshot of the events currently known to the ledger.
    fn interferers(&self) -> Vec<InterferenceEvent>;
}

impl<L: InterferenceLedger + ?Sized> InterferenceLedger for &L {
    fn interferers(&self) -> Vec<InterferenceEvent> {
        (**self).interferers()
    }
}

/// Plain event lists act as a fixed ledger.
impl InterferenceLedger for [InterferenceEvent] {
    fn interferers(&self) -> Vec<InterferenceEvent> {
        self.to_vec()
    }
}

impl InterferenceLedger for Vec<InterferenceEvent> {
    fn interferers(&self) -> Vec<InterferenceEvent> {
        self.clone()
    }
}

/// In-memory interference ledger.
#[derive(Debug, Clone, Default)]
pub struct InterferenceTracker {
    events: Vec<InterferenceEvent>,
}

impl InterferenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transmission.
    pub fn add(&mut self, event: InterferenceEvent) {
        log::trace!(
            "Interference event added: {} MHz {} [{}, {}) {} dBm",
            event.frequency_mhz,
            event.spreading_factor,
            event.start,
            event.end,
            event.rx_power_dbm
        );
        self.events.push(event);
    }

    /// Forget events that ended before `now`. Returns how many were removed.
    pub fn clean_old_events(&mut self, now: SimTime) -> usize {
        let before = self.events.len();
        self.events.retain(|e| e.end >= now);
        before - self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl InterferenceLedger for InterferenceTracker {
    fn interferers(&self) -> Vec<InterferenceEvent> {
        self.events.clone()
    }
}
