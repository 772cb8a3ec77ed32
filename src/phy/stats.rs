//! Reception loss accounting.
//!
//! The MAC above the PHY rejects packets the radio is not tuned for. These
//! counters surface why, for observability.

use serde::Serialize;
use std::cell::Cell;
use std::fmt;

/// Why a packet reaching the PHY could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LossReason {
    /// The device was listening on a different frequency.
    WrongFrequency,
    /// The device was listening for a different spreading factor.
    WrongSpreadingFactor,
}

impl fmt::Display for LossReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongFrequency => write!(f, "lost because wrong frequency"),
            Self::WrongSpreadingFactor => write!(f, "lost because wrong spreading factor"),
        }
    }
}

/// Per-device loss counters.
#[derive(Debug, Default)]
pub struct PhyStats {
    wrong_frequency: Cell<u64>,
    wrong_spreading_factor: Cell<u64>,
}

/// Plain copy of [`PhyStats`] for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhyStatsSnapshot {
    pub lost_wrong_frequency: u64,
    pub lost_wrong_spreading_factor: u64,
}

impl PhyStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, reason: LossReason) {
        let counter = match reason {
            LossReason::WrongFrequency => &self.wrong_frequency,
            LossReason::WrongSpreadingFactor => &self.wrong_spreading_factor,
        };
        counter.set(counter.get() + 1);
    }

    pub fn count(&self, reason: LossReason) -> u64 {
        match reason {
            LossReason::WrongFrequency => self.wrong_frequency.get(),
            LossReason::WrongSpreadingFactor => self.wrong_spreading_factor.get(),
        }
    }

    pub fn snapshot(&self) -> PhyStatsSnapshot {
        PhyStatsSnapshot {
            lost_wrong_frequency: self.wrong_frequency.get(),
            lost_wrong_spreading_factor: self.wrong_spreading_factor.get(),
        }
    }
}
