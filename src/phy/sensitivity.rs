//! Spreading factor and receiver sensitivity.
//!
//! Sensitivity values are the SX1272 downlink figures for a 125 kHz
//! bandwidth. Higher spreading factors reach further, so their threshold is
//! lower (more negative).

use super::PhyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// LoRa spreading factor, always within `7..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SpreadingFactor(u8);

impl SpreadingFactor {
    pub const MIN: u8 = 7;
    pub const MAX: u8 = 12;

    pub const SF7: SpreadingFactor = SpreadingFactor(7);
    pub const SF8: SpreadingFactor = SpreadingFactor(8);
    pub const SF9: SpreadingFactor = SpreadingFactor(9);
    pub const SF10: SpreadingFactor = SpreadingFactor(10);
    pub const SF11: SpreadingFactor = SpreadingFactor(11);
    pub const SF12: SpreadingFactor = SpreadingFactor(12);

    /// Validate a raw spreading factor.
    pub fn new(sf: u8) -> Result<Self, PhyError> {
        if (Self::MIN..=Self::MAX).contains(&sf) {
            Ok(Self(sf))
        } else {
            Err(PhyError::InvalidSpreadingFactor(sf))
        }
    }

    /// All valid spreading factors, lowest first.
    pub fn all() -> impl Iterator<Item = SpreadingFactor> {
        (Self::MIN..=Self::MAX).map(SpreadingFactor)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Position in per-SF tables (`sf - 7`).
    pub fn index(self) -> usize {
        (self.0 - Self::MIN) as usize
    }
}

impl Default for SpreadingFactor {
    fn default() -> Self {
        Self::SF7
    }
}

impl TryFrom<u8> for SpreadingFactor {
    type Error = PhyError;

    fn try_from(sf: u8) -> Result<Self, Self::Error> {
        Self::new(sf)
    }
}

impl From<SpreadingFactor> for u8 {
    fn from(sf: SpreadingFactor) -> u8 {
        sf.0
    }
}

impl fmt::Display for SpreadingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SF{}", self.0)
    }
}

/// Minimum receivable power per spreading factor, in dBm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensitivityTable([f64; 6]);

/// Downlink sensitivity {SF7, SF8, SF9, SF10, SF11, SF12} at 125 kHz.
pub const END_DEVICE_SENSITIVITY: SensitivityTable =
    SensitivityTable([-124.0, -127.0, -130.0, -133.0, -135.0, -137.0]);

impl SensitivityTable {
    pub const fn new(thresholds_dbm: [f64; 6]) -> Self {
        Self(thresholds_dbm)
    }

    /// Threshold for a spreading factor.
    pub fn threshold(&self, sf: SpreadingFactor) -> f64 {
        self.0[sf.index()]
    }

    /// Threshold for a raw spreading factor, failing outside `7..=12`.
    pub fn threshold_raw(&self, sf: u8) -> Result<f64, PhyError> {
        SpreadingFactor::new(sf).map(|sf| self.threshold(sf))
    }

    /// Whether a signal at `rx_power_dbm` is strong enough to be received.
    pub fn is_receivable(&self, rx_power_dbm: f64, sf: SpreadingFactor) -> bool {
        rx_power_dbm > self.threshold(sf)
    }
}

impl Default for SensitivityTable {
    fn default() -> Self {
        END_DEVICE_SENSITIVITY
    }
}
