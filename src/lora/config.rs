//! Region channel plans and PHY configuration.

use crate::phy::{SpreadingFactor, DEFAULT_SENSING_DURATION};
use crate::time::SimTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Frequency band region.
///
/// Determines the default uplink channels an end device may tune to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    /// EU 863-870 MHz band
    Eu868,
    /// US 902-928 MHz band
    Us915,
    /// Australia 915-928 MHz
    Au915,
    /// Asia 920-923 MHz
    As923,
}

impl Region {
    /// Default uplink channels in MHz; the first one is the join channel.
    pub fn default_channels(self) -> &'static [f64] {
        match self {
            Self::Eu868 => &[868.1, 868.3, 868.5],
            Self::Us915 => &[902.3, 902.5, 902.7, 902.9, 903.1, 903.3, 903.5, 903.7],
            Self::Au915 => &[915.2, 915.4, 915.6, 915.8, 916.0, 916.2, 916.4, 916.6],
            Self::As923 => &[923.2, 923.4],
        }
    }

    /// Frequency a device tunes to by default.
    pub fn default_frequency(self) -> f64 {
        self.default_channels()[0]
    }

    pub fn contains(self, frequency_mhz: f64) -> bool {
        self.default_channels().contains(&frequency_mhz)
    }
}

impl Default for Region {
    fn default() -> Self {
        #[cfg(feature = "region-us915")]
        return Self::Us915;
        #[cfg(feature = "region-au915")]
        return Self::Au915;
        #[cfg(feature = "region-as923")]
        return Self::As923;
        #[cfg(not(any(
            feature = "region-us915",
            feature = "region-au915",
            feature = "region-as923"
        )))]
        Self::Eu868
    }
}

/// Errors raised while validating or loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tuning of one end-device PHY.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhyConfig {
    pub frequency_mhz: f64,
    pub spreading_factor: SpreadingFactor,
    /// Clear channel gap length in milliseconds.
    pub sensing_duration_ms: u64,
}

impl Default for PhyConfig {
    fn default() -> Self {
        Self {
            frequency_mhz: Region::default().default_frequency(),
            spreading_factor: SpreadingFactor::SF7,
            sensing_duration_ms: DEFAULT_SENSING_DURATION.as_millis(),
        }
    }
}

impl PhyConfig {
    pub fn sensing_duration(&self) -> SimTime {
        SimTime::from_millis(self.sensing_duration_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.frequency_mhz.is_finite() || self.frequency_mhz <= 0.0 {
            return Err(ConfigError::Invalid("frequency_mhz must be a positive number"));
        }
        if self.sensing_duration_ms == 0 {
            return Err(ConfigError::Invalid("sensing_duration_ms must be > 0"));
        }
        Ok(())
    }
}
