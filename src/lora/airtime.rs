//! LoRa time-on-air.
//!
//! Transmission duration of a packet, used to size the interference event a
//! transmission leaves in the ledger. Follows the Semtech SX127x/SX126x
//! datasheet formula.
//!
//! # Example
//!
//! ```
//! use lora_ed_phy::lora::{calculate_airtime, LoRaParams};
//!
//! let airtime = calculate_airtime(20, &LoRaParams::default());
//! assert!(airtime.as_millis() > 50);
//! ```

use crate::phy::SpreadingFactor;
use crate::time::SimTime;
use serde::{Deserialize, Serialize};

/// Symbol time above which low data rate optimisation is required.
const LDRO_SYMBOL_THRESHOLD_US: u64 = 16_000;

/// Modulation parameters that determine airtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoRaParams {
    pub spreading_factor: SpreadingFactor,
    /// Bandwidth in Hz (125000, 250000 or 500000)
    pub bandwidth_hz: u32,
    /// Coding rate denominator, 5..=8 for 4/5..4/8
    pub coding_rate: u8,
    pub preamble_symbols: u16,
    pub explicit_header: bool,
    pub crc_enabled: bool,
}

impl Default for LoRaParams {
    /// LoRaWAN uplink defaults: SF7, 125 kHz, 4/5, 8-symbol preamble.
    fn default() -> Self {
        Self {
            spreading_factor: SpreadingFactor::SF7,
            bandwidth_hz: 125_000,
            coding_rate: 5,
            preamble_symbols: 8,
            explicit_header: true,
            crc_enabled: true,
        }
    }
}

impl LoRaParams {
    /// Default parameters with a different spreading factor.
    pub fn with_spreading_factor(spreading_factor: SpreadingFactor) -> Self {
        Self {
            spreading_factor,
            ..Default::default()
        }
    }

    /// One symbol (`2^SF / BW`) in microseconds.
    pub fn symbol_duration_us(&self) -> f64 {
        if self.bandwidth_hz == 0 {
            return 0.0;
        }
        (1u64 << self.spreading_factor.value()) as f64 * 1_000_000.0 / self.bandwidth_hz as f64
    }

    pub fn low_data_rate_optimize(&self) -> bool {
        self.symbol_duration_us() > LDRO_SYMBOL_THRESHOLD_US as f64
    }

    /// Preamble plus sync word and start-of-frame delimiter, in symbols.
    fn preamble_length(&self) -> f64 {
        self.preamble_symbols as f64 + 4.25
    }

    /// Number of payload symbols for `payload_bytes`.
    pub fn payload_symbols(&self, payload_bytes: usize) -> u64 {
        let sf = self.spreading_factor.value() as i64;
        let de = self.low_data_rate_optimize() as i64;
        let ih = (!self.explicit_header) as i64;
        let crc = self.crc_enabled as i64;

        let numerator = 8 * payload_bytes as i64 - 4 * sf + 28 + 16 * crc - 20 * ih;
        let denominator = 4 * (sf - 2 * de);
        // ceil(numerator / denominator), never negative
        let blocks = if numerator <= 0 {
            0
        } else {
            (numerator + denominator - 1) / denominator
        };
        8 + (blocks * self.coding_rate as i64) as u64
    }
}

/// Time on air of a `payload_bytes` packet.
pub fn calculate_airtime(payload_bytes: usize, params: &LoRaParams) -> SimTime {
    let symbols = params.preamble_length() + params.payload_symbols(payload_bytes) as f64;
    SimTime::from_micros((symbols * params.symbol_duration_us()).round() as u64)
}
