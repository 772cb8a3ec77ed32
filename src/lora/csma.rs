//! Listen-before-talk channel access.
//!
//! Turns the PHY's clear channel assessment into a transmit decision:
//!
//! 1. If the channel is clear, transmit
//! 2. If it is occupied, defer for a random backoff
//! 3. The backoff window doubles with each retry, up to a cap
//! 4. After `max_retries` deferrals, give up on the packet
//!
//! # Example
//!
//! ```
//! use lora_ed_phy::lora::{AccessDecision, ChannelAccess, ChannelAccessConfig};
//!
//! let mut access = ChannelAccess::seeded(ChannelAccessConfig::default(), 7);
//!
//! match access.try_access(true) {
//!     AccessDecision::Transmit => println!("channel clear"),
//!     AccessDecision::Defer { backoff } => println!("busy, retry in {}", backoff),
//!     AccessDecision::GiveUp => println!("dropping packet"),
//! }
//! ```

use crate::lora::ConfigError;
use crate::time::SimTime;
use rand_chacha::ChaCha8Rng;
use rand_core::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

/// Backoff and retry limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelAccessConfig {
    /// Deferrals allowed before giving up.
    pub max_retries: u8,
    pub min_backoff_ms: u64,
    /// Cap on the exponential window.
    pub max_backoff_ms: u64,
}

impl Default for ChannelAccessConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            min_backoff_ms: 10,
            max_backoff_ms: 500,
        }
    }
}

impl ChannelAccessConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_backoff_ms == 0 {
            return Err(ConfigError::Invalid("min_backoff_ms must be > 0"));
        }
        if self.max_backoff_ms < self.min_backoff_ms {
            return Err(ConfigError::Invalid("max_backoff_ms must be >= min_backoff_ms"));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries must be > 0"));
        }
        if self.max_retries > 20 {
            return Err(ConfigError::Invalid("max_retries must be <= 20"));
        }
        Ok(())
    }
}

/// Outcome of one access attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "ignoring the access decision could transmit on a busy channel"]
pub enum AccessDecision {
    Transmit,
    /// Try again after `backoff`.
    Defer { backoff: SimTime },
    /// Retries exhausted.
    GiveUp,
}

/// Per-device channel access state.
#[derive(Debug, Clone)]
pub struct ChannelAccess {
    config: ChannelAccessConfig,
    retries: u8,
    rng: ChaCha8Rng,
}

impl ChannelAccess {
    /// Channel access with a reproducible backoff sequence.
    pub fn seeded(config: ChannelAccessConfig, seed: u64) -> Self {
        Self {
            config,
            retries: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Decide what to do given the latest clear channel assessment.
    pub fn try_access(&mut self, occupied: bool) -> AccessDecision {
        if !occupied {
            AccessDecision::Transmit
        } else if self.retries >= self.config.max_retries {
            AccessDecision::GiveUp
        } else {
            let backoff = self.next_backoff();
            self.retries += 1;
            AccessDecision::Defer { backoff }
        }
    }

    /// Clear the retry counter once a packet is sent or dropped.
    pub fn reset(&mut self) {
        self.retries = 0;
    }

    pub fn retries(&self) -> u8 {
        self.retries
    }

    pub fn config(&self) -> &ChannelAccessConfig {
        &self.config
    }

    /// Random backoff in `[min, window)`, where `window = min * 2^(retries+1)`
    /// capped at `max_backoff_ms`.
    fn next_backoff(&mut self) -> SimTime {
        let min = self.config.min_backoff_ms;
        let window = min
            .saturating_mul(1 << (self.retries as u32 + 1).min(10))
            .min(self.config.max_backoff_ms);
        let range = window.saturating_sub(min);
        let ms = if range == 0 {
            min
        } else {
            min + self.rng.next_u64() % range
        };
        SimTime::from_millis(ms)
    }
}
