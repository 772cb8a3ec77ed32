//! Simulated time.
//!
//! All timestamps and durations in the simulation are [`SimTime`] values,
//! counted in microseconds since simulation start. Time never comes from the
//! wall clock.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulation time (or duration) in microseconds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct SimTime(u64);

impl SimTime {
    /// Simulation start.
    pub const ZERO: SimTime = SimTime(0);

    /// Largest representable time.
    pub const MAX: SimTime = SimTime(u64::MAX);

    /// Create from microseconds.
    pub const fn from_micros(us: u64) -> Self {
        SimTime(us)
    }

    /// Create from milliseconds, clamping at [`SimTime::MAX`].
    pub const fn from_millis(ms: u64) -> Self {
        SimTime(ms.saturating_mul(1_000))
    }

    /// Create from whole seconds, clamping at [`SimTime::MAX`].
    pub const fn from_secs(s: u64) -> Self {
        SimTime(s.saturating_mul(1_000_000))
    }

    /// Create from fractional seconds. Negative input clamps to zero.
    pub fn from_secs_f64(s: f64) -> Self {
        SimTime((s.max(0.0) * 1_000_000.0) as u64)
    }

    pub fn as_micros(self) -> u64 {
        self.0
    }

    pub fn as_millis(self) -> u64 {
        self.0 / 1_000
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Add, returning `None` on overflow.
    pub fn checked_add(self, rhs: SimTime) -> Option<SimTime> {
        self.0.checked_add(rhs.0).map(SimTime)
    }

    /// Add, clamping at [`SimTime::MAX`].
    pub fn saturating_add(self, rhs: SimTime) -> SimTime {
        SimTime(self.0.saturating_add(rhs.0))
    }

    /// Subtract, clamping at zero.
    pub fn saturating_sub(self, rhs: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::Add for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = SimTime;

    fn sub(self, rhs: Self) -> Self::Output {
        self.saturating_sub(rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_conversions() {
        assert_eq!(SimTime::from_millis(10).as_micros(), 10_000);
        assert_eq!(SimTime::from_secs(2).as_millis(), 2_000);
        assert_eq!(SimTime::from_secs_f64(1.5).as_micros(), 1_500_000);
        assert_eq!(SimTime::from_secs_f64(-3.0), SimTime::ZERO);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let t = SimTime::from_micros(5);
        assert_eq!(t - SimTime::from_micros(10), SimTime::ZERO);
        assert_eq!(SimTime::MAX + t, SimTime::MAX);
        assert_eq!(SimTime::MAX.checked_add(t), None);
    }

    #[test]
    fn test_large_constructors_clamp() {
        assert_eq!(SimTime::from_secs(u64::MAX), SimTime::MAX);
        assert_eq!(SimTime::from_secs(18_446_744_073_709_552), SimTime::MAX);
        assert_eq!(SimTime::from_millis(u64::MAX / 10), SimTime::MAX);
        assert_eq!(SimTime::from_secs(18_446_744_073_709).as_micros(), 18_446_744_073_709_000_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(SimTime::from_millis(1_250).to_string(), "1.250000s");
    }
}
