//! Simulation clock.

use super::SimError;
use crate::time::SimTime;

/// Monotonic simulated clock. Time only moves forward.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimClock {
    now: SimTime,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Move to `target`.
    ///
    /// # Errors
    ///
    /// [`SimError::TimeWentBackwards`] if `target` is before the current time.
    pub fn advance_to(&mut self, target: SimTime) -> Result<(), SimError> {
        if target < self.now {
            return Err(SimError::TimeWentBackwards {
                now: self.now,
                target,
            });
        }
        self.now = target;
        Ok(())
    }

    pub fn advance_by(&mut self, duration: SimTime) {
        self.now = self.now + duration;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        assert_eq!(SimClock::new().now(), SimTime::ZERO);
    }

    #[test]
    fn test_advance() {
        let mut clock = SimClock::new();
        clock.advance_to(SimTime::from_millis(5)).unwrap();
        clock.advance_by(SimTime::from_millis(5));
        assert_eq!(clock.now(), SimTime::from_millis(10));
        // Same instant is allowed
        clock.advance_to(SimTime::from_millis(10)).unwrap();
    }

    #[test]
    fn test_cannot_go_backwards() {
        let mut clock = SimClock::new();
        clock.advance_to(SimTime::from_secs(1)).unwrap();
        let err = clock.advance_to(SimTime::from_millis(1)).unwrap_err();
        assert!(matches!(err, SimError::TimeWentBackwards { .. }));
        assert_eq!(clock.now(), SimTime::from_secs(1));
    }
}
