//! Clear channel assessment.
//!
//! Before transmitting, a device senses its channel for a short clear channel
//! gap (CCG) starting now. Any interference event on the same frequency that
//! overlaps the gap and is received above the sensitivity of its own
//! spreading factor occupies the channel. The querying device's own
//! spreading factor plays no part: sensing reports what is physically
//! detectable, not what the device is set to demodulate.
//!
//! # Example
//!
//! ```
//! use lora_ed_phy::phy::{ChannelOccupancy, SpreadingFactor};
//! use lora_ed_phy::{InterferenceEvent, SimTime};
//!
//! let cca = ChannelOccupancy::default();
//! let events = vec![InterferenceEvent::new(
//!     868.1,
//!     SpreadingFactor::SF7,
//!     SimTime::ZERO,
//!     SimTime::from_millis(50),
//!     -120.0,
//! )];
//!
//! assert!(cca.is_occupied(868.1, SimTime::from_millis(10), &events));
//! assert!(!cca.is_occupied(868.3, SimTime::from_millis(10), &events));
//! ```

use super::{SensitivityTable, END_DEVICE_SENSITIVITY};
use crate::interference::{InterferenceEvent, InterferenceLedger};
use crate::time::SimTime;
use log::debug;

/// Default CCG length (10 ms).
pub const DEFAULT_SENSING_DURATION: SimTime = SimTime::from_millis(10);

/// Sensing window `[start, end]` for one assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearChannelGap {
    pub start: SimTime,
    pub end: SimTime,
}

impl ClearChannelGap {
    pub fn starting_at(now: SimTime, sensing_duration: SimTime) -> Self {
        Self {
            start: now,
            end: now + sensing_duration,
        }
    }

    /// Whether `event` overlaps the gap.
    ///
    /// An event ending exactly at the gap start does not overlap; an event
    /// starting exactly at the gap end does.
    pub fn overlaps(&self, event: &InterferenceEvent) -> bool {
        !(event.end <= self.start || event.start > self.end)
    }
}

/// Stateless channel occupancy evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelOccupancy {
    sensing_duration: SimTime,
    sensitivity: SensitivityTable,
}

impl Default for ChannelOccupancy {
    fn default() -> Self {
        Self::new(DEFAULT_SENSING_DURATION)
    }
}

impl ChannelOccupancy {
    /// Evaluator using the end-device sensitivity table.
    pub fn new(sensing_duration: SimTime) -> Self {
        Self {
            sensing_duration,
            sensitivity: END_DEVICE_SENSITIVITY,
        }
    }

    /// Replace the sensitivity table.
    pub fn with_sensitivity(mut self, sensitivity: SensitivityTable) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    pub fn sensing_duration(&self) -> SimTime {
        self.sensing_duration
    }

    pub fn set_sensing_duration(&mut self, sensing_duration: SimTime) {
        self.sensing_duration = sensing_duration;
    }

    pub fn sensitivity(&self) -> &SensitivityTable {
        &self.sensitivity
    }

    /// Events that occupy `frequency_mhz` during the gap starting at `now`.
    pub fn occupiers<L>(
        &self,
        frequency_mhz: f64,
        now: SimTime,
        ledger: &L,
    ) -> Vec<InterferenceEvent>
    where
        L: InterferenceLedger + ?Sized,
    {
        let ccg = ClearChannelGap::starting_at(now, self.sensing_duration);

        ledger
            .interferers()
            .into_iter()
            .filter(|event| event.frequency_mhz == frequency_mhz && ccg.overlaps(event))
            .filter(|event| {
                let detected = self
                    .sensitivity
                    .is_receivable(event.rx_power_dbm, event.spreading_factor);
                if detected {
                    debug!(
                        "Occupier found for frequency: {} MHz, RxPower: {} dBm @ {} \
                         (threshold = {} dBm), eventStart: {}, eventEnd: {}, \
                         ccgStart: {}, ccgEnd: {}",
                        event.frequency_mhz,
                        event.rx_power_dbm,
                        event.spreading_factor,
                        self.sensitivity.threshold(event.spreading_factor),
                        event.start,
                        event.end,
                        ccg.start,
                        ccg.end
                    );
                }
                detected
            })
            .collect()
    }

    /// Whether any event occupies `frequency_mhz` during the gap starting at `now`.
    pub fn is_occupied<L>(&self, frequency_mhz: f64, now: SimTime, ledger: &L) -> bool
    where
        L: InterferenceLedger + ?Sized,
    {
        !self.occupiers(frequency_mhz, now, ledger).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interference::InterferenceTracker;
    use crate::phy::SpreadingFactor;

    const NOW_MS: u64 = 1_000;

    fn event_ms(
        freq: f64,
        sf: SpreadingFactor,
        start_ms: u64,
        end_ms: u64,
        power: f64,
    ) -> InterferenceEvent {
        InterferenceEvent {
            frequency_mhz: freq,
            spreading_factor: sf,
            start: SimTime::from_millis(start_ms),
            end: SimTime::from_millis(end_ms),
            rx_power_dbm: power,
        }
    }

    /// Event covering the whole CCG at `NOW_MS`.
    fn covering(freq: f64, sf: SpreadingFactor, power: f64) -> InterferenceEvent {
        event_ms(freq, sf, NOW_MS - 100, NOW_MS + 100, power)
    }

    fn now() -> SimTime {
        SimTime::from_millis(NOW_MS)
    }

    #[test]
    fn test_empty_ledger_is_clear() {
        let cca = ChannelOccupancy::default();
        let tracker = InterferenceTracker::new();
        assert!(!cca.is_occupied(868.1, now(), &tracker));
    }

    #[test]
    fn test_strong_event_occupies() {
        let cca = ChannelOccupancy::default();
        let events = vec![covering(868.1, SpreadingFactor::SF7, -120.0)];
        assert!(cca.is_occupied(868.1, now(), &events));
    }

    #[test]
    fn test_weak_event_does_not_occupy() {
        let cca = ChannelOccupancy::default();
        let events = vec![covering(868.1, SpreadingFactor::SF7, -125.0)];
        assert!(!cca.is_occupied(868.1, now(), &events));
    }

    #[test]
    fn test_power_exactly_at_threshold_is_clear() {
        let cca = ChannelOccupancy::default();
        for sf in SpreadingFactor::all() {
            let threshold = END_DEVICE_SENSITIVITY.threshold(sf);
            let at = vec![covering(868.1, sf, threshold)];
            assert!(!cca.is_occupied(868.1, now(), &at), "{} at threshold", sf);

            let above = vec![covering(868.1, sf, threshold + 1e-6)];
            assert!(cca.is_occupied(868.1, now(), &above), "{} above threshold", sf);
        }
    }

    #[test]
    fn test_other_frequency_ignored() {
        let cca = ChannelOccupancy::default();
        let events = vec![covering(868.3, SpreadingFactor::SF7, -30.0)];
        assert!(!cca.is_occupied(868.1, now(), &events));
        assert!(cca.is_occupied(868.3, now(), &events));
    }

    #[test]
    fn test_event_threshold_uses_event_sf() {
        // -128 dBm is below the SF7 threshold but above the SF12 one.
        let cca = ChannelOccupancy::default();
        let sf12 = vec![covering(868.1, SpreadingFactor::SF12, -128.0)];
        let sf7 = vec![covering(868.1, SpreadingFactor::SF7, -128.0)];
        assert!(cca.is_occupied(868.1, now(), &sf12));
        assert!(!cca.is_occupied(868.1, now(), &sf7));
    }

    #[test]
    fn test_event_ending_at_ccg_start_is_clear() {
        let cca = ChannelOccupancy::default();
        let events = vec![event_ms(868.1, SpreadingFactor::SF7, 900, NOW_MS, -50.0)];
        assert!(!cca.is_occupied(868.1, now(), &events));
    }

    #[test]
    fn test_event_ending_just_after_ccg_start_occupies() {
        let cca = ChannelOccupancy::default();
        let events = vec![InterferenceEvent {
            end: now() + SimTime::from_micros(1),
            ..event_ms(868.1, SpreadingFactor::SF7, 900, NOW_MS, -50.0)
        }];
        assert!(cca.is_occupied(868.1, now(), &events));
    }

    #[test]
    fn test_event_starting_at_ccg_end_occupies() {
        let cca = ChannelOccupancy::default();
        let ccg_end = NOW_MS + DEFAULT_SENSING_DURATION.as_millis();
        let events = vec![event_ms(868.1, SpreadingFactor::SF7, ccg_end, ccg_end + 50, -50.0)];
        assert!(cca.is_occupied(868.1, now(), &events));
    }

    #[test]
    fn test_event_starting_after_ccg_end_is_clear() {
        let cca = ChannelOccupancy::default();
        let ccg_end = now() + DEFAULT_SENSING_DURATION;
        let events = vec![InterferenceEvent {
            start: ccg_end + SimTime::from_micros(1),
            end: ccg_end + SimTime::from_millis(50),
            ..covering(868.1, SpreadingFactor::SF7, -50.0)
        }];
        assert!(!cca.is_occupied(868.1, now(), &events));
    }

    #[test]
    fn test_event_inside_ccg_occupies() {
        let cca = ChannelOccupancy::default();
        let events = vec![event_ms(868.1, SpreadingFactor::SF9, NOW_MS + 2, NOW_MS + 4, -100.0)];
        assert!(cca.is_occupied(868.1, now(), &events));
    }

    #[test]
    fn test_occupiers_lists_only_qualifying_events() {
        let cca = ChannelOccupancy::default();
        let events = vec![
            covering(868.1, SpreadingFactor::SF7, -120.0),
            covering(868.1, SpreadingFactor::SF7, -125.0),
            covering(868.3, SpreadingFactor::SF7, -60.0),
            covering(868.1, SpreadingFactor::SF10, -90.0),
        ];
        let occupiers = cca.occupiers(868.1, now(), &events);
        assert_eq!(occupiers.len(), 2);
        assert_eq!(occupiers[0].rx_power_dbm, -120.0);
        assert_eq!(occupiers[1].spreading_factor, SpreadingFactor::SF10);
    }

    #[test]
    fn test_idempotent_for_fixed_inputs() {
        let cca = ChannelOccupancy::default();
        let events = vec![covering(868.1, SpreadingFactor::SF8, -110.0)];
        let first = cca.is_occupied(868.1, now(), &events);
        for _ in 0..5 {
            assert_eq!(cca.is_occupied(868.1, now(), &events), first);
        }
    }

    #[test]
    fn test_longer_sensing_window_catches_later_event() {
        let events = vec![event_ms(868.1, SpreadingFactor::SF7, NOW_MS + 30, NOW_MS + 80, -100.0)];
        let short = ChannelOccupancy::default();
        let long = ChannelOccupancy::new(SimTime::from_millis(50));
        assert!(!short.is_occupied(868.1, now(), &events));
        assert!(long.is_occupied(868.1, now(), &events));
    }

    #[test]
    fn test_custom_sensitivity_table() {
        let cca = ChannelOccupancy::default()
            .with_sensitivity(SensitivityTable::new([-100.0; 6]));
        let events = vec![covering(868.1, SpreadingFactor::SF7, -110.0)];
        assert!(!cca.is_occupied(868.1, now(), &events));
    }
}
