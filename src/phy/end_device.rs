//! End-device PHY.
//!
//! Owns the radio state machine, the tuning (frequency, spreading factor),
//! the listener registry and the clear channel assessment settings. Every
//! call runs to completion on the single simulation thread.

use super::{
    ChannelOccupancy, InterferenceEvent, ListenerRegistry, LossReason, PhyError, PhyListener,
    PhyOperation, PhyState, PhyStats, SpreadingFactor, Transition,
};
use crate::interference::InterferenceLedger;
use crate::lora::PhyConfig;
use crate::time::SimTime;
use log::{debug, trace};
use std::rc::Rc;

/// Default reception frequency in MHz.
pub const DEFAULT_FREQUENCY_MHZ: f64 = 868.1;

/// PHY of a single end device.
#[derive(Debug)]
pub struct EndDevicePhy {
    state: PhyState,
    frequency_mhz: f64,
    spreading_factor: SpreadingFactor,
    occupancy: ChannelOccupancy,
    listeners: ListenerRegistry,
    stats: PhyStats,
}

impl Default for EndDevicePhy {
    fn default() -> Self {
        Self::new()
    }
}

impl EndDevicePhy {
    /// PHY in `Sleep` on 868.1 MHz, SF7, 10 ms sensing.
    pub fn new() -> Self {
        Self {
            state: PhyState::Sleep,
            frequency_mhz: DEFAULT_FREQUENCY_MHZ,
            spreading_factor: SpreadingFactor::default(),
            occupancy: ChannelOccupancy::default(),
            listeners: ListenerRegistry::new(),
            stats: PhyStats::new(),
        }
    }

    /// PHY tuned from a validated configuration.
    pub fn from_config(config: &PhyConfig) -> Self {
        let mut phy = Self::new();
        phy.set_frequency(config.frequency_mhz);
        phy.set_spreading_factor(config.spreading_factor);
        phy.set_sensing_duration(config.sensing_duration());
        phy
    }

    pub fn state(&self) -> PhyState {
        self.state
    }

    pub fn is_transmitting(&self) -> bool {
        self.state == PhyState::Tx
    }

    pub fn frequency(&self) -> f64 {
        self.frequency_mhz
    }

    pub fn set_frequency(&mut self, frequency_mhz: f64) {
        self.frequency_mhz = frequency_mhz;
    }

    /// Whether the radio is tuned to exactly `frequency_mhz`.
    pub fn is_on_frequency(&self, frequency_mhz: f64) -> bool {
        self.frequency_mhz == frequency_mhz
    }

    pub fn spreading_factor(&self) -> SpreadingFactor {
        self.spreading_factor
    }

    pub fn set_spreading_factor(&mut self, sf: SpreadingFactor) {
        self.spreading_factor = sf;
    }

    /// Validate and set a raw spreading factor.
    pub fn set_spreading_factor_raw(&mut self, sf: u8) -> Result<(), PhyError> {
        self.spreading_factor = SpreadingFactor::new(sf)?;
        Ok(())
    }

    pub fn sensing_duration(&self) -> SimTime {
        self.occupancy.sensing_duration()
    }

    pub fn set_sensing_duration(&mut self, duration: SimTime) {
        self.occupancy.set_sensing_duration(duration);
    }

    pub fn occupancy(&self) -> &ChannelOccupancy {
        &self.occupancy
    }

    pub fn stats(&self) -> &PhyStats {
        &self.stats
    }

    // ==================== State machine ====================

    /// Enter standby. Allowed from any state.
    pub fn switch_to_standby(&mut self) -> Result<(), PhyError> {
        self.transition(PhyOperation::ToStandby, Transition::Standby)
    }

    /// Start receiving. Requires standby.
    pub fn switch_to_rx(&mut self) -> Result<(), PhyError> {
        self.transition(PhyOperation::ToRx, Transition::RxStart)
    }

    /// Start transmitting at `tx_power_dbm`. Not allowed while receiving.
    pub fn switch_to_tx(&mut self, tx_power_dbm: f64) -> Result<(), PhyError> {
        self.transition(PhyOperation::ToTx, Transition::TxStart { tx_power_dbm })
    }

    /// Power down. Requires standby.
    pub fn switch_to_sleep(&mut self) -> Result<(), PhyError> {
        self.transition(PhyOperation::ToSleep, Transition::Sleep)
    }

    fn transition(&mut self, operation: PhyOperation, notice: Transition) -> Result<(), PhyError> {
        let next = operation.apply(self.state)?;
        trace!("PHY {} -> {}", self.state, next);
        self.state = next;
        self.listeners.notify(notice);
        Ok(())
    }

    // ==================== Listeners ====================

    pub fn register_listener(&mut self, listener: Rc<dyn PhyListener>) {
        self.listeners.register(listener);
    }

    /// Returns `false` if the listener was not registered.
    pub fn unregister_listener<L: PhyListener + ?Sized>(&mut self, listener: &Rc<L>) -> bool {
        self.listeners.unregister(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ==================== Channel access ====================

    /// Clear channel assessment on `frequency_mhz` at simulated time `now`.
    pub fn is_channel_occupied<L>(&self, frequency_mhz: f64, now: SimTime, ledger: &L) -> bool
    where
        L: InterferenceLedger + ?Sized,
    {
        let occupied = self.occupancy.is_occupied(frequency_mhz, now, ledger);
        debug!(
            "CCA at {} on {} MHz: {}",
            now,
            frequency_mhz,
            if occupied { "occupied" } else { "clear" }
        );
        occupied
    }

    /// Events blocking `frequency_mhz` at `now`.
    pub fn channel_occupiers<L>(
        &self,
        frequency_mhz: f64,
        now: SimTime,
        ledger: &L,
    ) -> Vec<InterferenceEvent>
    where
        L: InterferenceLedger + ?Sized,
    {
        self.occupancy.occupiers(frequency_mhz, now, ledger)
    }

    // ==================== Reception filter ====================

    /// Check an incoming packet against the current tuning.
    ///
    /// A mismatch is counted in [`PhyStats`] and returned to the caller.
    /// Frequency is checked before spreading factor.
    pub fn check_reception(
        &self,
        frequency_mhz: f64,
        sf: SpreadingFactor,
    ) -> Result<(), LossReason> {
        let reason = if !self.is_on_frequency(frequency_mhz) {
            LossReason::WrongFrequency
        } else if sf != self.spreading_factor {
            LossReason::WrongSpreadingFactor
        } else {
            return Ok(());
        };
        debug!(
            "Packet on {} MHz {} {} (tuned to {} MHz {})",
            frequency_mhz, sf, reason, self.frequency_mhz, self.spreading_factor
        );
        self.stats.record(reason);
        Err(reason)
    }
}
