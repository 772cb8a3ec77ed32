//! Multi-device scenario runner.
//!
//! Wires several end devices to one shared [`InterferenceTracker`] and
//! drives them from an [`EventQueue`]:
//!
//! 1. At every planned send the device wakes to standby and senses its channel
//! 2. A clear channel starts a transmission; the airtime is added to the
//!    tracker, heard by every other device at the device's `heard_at_dbm`
//! 3. An occupied channel defers with backoff, or drops the packet once
//!    retries are exhausted
//! 4. After TX the device sleeps, then opens one receive window, during which
//!    uplinks above its sensitivity are checked against its tuning
//!
//! Every device hears every other device at the same power: there is no
//! propagation model.

use super::{EventQueue, SimClock, SimError};
use crate::interference::{InterferenceEvent, InterferenceTracker};
use crate::lora::{
    calculate_airtime, AccessDecision, ChannelAccess, ChannelAccessConfig, ConfigError, LoRaParams,
    PhyConfig, Region,
};
use crate::phy::{EndDevicePhy, PhyState, PhyStatsSnapshot, SpreadingFactor, TransitionRecorder};
use crate::time::SimTime;
use crate::traffic::{PlannedPacket, TransactionalSender, TransactionalSenderConfig};
use log::{debug, info, trace, warn};
use rand_chacha::ChaCha8Rng;
use rand_core::{OsRng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;

/// One end device in a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    #[serde(flatten)]
    pub phy: PhyConfig,
    pub tx_power_dbm: f64,
    /// Power at which the other devices receive this device.
    pub heard_at_dbm: f64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            phy: PhyConfig::default(),
            tx_power_dbm: 14.0,
            heard_at_dbm: -110.0,
        }
    }
}

/// Longest simulated run accepted, one year.
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 3_600;

/// A complete scenario, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Base seed for traffic and backoff. `None` draws one from the OS.
    pub seed: Option<u64>,
    pub duration_secs: u64,
    pub region: Region,
    pub devices: Vec<DeviceConfig>,
    pub traffic: TransactionalSenderConfig,
    pub channel_access: ChannelAccessConfig,
    /// Delay from end of TX to the receive window. Zero disables the window.
    pub rx_window_delay_ms: u64,
    pub rx_window_ms: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        let device = |frequency_mhz, sf, heard_at_dbm| DeviceConfig {
            phy: PhyConfig {
                frequency_mhz,
                spreading_factor: sf,
                ..Default::default()
            },
            heard_at_dbm,
            ..Default::default()
        };
        Self {
            seed: Some(1),
            duration_secs: 3_600,
            region: Region::Eu868,
            devices: vec![
                device(868.1, SpreadingFactor::SF7, -110.0),
                device(868.1, SpreadingFactor::SF9, -118.0),
                device(868.1, SpreadingFactor::SF7, -126.0),
                device(868.3, SpreadingFactor::SF7, -100.0),
            ],
            traffic: TransactionalSenderConfig {
                period_ms: 60_000,
                intra_transaction_delay_ms: 50,
                inter_transaction_delay_ms: 120_000,
                ..Default::default()
            },
            channel_access: ChannelAccessConfig::default(),
            rx_window_delay_ms: 1_000,
            rx_window_ms: 200,
        }
    }
}

impl ScenarioConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::Invalid("scenario needs at least one device"));
        }
        if self.duration_secs == 0 {
            return Err(ConfigError::Invalid("duration_secs must be > 0"));
        }
        if self.duration_secs > MAX_DURATION_SECS {
            return Err(ConfigError::Invalid("duration_secs must be at most one year"));
        }
        for device in &self.devices {
            device.phy.validate()?;
            if !self.region.contains(device.phy.frequency_mhz) {
                warn!(
                    "Device frequency {} MHz is outside the {:?} channel plan",
                    device.phy.frequency_mhz, self.region
                );
            }
        }
        self.traffic.validate()?;
        self.channel_access.validate()?;
        Ok(())
    }
}

/// Per-device outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceReport {
    pub id: usize,
    pub frequency_mhz: f64,
    pub spreading_factor: SpreadingFactor,
    pub sent: u64,
    pub deferred: u64,
    pub dropped: u64,
    /// Uplinks of other devices decoded during a receive window.
    pub overheard: u64,
    pub airtime_ms: u64,
    pub transitions: usize,
    pub losses: PhyStatsSnapshot,
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub seed: u64,
    pub duration_secs: u64,
    pub devices: Vec<DeviceReport>,
}

impl ScenarioReport {
    pub fn total_sent(&self) -> u64 {
        self.devices.iter().map(|d| d.sent).sum()
    }

    pub fn total_deferred(&self) -> u64 {
        self.devices.iter().map(|d| d.deferred).sum()
    }

    pub fn total_dropped(&self) -> u64 {
        self.devices.iter().map(|d| d.dropped).sum()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug)]
enum Event {
    /// A packet handed over by the application.
    Arrival { device: usize, packet: PlannedPacket },
    /// Channel access retry after a backoff.
    Retry { device: usize, packet: PlannedPacket },
    TxEnd { device: usize },
    RxWindowOpen { device: usize },
    RxWindowClose { device: usize },
}

struct Device {
    phy: EndDevicePhy,
    access: ChannelAccess,
    recorder: Rc<TransitionRecorder>,
    tx_power_dbm: f64,
    heard_at_dbm: f64,
    /// A packet is between its first access attempt and the end of its
    /// receive window.
    busy: bool,
    backlog: VecDeque<PlannedPacket>,
    sent: u64,
    deferred: u64,
    dropped: u64,
    overheard: u64,
    airtime: SimTime,
}

/// A runnable scenario.
pub struct Scenario {
    config: ScenarioConfig,
    seed: u64,
    clock: SimClock,
    queue: EventQueue<Event>,
    tracker: InterferenceTracker,
    devices: Vec<Device>,
}

impl Scenario {
    pub fn new(config: ScenarioConfig) -> Result<Self, SimError> {
        config.validate()?;
        let sender = TransactionalSender::new(config.traffic)?;
        let horizon = SimTime::from_secs(config.duration_secs);
        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed = OsRng.next_u64();
                info!("No seed configured, using {}", seed);
                seed
            }
        };

        let mut queue = EventQueue::new();
        let mut devices = Vec::with_capacity(config.devices.len());

        for (id, device) in config.devices.iter().enumerate() {
            let mut phy = EndDevicePhy::from_config(&device.phy);
            let recorder = Rc::new(TransitionRecorder::new());
            phy.register_listener(recorder.clone());

            let device_seed = seed.wrapping_add(id as u64);
            let mut rng = ChaCha8Rng::seed_from_u64(device_seed);
            for packet in sender.schedule(SimTime::ZERO, horizon, &mut rng) {
                queue.schedule(packet.time, Event::Arrival { device: id, packet });
            }

            devices.push(Device {
                phy,
                access: ChannelAccess::seeded(config.channel_access, device_seed ^ 0x5eed),
                recorder,
                tx_power_dbm: device.tx_power_dbm,
                heard_at_dbm: device.heard_at_dbm,
                busy: false,
                backlog: VecDeque::new(),
                sent: 0,
                deferred: 0,
                dropped: 0,
                overheard: 0,
                airtime: SimTime::ZERO,
            });
        }

        info!(
            "Scenario ready: {} devices, {} planned packets, {} s",
            devices.len(),
            queue.len(),
            config.duration_secs
        );

        Ok(Self {
            config,
            seed,
            clock: SimClock::new(),
            queue,
            tracker: InterferenceTracker::new(),
            devices,
        })
    }

    /// Run to the configured horizon.
    pub fn run(mut self) -> Result<ScenarioReport, SimError> {
        let horizon = SimTime::from_secs(self.config.duration_secs);

        while let Some((time, event)) = self.queue.pop() {
            if time >= horizon {
                break;
            }
            self.clock.advance_to(time)?;
            self.handle(event)?;
        }

        let report = self.report();
        info!(
            "Scenario finished: {} sent, {} deferred, {} dropped",
            report.total_sent(),
            report.total_deferred(),
            report.total_dropped()
        );
        Ok(report)
    }

    fn handle(&mut self, event: Event) -> Result<(), SimError> {
        match event {
            Event::Arrival { device, packet } => {
                let d = &mut self.devices[device];
                if d.busy {
                    d.backlog.push_back(packet);
                    Ok(())
                } else {
                    d.busy = true;
                    self.attempt(device, packet)
                }
            }
            Event::Retry { device, packet } => self.attempt(device, packet),
            Event::TxEnd { device } => self.tx_end(device),
            Event::RxWindowOpen { device } => {
                let phy = &mut self.devices[device].phy;
                phy.switch_to_standby()?;
                phy.switch_to_rx()?;
                let close = self.clock.now() + SimTime::from_millis(self.config.rx_window_ms);
                self.queue.schedule(close, Event::RxWindowClose { device });
                Ok(())
            }
            Event::RxWindowClose { device } => {
                let phy = &mut self.devices[device].phy;
                phy.switch_to_standby()?;
                phy.switch_to_sleep()?;
                self.finish_packet(device)
            }
        }
    }

    fn attempt(&mut self, id: usize, packet: PlannedPacket) -> Result<(), SimError> {
        let now = self.clock.now();
        let device = &mut self.devices[id];

        device.phy.switch_to_standby()?;
        let frequency = device.phy.frequency();
        let occupied = device.phy.is_channel_occupied(frequency, now, &self.tracker);

        match device.access.try_access(occupied) {
            AccessDecision::Transmit => {
                device.access.reset();
                let sf = device.phy.spreading_factor();
                let airtime = calculate_airtime(
                    packet.size_bytes as usize,
                    &LoRaParams::with_spreading_factor(sf),
                );
                device.phy.switch_to_tx(device.tx_power_dbm)?;
                device.sent += 1;
                device.airtime = device.airtime + airtime;
                let heard_at_dbm = device.heard_at_dbm;

                debug!(
                    "Device {} TX {} bytes on {} MHz {} for {}",
                    id, packet.size_bytes, frequency, sf, airtime
                );
                self.tracker.add(InterferenceEvent::new(
                    frequency,
                    sf,
                    now,
                    airtime,
                    heard_at_dbm,
                ));
                self.overhear(id, frequency, sf, heard_at_dbm);
                self.queue.schedule(now + airtime, Event::TxEnd { device: id });
                Ok(())
            }
            AccessDecision::Defer { backoff } => {
                device.deferred += 1;
                device.phy.switch_to_sleep()?;
                debug!("Device {} deferring for {}", id, backoff);
                self.queue
                    .schedule(now + backoff, Event::Retry { device: id, packet });
                Ok(())
            }
            AccessDecision::GiveUp => {
                device.access.reset();
                device.dropped += 1;
                device.phy.switch_to_sleep()?;
                warn!(
                    "Device {} dropped {}-byte packet of transaction {}: channel busy",
                    id, packet.size_bytes, packet.transaction
                );
                self.finish_packet(id)
            }
        }
    }

    fn tx_end(&mut self, id: usize) -> Result<(), SimError> {
        let now = self.clock.now();
        let phy = &mut self.devices[id].phy;
        phy.switch_to_standby()?;
        phy.switch_to_sleep()?;
        self.tracker.clean_old_events(now);

        if self.config.rx_window_delay_ms > 0 && self.config.rx_window_ms > 0 {
            let open = now + SimTime::from_millis(self.config.rx_window_delay_ms);
            self.queue.schedule(open, Event::RxWindowOpen { device: id });
            Ok(())
        } else {
            self.finish_packet(id)
        }
    }

    /// The device is free again; start on its backlog.
    fn finish_packet(&mut self, id: usize) -> Result<(), SimError> {
        let device = &mut self.devices[id];
        match device.backlog.pop_front() {
            Some(packet) => self.attempt(id, packet),
            None => {
                device.busy = false;
                Ok(())
            }
        }
    }

    /// Let devices with an open receive window try to decode an uplink.
    ///
    /// Uplinks below the receiver's sensitivity are never seen by the PHY.
    fn overhear(
        &mut self,
        sender: usize,
        frequency: f64,
        sf: SpreadingFactor,
        heard_at_dbm: f64,
    ) {
        for (id, device) in self.devices.iter_mut().enumerate() {
            if id == sender || device.phy.state() != PhyState::Rx {
                continue;
            }
            if !device.phy.occupancy().sensitivity().is_receivable(heard_at_dbm, sf) {
                trace!("Device {} cannot hear device {} at {} dBm", id, sender, heard_at_dbm);
                continue;
            }
            if device.phy.check_reception(frequency, sf).is_ok() {
                device.overheard += 1;
            }
        }
    }

    fn report(&self) -> ScenarioReport {
        ScenarioReport {
            seed: self.seed,
            duration_secs: self.config.duration_secs,
            devices: self
                .devices
                .iter()
                .enumerate()
                .map(|(id, d)| DeviceReport {
                    id,
                    frequency_mhz: d.phy.frequency(),
                    spreading_factor: d.phy.spreading_factor(),
                    sent: d.sent,
                    deferred: d.deferred,
                    dropped: d.dropped,
                    overheard: d.overheard,
                    airtime_ms: d.airtime.as_millis(),
                    transitions: d.recorder.transitions().len(),
                    losses: d.phy.stats().snapshot(),
                })
                .collect(),
        }
    }
}
