//! Transactional traffic.
//!
//! A transaction is a burst of data packets followed by a signature split
//! into two partial-signature packets. Packets inside a transaction are
//! spaced by the intra-transaction delay; consecutive transactions are
//! separated by the inter-transaction delay, measured from the last packet
//! of the previous transaction.

use crate::lora::ConfigError;
use crate::time::SimTime;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};

/// Partial-signature packets closing every transaction.
pub const SIGNATURE_PARTS: u32 = 2;

/// Configuration surface of the transactional sender helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionalSenderConfig {
    /// Window for the random start offset. Zero draws it from the TR 45.820
    /// traffic mix.
    pub period_ms: u64,
    /// Data packet size used when `data_packet_size` is zero.
    pub packet_size: u8,
    /// Upper bound of a uniform random number of bytes added to every packet.
    pub packet_size_jitter: u8,
    pub data_packet_size: u8,
    pub partial_signature_packet_size: u8,
    pub packets_per_transaction: u32,
    pub intra_transaction_delay_ms: u64,
    pub inter_transaction_delay_ms: u64,
}

impl Default for TransactionalSenderConfig {
    fn default() -> Self {
        Self {
            period_ms: 600_000,
            packet_size: 10,
            packet_size_jitter: 0,
            data_packet_size: 10,
            partial_signature_packet_size: 32,
            packets_per_transaction: 5,
            intra_transaction_delay_ms: 5_000,
            inter_transaction_delay_ms: 600_000,
        }
    }
}

impl TransactionalSenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.packets_per_transaction == 0 {
            return Err(ConfigError::Invalid("packets_per_transaction must be > 0"));
        }
        if self.data_packet_size == 0 && self.packet_size == 0 {
            return Err(ConfigError::Invalid("data packet size must be > 0"));
        }
        if self.partial_signature_packet_size == 0 {
            return Err(ConfigError::Invalid("partial_signature_packet_size must be > 0"));
        }
        if self.inter_transaction_delay_ms == 0 {
            return Err(ConfigError::Invalid("inter_transaction_delay_ms must be > 0"));
        }
        Ok(())
    }

    fn base_data_size(&self) -> u8 {
        if self.data_packet_size > 0 {
            self.data_packet_size
        } else {
            self.packet_size
        }
    }

    /// Packets sent per transaction, signature parts included.
    pub fn packets_per_burst(&self) -> u32 {
        self.packets_per_transaction + SIGNATURE_PARTS
    }
}

/// What a planned packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PacketKind {
    Data,
    SignaturePart,
}

/// One uplink the application will hand to the MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlannedPacket {
    pub time: SimTime,
    pub size_bytes: u8,
    pub kind: PacketKind,
    /// Zero-based transaction number.
    pub transaction: u32,
}

/// Generates transactional send plans.
#[derive(Debug, Clone)]
pub struct TransactionalSender {
    config: TransactionalSenderConfig,
}

impl TransactionalSender {
    pub fn new(config: TransactionalSenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TransactionalSenderConfig {
        &self.config
    }

    /// Every packet planned in `[start, horizon)`.
    pub fn schedule<R: RngCore + ?Sized>(
        &self,
        start: SimTime,
        horizon: SimTime,
        rng: &mut R,
    ) -> Vec<PlannedPacket> {
        let period = if self.config.period_ms == 0 {
            tr45820_period(rng)
        } else {
            SimTime::from_millis(self.config.period_ms)
        };
        let intra = SimTime::from_millis(self.config.intra_transaction_delay_ms);
        let inter = SimTime::from_millis(self.config.inter_transaction_delay_ms);

        let mut plan = Vec::new();
        let mut time = start + SimTime::from_micros(uniform_below(rng, period.as_micros()));
        let mut transaction = 0u32;

        while time < horizon {
            for index in 0..self.config.packets_per_burst() {
                if index > 0 {
                    time = time + intra;
                }
                if time >= horizon {
                    return plan;
                }
                let (kind, base) = if index < self.config.packets_per_transaction {
                    (PacketKind::Data, self.config.base_data_size())
                } else {
                    (PacketKind::SignaturePart, self.config.partial_signature_packet_size)
                };
                let jitter = uniform_below(rng, self.config.packet_size_jitter as u64 + 1) as u8;
                plan.push(PlannedPacket {
                    time,
                    size_bytes: base.saturating_add(jitter),
                    kind,
                    transaction,
                });
            }
            time = time + inter;
            transaction += 1;
        }
        plan
    }
}

/// Draw a reporting period from the TR 45.820 mobile autonomous reporting
/// mix: 1 day (40 %), 2 hours (40 %), 1 hour (15 %), 30 minutes (5 %).
pub fn tr45820_period<R: RngCore + ?Sized>(rng: &mut R) -> SimTime {
    let p = rng.next_u64() as f64 / u64::MAX as f64;
    let secs = if p < 0.4 {
        86_400
    } else if p < 0.8 {
        7_200
    } else if p < 0.95 {
        3_600
    } else {
        1_800
    };
    SimTime::from_secs(secs)
}

fn uniform_below<R: RngCore + ?Sized>(rng: &mut R, bound: u64) -> u64 {
    if bound == 0 {
        0
    } else {
        rng.next_u64() % bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha8Rng;
    use rand_core::SeedableRng;

    fn fixed_offset_config() -> TransactionalSenderConfig {
        TransactionalSenderConfig {
            period_ms: 1,
            packets_per_transaction: 3,
            intra_transaction_delay_ms: 100,
            inter_transaction_delay_ms: 1_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_valid() {
        assert!(TransactionalSenderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let zero_packets = TransactionalSenderConfig {
            packets_per_transaction: 0,
            ..Default::default()
        };
        assert!(TransactionalSender::new(zero_packets).is_err());

        let zero_inter = TransactionalSenderConfig {
            inter_transaction_delay_ms: 0,
            ..Default::default()
        };
        assert!(TransactionalSender::new(zero_inter).is_err());

        let no_sizes = TransactionalSenderConfig {
            packet_size: 0,
            data_packet_size: 0,
            ..Default::default()
        };
        assert!(TransactionalSender::new(no_sizes).is_err());
    }

    #[test]
    fn test_transaction_layout() {
        let sender = TransactionalSender::new(fixed_offset_config()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let plan = sender.schedule(SimTime::ZERO, SimTime::from_millis(1_450), &mut rng);

        // 3 data + 2 signature packets per transaction
        let first: Vec<_> = plan.iter().filter(|p| p.transaction == 0).collect();
        assert_eq!(first.len(), 5);
        assert_eq!(
            first.iter().map(|p| p.kind).collect::<Vec<_>>(),
            vec![
                PacketKind::Data,
                PacketKind::Data,
                PacketKind::Data,
                PacketKind::SignaturePart,
                PacketKind::SignaturePart,
            ]
        );
        assert_eq!(first[0].size_bytes, 10);
        assert_eq!(first[3].size_bytes, 32);

        for pair in first.windows(2) {
            assert_eq!(pair[1].time - pair[0].time, SimTime::from_millis(100));
        }

        // Second transaction starts 1 s after the last packet of the first.
        let second_start = plan.iter().find(|p| p.transaction == 1).unwrap().time;
        assert_eq!(second_start - first[4].time, SimTime::from_millis(1_000));
    }

    #[test]
    fn test_schedule_respects_horizon() {
        let sender = TransactionalSender::new(fixed_offset_config()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let horizon = SimTime::from_secs(10);
        let plan = sender.schedule(SimTime::ZERO, horizon, &mut rng);
        assert!(!plan.is_empty());
        assert!(plan.iter().all(|p| p.time < horizon));
        assert!(plan.windows(2).all(|w| w[0].time <= w[1].time));
    }

    #[test]
    fn test_start_offset_within_period() {
        let config = TransactionalSenderConfig {
            period_ms: 2_000,
            ..fixed_offset_config()
        };
        let sender = TransactionalSender::new(config).unwrap();
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let plan = sender.schedule(SimTime::from_secs(5), SimTime::from_secs(60), &mut rng);
            let first = plan[0].time;
            assert!(first >= SimTime::from_secs(5));
            assert!(first < SimTime::from_secs(7));
        }
    }

    #[test]
    fn test_data_size_falls_back_to_packet_size() {
        let config = TransactionalSenderConfig {
            data_packet_size: 0,
            packet_size: 23,
            ..fixed_offset_config()
        };
        let sender = TransactionalSender::new(config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let plan = sender.schedule(SimTime::ZERO, SimTime::from_secs(1), &mut rng);
        assert_eq!(plan[0].size_bytes, 23);
    }

    #[test]
    fn test_size_jitter_bounds() {
        let config = TransactionalSenderConfig {
            packet_size_jitter: 4,
            ..fixed_offset_config()
        };
        let sender = TransactionalSender::new(config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let plan = sender.schedule(SimTime::ZERO, SimTime::from_secs(60), &mut rng);
        for p in plan.iter().filter(|p| p.kind == PacketKind::Data) {
            assert!((10..=14).contains(&p.size_bytes), "size {}", p.size_bytes);
        }
    }

    #[test]
    fn test_tr45820_period_classes() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let allowed = [86_400, 7_200, 3_600, 1_800].map(SimTime::from_secs);
        for _ in 0..200 {
            assert!(allowed.contains(&tr45820_period(&mut rng)));
        }
    }

    #[test]
    fn test_same_seed_same_plan() {
        let sender = TransactionalSender::new(TransactionalSenderConfig::default()).unwrap();
        let horizon = SimTime::from_secs(3_600);
        let a = sender.schedule(SimTime::ZERO, horizon, &mut ChaCha8Rng::seed_from_u64(9));
        let b = sender.schedule(SimTime::ZERO, horizon, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
