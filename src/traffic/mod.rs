//! Application traffic generation.
//!
//! Produces the send plans that drive end devices in a scenario. The PHY
//! core does not depend on this module.

mod transactional;

pub use transactional::{
    tr45820_period, PacketKind, PlannedPacket, TransactionalSender, TransactionalSenderConfig,
    SIGNATURE_PARTS,
};
