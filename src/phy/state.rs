//! Radio operating states and the transition table.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Operating mode of an end-device radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum PhyState {
    /// Radio powered down. Initial state.
    #[default]
    Sleep,
    /// Radio idle, ready to switch to TX or RX.
    Standby,
    /// Transmitting.
    Tx,
    /// Receiving.
    Rx,
}

impl fmt::Display for PhyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sleep => write!(f, "SLEEP"),
            Self::Standby => write!(f, "STANDBY"),
            Self::Tx => write!(f, "TX"),
            Self::Rx => write!(f, "RX"),
        }
    }
}

/// A state change requested of the PHY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PhyOperation {
    ToStandby,
    ToRx,
    ToTx,
    ToSleep,
}

impl PhyOperation {
    /// Whether this operation may be applied in `state`.
    pub fn is_allowed_from(self, state: PhyState) -> bool {
        match self {
            Self::ToStandby => true,
            Self::ToRx => state == PhyState::Standby,
            Self::ToTx => state != PhyState::Rx,
            Self::ToSleep => state == PhyState::Standby,
        }
    }

    /// State reached after the operation succeeds.
    pub fn target(self) -> PhyState {
        match self {
            Self::ToStandby => PhyState::Standby,
            Self::ToRx => PhyState::Rx,
            Self::ToTx => PhyState::Tx,
            Self::ToSleep => PhyState::Sleep,
        }
    }

    /// Apply the transition table, returning the next state.
    pub fn apply(self, state: PhyState) -> Result<PhyState, PhyError> {
        if self.is_allowed_from(state) {
            Ok(self.target())
        } else {
            Err(PhyError::ContractViolation {
                operation: self,
                state,
            })
        }
    }
}

impl fmt::Display for PhyOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToStandby => write!(f, "switch to standby"),
            Self::ToRx => write!(f, "switch to rx"),
            Self::ToTx => write!(f, "switch to tx"),
            Self::ToSleep => write!(f, "switch to sleep"),
        }
    }
}

/// Notification delivered to listeners after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Transition {
    Standby,
    RxStart,
    TxStart { tx_power_dbm: f64 },
    Sleep,
}

impl Transition {
    pub fn state(&self) -> PhyState {
        match self {
            Self::Standby => PhyState::Standby,
            Self::RxStart => PhyState::Rx,
            Self::TxStart { .. } => PhyState::Tx,
            Self::Sleep => PhyState::Sleep,
        }
    }
}

/// Errors raised by the PHY core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhyError {
    /// The caller broke the radio protocol. The PHY state is unchanged; the
    /// host should treat the run as invalid.
    #[error("contract violation: cannot {operation} while in {state}")]
    ContractViolation {
        operation: PhyOperation,
        state: PhyState,
    },

    /// Spreading factor outside `7..=12`.
    #[error("spreading factor {0} out of range (7-12)")]
    InvalidSpreadingFactor(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATES: [PhyState; 4] = [
        PhyState::Sleep,
        PhyState::Standby,
        PhyState::Tx,
        PhyState::Rx,
    ];

    #[test]
    fn test_default_state_is_sleep() {
        assert_eq!(PhyState::default(), PhyState::Sleep);
    }

    #[test]
    fn test_standby_allowed_everywhere() {
        for state in STATES {
            assert_eq!(PhyOperation::ToStandby.apply(state), Ok(PhyState::Standby));
        }
    }

    #[test]
    fn test_rx_and_sleep_only_from_standby() {
        for op in [PhyOperation::ToRx, PhyOperation::ToSleep] {
            for state in STATES {
                assert_eq!(op.is_allowed_from(state), state == PhyState::Standby);
            }
        }
    }

    #[test]
    fn test_tx_forbidden_only_from_rx() {
        assert!(PhyOperation::ToTx.is_allowed_from(PhyState::Sleep));
        assert!(PhyOperation::ToTx.is_allowed_from(PhyState::Standby));
        assert!(PhyOperation::ToTx.is_allowed_from(PhyState::Tx));
        assert_eq!(
            PhyOperation::ToTx.apply(PhyState::Rx),
            Err(PhyError::ContractViolation {
                operation: PhyOperation::ToTx,
                state: PhyState::Rx,
            })
        );
    }

    #[test]
    fn test_error_message() {
        let err = PhyOperation::ToRx.apply(PhyState::Sleep).unwrap_err();
        assert_eq!(
            err.to_string(),
            "contract violation: cannot switch to rx while in SLEEP"
        );
    }
}
