// File: testing-framework/src/chain/error.rs

use aha_common::{account::Address, token::LedgerError, vesting::VestingError};
use thiserror::Error;

/// Why a call on the test chain was rejected
///
/// A rejected call commits nothing: no state change, no event, no block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Rejected by a token ledger
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Rejected by a vesting schedule
    #[error(transparent)]
    Vesting(#[from] VestingError),

    /// No contract of the expected kind at this address
    #[error("No contract deployed at {0}")]
    UnknownContract(Address),

    /// Contract without a payable entry point
    #[error("Contract {0} does not accept native value")]
    NativeValueRejected(Address),

    /// Sender cannot cover a native value transfer
    #[error("Insufficient native balance: need {need}, have {have}")]
    InsufficientNativeBalance {
        /// Requested value
        need: u128,
        /// Available balance
        have: u128,
    },
}

impl CallError {
    /// Name of the underlying rejection, e.g. `InsufficientAllowance`
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.kind(),
            Self::Vesting(e) => e.kind(),
            Self::UnknownContract(_) => "UnknownContract",
            Self::NativeValueRejected(_) => "NativeValueRejected",
            Self::InsufficientNativeBalance { .. } => "InsufficientNativeBalance",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_unwraps_contract_errors() {
        let err: CallError = VestingError::from(LedgerError::InvalidRecipient).into();
        assert_eq!(err.kind(), "InvalidRecipient");

        let err: CallError = VestingError::NotRevocable.into();
        assert_eq!(err.kind(), "NotRevocable");
        assert_eq!(err.to_string(), "Schedule is not revocable");

        let err = CallError::UnknownContract(Address::zero());
        assert_eq!(err.kind(), "UnknownContract");
    }
}
