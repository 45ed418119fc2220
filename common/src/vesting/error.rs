//! Vesting Error Codes
//!
//! Range: 0x0200 - 0x02FF
//! Ledger failures raised while moving tokens keep their own 0x01xx code.

use strum::IntoStaticStr;
use thiserror::Error;

use crate::{account::Address, token::LedgerError};

// ===== Schedule Errors (0x0200 - 0x020F) =====

pub const VESTING_ERROR_INVALID_SCHEDULE_PARAMETERS: u64 = 0x0200;
pub const VESTING_ERROR_OVERFLOW: u64 = 0x0201;

// ===== Release/Revoke Errors (0x0210 - 0x021F) =====

pub const VESTING_ERROR_NOTHING_TO_RELEASE: u64 = 0x0210;
pub const VESTING_ERROR_NOT_REVOCABLE: u64 = 0x0211;
pub const VESTING_ERROR_ALREADY_REVOKED: u64 = 0x0212;

// ===== Ownership Errors (0x0220 - 0x022F) =====

pub const VESTING_ERROR_UNAUTHORIZED: u64 = 0x0220;
pub const VESTING_ERROR_INVALID_OWNER: u64 = 0x0221;

#[derive(Debug, Clone, PartialEq, Eq, Error, IntoStaticStr)]
pub enum VestingError {
    #[error("Invalid schedule parameters: {0}")]
    InvalidScheduleParameters(&'static str),

    #[error("No tokens are due")]
    NothingToRelease,

    #[error("Schedule is not revocable")]
    NotRevocable,

    #[error("Token {0} was already revoked")]
    AlreadyRevoked(Address),

    #[error("Account {0} is not the schedule owner")]
    Unauthorized(Address),

    #[error("New owner cannot be the zero address")]
    InvalidOwner,

    #[error("Arithmetic overflow")]
    Overflow,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl VestingError {
    /// Convert error to u64 error code
    pub fn code(&self) -> u64 {
        match self {
            Self::InvalidScheduleParameters(_) => VESTING_ERROR_INVALID_SCHEDULE_PARAMETERS,
            Self::NothingToRelease => VESTING_ERROR_NOTHING_TO_RELEASE,
            Self::NotRevocable => VESTING_ERROR_NOT_REVOCABLE,
            Self::AlreadyRevoked(_) => VESTING_ERROR_ALREADY_REVOKED,
            Self::Unauthorized(_) => VESTING_ERROR_UNAUTHORIZED,
            Self::InvalidOwner => VESTING_ERROR_INVALID_OWNER,
            Self::Overflow => VESTING_ERROR_OVERFLOW,
            Self::Ledger(e) => e.code(),
        }
    }

    /// Variant name; ledger failures report the ledger's variant
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.kind(),
            other => other.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_errors_keep_their_identity() {
        let err: VestingError = LedgerError::InvalidRecipient.into();
        assert_eq!(err.kind(), "InvalidRecipient");
        assert_eq!(err.code(), LedgerError::InvalidRecipient.code());
        assert_eq!(err.to_string(), "Recipient cannot be the zero address");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(VestingError::NothingToRelease.kind(), "NothingToRelease");
        assert_eq!(
            VestingError::InvalidScheduleParameters("cliff").kind(),
            "InvalidScheduleParameters"
        );
        assert_eq!(
            VestingError::AlreadyRevoked(Address::zero()).code(),
            VESTING_ERROR_ALREADY_REVOKED
        );
    }
}
