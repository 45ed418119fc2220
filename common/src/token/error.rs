//! Token Ledger Error Codes
//!
//! Range: 0x0100 - 0x01FF
//! Format: LEDGER_ERROR_<CATEGORY>_<SPECIFIC>

use primitive_types::U256;
use strum::IntoStaticStr;
use thiserror::Error;

use crate::account::Address;

// ===== Address Errors (0x0100 - 0x010F) =====

pub const LEDGER_ERROR_INVALID_RECIPIENT: u64 = 0x0100;
pub const LEDGER_ERROR_INVALID_SPENDER: u64 = 0x0101;
pub const LEDGER_ERROR_INVALID_ACCOUNT: u64 = 0x0102;

// ===== Balance Errors (0x0110 - 0x011F) =====

pub const LEDGER_ERROR_INSUFFICIENT_BALANCE: u64 = 0x0110;
pub const LEDGER_ERROR_OVERFLOW: u64 = 0x0111;
pub const LEDGER_ERROR_NATIVE_VALUE_REJECTED: u64 = 0x0112;

// ===== Allowance Errors (0x0120 - 0x012F) =====

pub const LEDGER_ERROR_INSUFFICIENT_ALLOWANCE: u64 = 0x0120;
pub const LEDGER_ERROR_UNSAFE_ALLOWANCE_CHANGE: u64 = 0x0121;

// ===== Role Errors (0x0130 - 0x013F) =====

pub const LEDGER_ERROR_UNAUTHORIZED: u64 = 0x0130;
pub const LEDGER_ERROR_ROLE_ALREADY_HELD: u64 = 0x0131;
pub const LEDGER_ERROR_ROLE_NOT_HELD: u64 = 0x0132;

/// Rejection reasons of the balance ledger
///
/// Every rejected call leaves the ledger untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error, IntoStaticStr)]
pub enum LedgerError {
    #[error("Recipient cannot be the zero address")]
    InvalidRecipient,

    #[error("Spender cannot be the zero address")]
    InvalidSpender,

    #[error("Account cannot be the zero address")]
    InvalidAccount,

    #[error("Insufficient balance: need {need}, have {have}")]
    InsufficientBalance { need: U256, have: U256 },

    #[error("Insufficient allowance: need {need}, have {have}")]
    InsufficientAllowance { need: U256, have: U256 },

    #[error("Allowance of {current} must be set to zero before approving a new value")]
    UnsafeAllowanceChange { current: U256 },

    #[error("Account {0} is not authorized")]
    Unauthorized(Address),

    #[error("Account {0} already holds the role")]
    RoleAlreadyHeld(Address),

    #[error("Account {0} does not hold the role")]
    RoleNotHeld(Address),

    #[error("Native value transfers are not accepted")]
    NativeValueRejected,

    #[error("Arithmetic overflow")]
    Overflow,
}

impl LedgerError {
    /// Convert error to u64 error code
    pub fn code(&self) -> u64 {
        match self {
            Self::InvalidRecipient => LEDGER_ERROR_INVALID_RECIPIENT,
            Self::InvalidSpender => LEDGER_ERROR_INVALID_SPENDER,
            Self::InvalidAccount => LEDGER_ERROR_INVALID_ACCOUNT,
            Self::InsufficientBalance { .. } => LEDGER_ERROR_INSUFFICIENT_BALANCE,
            Self::InsufficientAllowance { .. } => LEDGER_ERROR_INSUFFICIENT_ALLOWANCE,
            Self::UnsafeAllowanceChange { .. } => LEDGER_ERROR_UNSAFE_ALLOWANCE_CHANGE,
            Self::Unauthorized(_) => LEDGER_ERROR_UNAUTHORIZED,
            Self::RoleAlreadyHeld(_) => LEDGER_ERROR_ROLE_ALREADY_HELD,
            Self::RoleNotHeld(_) => LEDGER_ERROR_ROLE_NOT_HELD,
            Self::NativeValueRejected => LEDGER_ERROR_NATIVE_VALUE_REJECTED,
            Self::Overflow => LEDGER_ERROR_OVERFLOW,
        }
    }

    /// Variant name, stable across releases
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let errors = [
            LedgerError::InvalidRecipient,
            LedgerError::InvalidSpender,
            LedgerError::InvalidAccount,
            LedgerError::InsufficientBalance {
                need: U256::one(),
                have: U256::zero(),
            },
            LedgerError::InsufficientAllowance {
                need: U256::one(),
                have: U256::zero(),
            },
            LedgerError::UnsafeAllowanceChange {
                current: U256::one(),
            },
            LedgerError::Unauthorized(Address::zero()),
            LedgerError::RoleAlreadyHeld(Address::zero()),
            LedgerError::RoleNotHeld(Address::zero()),
            LedgerError::NativeValueRejected,
            LedgerError::Overflow,
        ];
        let mut codes: Vec<u64> = errors.iter().map(LedgerError::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_kind_is_variant_name() {
        assert_eq!(LedgerError::InvalidRecipient.kind(), "InvalidRecipient");
        let err = LedgerError::InsufficientBalance {
            need: U256::from(2),
            have: U256::one(),
        };
        assert_eq!(err.kind(), "InsufficientBalance");
        assert_eq!(err.to_string(), "Insufficient balance: need 2, have 1");
    }
}
