use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::account::Address;

/// Events emitted by the token ledger and the vesting schedules
///
/// Events are buffered by the emitting contract and only reach the
/// environment log when the call that produced them succeeds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    Transfer {
        from: Address,
        to: Address,
        value: U256,
    },
    Approval {
        owner: Address,
        spender: Address,
        value: U256,
    },
    Burn {
        account: Address,
        value: U256,
    },
    BurnerAdded {
        account: Address,
    },
    BurnerRemoved {
        account: Address,
    },
    TokensReleased {
        token: Address,
        amount: U256,
    },
    TokenVestingRevoked {
        token: Address,
    },
    OwnershipTransferred {
        previous_owner: Option<Address>,
        new_owner: Option<Address>,
    },
}

impl LedgerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Transfer { .. } => "Transfer",
            Self::Approval { .. } => "Approval",
            Self::Burn { .. } => "Burn",
            Self::BurnerAdded { .. } => "BurnerAdded",
            Self::BurnerRemoved { .. } => "BurnerRemoved",
            Self::TokensReleased { .. } => "TokensReleased",
            Self::TokenVestingRevoked { .. } => "TokenVestingRevoked",
            Self::OwnershipTransferred { .. } => "OwnershipTransferred",
        }
    }
}

/// An event together with the contract that emitted it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmittedEvent {
    pub contract: Address,
    pub event: LedgerEvent,
}
