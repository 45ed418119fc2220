//! Token Types

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{account::Address, config::TokenConfig};

/// Vanity metadata fixed at creation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Token name
    pub name: String,
    /// Token symbol/ticker
    pub symbol: String,
    /// Decimal places, display only
    pub decimals: u8,
    /// Supply minted at creation
    pub initial_supply: U256,
    /// Account credited with the initial supply
    pub creator: Address,
}

impl TokenMetadata {
    pub fn from_config(config: &TokenConfig, creator: Address) -> Self {
        Self {
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            decimals: config.decimals,
            initial_supply: config.initial_supply,
            creator,
        }
    }
}
