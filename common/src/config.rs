use std::{fs, path::Path};

use anyhow::{Context, Result};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{
    account::Address,
    time::{duration, TimestampSeconds},
};

// ===== Token =====

pub const TOKEN_NAME: &str = "Aha Knowledge Token";
pub const TOKEN_SYMBOL: &str = "AHT";
pub const TOKEN_DECIMALS: u8 = 18;
// Whole tokens minted once at creation, there is no mint afterwards
pub const INITIAL_SUPPLY_UNITS: u64 = 15_000_000_000;

// ===== Vesting deployment defaults =====

pub const DEFAULT_CLIFF_DURATION: TimestampSeconds = duration::minutes(5);
pub const DEFAULT_VESTING_DURATION: TimestampSeconds = duration::minutes(10);
pub const DEFAULT_REVOCABLE: bool = true;

/// Fixed supply in base units: `INITIAL_SUPPLY_UNITS * 10^TOKEN_DECIMALS`
pub fn initial_supply() -> U256 {
    U256::from(INITIAL_SUPPLY_UNITS) * U256::exp10(TOKEN_DECIMALS as usize)
}

fn default_name() -> String {
    TOKEN_NAME.to_owned()
}

fn default_symbol() -> String {
    TOKEN_SYMBOL.to_owned()
}

fn default_decimals() -> u8 {
    TOKEN_DECIMALS
}

fn default_cliff_duration() -> TimestampSeconds {
    DEFAULT_CLIFF_DURATION
}

fn default_duration() -> TimestampSeconds {
    DEFAULT_VESTING_DURATION
}

fn default_revocable() -> bool {
    DEFAULT_REVOCABLE
}

/// Token creation parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TokenConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    #[serde(default = "initial_supply")]
    pub initial_supply: U256,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            decimals: default_decimals(),
            initial_supply: initial_supply(),
        }
    }
}

/// Vesting schedule deployment parameters
///
/// `start` falls back to the environment clock at deployment when absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VestingConfig {
    pub beneficiary: Address,
    #[serde(default)]
    pub start: Option<TimestampSeconds>,
    #[serde(default = "default_cliff_duration")]
    pub cliff_duration: TimestampSeconds,
    #[serde(default = "default_duration")]
    pub duration: TimestampSeconds,
    #[serde(default = "default_revocable")]
    pub revocable: bool,
}

impl VestingConfig {
    pub fn new(beneficiary: Address) -> Self {
        Self {
            beneficiary,
            start: None,
            cliff_duration: DEFAULT_CLIFF_DURATION,
            duration: DEFAULT_VESTING_DURATION,
            revocable: DEFAULT_REVOCABLE,
        }
    }
}

/// Full deployment: one token and the schedules funded from it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub vesting: Vec<VestingConfig>,
}

impl DeploymentConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse deployment config")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read deployment config {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid deployment config {}", path.display()))
    }
}
