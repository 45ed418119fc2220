//! YAML scenario parser
//!
//! Amounts may be written as integers or, above `u64`, as decimal strings
//! (`"15000000000000000000000000000"`).

use std::collections::HashSet;

use aha_common::time::TimestampSeconds;
use anyhow::{bail, Context, Result};
use primitive_types::U256;
use serde::{Deserialize, Deserializer};

/// Token amount accepting integers and decimal strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amount(pub U256);

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Amount(U256::from(n))),
            Raw::Text(s) => U256::from_dec_str(s.trim())
                .map(Amount)
                .map_err(|e| serde::de::Error::custom(format!("invalid amount '{}': {:?}", s, e))),
        }
    }
}

impl From<Amount> for U256 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

/// Complete scenario file
#[derive(Debug, Clone, Deserialize)]
pub struct TestScenario {
    /// Scenario name
    pub name: String,
    /// Optional free text
    #[serde(default)]
    pub description: Option<String>,
    /// Initial chain state
    pub genesis: Genesis,
    /// Ordered steps
    pub steps: Vec<Step>,
    /// Invariants checked after the last step
    #[serde(default)]
    pub invariants: Option<Vec<String>>,
}

/// Accounts, token and schedules present before the first step
#[derive(Debug, Clone, Deserialize)]
pub struct Genesis {
    /// Clock value at genesis
    #[serde(default)]
    pub timestamp: Option<TimestampSeconds>,
    /// Named accounts; the first one deploys every contract
    pub accounts: Vec<String>,
    /// Token parameters
    #[serde(default)]
    pub token: GenesisToken,
    /// Vesting schedules, funded from the deployer
    #[serde(default)]
    pub vesting: Vec<GenesisVesting>,
}

/// Token parameters of a scenario
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenesisToken {
    /// Supply credited to the deployer, defaults to the fixed supply
    #[serde(default)]
    pub initial_supply: Option<Amount>,
}

/// A vesting schedule deployed at genesis
#[derive(Debug, Clone, Deserialize)]
pub struct GenesisVesting {
    /// Name used by steps to refer to the schedule
    pub name: String,
    /// Beneficiary account name
    pub beneficiary: String,
    /// Start relative to genesis, in seconds
    #[serde(default)]
    pub start_offset: TimestampSeconds,
    /// Seconds from start to cliff
    pub cliff_duration: TimestampSeconds,
    /// Seconds from start to the end of vesting
    pub duration: TimestampSeconds,
    /// Whether the owner may revoke
    #[serde(default = "default_true")]
    pub revocable: bool,
    /// Tokens moved from the deployer to the schedule
    #[serde(default)]
    pub amount: Option<Amount>,
}

fn default_true() -> bool {
    true
}

/// Scenario step
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Token transfer
    Transfer {
        /// Sender
        from: String,
        /// Recipient
        to: String,
        /// Amount
        amount: Amount,
        /// Expected rejection kind
        #[serde(default)]
        expect_error: Option<String>,
    },
    /// Set an allowance
    Approve {
        /// Token owner
        owner: String,
        /// Spender
        spender: String,
        /// New allowance
        amount: Amount,
        /// Expected rejection kind
        #[serde(default)]
        expect_error: Option<String>,
    },
    /// Raise an allowance
    IncreaseAllowance {
        /// Token owner
        owner: String,
        /// Spender
        spender: String,
        /// Added value
        amount: Amount,
        /// Expected rejection kind
        #[serde(default)]
        expect_error: Option<String>,
    },
    /// Lower an allowance
    DecreaseAllowance {
        /// Token owner
        owner: String,
        /// Spender
        spender: String,
        /// Subtracted value
        amount: Amount,
        /// Expected rejection kind
        #[serde(default)]
        expect_error: Option<String>,
    },
    /// Delegated transfer
    TransferFrom {
        /// Spender executing the transfer
        spender: String,
        /// Token owner
        owner: String,
        /// Recipient
        to: String,
        /// Amount
        amount: Amount,
        /// Expected rejection kind
        #[serde(default)]
        expect_error: Option<String>,
    },
    /// Burn own tokens
    Burn {
        /// Burning account
        account: String,
        /// Amount
        amount: Amount,
        /// Expected rejection kind
        #[serde(default)]
        expect_error: Option<String>,
    },
    /// Grant the burner role
    AddBurner {
        /// Existing burner
        caller: String,
        /// New burner
        account: String,
        /// Expected rejection kind
        #[serde(default)]
        expect_error: Option<String>,
    },
    /// Give up the burner role
    RenounceBurner {
        /// Renouncing account
        account: String,
        /// Expected rejection kind
        #[serde(default)]
        expect_error: Option<String>,
    },
    /// Release vested tokens
    Release {
        /// Schedule name
        schedule: String,
        /// Expected rejection kind
        #[serde(default)]
        expect_error: Option<String>,
    },
    /// Revoke a schedule
    Revoke {
        /// Schedule name
        schedule: String,
        /// Calling account
        caller: String,
        /// Expected rejection kind
        #[serde(default)]
        expect_error: Option<String>,
    },
    /// Hand a schedule to a new owner
    TransferOwnership {
        /// Schedule name
        schedule: String,
        /// Calling account
        caller: String,
        /// New owner
        new_owner: String,
        /// Expected rejection kind
        #[serde(default)]
        expect_error: Option<String>,
    },
    /// Leave a schedule without owner
    RenounceOwnership {
        /// Schedule name
        schedule: String,
        /// Calling account
        caller: String,
        /// Expected rejection kind
        #[serde(default)]
        expect_error: Option<String>,
    },
    /// Move the clock forward
    AdvanceTime {
        /// Seconds to add
        seconds: TimestampSeconds,
    },
    /// Move the clock to genesis + offset
    IncreaseTo {
        /// Seconds after genesis
        offset: TimestampSeconds,
    },
    /// Check a token balance
    AssertBalance {
        /// Account name
        account: String,
        /// Expected balance
        eq: Amount,
    },
    /// Check an allowance
    AssertAllowance {
        /// Token owner
        owner: String,
        /// Spender
        spender: String,
        /// Expected allowance
        eq: Amount,
    },
    /// Check the total supply
    AssertTotalSupply {
        /// Expected supply
        eq: Amount,
    },
    /// Check the released amount of a schedule
    AssertReleased {
        /// Schedule name
        schedule: String,
        /// Expected amount
        eq: Amount,
    },
    /// Check the vested amount of a schedule now
    AssertVested {
        /// Schedule name
        schedule: String,
        /// Expected amount
        eq: Amount,
    },
    /// Check the revocation flag of a schedule
    AssertRevoked {
        /// Schedule name
        schedule: String,
        /// Expected flag
        eq: bool,
    },
    /// Check the phase of a schedule now
    AssertPhase {
        /// Schedule name
        schedule: String,
        /// `Pending`, `Vesting` or `FullyVested`
        eq: String,
    },
    /// Check burner membership
    AssertBurner {
        /// Account name
        account: String,
        /// Expected membership
        eq: bool,
    },
    /// Check that the last successful call emitted an event
    AssertEvent {
        /// Event name
        name: String,
    },
}

impl Step {
    /// Every account or schedule name the step refers to
    pub fn referenced_names(&self) -> Vec<&str> {
        match self {
            Step::Transfer { from, to, .. } => vec![from, to],
            Step::Approve { owner, spender, .. }
            | Step::IncreaseAllowance { owner, spender, .. }
            | Step::DecreaseAllowance { owner, spender, .. }
            | Step::AssertAllowance { owner, spender, .. } => vec![owner, spender],
            Step::TransferFrom {
                spender, owner, to, ..
            } => vec![spender, owner, to],
            Step::Burn { account, .. }
            | Step::RenounceBurner { account, .. }
            | Step::AssertBalance { account, .. }
            | Step::AssertBurner { account, .. } => vec![account],
            Step::AddBurner {
                caller, account, ..
            } => vec![caller, account],
            Step::Release { schedule, .. }
            | Step::AssertReleased { schedule, .. }
            | Step::AssertVested { schedule, .. }
            | Step::AssertRevoked { schedule, .. }
            | Step::AssertPhase { schedule, .. } => vec![schedule],
            Step::Revoke {
                schedule, caller, ..
            }
            | Step::RenounceOwnership {
                schedule, caller, ..
            } => vec![schedule, caller],
            Step::TransferOwnership {
                schedule,
                caller,
                new_owner,
                ..
            } => vec![schedule, caller, new_owner],
            Step::AdvanceTime { .. }
            | Step::IncreaseTo { .. }
            | Step::AssertTotalSupply { .. }
            | Step::AssertEvent { .. } => Vec::new(),
        }
        .into_iter()
        .map(String::as_str)
        .collect()
    }
}

/// Names every scenario may use without declaring them
pub const RESERVED_NAMES: [&str; 2] = ["token", "zero"];

/// Parse and validate a scenario
///
/// Rejects empty or duplicate account lists, empty step lists, and
/// references to undeclared accounts or schedules.
pub fn parse_scenario(yaml: &str) -> Result<TestScenario> {
    let scenario: TestScenario =
        serde_yaml::from_str(yaml).context("Failed to parse scenario YAML")?;
    validate(&scenario)?;
    Ok(scenario)
}

fn validate(scenario: &TestScenario) -> Result<()> {
    if scenario.genesis.accounts.is_empty() {
        bail!("Scenario '{}' declares no accounts", scenario.name);
    }
    if scenario.steps.is_empty() {
        bail!("Scenario '{}' has no steps", scenario.name);
    }

    let mut names = HashSet::new();
    for name in scenario
        .genesis
        .accounts
        .iter()
        .chain(scenario.genesis.vesting.iter().map(|v| &v.name))
    {
        if RESERVED_NAMES.contains(&name.as_str()) {
            bail!("'{}' is a reserved name", name);
        }
        if !names.insert(name.as_str()) {
            bail!("Duplicate name '{}'", name);
        }
    }

    for vesting in &scenario.genesis.vesting {
        if !names.contains(vesting.beneficiary.as_str())
            && !RESERVED_NAMES.contains(&vesting.beneficiary.as_str())
        {
            bail!(
                "Schedule '{}' has unknown beneficiary '{}'",
                vesting.name,
                vesting.beneficiary
            );
        }
    }

    for (idx, step) in scenario.steps.iter().enumerate() {
        for name in step.referenced_names() {
            if !names.contains(name) && !RESERVED_NAMES.contains(&name) {
                bail!("Step {} refers to unknown name '{}'", idx + 1, name);
            }
        }
    }
    Ok(())
}
