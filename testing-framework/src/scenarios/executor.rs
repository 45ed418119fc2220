//! YAML scenario execution engine
//!
//! Runs parsed scenarios against a [`DeterministicTestEnv`]: the first
//! genesis account deploys the token and every schedule, schedules are
//! funded from it, then steps run in order.
//!
//! # Example
//!
//! ```rust
//! use aha_testing_framework::scenarios::{parse_scenario, ScenarioExecutor};
//!
//! let yaml = r#"
//! name: "Simple Transfer"
//! genesis:
//!   accounts: ["owner", "alice"]
//!   token:
//!     initial_supply: 1000
//! steps:
//!   - action: transfer
//!     from: owner
//!     to: alice
//!     amount: 100
//!   - action: assert_balance
//!     account: alice
//!     eq: 100
//! invariants:
//!   - supply_conservation
//! "#;
//!
//! let scenario = parse_scenario(yaml).unwrap();
//! let report = ScenarioExecutor::new().execute(scenario).unwrap();
//! assert!(report.success);
//! ```

use std::collections::HashMap;

use aha_common::{
    account::Address,
    config::TokenConfig,
    time::TimestampSeconds,
    vesting::{VestingParams, VestingPhase},
};
use anyhow::{bail, Context, Result};
use log::info;
use primitive_types::U256;

use super::parser::{Step, TestScenario};
use crate::{
    chain::{CallError, CallReceipt, TestChain},
    invariants,
    orchestrator::{DeterministicTestEnv, GENESIS_TIMESTAMP},
};

/// Scenario executor that runs parsed YAML scenarios
pub struct ScenarioExecutor {
    env: Option<DeterministicTestEnv>,

    /// Named accounts and schedules (name → address)
    names: HashMap<String, Address>,

    /// Token every step operates on
    token: Option<Address>,

    genesis_timestamp: TimestampSeconds,

    /// Execution log
    log: Vec<String>,

    /// Current step number (1-indexed)
    current_step: usize,
}

impl ScenarioExecutor {
    /// Create new executor
    pub fn new() -> Self {
        Self {
            env: None,
            names: HashMap::new(),
            token: None,
            genesis_timestamp: GENESIS_TIMESTAMP,
            log: Vec::new(),
            current_step: 0,
        }
    }

    /// Execute a complete scenario
    ///
    /// Fails at the first step whose outcome differs from what the scenario
    /// expects, or at the first violated invariant.
    pub fn execute(&mut self, scenario: TestScenario) -> Result<ExecutionReport> {
        self.log.clear();
        self.names.clear();
        self.current_step = 0;

        self.log(format!("Starting scenario: {}", scenario.name));
        if let Some(desc) = &scenario.description {
            self.log(format!("Description: {}", desc));
        }

        self.setup_genesis(&scenario)?;

        for (idx, step) in scenario.steps.iter().enumerate() {
            self.current_step = idx + 1;
            self.log(format!("--- Step {}: {:?} ---", self.current_step, step));

            self.execute_step(step)
                .with_context(|| format!("Failed at step {} ({:?})", self.current_step, step))?;
        }

        if let Some(names) = &scenario.invariants {
            self.log("--- Checking Invariants ---".to_string());
            for name in names {
                self.check_invariant(name)?;
            }
        }

        self.log("=== Scenario completed successfully ===".to_string());
        info!("Scenario '{}' passed", scenario.name);

        Ok(ExecutionReport {
            scenario_name: scenario.name,
            steps_executed: self.current_step,
            success: true,
            log: self.log.clone(),
        })
    }

    /// Deploy the token and the schedules, funding each schedule
    fn setup_genesis(&mut self, scenario: &TestScenario) -> Result<()> {
        self.log("Setting up genesis...".to_string());

        let genesis = &scenario.genesis;
        self.genesis_timestamp = genesis.timestamp.unwrap_or(GENESIS_TIMESTAMP);
        let mut env = DeterministicTestEnv::starting_at(self.genesis_timestamp);

        for name in &genesis.accounts {
            let address = env.chain.account(name);
            self.names.insert(name.clone(), address);
            self.log(format!("  Account '{}': {}", name, address));
        }
        let first = genesis
            .accounts
            .first()
            .context("Genesis declares no accounts")?;
        let deployer = env.chain.account(first);

        let mut config = TokenConfig::default();
        if let Some(supply) = genesis.token.initial_supply {
            config.initial_supply = supply.into();
        }
        let token = env.chain.deploy_token(&deployer, &config);
        self.token = Some(token);
        self.log(format!(
            "  Token {} with supply {}",
            token, config.initial_supply
        ));

        for vesting in &genesis.vesting {
            let beneficiary = self.resolve(&vesting.beneficiary)?;
            let params = VestingParams {
                beneficiary,
                start: self.genesis_timestamp + vesting.start_offset,
                cliff_duration: vesting.cliff_duration,
                duration: vesting.duration,
                revocable: vesting.revocable,
            };
            let schedule = env
                .chain
                .deploy_vesting(&deployer, params)
                .with_context(|| format!("Failed to deploy schedule '{}'", vesting.name))?;
            self.names.insert(vesting.name.clone(), schedule);

            if let Some(amount) = vesting.amount {
                env.chain
                    .transfer(&token, &deployer, &schedule, amount.into())
                    .with_context(|| format!("Failed to fund schedule '{}'", vesting.name))?;
            }
            self.log(format!("  Schedule '{}': {}", vesting.name, schedule));
        }

        self.env = Some(env);
        self.log(format!("Genesis complete: {} names", self.names.len()));
        Ok(())
    }

    fn execute_step(&mut self, step: &Step) -> Result<()> {
        let token = self.token.context("Token not deployed")?;

        match step {
            Step::Transfer {
                from,
                to,
                amount,
                expect_error,
            } => {
                let (from, to) = (self.resolve(from)?, self.resolve(to)?);
                let result = self.chain()?.transfer(&token, &from, &to, amount.0);
                self.check_outcome("transfer", result, expect_error)
            }
            Step::Approve {
                owner,
                spender,
                amount,
                expect_error,
            } => {
                let (owner, spender) = (self.resolve(owner)?, self.resolve(spender)?);
                let result = self.chain()?.approve(&token, &owner, &spender, amount.0);
                self.check_outcome("approve", result, expect_error)
            }
            Step::IncreaseAllowance {
                owner,
                spender,
                amount,
                expect_error,
            } => {
                let (owner, spender) = (self.resolve(owner)?, self.resolve(spender)?);
                let result = self
                    .chain()?
                    .increase_allowance(&token, &owner, &spender, amount.0);
                self.check_outcome("increase_allowance", result, expect_error)
            }
            Step::DecreaseAllowance {
                owner,
                spender,
                amount,
                expect_error,
            } => {
                let (owner, spender) = (self.resolve(owner)?, self.resolve(spender)?);
                let result = self
                    .chain()?
                    .decrease_allowance(&token, &owner, &spender, amount.0);
                self.check_outcome("decrease_allowance", result, expect_error)
            }
            Step::TransferFrom {
                spender,
                owner,
                to,
                amount,
                expect_error,
            } => {
                let spender = self.resolve(spender)?;
                let owner = self.resolve(owner)?;
                let to = self.resolve(to)?;
                let result = self
                    .chain()?
                    .transfer_from(&token, &spender, &owner, &to, amount.0);
                self.check_outcome("transfer_from", result, expect_error)
            }
            Step::Burn {
                account,
                amount,
                expect_error,
            } => {
                let account = self.resolve(account)?;
                let result = self.chain()?.burn(&token, &account, amount.0);
                self.check_outcome("burn", result, expect_error)
            }
            Step::AddBurner {
                caller,
                account,
                expect_error,
            } => {
                let (caller, account) = (self.resolve(caller)?, self.resolve(account)?);
                let result = self.chain()?.add_burner(&token, &caller, &account);
                self.check_outcome("add_burner", result, expect_error)
            }
            Step::RenounceBurner {
                account,
                expect_error,
            } => {
                let account = self.resolve(account)?;
                let result = self.chain()?.renounce_burner(&token, &account);
                self.check_outcome("renounce_burner", result, expect_error)
            }
            Step::Release {
                schedule,
                expect_error,
            } => {
                let schedule = self.resolve(schedule)?;
                let result = self.chain()?.release(&schedule, &token);
                self.check_outcome("release", result, expect_error)
            }
            Step::Revoke {
                schedule,
                caller,
                expect_error,
            } => {
                let (schedule, caller) = (self.resolve(schedule)?, self.resolve(caller)?);
                let result = self.chain()?.revoke(&schedule, &token, &caller);
                self.check_outcome("revoke", result, expect_error)
            }
            Step::TransferOwnership {
                schedule,
                caller,
                new_owner,
                expect_error,
            } => {
                let schedule = self.resolve(schedule)?;
                let caller = self.resolve(caller)?;
                let new_owner = self.resolve(new_owner)?;
                let result = self
                    .chain()?
                    .transfer_ownership(&schedule, &caller, &new_owner);
                self.check_outcome("transfer_ownership", result, expect_error)
            }
            Step::RenounceOwnership {
                schedule,
                caller,
                expect_error,
            } => {
                let (schedule, caller) = (self.resolve(schedule)?, self.resolve(caller)?);
                let result = self.chain()?.renounce_ownership(&schedule, &caller);
                self.check_outcome("renounce_ownership", result, expect_error)
            }
            Step::AdvanceTime { seconds } => {
                let now = self.chain()?.increase_time(*seconds);
                self.log(format!("  ✓ Time advanced by {}s to {}", seconds, now));
                Ok(())
            }
            Step::IncreaseTo { offset } => {
                let target = self.genesis_timestamp + offset;
                self.chain()?.increase_to(target)?;
                self.log(format!("  ✓ Time is now {}", target));
                Ok(())
            }
            Step::AssertBalance { account, eq } => {
                let address = self.resolve(account)?;
                let actual = self.chain()?.balance_of(&token, &address)?;
                self.assert_amount(&format!("balance of '{}'", account), actual, eq.0)
            }
            Step::AssertAllowance { owner, spender, eq } => {
                let (owner_address, spender_address) =
                    (self.resolve(owner)?, self.resolve(spender)?);
                let actual = self
                    .chain()?
                    .allowance(&token, &owner_address, &spender_address)?;
                self.assert_amount(
                    &format!("allowance of '{}' over '{}'", spender, owner),
                    actual,
                    eq.0,
                )
            }
            Step::AssertTotalSupply { eq } => {
                let actual = self.chain()?.total_supply(&token)?;
                self.assert_amount("total supply", actual, eq.0)
            }
            Step::AssertReleased { schedule, eq } => {
                let address = self.resolve(schedule)?;
                let actual = self.chain()?.schedule(&address)?.released(&token);
                self.assert_amount(&format!("released of '{}'", schedule), actual, eq.0)
            }
            Step::AssertVested { schedule, eq } => {
                let address = self.resolve(schedule)?;
                let actual = self.chain()?.vested_amount(&address, &token)?;
                self.assert_amount(&format!("vested of '{}'", schedule), actual, eq.0)
            }
            Step::AssertRevoked { schedule, eq } => {
                let address = self.resolve(schedule)?;
                let actual = self.chain()?.schedule(&address)?.revoked(&token);
                if actual != *eq {
                    bail!("Revoked flag of '{}': expected {}, got {}", schedule, eq, actual);
                }
                self.log(format!("  ✓ Revoked flag is {}", eq));
                Ok(())
            }
            Step::AssertPhase { schedule, eq } => {
                let address = self.resolve(schedule)?;
                let phase: VestingPhase = self.chain()?.status(&address, &token)?.phase;
                let actual: &'static str = phase.into();
                if actual != eq.as_str() {
                    bail!("Phase of '{}': expected {}, got {}", schedule, eq, actual);
                }
                self.log(format!("  ✓ Phase is {}", eq));
                Ok(())
            }
            Step::AssertBurner { account, eq } => {
                let address = self.resolve(account)?;
                let actual = self.chain()?.is_burner(&token, &address)?;
                if actual != *eq {
                    bail!("Burner role of '{}': expected {}, got {}", account, eq, actual);
                }
                self.log(format!("  ✓ Burner role is {}", eq));
                Ok(())
            }
            Step::AssertEvent { name } => {
                let receipt = self
                    .chain()?
                    .last_receipt()
                    .context("No call has succeeded yet")?;
                if !receipt.event_names().contains(&name.as_str()) {
                    bail!(
                        "Event {} not emitted by the last call, got {:?}",
                        name,
                        receipt.event_names()
                    );
                }
                self.log(format!("  ✓ Event {} emitted", name));
                Ok(())
            }
        }
    }

    fn check_outcome(
        &mut self,
        action: &str,
        result: Result<CallReceipt, CallError>,
        expect_error: &Option<String>,
    ) -> Result<()> {
        match (result, expect_error) {
            (Ok(receipt), None) => {
                self.log(format!(
                    "  ✓ {} succeeded in block {} ({:?})",
                    action,
                    receipt.block,
                    receipt.event_names()
                ));
                Ok(())
            }
            (Ok(_), Some(expected)) => {
                bail!("Expected {} to fail with {}, but it succeeded", action, expected)
            }
            (Err(e), None) => Err(e).with_context(|| format!("Expected {} to succeed", action)),
            (Err(e), Some(expected)) => {
                if e.kind() != expected.as_str() {
                    bail!(
                        "Expected {} to fail with {}, but it failed with {} ({})",
                        action,
                        expected,
                        e.kind(),
                        e
                    );
                }
                self.log(format!("  ✓ {} failed as expected: {}", action, e));
                Ok(())
            }
        }
    }

    fn assert_amount(&mut self, what: &str, actual: U256, expected: U256) -> Result<()> {
        if actual != expected {
            bail!("Assertion on {} failed: expected {}, got {}", what, expected, actual);
        }
        self.log(format!("  ✓ {} equals {}", what, expected));
        Ok(())
    }

    fn check_invariant(&mut self, name: &str) -> Result<()> {
        let chain = self.chain()?;
        match name {
            "supply_conservation" => {
                for ledger in chain.tokens() {
                    invariants::check_supply_conservation(ledger)?;
                }
            }
            "vesting_bounds" => invariants::check_vesting_bounds(chain)?,
            other => bail!("Unknown invariant '{}'", other),
        }
        self.log(format!("  ✓ Invariant {} holds", name));
        Ok(())
    }

    fn chain(&mut self) -> Result<&mut TestChain> {
        self.env
            .as_mut()
            .map(|env| &mut env.chain)
            .context("Chain not initialized")
    }

    /// Address of a declared name, or of `token` / `zero`
    fn resolve(&self, name: &str) -> Result<Address> {
        match name {
            "zero" => Ok(Address::zero()),
            "token" => self.token.context("Token not deployed"),
            _ => self
                .names
                .get(name)
                .copied()
                .with_context(|| format!("Unknown name '{}'", name)),
        }
    }

    fn log(&mut self, message: String) {
        self.log.push(message);
    }

    /// Get execution log
    pub fn get_log(&self) -> &[String] {
        &self.log
    }
}

impl Default for ScenarioExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Execution report
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// Scenario name
    pub scenario_name: String,

    /// Number of steps executed
    pub steps_executed: usize,

    /// Whether execution succeeded
    pub success: bool,

    /// Execution log
    pub log: Vec<String>,
}

impl ExecutionReport {
    /// Print report to stdout
    pub fn print(&self) {
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║  Scenario Execution Report                                 ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║  Name: {:<50} ║", self.scenario_name);
        println!("║  Steps: {:<48} ║", self.steps_executed);
        println!(
            "║  Status: {:<47} ║",
            if self.success {
                "SUCCESS ✓"
            } else {
                "FAILED ✗"
            }
        );
        println!("╚════════════════════════════════════════════════════════════╝\n");

        println!("Execution Log:");
        for entry in &self.log {
            println!("{}", entry);
        }
    }
}
