// File: testing-framework/src/chain/mod.rs
//
// TestChain - In-Process Ledger Environment
//
// Hosts token ledgers and vesting schedules behind a single call interface:
// - Deterministic account and contract addresses
// - Manual clock read once per call
// - Atomic calls: contract state is restored when a call is rejected
// - Event log made of the receipts of successful calls
// - Native currency balances, refused by every contract

mod error;
mod receipt;

use std::{collections::HashMap, sync::Arc};

use aha_common::{
    account::Address,
    config::{DeploymentConfig, TokenConfig, VestingConfig},
    event::{EmittedEvent, LedgerEvent},
    time::{Clock, TimestampSeconds},
    token::{BalanceLedger, LedgerError, TokenLedger},
    vesting::{VestingError, VestingParams, VestingSchedule, VestingStatus},
};
use log::{debug, trace};
use primitive_types::U256;

pub use error::CallError;
pub use receipt::CallReceipt;

use crate::orchestrator::ManualClock;

/// Native balance given to every named test account (100 coins of 10^18)
pub const DEFAULT_NATIVE_BALANCE: u128 = 100 * 1_000_000_000_000_000_000;

/// Addresses created by [`TestChain::deploy_from_config`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    /// Token contract
    pub token: Address,
    /// Vesting schedules, in config order
    pub schedules: Vec<Address>,
}

#[derive(Debug, Clone, Default)]
struct ChainState {
    block: u64,
    tokens: HashMap<Address, BalanceLedger>,
    schedules: HashMap<Address, VestingSchedule>,
    native: HashMap<Address, u128>,
    // deployer => number of contracts deployed
    nonces: HashMap<Address, u64>,
    receipts: Vec<CallReceipt>,
}

/// Saved chain state, see [`TestChain::snapshot`]
#[derive(Debug, Clone)]
pub struct ChainSnapshot(ChainState);

/// In-process ledger environment
///
/// Calls are serialized by `&mut self`; each successful call is included in
/// its own block at the current clock value.
pub struct TestChain {
    clock: Arc<ManualClock>,
    accounts: HashMap<String, Address>,
    state: ChainState,
}

impl TestChain {
    /// Chain on a fresh clock at the default genesis timestamp
    pub fn new() -> Self {
        Self::with_clock(Arc::new(ManualClock::default()))
    }

    /// Chain reading `clock`
    pub fn with_clock(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            accounts: HashMap::new(),
            state: ChainState::default(),
        }
    }

    // ===== Time =====

    /// Current clock value
    pub fn now(&self) -> TimestampSeconds {
        self.clock.now()
    }

    /// Shared clock handle
    pub fn clock(&self) -> &Arc<ManualClock> {
        &self.clock
    }

    /// Number of the last block
    pub fn block_number(&self) -> u64 {
        self.state.block
    }

    /// Move time forward by `seconds` and mine an empty block
    pub fn increase_time(&mut self, seconds: TimestampSeconds) -> TimestampSeconds {
        let now = self.clock.advance(seconds);
        self.state.block += 1;
        now
    }

    /// Move time forward to `target` and mine an empty block
    pub fn increase_to(&mut self, target: TimestampSeconds) -> anyhow::Result<()> {
        self.clock.increase_to(target)?;
        self.state.block += 1;
        Ok(())
    }

    // ===== Accounts =====

    /// Deterministic account for `name`, funded with native currency on first use
    pub fn account(&mut self, name: &str) -> Address {
        if let Some(address) = self.accounts.get(name) {
            return *address;
        }

        let address = Address::from_label(name);
        self.accounts.insert(name.to_owned(), address);
        self.state
            .native
            .entry(address)
            .or_insert(DEFAULT_NATIVE_BALANCE);
        trace!("Account '{}' is {}", name, address);
        address
    }

    /// `count` accounts named `account0`, `account1`, ...
    pub fn accounts(&mut self, count: usize) -> Vec<Address> {
        (0..count)
            .map(|i| self.account(&format!("account{}", i)))
            .collect()
    }

    /// Name given to `address`, if it is a named account
    pub fn name_of(&self, address: &Address) -> Option<&str> {
        self.accounts
            .iter()
            .find(|(_, a)| *a == address)
            .map(|(name, _)| name.as_str())
    }

    // ===== Native currency =====

    /// Native balance of `account`
    pub fn native_balance(&self, account: &Address) -> u128 {
        self.state.native.get(account).copied().unwrap_or_default()
    }

    /// Send native currency; contracts reject it
    pub fn send_native(
        &mut self,
        from: &Address,
        to: &Address,
        value: u128,
    ) -> Result<CallReceipt, CallError> {
        if let Some(ledger) = self.state.tokens.get(to) {
            ledger.receive_native(from, value)?;
        }
        if self.state.schedules.contains_key(to) {
            return Err(CallError::NativeValueRejected(*to));
        }

        let have = self.native_balance(from);
        if value > have {
            return Err(CallError::InsufficientNativeBalance { need: value, have });
        }
        if from != to {
            self.state.native.insert(*from, have - value);
            let credited = self.native_balance(to).saturating_add(value);
            self.state.native.insert(*to, credited);
        }
        Ok(self.commit(Vec::new()))
    }

    // ===== Deployment =====

    /// Deploy a token crediting its whole supply to `deployer`
    pub fn deploy_token(&mut self, deployer: &Address, config: &TokenConfig) -> Address {
        let address = self.next_contract_address(deployer);
        let mut ledger = BalanceLedger::new(address, *deployer, config);
        let events = tag(address, ledger.take_events());
        self.state.tokens.insert(address, ledger);
        self.commit(events);

        debug!("Token deployed at {} by {}", address, deployer);
        address
    }

    /// Deploy a vesting schedule owned by `deployer`
    pub fn deploy_vesting(
        &mut self,
        deployer: &Address,
        params: VestingParams,
    ) -> Result<Address, CallError> {
        let address = Address::derive_contract(deployer, self.nonce(deployer));
        let mut schedule = VestingSchedule::new(address, *deployer, params, self.now())?;
        self.bump_nonce(deployer);

        let events = tag(address, schedule.take_events());
        self.state.schedules.insert(address, schedule);
        self.commit(events);

        debug!("Vesting schedule deployed at {} by {}", address, deployer);
        Ok(address)
    }

    /// Deploy a vesting schedule from its config; no start means now
    pub fn deploy_vesting_config(
        &mut self,
        deployer: &Address,
        config: &VestingConfig,
    ) -> Result<Address, CallError> {
        let params = VestingParams::from_config(config, self.now());
        self.deploy_vesting(deployer, params)
    }

    /// Deploy a token and its schedules; nothing is deployed if any fails
    pub fn deploy_from_config(
        &mut self,
        deployer: &Address,
        config: &DeploymentConfig,
    ) -> Result<Deployment, CallError> {
        let snapshot = self.snapshot();
        let token = self.deploy_token(deployer, &config.token);

        let mut schedules = Vec::with_capacity(config.vesting.len());
        for vesting in &config.vesting {
            match self.deploy_vesting_config(deployer, vesting) {
                Ok(address) => schedules.push(address),
                Err(e) => {
                    self.revert_to(snapshot);
                    return Err(e);
                }
            }
        }

        Ok(Deployment { token, schedules })
    }

    // ===== Snapshots =====

    /// Save the whole chain state
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot(self.state.clone())
    }

    /// Restore a saved state; the clock is not rewound
    pub fn revert_to(&mut self, snapshot: ChainSnapshot) {
        self.state = snapshot.0;
    }

    // ===== Token calls =====

    /// Transfer `amount` of `token` from `from` to `to`
    pub fn transfer(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> Result<CallReceipt, CallError> {
        self.call_token(token, |ledger| ledger.transfer(from, to, amount))
    }

    /// Set `spender`'s allowance over `owner`'s tokens
    pub fn approve(
        &mut self,
        token: &Address,
        owner: &Address,
        spender: &Address,
        amount: U256,
    ) -> Result<CallReceipt, CallError> {
        self.call_token(token, |ledger| ledger.approve(owner, spender, amount))
    }

    /// Raise `spender`'s allowance by `added`
    pub fn increase_allowance(
        &mut self,
        token: &Address,
        owner: &Address,
        spender: &Address,
        added: U256,
    ) -> Result<CallReceipt, CallError> {
        self.call_token(token, |ledger| {
            ledger.increase_allowance(owner, spender, added)
        })
    }

    /// Lower `spender`'s allowance by `subtracted`
    pub fn decrease_allowance(
        &mut self,
        token: &Address,
        owner: &Address,
        spender: &Address,
        subtracted: U256,
    ) -> Result<CallReceipt, CallError> {
        self.call_token(token, |ledger| {
            ledger.decrease_allowance(owner, spender, subtracted)
        })
    }

    /// `spender` moves `amount` of `owner`'s tokens to `to`
    pub fn transfer_from(
        &mut self,
        token: &Address,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: U256,
    ) -> Result<CallReceipt, CallError> {
        self.call_token(token, |ledger| {
            ledger.transfer_from(spender, owner, to, amount)
        })
    }

    /// Burn `amount` of the caller's tokens
    pub fn burn(
        &mut self,
        token: &Address,
        caller: &Address,
        amount: U256,
    ) -> Result<CallReceipt, CallError> {
        self.call_token(token, |ledger| ledger.burn(caller, amount))
    }

    /// Grant the burner role
    pub fn add_burner(
        &mut self,
        token: &Address,
        caller: &Address,
        account: &Address,
    ) -> Result<CallReceipt, CallError> {
        self.call_token(token, |ledger| ledger.add_burner(caller, *account))
    }

    /// Give up the caller's burner role
    pub fn renounce_burner(
        &mut self,
        token: &Address,
        caller: &Address,
    ) -> Result<CallReceipt, CallError> {
        self.call_token(token, |ledger| ledger.renounce_burner(caller))
    }

    // ===== Vesting calls =====

    /// Release the vested `token` amount of `schedule` to its beneficiary
    pub fn release(
        &mut self,
        schedule: &Address,
        token: &Address,
    ) -> Result<CallReceipt, CallError> {
        self.call_vesting(schedule, token, |vesting, ledger, now| {
            vesting.release(ledger, now).map(|_| ())
        })
    }

    /// Revoke `token` on `schedule`, refunding the unvested part to the owner
    pub fn revoke(
        &mut self,
        schedule: &Address,
        token: &Address,
        caller: &Address,
    ) -> Result<CallReceipt, CallError> {
        self.call_vesting(schedule, token, |vesting, ledger, now| {
            vesting.revoke(caller, ledger, now).map(|_| ())
        })
    }

    /// Hand the schedule over to `new_owner`
    pub fn transfer_ownership(
        &mut self,
        schedule: &Address,
        caller: &Address,
        new_owner: &Address,
    ) -> Result<CallReceipt, CallError> {
        self.call_schedule(schedule, |vesting| {
            vesting.transfer_ownership(caller, *new_owner)
        })
    }

    /// Leave the schedule without owner
    pub fn renounce_ownership(
        &mut self,
        schedule: &Address,
        caller: &Address,
    ) -> Result<CallReceipt, CallError> {
        self.call_schedule(schedule, |vesting| vesting.renounce_ownership(caller))
    }

    // ===== Queries =====

    /// Token ledger at `address`
    pub fn token(&self, address: &Address) -> Result<&BalanceLedger, CallError> {
        self.state
            .tokens
            .get(address)
            .ok_or(CallError::UnknownContract(*address))
    }

    /// Vesting schedule at `address`
    pub fn schedule(&self, address: &Address) -> Result<&VestingSchedule, CallError> {
        self.state
            .schedules
            .get(address)
            .ok_or(CallError::UnknownContract(*address))
    }

    /// Deployed tokens
    pub fn tokens(&self) -> impl Iterator<Item = &BalanceLedger> {
        self.state.tokens.values()
    }

    /// Deployed schedules
    pub fn schedules(&self) -> impl Iterator<Item = &VestingSchedule> {
        self.state.schedules.values()
    }

    /// `token` balance of `account`
    pub fn balance_of(&self, token: &Address, account: &Address) -> Result<U256, CallError> {
        Ok(self.token(token)?.balance_of(account))
    }

    /// Allowance of `spender` over `owner`'s `token`
    pub fn allowance(
        &self,
        token: &Address,
        owner: &Address,
        spender: &Address,
    ) -> Result<U256, CallError> {
        Ok(self.token(token)?.allowance(owner, spender))
    }

    /// Total supply of `token`
    pub fn total_supply(&self, token: &Address) -> Result<U256, CallError> {
        Ok(self.token(token)?.total_supply())
    }

    /// Whether `account` may burn `token`
    pub fn is_burner(&self, token: &Address, account: &Address) -> Result<bool, CallError> {
        Ok(self.token(token)?.is_burner(account))
    }

    /// Vested `token` amount of `schedule` at the current time
    pub fn vested_amount(&self, schedule: &Address, token: &Address) -> Result<U256, CallError> {
        let ledger = self.token(token)?;
        Ok(self.schedule(schedule)?.vested_amount(ledger, self.now())?)
    }

    /// Releasable `token` amount of `schedule` at the current time
    pub fn releasable_amount(
        &self,
        schedule: &Address,
        token: &Address,
    ) -> Result<U256, CallError> {
        let ledger = self.token(token)?;
        Ok(self.schedule(schedule)?.releasable_amount(ledger, self.now())?)
    }

    /// Phase and revocation flag of `schedule` for `token` at the current time
    pub fn status(&self, schedule: &Address, token: &Address) -> Result<VestingStatus, CallError> {
        Ok(self.schedule(schedule)?.status(token, self.now()))
    }

    // ===== Event log =====

    /// Receipts of every successful call, oldest first
    pub fn receipts(&self) -> &[CallReceipt] {
        &self.state.receipts
    }

    /// Receipt of the last successful call
    pub fn last_receipt(&self) -> Option<&CallReceipt> {
        self.state.receipts.last()
    }

    /// Every event ever emitted, oldest first
    pub fn events(&self) -> impl Iterator<Item = &EmittedEvent> {
        self.state.receipts.iter().flat_map(|r| r.events.iter())
    }

    /// Events emitted by `contract`
    pub fn events_of<'a>(&'a self, contract: &'a Address) -> impl Iterator<Item = &'a LedgerEvent> {
        self.events()
            .filter(move |e| e.contract == *contract)
            .map(|e| &e.event)
    }

    // ===== Internals =====

    fn call_token<F>(&mut self, token: &Address, f: F) -> Result<CallReceipt, CallError>
    where
        F: FnOnce(&mut BalanceLedger) -> Result<(), LedgerError>,
    {
        let ledger = self
            .state
            .tokens
            .get_mut(token)
            .ok_or(CallError::UnknownContract(*token))?;
        let before = ledger.clone();

        match f(&mut *ledger) {
            Ok(()) => {
                let events = tag(*token, ledger.take_events());
                Ok(self.commit(events))
            }
            Err(e) => {
                *ledger = before;
                if log::log_enabled!(log::Level::Debug) {
                    debug!("Call on token {} rejected: {}", token, e);
                }
                Err(e.into())
            }
        }
    }

    fn call_vesting<F>(
        &mut self,
        schedule: &Address,
        token: &Address,
        f: F,
    ) -> Result<CallReceipt, CallError>
    where
        F: FnOnce(&mut VestingSchedule, &mut BalanceLedger, TimestampSeconds) -> Result<(), VestingError>,
    {
        let now = self.now();
        let vesting = self
            .state
            .schedules
            .get_mut(schedule)
            .ok_or(CallError::UnknownContract(*schedule))?;
        let ledger = self
            .state
            .tokens
            .get_mut(token)
            .ok_or(CallError::UnknownContract(*token))?;
        let (vesting_before, ledger_before) = (vesting.clone(), ledger.clone());

        match f(&mut *vesting, &mut *ledger, now) {
            Ok(()) => {
                // token transfers happen inside the schedule call, so they come first
                let mut events = tag(*token, ledger.take_events());
                events.extend(tag(*schedule, vesting.take_events()));
                Ok(self.commit(events))
            }
            Err(e) => {
                *vesting = vesting_before;
                *ledger = ledger_before;
                if log::log_enabled!(log::Level::Debug) {
                    debug!("Call on schedule {} rejected: {}", schedule, e);
                }
                Err(e.into())
            }
        }
    }

    fn call_schedule<F>(&mut self, schedule: &Address, f: F) -> Result<CallReceipt, CallError>
    where
        F: FnOnce(&mut VestingSchedule) -> Result<(), VestingError>,
    {
        let vesting = self
            .state
            .schedules
            .get_mut(schedule)
            .ok_or(CallError::UnknownContract(*schedule))?;
        let before = vesting.clone();

        match f(&mut *vesting) {
            Ok(()) => {
                let events = tag(*schedule, vesting.take_events());
                Ok(self.commit(events))
            }
            Err(e) => {
                *vesting = before;
                Err(e.into())
            }
        }
    }

    fn commit(&mut self, events: Vec<EmittedEvent>) -> CallReceipt {
        self.state.block += 1;
        let receipt = CallReceipt {
            block: self.state.block,
            timestamp: self.now(),
            events,
        };
        self.state.receipts.push(receipt.clone());
        receipt
    }

    fn nonce(&self, deployer: &Address) -> u64 {
        self.state.nonces.get(deployer).copied().unwrap_or_default()
    }

    fn bump_nonce(&mut self, deployer: &Address) {
        *self.state.nonces.entry(*deployer).or_default() += 1;
    }

    fn next_contract_address(&mut self, deployer: &Address) -> Address {
        let address = Address::derive_contract(deployer, self.nonce(deployer));
        self.bump_nonce(deployer);
        address
    }
}

impl Default for TestChain {
    fn default() -> Self {
        Self::new()
    }
}

fn tag(contract: Address, events: Vec<LedgerEvent>) -> Vec<EmittedEvent> {
    events
        .into_iter()
        .map(|event| EmittedEvent { contract, event })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_token() -> TokenConfig {
        TokenConfig {
            initial_supply: U256::from(1000),
            ..Default::default()
        }
    }

    #[test]
    fn test_contract_addresses_are_deterministic() {
        let mut first = TestChain::new();
        let mut second = TestChain::new();
        let deployer = first.account("deployer");
        second.account("deployer");

        let a = first.deploy_token(&deployer, &small_token());
        let b = second.deploy_token(&deployer, &small_token());
        assert_eq!(a, b);
        assert_ne!(a, first.deploy_token(&deployer, &small_token()));
    }

    #[test]
    fn test_rejected_call_commits_nothing() {
        let mut chain = TestChain::new();
        let deployer = chain.account("deployer");
        let alice = chain.account("alice");
        let token = chain.deploy_token(&deployer, &small_token());
        let block = chain.block_number();
        let receipts = chain.receipts().len();

        let err = chain
            .transfer(&token, &deployer, &alice, U256::from(1001))
            .unwrap_err();
        assert_eq!(err.kind(), "InsufficientBalance");
        assert_eq!(chain.block_number(), block);
        assert_eq!(chain.receipts().len(), receipts);
    }

    #[test]
    fn test_receipt_carries_block_and_time() {
        let mut chain = TestChain::new();
        let deployer = chain.account("deployer");
        let alice = chain.account("alice");
        let token = chain.deploy_token(&deployer, &small_token());
        chain.increase_time(60);

        let receipt = chain
            .transfer(&token, &deployer, &alice, U256::from(10))
            .unwrap();
        assert_eq!(receipt.block, chain.block_number());
        assert_eq!(receipt.timestamp, chain.now());
        assert_eq!(receipt.event_names(), vec!["Transfer"]);
        assert_eq!(chain.last_receipt(), Some(&receipt));
    }

    #[test]
    fn test_snapshot_and_revert() {
        let mut chain = TestChain::new();
        let deployer = chain.account("deployer");
        let alice = chain.account("alice");
        let token = chain.deploy_token(&deployer, &small_token());

        let snapshot = chain.snapshot();
        chain
            .transfer(&token, &deployer, &alice, U256::from(10))
            .unwrap();
        chain.revert_to(snapshot);

        assert_eq!(chain.balance_of(&token, &alice).unwrap(), U256::zero());
    }

    #[test]
    fn test_contracts_reject_native_value() {
        let mut chain = TestChain::new();
        let deployer = chain.account("deployer");
        let alice = chain.account("alice");
        let token = chain.deploy_token(&deployer, &small_token());

        let err = chain.send_native(&deployer, &token, 10).unwrap_err();
        assert_eq!(err, CallError::Ledger(LedgerError::NativeValueRejected));
        assert_eq!(chain.native_balance(&deployer), DEFAULT_NATIVE_BALANCE);

        chain.send_native(&deployer, &alice, 10).unwrap();
        assert_eq!(chain.native_balance(&alice), DEFAULT_NATIVE_BALANCE + 10);
    }

    #[test]
    fn test_unknown_contract() {
        let mut chain = TestChain::new();
        let deployer = chain.account("deployer");
        let nowhere = chain.account("nowhere");
        assert_eq!(
            chain
                .transfer(&nowhere, &deployer, &deployer, U256::zero())
                .unwrap_err(),
            CallError::UnknownContract(nowhere)
        );
    }

    #[test]
    fn test_failed_deployment_rolls_back() {
        let mut chain = TestChain::new();
        let deployer = chain.account("deployer");
        let beneficiary = chain.account("beneficiary");
        let config = DeploymentConfig {
            token: small_token(),
            vesting: vec![
                VestingConfig::new(beneficiary),
                VestingConfig::new(Address::zero()),
            ],
        };

        let err = chain.deploy_from_config(&deployer, &config).unwrap_err();
        assert_eq!(err.kind(), "InvalidScheduleParameters");
        assert_eq!(chain.tokens().count(), 0);
        assert_eq!(chain.schedules().count(), 0);
    }
}
