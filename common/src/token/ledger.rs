//! Balance Ledger
//!
//! Fixed supply token accounting: balances, the allowance matrix, and
//! role-gated burns. Every operation validates first and only then mutates,
//! so a rejected call leaves the ledger untouched.

use std::collections::HashMap;

use log::{debug, trace};
use primitive_types::U256;

use super::{
    error::LedgerError,
    roles::{RoleRegistry, BURNER_ROLE},
    types::TokenMetadata,
};
use crate::{account::Address, config::TokenConfig, event::LedgerEvent};

/// Transfer primitive used by contracts holding tokens on the ledger
pub trait TokenLedger {
    /// Address of the token contract
    fn address(&self) -> &Address;

    fn balance_of(&self, account: &Address) -> U256;

    fn transfer(&mut self, from: &Address, to: &Address, amount: U256) -> Result<(), LedgerError>;
}

#[derive(Clone, Debug)]
pub struct BalanceLedger {
    address: Address,
    metadata: TokenMetadata,
    total_supply: U256,
    // Zero balances are not stored
    balances: HashMap<Address, U256>,
    // (owner, spender) => allowance, zero allowances are not stored
    allowances: HashMap<(Address, Address), U256>,
    burners: RoleRegistry,
    // Events emitted since the last take_events
    events: Vec<LedgerEvent>,
}

impl BalanceLedger {
    /// Create the token, crediting the entire supply to `deployer`
    ///
    /// The deployer is also the first burner.
    pub fn new(address: Address, deployer: Address, config: &TokenConfig) -> Self {
        let metadata = TokenMetadata::from_config(config, deployer);
        let supply = metadata.initial_supply;

        let mut balances = HashMap::new();
        if !supply.is_zero() {
            balances.insert(deployer, supply);
        }

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Token {} ({}) created at {} with supply {} for {}",
                metadata.name, metadata.symbol, address, supply, deployer
            );
        }

        Self {
            address,
            metadata,
            total_supply: supply,
            balances,
            allowances: HashMap::new(),
            burners: RoleRegistry::new(BURNER_ROLE, deployer),
            events: vec![LedgerEvent::Transfer {
                from: Address::zero(),
                to: deployer,
                value: supply,
            }],
        }
    }

    // ===== Queries =====

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn is_burner(&self, account: &Address) -> bool {
        self.burners.is_member(account)
    }

    /// Burners in grant order
    pub fn burners(&self) -> Vec<Address> {
        self.burners.members().copied().collect()
    }

    /// Every account holding a non-zero balance
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &U256)> {
        self.balances.iter()
    }

    /// Drain the events emitted since the last call
    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // ===== Transfers =====

    /// Move `amount` from `spender`'s allowance on `owner` to `to`
    ///
    /// The allowance is checked before the balance. On success only a
    /// `Transfer` event is emitted, the allowance decrease is silent.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        // Phase 1: validate everything
        let current = self.allowance(owner, spender);
        if amount > current {
            return Err(LedgerError::InsufficientAllowance {
                need: amount,
                have: current,
            });
        }
        self.check_transfer(owner, to, amount)?;

        // Phase 2: apply
        self.set_allowance(*owner, *spender, current - amount);
        self.apply_transfer(owner, to, amount)
    }

    // ===== Allowances =====

    /// Set the allowance of `spender` over `owner`'s tokens
    ///
    /// A non-zero allowance can only be replaced by zero or by the same
    /// value; use the increase/decrease helpers to adjust it.
    pub fn approve(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        if spender.is_zero() {
            return Err(LedgerError::InvalidSpender);
        }

        let current = self.allowance(owner, spender);
        if !amount.is_zero() && !current.is_zero() && amount != current {
            return Err(LedgerError::UnsafeAllowanceChange { current });
        }

        self.set_allowance(*owner, *spender, amount);
        self.events.push(LedgerEvent::Approval {
            owner: *owner,
            spender: *spender,
            value: amount,
        });
        Ok(())
    }

    pub fn increase_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        added: U256,
    ) -> Result<(), LedgerError> {
        if spender.is_zero() {
            return Err(LedgerError::InvalidSpender);
        }

        let value = self
            .allowance(owner, spender)
            .checked_add(added)
            .ok_or(LedgerError::Overflow)?;

        self.set_allowance(*owner, *spender, value);
        self.events.push(LedgerEvent::Approval {
            owner: *owner,
            spender: *spender,
            value,
        });
        Ok(())
    }

    pub fn decrease_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        subtracted: U256,
    ) -> Result<(), LedgerError> {
        if spender.is_zero() {
            return Err(LedgerError::InvalidSpender);
        }

        let current = self.allowance(owner, spender);
        let value = current
            .checked_sub(subtracted)
            .ok_or(LedgerError::InsufficientAllowance {
                need: subtracted,
                have: current,
            })?;

        self.set_allowance(*owner, *spender, value);
        self.events.push(LedgerEvent::Approval {
            owner: *owner,
            spender: *spender,
            value,
        });
        Ok(())
    }

    // ===== Burn & roles =====

    /// Destroy `amount` of the caller's tokens, reducing the total supply
    pub fn burn(&mut self, caller: &Address, amount: U256) -> Result<(), LedgerError> {
        if !self.burners.is_member(caller) {
            return Err(LedgerError::Unauthorized(*caller));
        }

        let balance = self.balance_of(caller);
        if amount > balance {
            return Err(LedgerError::InsufficientBalance {
                need: amount,
                have: balance,
            });
        }

        // total_supply >= balance >= amount
        self.set_balance(*caller, balance - amount);
        self.total_supply -= amount;
        self.events.push(LedgerEvent::Burn {
            account: *caller,
            value: amount,
        });

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Burned {} from {}, total supply is now {}",
                amount, caller, self.total_supply
            );
        }
        Ok(())
    }

    pub fn add_burner(&mut self, caller: &Address, account: Address) -> Result<(), LedgerError> {
        self.burners.add(caller, account)?;
        self.events.push(LedgerEvent::BurnerAdded { account });
        Ok(())
    }

    pub fn renounce_burner(&mut self, caller: &Address) -> Result<(), LedgerError> {
        self.burners.renounce(caller)?;
        self.events
            .push(LedgerEvent::BurnerRemoved { account: *caller });
        Ok(())
    }

    /// Native currency sent to the token contract is always refused
    pub fn receive_native(&self, from: &Address, value: u128) -> Result<(), LedgerError> {
        if log::log_enabled!(log::Level::Trace) {
            trace!("Rejecting {} native units from {} on {}", value, from, self.address);
        }
        Err(LedgerError::NativeValueRejected)
    }

    // ===== Internals =====

    fn check_transfer(&self, from: &Address, to: &Address, amount: U256) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::InvalidRecipient);
        }

        let balance = self.balance_of(from);
        if amount > balance {
            return Err(LedgerError::InsufficientBalance {
                need: amount,
                have: balance,
            });
        }

        if from != to {
            self.balance_of(to)
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?;
        }
        Ok(())
    }

    // Caller must have run check_transfer with the same arguments
    fn apply_transfer(&mut self, from: &Address, to: &Address, amount: U256) -> Result<(), LedgerError> {
        if from != to {
            let from_balance = self.balance_of(from);
            let to_balance = self
                .balance_of(to)
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?;
            self.set_balance(*from, from_balance - amount);
            self.set_balance(*to, to_balance);
        }

        self.events.push(LedgerEvent::Transfer {
            from: *from,
            to: *to,
            value: amount,
        });

        if log::log_enabled!(log::Level::Trace) {
            trace!("Transfer of {} from {} to {}", amount, from, to);
        }
        Ok(())
    }

    fn set_balance(&mut self, account: Address, value: U256) {
        if value.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, value);
        }
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, value: U256) {
        if value.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), value);
        }
    }
}

impl TokenLedger for BalanceLedger {
    fn address(&self) -> &Address {
        &self.address
    }

    fn balance_of(&self, account: &Address) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: U256) -> Result<(), LedgerError> {
        self.check_transfer(from, to, amount)?;
        self.apply_transfer(from, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Accounts {
        deployer: Address,
        alice: Address,
        bob: Address,
    }

    fn setup(supply: u64) -> (BalanceLedger, Accounts) {
        let accounts = Accounts {
            deployer: Address::from_label("deployer"),
            alice: Address::from_label("alice"),
            bob: Address::from_label("bob"),
        };
        let config = TokenConfig {
            initial_supply: U256::from(supply),
            ..Default::default()
        };
        let mut ledger = BalanceLedger::new(Address::from_label("token"), accounts.deployer, &config);
        ledger.take_events();
        (ledger, accounts)
    }

    fn sum_of_balances(ledger: &BalanceLedger) -> U256 {
        ledger
            .holders()
            .fold(U256::zero(), |acc, (_, balance)| acc + *balance)
    }

    #[test]
    fn test_creation_credits_deployer() {
        let deployer = Address::from_label("deployer");
        let mut ledger = BalanceLedger::new(Address::from_label("token"), deployer, &TokenConfig::default());

        assert_eq!(ledger.name(), "Aha Knowledge Token");
        assert_eq!(ledger.symbol(), "AHT");
        assert_eq!(ledger.decimals(), 18);
        assert_eq!(ledger.balance_of(&deployer), crate::config::initial_supply());
        assert_eq!(ledger.total_supply(), crate::config::initial_supply());
        assert!(ledger.is_burner(&deployer));
        assert_eq!(
            ledger.take_events(),
            vec![LedgerEvent::Transfer {
                from: Address::zero(),
                to: deployer,
                value: crate::config::initial_supply(),
            }]
        );
    }

    #[test]
    fn test_transfer_moves_balance() {
        let (mut ledger, a) = setup(1000);
        ledger.transfer(&a.deployer, &a.alice, U256::from(300)).unwrap();

        assert_eq!(ledger.balance_of(&a.deployer), U256::from(700));
        assert_eq!(ledger.balance_of(&a.alice), U256::from(300));
        assert_eq!(sum_of_balances(&ledger), ledger.total_supply());
        assert_eq!(
            ledger.take_events(),
            vec![LedgerEvent::Transfer {
                from: a.deployer,
                to: a.alice,
                value: U256::from(300),
            }]
        );
    }

    #[test]
    fn test_zero_transfer_emits_event() {
        let (mut ledger, a) = setup(1000);
        ledger.transfer(&a.alice, &a.bob, U256::zero()).unwrap();

        assert_eq!(ledger.balance_of(&a.alice), U256::zero());
        assert_eq!(ledger.take_events().len(), 1);
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let (mut ledger, a) = setup(1000);
        ledger.transfer(&a.deployer, &a.deployer, U256::from(1000)).unwrap();
        assert_eq!(ledger.balance_of(&a.deployer), U256::from(1000));
    }

    #[test]
    fn test_transfer_rejections_leave_no_trace() {
        let (mut ledger, a) = setup(1000);

        assert_eq!(
            ledger.transfer(&a.deployer, &Address::zero(), U256::one()),
            Err(LedgerError::InvalidRecipient)
        );
        assert_eq!(
            ledger.transfer(&a.deployer, &a.alice, U256::from(1001)),
            Err(LedgerError::InsufficientBalance {
                need: U256::from(1001),
                have: U256::from(1000),
            })
        );
        assert_eq!(ledger.balance_of(&a.deployer), U256::from(1000));
        assert!(ledger.take_events().is_empty());
    }

    #[test]
    fn test_zero_recipient_checked_before_balance() {
        let (mut ledger, a) = setup(1000);
        let amounts = [
            U256::zero(),
            U256::from(1000),
            U256::from(1001),
            U256::MAX,
        ];

        for from in [a.deployer, a.alice] {
            for amount in amounts {
                assert_eq!(
                    ledger.transfer(&from, &Address::zero(), amount),
                    Err(LedgerError::InvalidRecipient)
                );
            }
        }
        assert_eq!(ledger.balance_of(&a.deployer), U256::from(1000));
        assert_eq!(ledger.total_supply(), U256::from(1000));
        assert!(ledger.take_events().is_empty());
    }

    #[test]
    fn test_approve_requires_zero_first() {
        let (mut ledger, a) = setup(1000);

        ledger.approve(&a.deployer, &a.alice, U256::from(100)).unwrap();
        assert_eq!(
            ledger.approve(&a.deployer, &a.alice, U256::from(200)),
            Err(LedgerError::UnsafeAllowanceChange {
                current: U256::from(100)
            })
        );
        // re-approving the same value is harmless
        ledger.approve(&a.deployer, &a.alice, U256::from(100)).unwrap();
        ledger.approve(&a.deployer, &a.alice, U256::zero()).unwrap();
        ledger.approve(&a.deployer, &a.alice, U256::from(200)).unwrap();
        assert_eq!(ledger.allowance(&a.deployer, &a.alice), U256::from(200));
    }

    #[test]
    fn test_approve_zero_spender() {
        let (mut ledger, a) = setup(1000);
        assert_eq!(
            ledger.approve(&a.deployer, &Address::zero(), U256::one()),
            Err(LedgerError::InvalidSpender)
        );
    }

    #[test]
    fn test_unlimited_allowance_roundtrip() {
        let (mut ledger, a) = setup(1000);
        ledger.approve(&a.deployer, &a.alice, U256::MAX).unwrap();
        assert_eq!(ledger.allowance(&a.deployer, &a.alice), U256::MAX);
        assert_eq!(
            ledger.increase_allowance(&a.deployer, &a.alice, U256::one()),
            Err(LedgerError::Overflow)
        );
    }

    #[test]
    fn test_increase_and_decrease_allowance() {
        let (mut ledger, a) = setup(1000);

        ledger.increase_allowance(&a.deployer, &a.alice, U256::from(50)).unwrap();
        ledger.increase_allowance(&a.deployer, &a.alice, U256::from(50)).unwrap();
        ledger.decrease_allowance(&a.deployer, &a.alice, U256::from(30)).unwrap();
        assert_eq!(ledger.allowance(&a.deployer, &a.alice), U256::from(70));

        assert_eq!(
            ledger.decrease_allowance(&a.deployer, &a.alice, U256::from(71)),
            Err(LedgerError::InsufficientAllowance {
                need: U256::from(71),
                have: U256::from(70),
            })
        );

        let values: Vec<U256> = ledger
            .take_events()
            .into_iter()
            .filter_map(|event| match event {
                LedgerEvent::Approval { value, .. } => Some(value),
                _ => None,
            })
            .collect();
        assert_eq!(values, vec![U256::from(50), U256::from(100), U256::from(70)]);
    }

    #[test]
    fn test_transfer_from_consumes_allowance() {
        let (mut ledger, a) = setup(1000);
        ledger.approve(&a.deployer, &a.alice, U256::from(100)).unwrap();
        ledger.take_events();

        ledger
            .transfer_from(&a.alice, &a.deployer, &a.bob, U256::from(20))
            .unwrap();
        ledger
            .transfer_from(&a.alice, &a.deployer, &a.bob, U256::from(20))
            .unwrap();

        assert_eq!(ledger.allowance(&a.deployer, &a.alice), U256::from(60));
        assert_eq!(ledger.balance_of(&a.bob), U256::from(40));
        assert_eq!(ledger.balance_of(&a.deployer), U256::from(960));
        assert!(ledger
            .take_events()
            .iter()
            .all(|event| event.name() == "Transfer"));
    }

    #[test]
    fn test_transfer_from_checks_allowance_first() {
        let (mut ledger, a) = setup(1000);
        ledger.approve(&a.alice, &a.bob, U256::from(10)).unwrap();

        // alice holds nothing, but the allowance error comes first
        assert_eq!(
            ledger.transfer_from(&a.bob, &a.alice, &a.deployer, U256::from(11)),
            Err(LedgerError::InsufficientAllowance {
                need: U256::from(11),
                have: U256::from(10),
            })
        );
        assert_eq!(
            ledger.transfer_from(&a.bob, &a.alice, &a.deployer, U256::from(10)),
            Err(LedgerError::InsufficientBalance {
                need: U256::from(10),
                have: U256::zero(),
            })
        );
        assert_eq!(
            ledger.transfer_from(&a.bob, &a.alice, &Address::zero(), U256::from(10)),
            Err(LedgerError::InvalidRecipient)
        );
        // failed delegated transfers keep the allowance
        assert_eq!(ledger.allowance(&a.alice, &a.bob), U256::from(10));
    }

    #[test]
    fn test_burn_reduces_supply() {
        let (mut ledger, a) = setup(1000);
        ledger.burn(&a.deployer, U256::from(400)).unwrap();

        assert_eq!(ledger.balance_of(&a.deployer), U256::from(600));
        assert_eq!(ledger.total_supply(), U256::from(600));
        assert_eq!(sum_of_balances(&ledger), ledger.total_supply());
        assert_eq!(
            ledger.take_events(),
            vec![LedgerEvent::Burn {
                account: a.deployer,
                value: U256::from(400),
            }]
        );
    }

    #[test]
    fn test_burn_requires_role_and_balance() {
        let (mut ledger, a) = setup(1000);
        ledger.transfer(&a.deployer, &a.alice, U256::from(100)).unwrap();

        assert_eq!(
            ledger.burn(&a.alice, U256::from(10)),
            Err(LedgerError::Unauthorized(a.alice))
        );

        ledger.add_burner(&a.deployer, a.alice).unwrap();
        assert_eq!(
            ledger.burn(&a.alice, U256::from(101)),
            Err(LedgerError::InsufficientBalance {
                need: U256::from(101),
                have: U256::from(100),
            })
        );
        ledger.burn(&a.alice, U256::from(100)).unwrap();
        assert_eq!(ledger.total_supply(), U256::from(900));
    }

    #[test]
    fn test_burner_events() {
        let (mut ledger, a) = setup(1000);
        ledger.add_burner(&a.deployer, a.alice).unwrap();
        ledger.renounce_burner(&a.deployer).unwrap();

        assert_eq!(ledger.burners(), vec![a.alice]);
        assert_eq!(
            ledger.take_events(),
            vec![
                LedgerEvent::BurnerAdded { account: a.alice },
                LedgerEvent::BurnerRemoved {
                    account: a.deployer
                },
            ]
        );
    }

    #[test]
    fn test_native_value_rejected() {
        let (ledger, a) = setup(1000);
        assert_eq!(
            ledger.receive_native(&a.alice, 1),
            Err(LedgerError::NativeValueRejected)
        );
    }
}
