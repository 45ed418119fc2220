//! Core invariant checkers
//!
//! - Supply conservation: the balances of a token sum to its total supply
//! - Vesting bounds: `released <= vested <= held + released` for every
//!   schedule and token pair
//! - Vesting monotonicity: the vested amount never decreases over time

use aha_common::{
    time::TimestampSeconds,
    token::{BalanceLedger, TokenLedger},
    vesting::VestingSchedule,
};
use anyhow::{bail, Result};
use primitive_types::U256;

use crate::chain::TestChain;

/// Check that the balances of `ledger` sum to its total supply
pub fn check_supply_conservation(ledger: &BalanceLedger) -> Result<()> {
    let mut sum = U256::zero();
    for (account, balance) in ledger.holders() {
        sum = match sum.checked_add(*balance) {
            Some(sum) => sum,
            None => bail!("Balances of {} overflow at account {}", ledger.address(), account),
        };
    }

    if sum != ledger.total_supply() {
        bail!(
            "Supply conservation violated on {}: balances sum to {}, total supply is {}",
            ledger.address(),
            sum,
            ledger.total_supply()
        );
    }
    Ok(())
}

/// Check the bounds of one schedule on one token at `now`
pub fn check_schedule_bounds(
    schedule: &VestingSchedule,
    ledger: &BalanceLedger,
    now: TimestampSeconds,
) -> Result<()> {
    let token = ledger.address();
    let released = schedule.released(token);
    let vested = schedule.vested_amount(ledger, now)?;
    let held = ledger.balance_of(schedule.address());

    if released > vested {
        bail!(
            "Schedule {} released {} of {} but only {} is vested",
            schedule.address(),
            released,
            token,
            vested
        );
    }
    if vested > held.saturating_add(released) {
        bail!(
            "Schedule {} vests {} of {} but only holds {} with {} released",
            schedule.address(),
            vested,
            token,
            held,
            released
        );
    }
    Ok(())
}

/// Check the bounds of every schedule on every token of `chain`
pub fn check_vesting_bounds(chain: &TestChain) -> Result<()> {
    let now = chain.now();
    for schedule in chain.schedules() {
        for ledger in chain.tokens() {
            check_schedule_bounds(schedule, ledger, now)?;
        }
    }
    Ok(())
}

/// Check that the vested amount never decreases between `from` and `to`,
/// sampling every `step` seconds
pub fn check_vesting_monotonic(
    schedule: &VestingSchedule,
    ledger: &BalanceLedger,
    from: TimestampSeconds,
    to: TimestampSeconds,
    step: TimestampSeconds,
) -> Result<()> {
    if step == 0 {
        bail!("Sampling step must be positive");
    }

    let mut previous = schedule.vested_amount(ledger, from)?;
    let mut t = from;
    while t < to {
        t = t.saturating_add(step).min(to);
        let vested = schedule.vested_amount(ledger, t)?;
        if vested < previous {
            bail!(
                "Vested amount of {} decreased from {} to {} at {}",
                schedule.address(),
                previous,
                vested,
                t
            );
        }
        previous = vested;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aha_common::config::TokenConfig;

    #[test]
    fn test_fresh_chain_holds_invariants() {
        let mut chain = TestChain::new();
        let deployer = chain.account("deployer");
        let alice = chain.account("alice");
        let token = chain.deploy_token(&deployer, &TokenConfig::default());
        chain
            .transfer(&token, &deployer, &alice, U256::from(5))
            .unwrap();
        chain.burn(&token, &deployer, U256::from(7)).unwrap();

        check_supply_conservation(chain.token(&token).unwrap()).unwrap();
        check_vesting_bounds(&chain).unwrap();
    }

    #[test]
    fn test_zero_step_is_rejected() {
        let mut chain = TestChain::new();
        let deployer = chain.account("deployer");
        let beneficiary = chain.account("beneficiary");
        let token = chain.deploy_token(&deployer, &TokenConfig::default());
        let schedule = chain
            .deploy_vesting_config(
                &deployer,
                &aha_common::config::VestingConfig::new(beneficiary),
            )
            .unwrap();

        let schedule = chain.schedule(&schedule).unwrap();
        let ledger = chain.token(&token).unwrap();
        assert!(check_vesting_monotonic(schedule, ledger, 0, 10, 0).is_err());
        assert!(check_vesting_monotonic(schedule, ledger, 0, 10_000, 7).is_ok());
    }
}
