//! Linear Vesting Schedule
//!
//! A schedule holds tokens in its own ledger account on behalf of a
//! beneficiary. Entitlement is computed lazily from the clock value handed
//! to each call:
//!
//! ```text
//! total  = balance held by the schedule + released
//! vested = 0                                 now < cliff
//!        = total * (now - start) / duration  cliff <= now < start + duration
//!        = total                             now >= start + duration
//! ```
//!
//! Revoking a token freezes its vested amount at the revocation instant and
//! returns the unvested remainder to the owner.

use std::collections::HashMap;

use log::debug;
use primitive_types::{U256, U512};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use super::{error::VestingError, ownable::Ownable};
use crate::{
    account::Address,
    config::VestingConfig,
    event::LedgerEvent,
    time::TimestampSeconds,
    token::TokenLedger,
};

/// Validated-on-construction schedule parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingParams {
    pub beneficiary: Address,
    pub start: TimestampSeconds,
    pub cliff_duration: TimestampSeconds,
    pub duration: TimestampSeconds,
    pub revocable: bool,
}

impl VestingParams {
    /// Resolve a deployment config, starting now when no start is given
    pub fn from_config(config: &VestingConfig, now: TimestampSeconds) -> Self {
        Self {
            beneficiary: config.beneficiary,
            start: config.start.unwrap_or(now),
            cliff_duration: config.cliff_duration,
            duration: config.duration,
            revocable: config.revocable,
        }
    }
}

/// Time-derived state of a schedule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, IntoStaticStr)]
pub enum VestingPhase {
    /// Before the cliff, nothing is releasable
    Pending,
    /// Between the cliff and the end, entitlement grows linearly
    Vesting,
    /// At or after the end, everything is vested
    FullyVested,
}

/// Phase of a schedule for one token, plus the revocation flag
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingStatus {
    pub phase: VestingPhase,
    pub revoked: bool,
}

/// Linear vesting of `total * elapsed / duration`, rounded down
///
/// The product is taken in 512 bits so it cannot overflow.
pub fn linear_vested(
    total: U256,
    start: TimestampSeconds,
    cliff: TimestampSeconds,
    duration: TimestampSeconds,
    now: TimestampSeconds,
) -> U256 {
    if now < cliff {
        return U256::zero();
    }

    let elapsed = now.saturating_sub(start);
    if elapsed >= duration {
        return total;
    }

    let vested = total.full_mul(U256::from(elapsed)) / U512::from(duration);
    // elapsed < duration so the quotient is below total
    U256::try_from(vested).unwrap_or(total)
}

#[derive(Clone, Debug)]
pub struct VestingSchedule {
    address: Address,
    ownable: Ownable,
    beneficiary: Address,
    start: TimestampSeconds,
    cliff: TimestampSeconds,
    duration: TimestampSeconds,
    revocable: bool,
    // token => cumulative released amount
    released: HashMap<Address, U256>,
    // token => vested amount frozen at revocation
    revoked: HashMap<Address, U256>,
    events: Vec<LedgerEvent>,
}

impl VestingSchedule {
    /// Create a schedule owned by `owner` (the funder)
    ///
    /// Fails if the beneficiary is zero, the cliff is longer than the
    /// duration, the duration is zero, or the schedule already ended at `now`.
    pub fn new(
        address: Address,
        owner: Address,
        params: VestingParams,
        now: TimestampSeconds,
    ) -> Result<Self, VestingError> {
        if params.beneficiary.is_zero() {
            return Err(VestingError::InvalidScheduleParameters(
                "beneficiary is the zero address",
            ));
        }
        if params.cliff_duration > params.duration {
            return Err(VestingError::InvalidScheduleParameters(
                "cliff is longer than duration",
            ));
        }
        if params.duration == 0 {
            return Err(VestingError::InvalidScheduleParameters("duration is zero"));
        }

        let end = params
            .start
            .checked_add(params.duration)
            .ok_or(VestingError::InvalidScheduleParameters("end time overflows"))?;
        if end <= now {
            return Err(VestingError::InvalidScheduleParameters(
                "final time is before current time",
            ));
        }

        // cliff_duration <= duration, so this cannot overflow either
        let cliff = params.start + params.cliff_duration;

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Vesting schedule {} for {}: start {}, cliff {}, end {}, revocable {}",
                address, params.beneficiary, params.start, cliff, end, params.revocable
            );
        }

        Ok(Self {
            address,
            ownable: Ownable::new(owner),
            beneficiary: params.beneficiary,
            start: params.start,
            cliff,
            duration: params.duration,
            revocable: params.revocable,
            released: HashMap::new(),
            revoked: HashMap::new(),
            events: vec![LedgerEvent::OwnershipTransferred {
                previous_owner: None,
                new_owner: Some(owner),
            }],
        })
    }

    // ===== Queries =====

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn owner(&self) -> Option<Address> {
        self.ownable.owner()
    }

    pub fn beneficiary(&self) -> &Address {
        &self.beneficiary
    }

    pub fn start(&self) -> TimestampSeconds {
        self.start
    }

    pub fn cliff(&self) -> TimestampSeconds {
        self.cliff
    }

    pub fn duration(&self) -> TimestampSeconds {
        self.duration
    }

    pub fn end(&self) -> TimestampSeconds {
        // validated at construction
        self.start.saturating_add(self.duration)
    }

    pub fn revocable(&self) -> bool {
        self.revocable
    }

    pub fn released(&self, token: &Address) -> U256 {
        self.released.get(token).copied().unwrap_or_default()
    }

    pub fn revoked(&self, token: &Address) -> bool {
        self.revoked.contains_key(token)
    }

    pub fn phase(&self, now: TimestampSeconds) -> VestingPhase {
        if now < self.cliff {
            VestingPhase::Pending
        } else if now < self.end() {
            VestingPhase::Vesting
        } else {
            VestingPhase::FullyVested
        }
    }

    pub fn status(&self, token: &Address, now: TimestampSeconds) -> VestingStatus {
        VestingStatus {
            phase: self.phase(now),
            revoked: self.revoked(token),
        }
    }

    /// Amount of `ledger`'s token vested at `now`, released or not
    pub fn vested_amount<L: TokenLedger>(
        &self,
        ledger: &L,
        now: TimestampSeconds,
    ) -> Result<U256, VestingError> {
        let token = ledger.address();
        if let Some(frozen) = self.revoked.get(token) {
            return Ok(*frozen);
        }

        let total = ledger
            .balance_of(&self.address)
            .checked_add(self.released(token))
            .ok_or(VestingError::Overflow)?;
        Ok(linear_vested(total, self.start, self.cliff, self.duration, now))
    }

    /// Vested but not yet released amount at `now`
    pub fn releasable_amount<L: TokenLedger>(
        &self,
        ledger: &L,
        now: TimestampSeconds,
    ) -> Result<U256, VestingError> {
        let vested = self.vested_amount(ledger, now)?;
        // released never exceeds what was vested when it was released
        Ok(vested.saturating_sub(self.released(ledger.address())))
    }

    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // ===== Mutations =====

    /// Transfer everything releasable to the beneficiary. Anyone may call.
    pub fn release<L: TokenLedger>(
        &mut self,
        ledger: &mut L,
        now: TimestampSeconds,
    ) -> Result<U256, VestingError> {
        let token = *ledger.address();
        let amount = self.releasable_amount(&*ledger, now)?;
        if amount.is_zero() {
            return Err(VestingError::NothingToRelease);
        }

        let previous = self.released(&token);
        let released = previous
            .checked_add(amount)
            .ok_or(VestingError::Overflow)?;

        // Record the release before moving any token
        self.released.insert(token, released);
        if let Err(e) = ledger.transfer(&self.address, &self.beneficiary, amount) {
            self.set_released(token, previous);
            return Err(e.into());
        }

        self.events.push(LedgerEvent::TokensReleased { token, amount });

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Released {} of token {} to {}, {} released in total",
                amount, token, self.beneficiary, released
            );
        }
        Ok(amount)
    }

    /// Stop vesting `ledger`'s token and return the unvested part to the owner
    ///
    /// Tokens already vested but not released stay claimable by the
    /// beneficiary. Returns the refunded amount.
    pub fn revoke<L: TokenLedger>(
        &mut self,
        caller: &Address,
        ledger: &mut L,
        now: TimestampSeconds,
    ) -> Result<U256, VestingError> {
        let owner = self.ownable.ensure_owner(caller)?;
        if !self.revocable {
            return Err(VestingError::NotRevocable);
        }

        let token = *ledger.address();
        if self.revoked(&token) {
            return Err(VestingError::AlreadyRevoked(token));
        }

        let balance = ledger.balance_of(&self.address);
        let vested = self.vested_amount(&*ledger, now)?;
        let unreleased = vested.saturating_sub(self.released(&token));
        let refund = balance
            .checked_sub(unreleased)
            .ok_or(VestingError::Overflow)?;

        // Freeze the entitlement before moving any token
        self.revoked.insert(token, vested);
        if let Err(e) = ledger.transfer(&self.address, &owner, refund) {
            self.revoked.remove(&token);
            return Err(e.into());
        }

        self.events.push(LedgerEvent::TokenVestingRevoked { token });

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Revoked token {} on {}: refunded {} to {}, {} stays vested",
                token, self.address, refund, owner, vested
            );
        }
        Ok(refund)
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<(), VestingError> {
        let event = self.ownable.transfer_ownership(caller, new_owner)?;
        self.events.push(event);
        Ok(())
    }

    pub fn renounce_ownership(&mut self, caller: &Address) -> Result<(), VestingError> {
        let event = self.ownable.renounce_ownership(caller)?;
        self.events.push(event);
        Ok(())
    }

    fn set_released(&mut self, token: Address, value: U256) {
        if value.is_zero() {
            self.released.remove(&token);
        } else {
            self.released.insert(token, value);
        }
    }
}
