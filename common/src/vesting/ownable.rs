//! Single owner access control for vesting schedules
//!
//! The owner may hand over or renounce ownership. Every change yields an
//! `OwnershipTransferred` event.

use log::debug;
use serde::{Deserialize, Serialize};

use super::error::VestingError;
use crate::{account::Address, event::LedgerEvent};

/// Single owner access control
///
/// `None` once ownership has been renounced; owner-only operations are then
/// permanently unavailable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownable {
    owner: Option<Address>,
}

impl Ownable {
    pub fn new(owner: Address) -> Self {
        Self { owner: Some(owner) }
    }

    pub fn owner(&self) -> Option<Address> {
        self.owner
    }

    /// Returns the owner if `caller` is it
    pub fn ensure_owner(&self, caller: &Address) -> Result<Address, VestingError> {
        match self.owner {
            Some(owner) if owner == *caller => Ok(owner),
            _ => Err(VestingError::Unauthorized(*caller)),
        }
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<LedgerEvent, VestingError> {
        let previous = self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(VestingError::InvalidOwner);
        }
        self.owner = Some(new_owner);
        debug!("Ownership transferred from {} to {}", previous, new_owner);

        Ok(LedgerEvent::OwnershipTransferred {
            previous_owner: Some(previous),
            new_owner: Some(new_owner),
        })
    }

    pub fn renounce_ownership(&mut self, caller: &Address) -> Result<LedgerEvent, VestingError> {
        let previous = self.ensure_owner(caller)?;
        self.owner = None;
        debug!("Ownership renounced by {}", previous);

        Ok(LedgerEvent::OwnershipTransferred {
            previous_owner: Some(previous),
            new_owner: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_ownership() {
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        let mut ownable = Ownable::new(alice);

        assert_eq!(
            ownable.transfer_ownership(&bob, bob),
            Err(VestingError::Unauthorized(bob))
        );
        assert_eq!(
            ownable.transfer_ownership(&alice, Address::zero()),
            Err(VestingError::InvalidOwner)
        );
        let event = ownable.transfer_ownership(&alice, bob).unwrap();
        assert_eq!(
            event,
            LedgerEvent::OwnershipTransferred {
                previous_owner: Some(alice),
                new_owner: Some(bob),
            }
        );
        assert_eq!(ownable.owner(), Some(bob));
        assert!(ownable.ensure_owner(&alice).is_err());
    }

    #[test]
    fn test_renounce_is_final() {
        let alice = Address::from_label("alice");
        let mut ownable = Ownable::new(alice);

        ownable.renounce_ownership(&alice).unwrap();
        assert_eq!(ownable.owner(), None);
        assert_eq!(
            ownable.ensure_owner(&alice),
            Err(VestingError::Unauthorized(alice))
        );
        assert!(ownable.renounce_ownership(&alice).is_err());
    }
}
