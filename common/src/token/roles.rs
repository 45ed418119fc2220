//! Token Role System
//!
//! Explicit membership sets for capabilities on the ledger. Membership is
//! granted by existing members and can only be given up by the holder.

use indexmap::IndexSet;
use log::trace;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use crate::account::Address;

/// Burner role - can destroy its own tokens
pub const BURNER_ROLE: &str = "BURNER";

/// Members of a single role, kept in grant order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRegistry {
    name: String,
    members: IndexSet<Address>,
}

impl RoleRegistry {
    /// Create the role with its first holder
    pub fn new(name: &str, initial: Address) -> Self {
        let mut members = IndexSet::new();
        members.insert(initial);
        Self {
            name: name.to_owned(),
            members,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_member(&self, account: &Address) -> bool {
        self.members.contains(account)
    }

    pub fn members(&self) -> impl Iterator<Item = &Address> {
        self.members.iter()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Grant the role to `account` on behalf of an existing member
    pub fn add(&mut self, caller: &Address, account: Address) -> Result<(), LedgerError> {
        if !self.is_member(caller) {
            return Err(LedgerError::Unauthorized(*caller));
        }
        if account.is_zero() {
            return Err(LedgerError::InvalidAccount);
        }
        if !self.members.insert(account) {
            return Err(LedgerError::RoleAlreadyHeld(account));
        }
        trace!("{} role granted to {} by {}", self.name, account, caller);
        Ok(())
    }

    /// Give up the caller's own membership
    pub fn renounce(&mut self, caller: &Address) -> Result<(), LedgerError> {
        // shift_remove keeps the grant order of the remaining members
        if !self.members.shift_remove(caller) {
            return Err(LedgerError::RoleNotHeld(*caller));
        }
        trace!("{} role renounced by {}", self.name, caller);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accounts() -> (Address, Address, Address) {
        (
            Address::from_label("deployer"),
            Address::from_label("alice"),
            Address::from_label("bob"),
        )
    }

    #[test]
    fn test_first_holder_is_member() {
        let (deployer, alice, _) = accounts();
        let roles = RoleRegistry::new(BURNER_ROLE, deployer);
        assert!(roles.is_member(&deployer));
        assert!(!roles.is_member(&alice));
        assert_eq!(roles.len(), 1);
        assert_eq!(roles.name(), "BURNER");
    }

    #[test]
    fn test_only_members_can_grant() {
        let (deployer, alice, bob) = accounts();
        let mut roles = RoleRegistry::new(BURNER_ROLE, deployer);

        assert_eq!(roles.add(&alice, bob), Err(LedgerError::Unauthorized(alice)));
        roles.add(&deployer, alice).unwrap();
        roles.add(&alice, bob).unwrap();
        assert_eq!(
            roles.members().copied().collect::<Vec<_>>(),
            vec![deployer, alice, bob]
        );
    }

    #[test]
    fn test_grant_guards() {
        let (deployer, alice, _) = accounts();
        let mut roles = RoleRegistry::new(BURNER_ROLE, deployer);

        assert_eq!(
            roles.add(&deployer, Address::zero()),
            Err(LedgerError::InvalidAccount)
        );
        roles.add(&deployer, alice).unwrap();
        assert_eq!(
            roles.add(&deployer, alice),
            Err(LedgerError::RoleAlreadyHeld(alice))
        );
    }

    #[test]
    fn test_renounce_own_membership_only() {
        let (deployer, alice, bob) = accounts();
        let mut roles = RoleRegistry::new(BURNER_ROLE, deployer);
        roles.add(&deployer, alice).unwrap();
        roles.add(&deployer, bob).unwrap();

        roles.renounce(&alice).unwrap();
        assert!(!roles.is_member(&alice));
        assert_eq!(roles.renounce(&alice), Err(LedgerError::RoleNotHeld(alice)));
        assert_eq!(
            roles.members().copied().collect::<Vec<_>>(),
            vec![deployer, bob]
        );

        // the last holder may leave, after which nobody can grant again
        roles.renounce(&deployer).unwrap();
        roles.renounce(&bob).unwrap();
        assert!(roles.is_empty());
        assert_eq!(
            roles.add(&deployer, alice),
            Err(LedgerError::Unauthorized(deployer))
        );
    }
}
