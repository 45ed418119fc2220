//! Fixed supply token
//!
//! - `ledger`: balances, allowances, transfers and burns
//! - `roles`: burner role membership
//! - `types`: token metadata
//! - `error`: ledger error codes

mod error;
mod ledger;
mod roles;
mod types;

pub use error::*;
pub use ledger::*;
pub use roles::*;
pub use types::*;
