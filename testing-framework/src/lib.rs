//! # Aha Testing Framework
//!
//! Deterministic, in-process environment for the Aha token ledger and the
//! linear vesting schedules.
//!
//! ## Quick Start
//!
//! ```rust
//! use aha_common::{config::TokenConfig, time::duration};
//! use aha_testing_framework::prelude::*;
//! use primitive_types::U256;
//!
//! let mut env = DeterministicTestEnv::new();
//! let owner = env.chain.account("owner");
//! let alice = env.chain.account("alice");
//! let token = env.chain.deploy_token(&owner, &TokenConfig::default());
//!
//! env.chain.transfer(&token, &owner, &alice, U256::from(10_000)).unwrap();
//! env.chain.increase_time(duration::days(1));
//! assert_eq!(env.chain.balance_of(&token, &alice).unwrap(), U256::from(10_000));
//! ```
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: the manual clock is the only source of time
//! 2. **Atomic**: a rejected call leaves no state change and no event
//! 3. **Checked**: invariant checkers run after any sequence of calls

#![warn(clippy::all)]

/// Simulated ledger environment
pub mod chain;

/// Manual clock and test environment
pub mod orchestrator;

/// Shared helpers (event assertions, amounts)
pub mod utilities;

// Core invariant checkers (supply conservation, vesting bounds)
pub mod invariants;

// DSL scenario parser and executor
pub mod scenarios;

/// Convenient re-exports for common usage
pub mod prelude {
    pub use crate::chain::{CallError, CallReceipt, Deployment, TestChain};
    pub use crate::invariants::{check_supply_conservation, check_vesting_bounds};
    pub use crate::orchestrator::{DeterministicTestEnv, ManualClock, GENESIS_TIMESTAMP};
    pub use crate::utilities::{expect_event, find_event};
}

pub use chain::TestChain;
pub use orchestrator::{DeterministicTestEnv, ManualClock};
