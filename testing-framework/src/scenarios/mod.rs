//! DSL scenario parser and executor
//!
//! Parses YAML scenario files describing a token deployment, its vesting
//! schedules and a sequence of calls, time jumps and assertions:
//! - Amounts are integers, or decimal strings when they exceed `u64`
//! - Mutating steps may carry `expect_error: <ErrorKind>`
//! - `zero` names the zero address and `token` the deployed token
//!
//! ## Example Scenario
//!
//! ```yaml
//! name: "Revoke halfway"
//! genesis:
//!   accounts: ["owner", "beneficiary"]
//!   vesting:
//!     - name: "grant"
//!       beneficiary: "beneficiary"
//!       cliff_duration: 31536000
//!       duration: 63072000
//!       amount: 1000
//! steps:
//!   - action: "increase_to"
//!     offset: 47304000
//!   - action: "revoke"
//!     schedule: "grant"
//!     caller: "owner"
//!   - action: "release"
//!     schedule: "grant"
//!   - action: "assert_balance"
//!     account: "beneficiary"
//!     eq: 750
//!   - action: "revoke"
//!     schedule: "grant"
//!     caller: "owner"
//!     expect_error: "AlreadyRevoked"
//! invariants:
//!   - "supply_conservation"
//!   - "vesting_bounds"
//! ```

pub mod executor;
pub mod parser;

pub use executor::{ExecutionReport, ScenarioExecutor};
pub use parser::{parse_scenario, Amount, Step, TestScenario};
