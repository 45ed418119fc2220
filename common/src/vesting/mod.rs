//! Token vesting
//!
//! Linear release of tokens held by a schedule, with an optional
//! owner-triggered revocation per token.

mod error;
mod ownable;
mod schedule;

pub use error::*;
pub use ownable::Ownable;
pub use schedule::*;
