pub mod account;
pub mod config;
pub mod event;
pub mod logger;
pub mod time;
pub mod token;
pub mod vesting;
