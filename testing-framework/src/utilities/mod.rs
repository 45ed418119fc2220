//! Shared test helpers
//!
//! Event assertions modelled on `expectEvent.inLogs`, and amount helpers.

use aha_common::event::{EmittedEvent, LedgerEvent};
use anyhow::{bail, Context, Result};
use primitive_types::U256;

use crate::chain::CallReceipt;

/// First event named `name` in `events`
pub fn find_event<'a>(events: &'a [EmittedEvent], name: &str) -> Option<&'a LedgerEvent> {
    events
        .iter()
        .map(|e| &e.event)
        .find(|event| event.name() == name)
}

/// Assert that `receipt` contains exactly `expected`
///
/// On failure the error lists the events that were emitted.
pub fn expect_event<'a>(receipt: &'a CallReceipt, expected: &LedgerEvent) -> Result<&'a EmittedEvent> {
    match receipt.events.iter().find(|e| e.event == *expected) {
        Some(found) => Ok(found),
        None => bail!(
            "Event {:?} not found in block {}, emitted: {:?}",
            expected,
            receipt.block,
            receipt.events
        ),
    }
}

/// Assert that `receipt` emitted no event named `name`
pub fn expect_no_event(receipt: &CallReceipt, name: &str) -> Result<()> {
    if find_event(&receipt.events, name).is_some() {
        bail!("Unexpected {} event in block {}", name, receipt.block);
    }
    Ok(())
}

/// Parse a decimal amount, e.g. `"15000000000000000000000000000"`
pub fn parse_amount(value: &str) -> Result<U256> {
    U256::from_dec_str(value)
        .map_err(|e| anyhow::anyhow!("{:?}", e))
        .with_context(|| format!("Invalid amount '{}'", value))
}

/// `units` whole tokens with `decimals` decimals
pub fn tokens(units: u64, decimals: u8) -> U256 {
    U256::from(units) * U256::exp10(decimals as usize)
}
