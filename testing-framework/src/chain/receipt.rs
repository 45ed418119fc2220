// File: testing-framework/src/chain/receipt.rs

use aha_common::{event::EmittedEvent, time::TimestampSeconds};
use serde::{Deserialize, Serialize};

/// Outcome of a successful call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallReceipt {
    /// Block the call was included in
    pub block: u64,
    /// Clock value the call executed at
    pub timestamp: TimestampSeconds,
    /// Events in emission order
    pub events: Vec<EmittedEvent>,
}

impl CallReceipt {
    /// Names of the emitted events, in order
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.iter().map(|e| e.event.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aha_common::{account::Address, event::LedgerEvent};

    #[test]
    fn test_receipt_json() {
        let receipt = CallReceipt {
            block: 7,
            timestamp: 1_700_000_000,
            events: vec![EmittedEvent {
                contract: Address::from_label("vesting"),
                event: LedgerEvent::TokenVestingRevoked {
                    token: Address::from_label("token"),
                },
            }],
        };

        let json = serde_json::to_value(&receipt).unwrap();
        assert_eq!(json["block"], 7);
        assert_eq!(json["events"][0]["event"]["event"], "TokenVestingRevoked");
        assert_eq!(receipt.event_names(), vec!["TokenVestingRevoked"]);

        let back: CallReceipt = serde_json::from_value(json).unwrap();
        assert_eq!(back, receipt);
    }
}
