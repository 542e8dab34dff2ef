//! Ledger events
//!
//! Every successful mutation returns exactly one event. The host decides what
//! to do with it (journal, relay, print); the ledger itself never emits I/O.

use crate::token::address::Address;
use crate::token::units::{amount_string, Amount};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Transfer event (emitted by `transfer` and `transfer_from`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    #[serde(with = "amount_string")]
    pub value: Amount,
}

/// Approval event (emitted by `approve`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    pub owner: Address,
    pub spender: Address,
    #[serde(with = "amount_string")]
    pub value: Amount,
}

/// Tagged event payload returned from every ledger mutation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    Transfer(TransferEvent),
    Approval(ApprovalEvent),
}

impl LedgerEvent {
    /// Event name as it appears in logs and the journal
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::Transfer(_) => "Transfer",
            LedgerEvent::Approval(_) => "Approval",
        }
    }

    /// Amount carried by the event
    pub fn value(&self) -> Amount {
        match self {
            LedgerEvent::Transfer(e) => e.value,
            LedgerEvent::Approval(e) => e.value,
        }
    }

    pub fn as_transfer(&self) -> Option<&TransferEvent> {
        match self {
            LedgerEvent::Transfer(e) => Some(e),
            LedgerEvent::Approval(_) => None,
        }
    }

    pub fn as_approval(&self) -> Option<&ApprovalEvent> {
        match self {
            LedgerEvent::Approval(e) => Some(e),
            LedgerEvent::Transfer(_) => None,
        }
    }
}

impl From<TransferEvent> for LedgerEvent {
    fn from(event: TransferEvent) -> Self {
        LedgerEvent::Transfer(event)
    }
}

impl From<ApprovalEvent> for LedgerEvent {
    fn from(event: ApprovalEvent) -> Self {
        LedgerEvent::Approval(event)
    }
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEvent::Transfer(e) => {
                write!(f, "Transfer(from={}, to={}, value={})", e.from, e.to, e.value)
            }
            LedgerEvent::Approval(e) => write!(
                f,
                "Approval(owner={}, spender={}, value={})",
                e.owner, e.spender, e.value
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let from = Address::derive("deployer");
        let to = Address::derive("receiver");
        let event: LedgerEvent = TransferEvent { from, to, value: 100 }.into();

        assert_eq!(event.name(), "Transfer");
        assert_eq!(event.value(), 100);
        assert_eq!(event.as_transfer().unwrap().to, to);
        assert!(event.as_approval().is_none());
    }

    #[test]
    fn test_event_json_is_tagged() {
        let event = LedgerEvent::Approval(ApprovalEvent {
            owner: Address::derive("deployer"),
            spender: Address::derive("exchange"),
            value: 5,
        });

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "Approval");
        assert_eq!(json["owner"], Address::derive("deployer").to_string());
        assert_eq!(json["value"], "5");

        let back: LedgerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_large_values_survive_json() {
        let event = LedgerEvent::Transfer(TransferEvent {
            from: Address::derive("deployer"),
            to: Address::derive("receiver"),
            value: u128::MAX,
        });

        let json = serde_json::to_string(&event).unwrap();
        let back: LedgerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.value(), u128::MAX);
    }
}
