//! ERC-20 style fungible token ledger
//!
//! Provides:
//! - Balances per address, with a fixed total supply
//! - Allowances for delegated transfers
//! - Transfer, approve and transfer-from operations that either fully apply
//!   or leave state untouched
//! - A thread-safe host that journals emitted events
//!
//! # Example
//!
//! ```
//! use token_ledger::token::{Address, Ledger, LedgerHost};
//!
//! let deployer = Address::derive("deployer");
//! let receiver = Address::derive("receiver");
//!
//! // 1,000,000 tokens with 18 decimals, all owned by the deployer
//! let ledger = Ledger::with_defaults("SYZYGY", "CZG", 1_000_000, deployer).unwrap();
//! let host = LedgerHost::new(ledger);
//!
//! let record = host.transfer(deployer, receiver, 100).unwrap();
//! assert_eq!(record.event.name(), "Transfer");
//! assert_eq!(host.balance_of(&receiver), 100);
//! ```

pub mod address;
pub mod event;
pub mod host;
pub mod ledger;
pub mod units;

pub use address::{Address, AddressError};
pub use event::{ApprovalEvent, LedgerEvent, TransferEvent};
pub use host::{
    Call, EventJournal, EventRecord, HostSnapshot, JournalError, LedgerHost, DEFAULT_HISTORY_LIMIT,
};
pub use ledger::{GenesisError, InvariantViolation, Ledger, LedgerError, TokenMetadata};
pub use units::{format_units, parse_units, Amount, UnitsError, DEFAULT_DECIMALS};
