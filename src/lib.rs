//! Token Ledger: an ERC-20 style fungible token ledger in Rust
//!
//! This crate provides:
//! - A fixed-supply token with name, symbol and decimals metadata
//! - Balances and allowances keyed by 20-byte addresses
//! - Transfer, approve and delegated transfer operations that are atomic
//! - Transfer and Approval events, journaled with sequence numbers
//! - A thread-safe host that serializes mutations
//! - JSON persistence with backups and invariant checks on load
//!
//! # Example
//!
//! ```rust
//! use token_ledger::token::{Address, Ledger};
//!
//! let deployer = Address::derive("deployer");
//! let exchange = Address::derive("exchange");
//! let receiver = Address::derive("receiver");
//!
//! let mut ledger = Ledger::with_defaults("SYZYGY", "CZG", 1_000_000, deployer).unwrap();
//!
//! ledger.approve(deployer, exchange, 500).unwrap();
//! ledger.transfer_from(exchange, deployer, receiver, 200).unwrap();
//!
//! assert_eq!(ledger.balance_of(&receiver), 200);
//! assert_eq!(ledger.allowance(&deployer, &exchange), 300);
//! assert!(ledger.check_invariants().is_ok());
//! ```

pub mod cli;
pub mod config;
pub mod crypto;
pub mod storage;
pub mod token;

// Re-export commonly used types
pub use config::{ConfigError, LedgerConfig};
pub use storage::{Storage, StorageConfig, StorageError};
pub use token::{
    Address, Amount, Call, EventRecord, GenesisError, Ledger, LedgerError, LedgerEvent,
    LedgerHost, TokenMetadata,
};
