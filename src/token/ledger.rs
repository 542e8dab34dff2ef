//! ERC-20 style ledger
//!
//! Owns balances, allowances, total supply and token metadata. Every
//! mutating operation validates all of its preconditions before touching
//! state, so a failed call leaves the ledger exactly as it was.

use crate::crypto::sha256_hex;
use crate::token::address::Address;
use crate::token::event::{ApprovalEvent, LedgerEvent, TransferEvent};
use crate::token::units::{self, Amount, DEFAULT_DECIMALS, MAX_DECIMALS};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use thiserror::Error;

/// Operation errors
///
/// All of these are caller errors: the inputs do not fit the current state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: Amount, need: Amount },
    #[error("Allowance exceeded: have {have}, need {need}")]
    AllowanceExceeded { have: Amount, need: Amount },
    #[error("Invalid recipient: cannot transfer to the null address")]
    InvalidRecipient,
    #[error("Invalid spender: cannot approve the null address")]
    InvalidSpender,
}

/// Construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenesisError {
    #[error("Invalid name: must be 1-50 characters")]
    InvalidName,
    #[error("Invalid symbol: must be 1-10 characters")]
    InvalidSymbol,
    #[error("Invalid decimals: must be 0-18")]
    InvalidDecimals,
    #[error("Initial supply {initial_supply} overflows with {decimals} decimals")]
    SupplyOverflow { initial_supply: u128, decimals: u8 },
    #[error("Creator cannot be the null address")]
    NullCreator,
}

/// Reported when stored state breaks a ledger invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("Balances sum to {actual}, total supply is {expected}")]
    SupplyMismatch { expected: Amount, actual: Amount },
    #[error("Balances overflow the integer range")]
    BalanceOverflow,
    #[error("Null address holds a balance of {0}")]
    NullAddressBalance(Amount),
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(GenesisError),
    #[error("Creator is the null address")]
    NullCreator,
}

/// Token metadata (immutable after creation)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenMetadata {
    /// Token name (e.g., "SYZYGY")
    name: String,
    /// Token symbol (e.g., "CZG")
    symbol: String,
    /// Decimal places (usually 18)
    decimals: u8,
}

impl TokenMetadata {
    /// Create new token metadata with validation
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
    ) -> Result<Self, GenesisError> {
        let name = name.into();
        let symbol = symbol.into();

        let name_len = name.chars().count();
        if name_len == 0 || name_len > 50 {
            return Err(GenesisError::InvalidName);
        }

        let symbol_len = symbol.chars().count();
        if symbol_len == 0 || symbol_len > 10 {
            return Err(GenesisError::InvalidSymbol);
        }

        if decimals > MAX_DECIMALS {
            return Err(GenesisError::InvalidDecimals);
        }

        Ok(Self {
            name,
            symbol,
            decimals,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }
}

/// A fungible-token ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    metadata: TokenMetadata,
    /// Fixed at construction
    total_supply: Amount,
    /// Account that received the initial supply
    creator: Address,
    /// Balances: address -> amount (zero balances are not stored)
    balances: HashMap<Address, Amount>,
    /// Allowances: owner -> (spender -> amount) (zero allowances are not stored)
    allowances: HashMap<Address, HashMap<Address, Amount>>,
}

impl Ledger {
    /// Create a ledger with the whole supply credited to `creator`
    ///
    /// `initial_supply` is in whole tokens and is scaled by `10^decimals`.
    pub fn new(
        metadata: TokenMetadata,
        initial_supply: u128,
        creator: Address,
    ) -> Result<Self, GenesisError> {
        if creator.is_null() {
            return Err(GenesisError::NullCreator);
        }

        let total_supply = units::scale(initial_supply, metadata.decimals).ok_or(
            GenesisError::SupplyOverflow {
                initial_supply,
                decimals: metadata.decimals,
            },
        )?;

        let mut balances = HashMap::new();
        if total_supply > 0 {
            balances.insert(creator, total_supply);
        }

        Ok(Self {
            metadata,
            total_supply,
            creator,
            balances,
            allowances: HashMap::new(),
        })
    }

    /// Create a ledger with the conventional 18 decimals
    pub fn with_defaults(
        name: impl Into<String>,
        symbol: impl Into<String>,
        initial_supply: u128,
        creator: Address,
    ) -> Result<Self, GenesisError> {
        let metadata = TokenMetadata::new(name, symbol, DEFAULT_DECIMALS)?;
        Self::new(metadata, initial_supply, creator)
    }

    // =========================================================================
    // View Functions
    // =========================================================================

    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    pub fn symbol(&self) -> &str {
        self.metadata.symbol()
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals()
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn creator(&self) -> Address {
        self.creator
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Balance of an address (0 if never credited)
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Amount `spender` may still move out of `owner`'s balance
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Accounts with a non-zero balance, largest first
    pub fn holders(&self) -> Vec<(Address, Amount)> {
        let mut holders: Vec<(Address, Amount)> = self
            .balances
            .iter()
            .filter(|(_, &b)| b > 0)
            .map(|(a, b)| (*a, *b))
            .collect();
        holders.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        holders
    }

    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|&&b| b > 0).count()
    }

    // =========================================================================
    // Mutating Functions
    // =========================================================================

    /// Move `amount` from `from` to `to`
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<LedgerEvent, LedgerError> {
        if to.is_null() {
            return Err(LedgerError::InvalidRecipient);
        }

        let have = self.balance_of(&from);
        if have < amount {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }

        self.move_balance(from, to, amount);

        Ok(TransferEvent {
            from,
            to,
            value: amount,
        }
        .into())
    }

    /// Set the allowance of `spender` over `owner`'s balance
    ///
    /// Overwrites any previous allowance; zero revokes it.
    pub fn approve(
        &mut self,
        owner: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<LedgerEvent, LedgerError> {
        if spender.is_null() {
            return Err(LedgerError::InvalidSpender);
        }

        self.set_allowance(owner, spender, amount);

        Ok(ApprovalEvent {
            owner,
            spender,
            value: amount,
        }
        .into())
    }

    /// Move `amount` from `owner` to `to` on behalf of `spender`
    ///
    /// Checks recipient, then allowance, then balance.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        owner: Address,
        to: Address,
        amount: Amount,
    ) -> Result<LedgerEvent, LedgerError> {
        if to.is_null() {
            return Err(LedgerError::InvalidRecipient);
        }

        let allowed = self.allowance(&owner, &spender);
        if allowed < amount {
            return Err(LedgerError::AllowanceExceeded {
                have: allowed,
                need: amount,
            });
        }

        let have = self.balance_of(&owner);
        if have < amount {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }

        self.set_allowance(owner, spender, allowed - amount);
        self.move_balance(owner, to, amount);

        Ok(TransferEvent {
            from: owner,
            to,
            value: amount,
        }
        .into())
    }

    // =========================================================================
    // Integrity
    // =========================================================================

    /// Re-run the construction guards and recompute the supply invariants
    /// from stored balances
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        TokenMetadata::new(
            self.metadata.name.as_str(),
            self.metadata.symbol.as_str(),
            self.metadata.decimals,
        )
        .map_err(InvariantViolation::InvalidMetadata)?;

        if self.creator.is_null() {
            return Err(InvariantViolation::NullCreator);
        }

        let null_balance = self.balance_of(&Address::NULL);
        if null_balance > 0 {
            return Err(InvariantViolation::NullAddressBalance(null_balance));
        }

        let actual = self
            .balances
            .values()
            .try_fold(0u128, |sum, b| sum.checked_add(*b))
            .ok_or(InvariantViolation::BalanceOverflow)?;

        if actual != self.total_supply {
            return Err(InvariantViolation::SupplyMismatch {
                expected: self.total_supply,
                actual,
            });
        }

        Ok(())
    }

    /// SHA-256 over a canonical encoding of the observable state
    ///
    /// Ledgers with the same metadata, supply, balances and allowances have
    /// the same digest regardless of map ordering.
    pub fn state_digest(&self) -> String {
        let balances: BTreeMap<&Address, &Amount> =
            self.balances.iter().filter(|(_, &b)| b > 0).collect();
        let allowances: BTreeMap<(&Address, &Address), &Amount> = self
            .allowances
            .iter()
            .flat_map(|(owner, spenders)| {
                spenders
                    .iter()
                    .filter(|(_, &a)| a > 0)
                    .map(move |(spender, amount)| ((owner, spender), amount))
            })
            .collect();

        let mut canonical = format!(
            "{}|{}|{}|{}\n",
            self.metadata.name, self.metadata.symbol, self.metadata.decimals, self.total_supply
        );
        for (account, amount) in balances {
            let _ = writeln!(canonical, "b|{}|{}", account, amount);
        }
        for ((owner, spender), amount) in allowances {
            let _ = writeln!(canonical, "a|{}|{}|{}", owner, spender, amount);
        }

        sha256_hex(canonical.as_bytes())
    }

    // ---- internals ----

    fn set_balance(&mut self, account: Address, amount: Amount) {
        if amount == 0 {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, amount);
        }
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        if amount == 0 {
            if let Some(spenders) = self.allowances.get_mut(&owner) {
                spenders.remove(&spender);
                if spenders.is_empty() {
                    self.allowances.remove(&owner);
                }
            }
        } else {
            self.allowances
                .entry(owner)
                .or_default()
                .insert(spender, amount);
        }
    }

    /// Caller has already checked `balance_of(from) >= amount`. The credit
    /// cannot overflow: every balance is bounded by total supply.
    fn move_balance(&mut self, from: Address, to: Address, amount: Amount) {
        let from_balance = self.balance_of(&from) - amount;
        self.set_balance(from, from_balance);

        let to_balance = self.balance_of(&to) + amount;
        self.set_balance(to, to_balance);
    }
}
