//! Account addresses
//!
//! A 20-byte identifier rendered as `0x` followed by 40 hex digits.
//! The all-zero value is the null address: it never holds a balance and is
//! never a valid recipient or spender.

use crate::crypto::sha256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Address length in bytes
pub const ADDRESS_LEN: usize = 20;

/// Address parsing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AddressError {
    #[error("Invalid address: missing 0x prefix")]
    MissingPrefix,
    #[error("Invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
    #[error("Invalid address: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

/// An account identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The null address (`0x000...000`)
    pub const NULL: Address = Address([0u8; ADDRESS_LEN]);

    /// Wrap raw bytes
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive an address from a human label
    ///
    /// Takes the first 20 bytes of SHA-256(label), so the same label always
    /// maps to the same account.
    pub fn derive(label: &str) -> Self {
        let hash = sha256(label.as_bytes());
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&hash[..ADDRESS_LEN]);
        Self(bytes)
    }

    /// Generate a random, non-null address
    pub fn random() -> Self {
        loop {
            let address = Self(rand::random());
            if !address.is_null() {
                return address;
            }
        }
    }

    /// Resolve CLI input: `0x`-prefixed hex is parsed, anything else is
    /// treated as a label and derived.
    pub fn resolve(input: &str) -> Result<Self, AddressError> {
        if input.starts_with("0x") || input.starts_with("0X") {
            input.parse()
        } else {
            Ok(Self::derive(input))
        }
    }

    /// True for the null sentinel
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// First 6 hex digits, for compact display
    pub fn short(&self) -> String {
        format!("0x{}…", &hex::encode(self.0)[..6])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or(AddressError::MissingPrefix)?;

        let bytes = hex::decode(digits)?;
        let bytes: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| AddressError::InvalidLength(b.len()))?;

        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}
