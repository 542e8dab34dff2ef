//! Fixed-point amount conversion
//!
//! Amounts on the ledger are integers scaled by `10^decimals`. These helpers
//! move between that representation and the human-scale strings a user types.

use thiserror::Error;

/// Raw token amount (scaled by `10^decimals`)
pub type Amount = u128;

/// Conventional number of decimal places
pub const DEFAULT_DECIMALS: u8 = 18;

/// Largest supported decimals value
pub const MAX_DECIMALS: u8 = 18;

/// Unit conversion errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitsError {
    #[error("Empty amount")]
    Empty,
    #[error("Invalid digit in amount: {0:?}")]
    InvalidDigit(String),
    #[error("Too many decimal places: {found} (token has {decimals})")]
    TooManyDecimals { found: usize, decimals: u8 },
    #[error("Amount overflows the ledger's integer range")]
    Overflow,
}

/// `10^decimals`, or `None` if it does not fit
pub fn unit(decimals: u8) -> Option<Amount> {
    10u128.checked_pow(decimals as u32)
}

/// Scale a whole-token count into raw units
pub fn scale(whole: u128, decimals: u8) -> Option<Amount> {
    whole.checked_mul(unit(decimals)?)
}

/// Parse a human-scale amount such as `"100"` or `"1.5"` into raw units
pub fn parse_units(text: &str, decimals: u8) -> Result<Amount, UnitsError> {
    let text = text.trim().replace('_', "");
    if text.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, fraction) = match text.split_once('.') {
        Some((w, f)) => (w, f),
        None => (text.as_str(), ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(UnitsError::Empty);
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(UnitsError::InvalidDigit(text.clone()));
    }
    if fraction.len() > decimals as usize {
        return Err(UnitsError::TooManyDecimals {
            found: fraction.len(),
            decimals,
        });
    }

    let whole: u128 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| UnitsError::Overflow)?
    };

    // Right-pad the fraction to exactly `decimals` digits
    let padded = format!("{:0<width$}", fraction, width = decimals as usize);
    let fraction: u128 = if padded.is_empty() {
        0
    } else {
        padded.parse().map_err(|_| UnitsError::Overflow)?
    };

    scale(whole, decimals)
        .and_then(|w| w.checked_add(fraction))
        .ok_or(UnitsError::Overflow)
}

/// Render raw units as a human-scale string, trimming trailing zeros
pub fn format_units(amount: Amount, decimals: u8) -> String {
    let Some(factor) = unit(decimals) else {
        return amount.to_string();
    };
    if decimals == 0 {
        return amount.to_string();
    }

    let whole = amount / factor;
    let fraction = amount % factor;
    if fraction == 0 {
        return whole.to_string();
    }

    let digits = format!("{:0>width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Serde helper that writes amounts as decimal strings
///
/// JSON numbers lose precision past `u64` once they are buffered (tagged
/// enums, `serde_json::Value`), so event and call payloads use strings.
pub mod amount_string {
    use super::Amount;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const E18: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_scale() {
        assert_eq!(scale(1_000_000, 18), Some(1_000_000 * E18));
        assert_eq!(scale(5, 0), Some(5));
        assert_eq!(scale(u128::MAX, 18), None);
    }

    #[test]
    fn test_parse_whole_and_fraction() {
        assert_eq!(parse_units("100", 18).unwrap(), 100 * E18);
        assert_eq!(parse_units("1.5", 18).unwrap(), 15 * E18 / 10);
        assert_eq!(parse_units("0.000000000000000001", 18).unwrap(), 1);
        assert_eq!(parse_units(".5", 18).unwrap(), E18 / 2);
        assert_eq!(parse_units("7.", 18).unwrap(), 7 * E18);
        assert_eq!(parse_units("1_000_000", 18).unwrap(), 1_000_000 * E18);
        assert_eq!(parse_units("42", 0).unwrap(), 42);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_units("", 18), Err(UnitsError::Empty));
        assert_eq!(parse_units(".", 18), Err(UnitsError::Empty));
        assert!(matches!(
            parse_units("12a", 18),
            Err(UnitsError::InvalidDigit(_))
        ));
        assert!(matches!(
            parse_units("-1", 18),
            Err(UnitsError::InvalidDigit(_))
        ));
        assert_eq!(
            parse_units("1.25", 1),
            Err(UnitsError::TooManyDecimals {
                found: 2,
                decimals: 1
            })
        );
        assert_eq!(
            parse_units("999999999999999999999999999999", 18),
            Err(UnitsError::Overflow)
        );
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(100 * E18, 18), "100");
        assert_eq!(format_units(999_900 * E18, 18), "999900");
        assert_eq!(format_units(15 * E18 / 10, 18), "1.5");
        assert_eq!(format_units(1, 18), "0.000000000000000001");
        assert_eq!(format_units(0, 18), "0");
        assert_eq!(format_units(42, 0), "42");
    }

    #[test]
    fn test_format_then_parse_is_stable() {
        let raw = 123_456_789_000_000_000_001u128;
        let text = format_units(raw, 18);
        assert_eq!(parse_units(&text, 18).unwrap(), raw);
    }

    #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
    struct Wrapped {
        #[serde(with = "amount_string")]
        value: Amount,
    }

    #[test]
    fn test_amount_string_keeps_precision() {
        let wrapped = Wrapped {
            value: 100_000_000 * E18,
        };
        let json = serde_json::to_string(&wrapped).unwrap();
        assert_eq!(json, r#"{"value":"100000000000000000000000000"}"#);

        let back: Wrapped = serde_json::from_str(&json).unwrap();
        assert_eq!(back, wrapped);

        assert!(serde_json::from_str::<Wrapped>(r#"{"value":"-1"}"#).is_err());
    }
}
