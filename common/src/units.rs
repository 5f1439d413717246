//! Decimal string <-> base unit conversion, the `parseUnits` / `formatUnits` pair
//! used when a user types "1.5" for a token with 18 decimals.

use alloy_primitives::{utils, U256};

/// Highest decimal precision a token may declare.
pub const MAX_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    #[error("empty amount")]
    Empty,
    #[error("invalid character {0:?} in amount")]
    InvalidDigit(char),
    #[error("amount has {found} fractional digits, token allows {decimals}")]
    TooManyDecimals { found: usize, decimals: u8 },
    #[error("decimals {0} exceeds the maximum of 18")]
    InvalidDecimals(u8),
    #[error("amount does not fit in 256 bits")]
    Overflow,
    #[error("malformed amount: {0}")]
    Parse(String),
}

impl From<utils::UnitsError> for UnitsError {
    fn from(err: utils::UnitsError) -> Self {
        UnitsError::Parse(err.to_string())
    }
}

/// Parses a non-negative decimal string into base units.
///
/// Surrounding whitespace and `_` separators are ignored. A trailing dot
/// ("10.") and a bare fraction (".5") are accepted. Unlike
/// [`utils::parse_units`], excess precision is an error rather than truncated.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, UnitsError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitsError::InvalidDecimals(decimals));
    }
    let cleaned: String = amount.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() || cleaned == "." {
        return Err(UnitsError::Empty);
    }

    let (whole, fraction) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));
    if let Some(bad) = whole
        .chars()
        .chain(fraction.chars())
        .find(|c| !c.is_ascii_digit())
    {
        return Err(UnitsError::InvalidDigit(bad));
    }

    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > decimals as usize {
        return Err(UnitsError::TooManyDecimals {
            found: fraction.len(),
            decimals,
        });
    }
    let whole = match whole.trim_start_matches('0') {
        "" => "0",
        digits => digits,
    };
    let canonical = if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{fraction}")
    };

    let value: U256 = utils::parse_units(&canonical, decimals)?.into();
    // scaling by 10^decimals wraps instead of failing
    if format_units(value, decimals) != canonical {
        return Err(UnitsError::Overflow);
    }
    Ok(value)
}

/// Renders base units as a decimal string without trailing fractional zeros.
pub fn format_units(value: U256, decimals: u8) -> String {
    let formatted = utils::format_units(value, decimals.min(MAX_DECIMALS))
        .unwrap_or_else(|_| value.to_string());
    match formatted.split_once('.') {
        Some((whole, fraction)) => match fraction.trim_end_matches('0') {
            "" => whole.to_string(),
            fraction => format!("{whole}.{fraction}"),
        },
        None => formatted,
    }
}

/// Shorthand for `parse_units(amount, 18)`.
pub fn parse_ether(amount: &str) -> Result<U256, UnitsError> {
    parse_units(amount, MAX_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_whole_and_fractional_amounts() {
        assert_eq!(parse_units("1", 18).unwrap(), U256::from(10u64).pow(U256::from(18)));
        assert_eq!(
            parse_units("1.5", 6).unwrap(),
            U256::from(1_500_000u64)
        );
        assert_eq!(parse_units(".25", 2).unwrap(), U256::from(25u64));
        assert_eq!(parse_units("10.", 0).unwrap(), U256::from(10u64));
        assert_eq!(
            parse_units("1_000_000", 0).unwrap(),
            U256::from(1_000_000u64)
        );
        assert_eq!(parse_units("2.500", 1).unwrap(), U256::from(25u64));
    }

    #[test]
    fn rejects_malformed_amounts() {
        assert_eq!(parse_units("", 18), Err(UnitsError::Empty));
        assert_eq!(parse_units("  ", 18), Err(UnitsError::Empty));
        assert_eq!(parse_units("-1", 18), Err(UnitsError::InvalidDigit('-')));
        assert_eq!(parse_units("1.2.3", 18), Err(UnitsError::InvalidDigit('.')));
        assert_eq!(
            parse_units("0.001", 2),
            Err(UnitsError::TooManyDecimals {
                found: 3,
                decimals: 2
            })
        );
        assert_eq!(parse_units("1", 19), Err(UnitsError::InvalidDecimals(19)));
    }

    #[test]
    fn overflow_is_reported() {
        let huge = "9".repeat(80);
        assert!(matches!(parse_units(&huge, 0), Err(UnitsError::Parse(_))));
        // fits as digits, wraps once scaled
        let scaled = "9".repeat(70);
        assert_eq!(parse_units(&scaled, 18), Err(UnitsError::Overflow));
        assert_eq!(parse_units(&scaled, 0).map(|v| v.to_string()), Ok(scaled));
    }

    #[test]
    fn excess_precision_is_not_truncated() {
        assert_eq!(
            parse_units("1.234", 2),
            Err(UnitsError::TooManyDecimals {
                found: 3,
                decimals: 2
            })
        );
        assert_eq!(parse_units("007.50", 2).unwrap(), U256::from(750u64));
        assert_eq!(parse_units("0", 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn formats_without_trailing_zeros() {
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(parse_ether("1").unwrap(), 18), "1");
        assert_eq!(format_units(U256::ZERO, 18), "0");
        assert_eq!(format_units(U256::from(5u64), 3), "0.005");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }

    #[test]
    fn ether_helper_uses_eighteen_decimals() {
        assert_eq!(
            parse_ether("0.01").unwrap(),
            U256::from(10_000_000_000_000_000u64)
        );
    }
}
