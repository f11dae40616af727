use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::PayError;

/// An amount in a token's smallest unit (e.g. 1 USDC = 1_000_000).
/// Serialized as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    #[must_use]
    pub const fn from_units(units: u128) -> Self {
        Self(units)
    }

    #[must_use]
    pub const fn units(&self) -> u128 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Converts a human quantity such as `"1.23"` or `"1.5e3"` into
    /// smallest units for a token with `decimals` places. Digits past
    /// `decimals` are truncated, never rounded, so the result is exactly
    /// `floor(Q * 10^D)`.
    pub fn from_quantity(quantity: &str, decimals: u8) -> Result<Self, PayError> {
        let quantity = quantity.trim();
        if quantity.is_empty() {
            return Err(PayError::Validation("Amount is empty".to_string()));
        }
        if quantity.starts_with('-') {
            return Err(PayError::Validation(format!(
                "Amount must be positive: {quantity}"
            )));
        }
        let invalid = || PayError::Validation(format!("Invalid amount: {quantity}"));

        let (mantissa, exponent) = match quantity.split_once(['e', 'E']) {
            Some((mantissa, exponent)) => (mantissa, parse_exponent(exponent).ok_or_else(invalid)?),
            None => (quantity, 0),
        };
        let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let (whole, fraction) = shift_point(whole, fraction, exponent);

        let decimals = usize::from(decimals);
        let kept = &fraction[..fraction.len().min(decimals)];
        let padding = decimals - kept.len();

        let mut units: u128 = 0;
        let digits = whole
            .bytes()
            .chain(kept.bytes())
            .chain(std::iter::repeat_n(b'0', padding));
        for digit in digits {
            units = units
                .checked_mul(10)
                .and_then(|u| u.checked_add(u128::from(digit - b'0')))
                .ok_or_else(|| PayError::Validation(format!("Amount too large: {quantity}")))?;
        }

        Ok(Self(units))
    }
}

// Past this any non-zero mantissa overflows u128 and any fraction truncates
// to zero, so larger exponents are clamped.
const MAX_EXPONENT: i64 = 400;

fn parse_exponent(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude = digits.parse::<i64>().unwrap_or(MAX_EXPONENT).min(MAX_EXPONENT);
    Some(if text.starts_with('-') { -magnitude } else { magnitude })
}

/// Moves the decimal point of `whole.fraction` right by `exponent` places
/// (left when negative).
fn shift_point(whole: &str, fraction: &str, exponent: i64) -> (String, String) {
    let digits = format!("{whole}{fraction}");
    let point = i64::try_from(whole.len()).unwrap_or(i64::MAX) + exponent;

    if point <= 0 {
        let zeros = "0".repeat(usize::try_from(-point).unwrap_or(0));
        return (String::new(), format!("{zeros}{digits}"));
    }

    let point = usize::try_from(point).unwrap_or(usize::MAX);
    if point >= digits.len() {
        let zeros = "0".repeat(point - digits.len());
        (format!("{digits}{zeros}"), String::new())
    } else {
        let (whole, fraction) = digits.split_at(point);
        (whole.to_string(), fraction.to_string())
    }
}

/// Renders smallest units back into a human quantity, trimming trailing zeros.
#[must_use]
pub fn format_units(amount: TokenAmount, decimals: u8) -> String {
    let decimals = usize::from(decimals);
    let digits = amount.0.to_string();
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        format!("{whole}.0")
    } else {
        format!("{whole}.{fraction}")
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TokenAmount {
    type Err = PayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>()
            .map(Self)
            .map_err(|e| PayError::Validation(format!("Invalid token amount {s}: {e}")))
    }
}

impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
