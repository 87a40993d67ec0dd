use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Fixed-point decimal with 4 decimal places, stored as a scaled integer.
///
/// Used for order amounts, slab bounds and percentage values so that the
/// points preview is computed with exact integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Amount(i64);

/// Errors produced when parsing an amount typed by the user.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("'{0}' is not a valid amount")]
    Invalid(String),
    #[error("amount '{0}' is too large")]
    Overflow(String),
}

impl Amount {
    const SCALE: i64 = 10_000;
    const FRAC_DIGITS: usize = 4;

    pub const ZERO: Amount = Amount(0);

    pub fn from_float(value: f64) -> Self {
        Amount((value * Self::SCALE as f64).round() as i64)
    }

    pub fn from_scaled(value: i64) -> Self {
        Amount(value)
    }

    pub fn from_whole(value: i64) -> Self {
        Amount(value.saturating_mul(Self::SCALE))
    }

    pub fn to_float(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    /// Integer part, truncated toward zero.
    pub fn whole_part(self) -> i64 {
        self.0 / Self::SCALE
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Read an amount from a JSON number or a numeric string.
    ///
    /// Returns `None` for anything else, including non-finite numbers.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    i.checked_mul(Self::SCALE).map(Amount)
                } else {
                    n.as_f64().filter(|f| f.is_finite()).map(Self::from_float)
                }
            }
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// `floor(self * percent / 100)` as whole points.
    ///
    /// Never rounds up. Non-positive operands yield 0.
    pub fn percent_floor(self, percent: Amount) -> i64 {
        if self.0 <= 0 || percent.0 <= 0 {
            return 0;
        }
        let scaled = self.0 as i128 * percent.0 as i128;
        let divisor = Self::SCALE as i128 * Self::SCALE as i128 * 100;
        (scaled / divisor).min(i64::MAX as i128) as i64
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AmountError::Empty);
        }
        let invalid = || AmountError::Invalid(trimmed.to_string());
        let overflow = || AmountError::Overflow(trimmed.to_string());

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid());
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole_value = if whole.is_empty() {
            0
        } else {
            whole.parse::<i64>().map_err(|_| overflow())?
        };
        // digits beyond the fourth decimal are truncated
        let mut frac_value = 0i64;
        for (idx, b) in frac.bytes().chain(std::iter::repeat(b'0')).enumerate() {
            if idx == Self::FRAC_DIGITS {
                break;
            }
            frac_value = frac_value * 10 + (b - b'0') as i64;
        }

        let scaled = whole_value
            .checked_mul(Self::SCALE)
            .and_then(|v| v.checked_add(frac_value))
            .ok_or_else(overflow)?;
        Ok(Amount(if negative { -scaled } else { scaled }))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = abs / Self::SCALE as u64;
        let frac = abs % Self::SCALE as u64;
        if frac == 0 {
            return write!(f, "{sign}{whole}");
        }
        let frac = format!("{frac:04}");
        write!(f, "{sign}{whole}.{}", frac.trim_end_matches('0'))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % Self::SCALE == 0 {
            serializer.serialize_i64(self.0 / Self::SCALE)
        } else {
            serializer.serialize_f64(self.to_float())
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Amount::from_json(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid amount: {value}")))
    }
}
