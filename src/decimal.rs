//! Exact decimal coercion and money rounding.
//!
//! Every amount that reaches the engine is a [`Decimal`].  Inputs may
//! arrive absent, as an empty string, as JSON numbers or as numeric
//! strings; the helpers here normalise all of those to an exact
//! decimal without routing through binary floating point arithmetic.
//! Empty-like inputs (absent, blank, zero) become exact zero.

use rust_decimal::prelude::*;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

/// Number of fraction digits carried by every monetary output.
pub const MONEY_SCALE: u32 = 2;

/// Raised when a textual value cannot be read as a decimal number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid decimal number")]
pub struct CoercionError(pub String);

/// A loosely typed numeric value as supplied by a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum DecimalInput {
    Decimal(Decimal),
    Integer(i64),
    Text(String),
}

impl From<Decimal> for DecimalInput {
    fn from(value: Decimal) -> Self {
        Self::Decimal(value)
    }
}

impl From<i64> for DecimalInput {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<u32> for DecimalInput {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for DecimalInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DecimalInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Coerce a possibly absent value to an exact decimal.
///
/// Absent values, blank strings and numeric zero all yield
/// `Decimal::ZERO`.  Text is parsed exactly, accepting plain and
/// scientific notation.
pub fn coerce(value: Option<&DecimalInput>) -> Result<Decimal, CoercionError> {
    match value {
        None => Ok(Decimal::ZERO),
        Some(DecimalInput::Decimal(d)) => Ok(*d),
        Some(DecimalInput::Integer(i)) => Ok(Decimal::from(*i)),
        Some(DecimalInput::Text(text)) => parse_text(text).map(|d| d.unwrap_or(Decimal::ZERO)),
    }
}

/// Typed shortcut for optional fields that are already decimals.
pub fn safe_decimal(value: Option<Decimal>) -> Decimal {
    value.unwrap_or(Decimal::ZERO)
}

/// Round half-up (midpoint away from zero) to two fraction digits.
///
/// The result always carries exactly two fraction digits, so
/// `22000` comes back as `22000.00`.
pub fn round_money(value: Decimal) -> Decimal {
    round_to(value, MONEY_SCALE)
}

/// Round half-up to `scale` fraction digits, padding when needed.
pub fn round_to(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    rounded
}

/// Exact zero with the money scale (`0.00`).
pub fn zero_money() -> Decimal {
    Decimal::new(0, MONEY_SCALE)
}

fn parse_text(text: &str) -> Result<Option<Decimal>, CoercionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map(Some)
        .map_err(|_| CoercionError(trimmed.to_string()))
}

// Wire representation accepted by the lenient deserializers.  Floats
// are converted via their shortest round-trip text, never arithmetic.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    fn into_decimal(self) -> Result<Option<Decimal>, CoercionError> {
        match self {
            Self::Integer(i) => Ok(Some(Decimal::from(i))),
            Self::Float(f) => parse_text(&f.to_string()),
            Self::Text(text) => parse_text(&text),
        }
    }
}

/// Deserialize an optional decimal, treating `null` and blank strings
/// as absent.  Use with `#[serde(default, deserialize_with = ...)]`.
pub fn lenient_option<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawValue>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(raw) => raw.into_decimal().map_err(serde::de::Error::custom),
    }
}

/// Deserialize a required decimal; empty-like input becomes zero.
pub fn lenient<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_option(deserializer).map(safe_decimal)
}

/// Deserialize an optional whole number (months, years) from a JSON
/// integer or numeric string.  Fractional values are rejected.
pub fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(value) = lenient_option(deserializer)? else {
        return Ok(None);
    };
    if !value.fract().is_zero() {
        return Err(serde::de::Error::custom(format!("{value} is not a whole number")));
    }
    value
        .to_u32()
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("{value} is out of range")))
}

/// Deserialize a required whole number; blank or `null` is rejected.
pub fn lenient_required_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_count(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("a whole number is required"))
}
