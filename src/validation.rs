//! Input validation.
//!
//! The engine trusts its input, so everything it cannot price
//! meaningfully is rejected here first.  [`validate`] never stops at
//! the first problem: it collects one [`FieldError`] per offending
//! field so a caller can report them all at once.

use crate::models::{EstimationInput, PurchaseType};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Longest accepted country or currency code.
const MAX_CODE_LEN: usize = 3;

/// Longest ownership horizon, in years.
pub const MAX_OWNERSHIP_YEARS: u32 = 100;
/// Longest finance or lease term, in months.
pub const MAX_TERM_MONTHS: u32 = 1200;

/// Vehicle-sized amounts: price, rebates, down payment, residual.
const MAX_PRICE: Decimal = dec!(9_999_999_999.99);
/// Annual or monthly running costs and one-off fees.
const MAX_RECURRING: Decimal = dec!(99_999_999.99);
/// Tax rate and APR, in percent.
const MAX_RATE_PERCENT: Decimal = dec!(999.999);
const MAX_CONSUMPTION: Decimal = dec!(99_999.99);
const MAX_FUEL_PRICE: Decimal = dec!(9_999.999);
const MAX_ELECTRICITY_PRICE: Decimal = dec!(999.9999);
const MAX_ANNUAL_DISTANCE: Decimal = dec!(9_999_999);

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// A field the chosen purchase or fuel type depends on is absent.
    Required,
    /// An amount, rate or distance is below zero.
    Negative,
    /// A count is outside its allowed range, or an amount exceeds its
    /// ceiling.
    OutOfRange,
    /// A country or currency code is blank, too long or not alphabetic.
    InvalidCode,
    /// An enumerated value was not one of the accepted choices.
    InvalidChoice,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Required => "required",
            Self::Negative => "negative",
            Self::OutOfRange => "out_of_range",
            Self::InvalidCode => "invalid_code",
            Self::InvalidChoice => "invalid_choice",
        };
        f.write_str(text)
    }
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub code: ErrorCode,
}

/// Every problem found in one input.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Error)]
#[error("{} invalid field(s): {}", .errors.len(), summary(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} ({})", e.field, e.code))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationErrors {
    fn add(&mut self, field: &str, code: ErrorCode) {
        self.errors.push(FieldError {
            field: field.to_string(),
            code,
        });
    }

    /// Whether `field` was rejected with `code`.
    pub fn contains(&self, field: &str, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.field == field && e.code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check an input before it is handed to the engine.
///
/// Codes are expected to be normalised already (see
/// [`EstimationInput::normalized`]).  A conditional field counts as
/// present whenever it is supplied, including an explicit zero, so a
/// 0% promotional loan is accepted.
pub fn validate(input: &EstimationInput) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    check_code(&mut errors, "country_code", Some(&input.country_code));
    if let Some(currency) = input.currency_code.as_deref() {
        check_code(&mut errors, "currency_code", Some(currency));
    }

    if !(1..=MAX_OWNERSHIP_YEARS).contains(&input.ownership_period_years) {
        errors.add("ownership_period_years", ErrorCode::OutOfRange);
    }

    let amounts = [
        ("purchase_price", Some(input.purchase_price), MAX_PRICE),
        ("incentives_rebates", input.incentives_rebates, MAX_PRICE),
        ("local_tax_rate", input.local_tax_rate, MAX_RATE_PERCENT),
        ("finance_down_payment", input.finance_down_payment, MAX_PRICE),
        ("finance_interest_rate", input.finance_interest_rate, MAX_RATE_PERCENT),
        ("lease_monthly_payment", input.lease_monthly_payment, MAX_RECURRING),
        ("lease_drive_off_cost", input.lease_drive_off_cost, MAX_RECURRING),
        ("annual_distance", Some(input.annual_distance), MAX_ANNUAL_DISTANCE),
        ("fuel_consumption_per_100", input.fuel_consumption_per_100, MAX_CONSUMPTION),
        (
            "electricity_consumption_per_100",
            input.electricity_consumption_per_100,
            MAX_CONSUMPTION,
        ),
        ("fuel_price_per_liter", input.fuel_price_per_liter, MAX_FUEL_PRICE),
        (
            "electricity_price_per_kwh",
            input.electricity_price_per_kwh,
            MAX_ELECTRICITY_PRICE,
        ),
        ("registration_fees_annual", input.registration_fees_annual, MAX_RECURRING),
        ("insurance_cost_annual", input.insurance_cost_annual, MAX_RECURRING),
        ("maintenance_cost_annual", input.maintenance_cost_annual, MAX_RECURRING),
        ("parking_cost_annual", input.parking_cost_annual, MAX_RECURRING),
        ("other_recurring_costs", input.other_recurring_costs, MAX_RECURRING),
        ("residual_value", input.residual_value, MAX_PRICE),
        ("charging_installation_cost", input.charging_installation_cost, MAX_RECURRING),
    ];
    for (field, value, max) in amounts {
        match value {
            Some(v) if v < Decimal::ZERO => errors.add(field, ErrorCode::Negative),
            Some(v) if v > max => errors.add(field, ErrorCode::OutOfRange),
            _ => {}
        }
    }

    for (field, months) in [
        ("finance_term_months", input.finance_term_months),
        ("lease_term_months", input.lease_term_months),
    ] {
        if months.is_some_and(|m| !(1..=MAX_TERM_MONTHS).contains(&m)) {
            errors.add(field, ErrorCode::OutOfRange);
        }
    }

    match input.purchase_type {
        PurchaseType::Finance => {
            require(&mut errors, "finance_interest_rate", input.finance_interest_rate.is_some());
            require(&mut errors, "finance_term_months", input.finance_term_months.is_some());
        }
        PurchaseType::Lease => {
            require(&mut errors, "lease_term_months", input.lease_term_months.is_some());
            require(&mut errors, "lease_monthly_payment", input.lease_monthly_payment.is_some());
        }
        PurchaseType::Cash => {}
        PurchaseType::Unrecognized => errors.add("purchase_type", ErrorCode::InvalidChoice),
    }

    if input.fuel_type.burns_fuel() {
        require(&mut errors, "fuel_consumption_per_100", input.fuel_consumption_per_100.is_some());
    }
    if input.fuel_type.uses_electricity() {
        require(
            &mut errors,
            "electricity_consumption_per_100",
            input.electricity_consumption_per_100.is_some(),
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn require(errors: &mut ValidationErrors, field: &str, present: bool) {
    if !present {
        errors.add(field, ErrorCode::Required);
    }
}

fn check_code(errors: &mut ValidationErrors, field: &str, code: Option<&str>) {
    let valid = code.is_some_and(|c| {
        !c.is_empty() && c.len() <= MAX_CODE_LEN && c.chars().all(|ch| ch.is_ascii_alphabetic())
    });
    if !valid {
        errors.add(field, ErrorCode::InvalidCode);
    }
}
