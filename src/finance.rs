//! Amortised loan scheduling.
//!
//! Computes the fixed monthly payment for a loan using the standard
//! annuity formula `P * r * (1+r)^n / ((1+r)^n - 1)`, where `r` is the
//! monthly rate.  The power is evaluated with exact decimal
//! exponentiation by squaring, so no floating point is involved and
//! long terms cost a handful of multiplications.

use crate::decimal::{round_money, zero_money};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Monthly payment and total outlay for an amortised loan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinanceSchedule {
    pub monthly_payment: Decimal,
    /// What the borrower pays over the full term: the rounded monthly
    /// payment times the number of months.
    pub total_paid: Decimal,
}

impl FinanceSchedule {
    fn zero() -> Self {
        Self {
            monthly_payment: zero_money(),
            total_paid: zero_money(),
        }
    }
}

/// Schedule a loan of `principal` at `apr_percent` over `term_months`.
///
/// The principal is rounded to cents first.  A non-positive principal
/// or a zero term yields an all-zero schedule; a zero rate divides the
/// principal evenly across the term.
pub fn schedule(principal: Decimal, apr_percent: Decimal, term_months: u32) -> FinanceSchedule {
    let principal = round_money(principal);
    if term_months == 0 || principal <= Decimal::ZERO {
        return FinanceSchedule::zero();
    }

    let term = Decimal::from(term_months);
    let monthly_rate = apr_percent / Decimal::ONE_HUNDRED / MONTHS_PER_YEAR;
    let payment = if monthly_rate.is_zero() {
        principal / term
    } else {
        amortized_payment(principal, monthly_rate, term_months)
    };

    let monthly_payment = round_money(payment);
    FinanceSchedule {
        monthly_payment,
        total_paid: round_money(monthly_payment * term),
    }
}

fn amortized_payment(principal: Decimal, monthly_rate: Decimal, term_months: u32) -> Decimal {
    // As (1+r)^n grows without bound the payment converges on P * r,
    // which is what we return once the power leaves decimal range.
    let interest_only = principal * monthly_rate;
    let Some(factor) = compound_factor(monthly_rate, term_months) else {
        return interest_only;
    };
    let denominator = factor - Decimal::ONE;
    if denominator.is_zero() {
        return principal / Decimal::from(term_months);
    }
    monthly_rate
        .checked_mul(factor)
        .and_then(|numerator| principal.checked_mul(numerator))
        .and_then(|scaled| scaled.checked_div(denominator))
        .or_else(|| {
            factor
                .checked_div(denominator)
                .and_then(|ratio| interest_only.checked_mul(ratio))
        })
        .unwrap_or(interest_only)
}

/// `(1 + rate)^periods`, or `None` if it overflows.
fn compound_factor(rate: Decimal, periods: u32) -> Option<Decimal> {
    Decimal::ONE
        .checked_add(rate)?
        .checked_powu(u64::from(periods))
}
