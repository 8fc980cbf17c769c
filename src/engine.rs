//! Cost estimation engine.
//!
//! The `engine` module turns an [`EstimationInput`] into an
//! [`EstimationResult`].  [`estimate`] is a pure function of its input:
//! it holds no state, performs no I/O and never fails for input that
//! passed [`crate::validation::validate`].  [`estimate_batch`] uses the
//! [`rayon`] crate to spread many independent estimates across CPU
//! cores.

use crate::decimal::{round_money, safe_decimal, zero_money};
use crate::finance;
use crate::models::{
    AcquisitionBreakdown, CostBreakdown, EstimationInput, EstimationResult, PurchaseType,
};
use rayon::prelude::*;
use rust_decimal::Decimal;
use tracing::debug;

const MONTHS_PER_YEAR: u32 = 12;

/// Estimate the total cost of a vehicle over the ownership horizon.
pub fn estimate(input: &EstimationInput) -> EstimationResult {
    let years = Decimal::from(input.ownership_period_years);
    let tax_rate = safe_decimal(input.local_tax_rate) / Decimal::ONE_HUNDRED;

    // Step 1: tax on the purchase price net of incentives.
    let taxable_base =
        (input.purchase_price - safe_decimal(input.incentives_rebates)).max(Decimal::ZERO);
    let tax_amount = round_money(taxable_base * tax_rate);

    // Step 2: acquisition cost for the chosen model.
    let (acquisition_total, acquisition) =
        acquisition_cost(input, taxable_base, tax_amount, tax_rate);

    // Step 3: energy per year.
    let distance_hundreds = input.annual_distance / Decimal::ONE_HUNDRED;
    let annual_fuel_cost = channel_cost(
        distance_hundreds,
        safe_decimal(input.fuel_consumption_per_100),
        safe_decimal(input.fuel_price_per_liter),
    );
    let annual_electric_cost = channel_cost(
        distance_hundreds,
        safe_decimal(input.electricity_consumption_per_100),
        safe_decimal(input.electricity_price_per_kwh),
    );

    // Step 4: recurring costs over the horizon.
    let insurance = safe_decimal(input.insurance_cost_annual);
    let maintenance = safe_decimal(input.maintenance_cost_annual);
    let registration = safe_decimal(input.registration_fees_annual);
    let parking = safe_decimal(input.parking_cost_annual);
    let other = safe_decimal(input.other_recurring_costs);
    let annual_recurring_total = annual_fuel_cost
        + annual_electric_cost
        + insurance
        + maintenance
        + registration
        + parking
        + other;
    let recurring_total = round_money(annual_recurring_total * years);

    // Step 5: roll up.
    let charging_installation = safe_decimal(input.charging_installation_cost);
    let residual_value = safe_decimal(input.residual_value);
    let total_cost =
        round_money(acquisition_total + recurring_total + charging_installation - residual_value);
    let monthly_cost = if input.ownership_period_years == 0 {
        zero_money()
    } else {
        round_money(total_cost / (years * Decimal::from(MONTHS_PER_YEAR)))
    };

    // Step 6: categories.  Energy stays annual while the other
    // recurring categories cover the whole horizon.
    let breakdown = CostBreakdown {
        acquisition: round_money(acquisition_total),
        energy: round_money(annual_fuel_cost + annual_electric_cost),
        insurance: round_money(insurance * years),
        maintenance: round_money(maintenance * years),
        registration: round_money(registration * years),
        parking: round_money(parking * years),
        other_recurring: round_money(other * years),
        charging_infrastructure: round_money(charging_installation),
        residual_credit: round_money(residual_value),
    };

    debug!(
        purchase_type = ?input.purchase_type,
        years = input.ownership_period_years,
        %total_cost,
        %monthly_cost,
        "estimate computed"
    );

    EstimationResult {
        currency_code: input.currency_code.clone(),
        total_cost,
        monthly_cost,
        annual_recurring_total: round_money(annual_recurring_total),
        breakdown,
        annual_fuel_cost,
        annual_electric_cost,
        acquisition,
    }
}

/// Estimate many inputs in parallel.  Results keep the input order.
pub fn estimate_batch(inputs: &[EstimationInput]) -> Vec<EstimationResult> {
    inputs.par_iter().map(estimate).collect()
}

fn acquisition_cost(
    input: &EstimationInput,
    taxable_base: Decimal,
    tax_amount: Decimal,
    tax_rate: Decimal,
) -> (Decimal, AcquisitionBreakdown) {
    match input.purchase_type {
        PurchaseType::Finance => {
            let down_payment = safe_decimal(input.finance_down_payment);
            let principal = (taxable_base - down_payment).max(Decimal::ZERO);
            let schedule = finance::schedule(
                principal + tax_amount,
                safe_decimal(input.finance_interest_rate),
                input.finance_term_months.unwrap_or(0),
            );
            let total = schedule.total_paid + down_payment;
            let breakdown = AcquisitionBreakdown::Finance {
                down_payment: round_money(down_payment),
                financed_total: schedule.total_paid,
                taxes: tax_amount,
            };
            (total, breakdown)
        }
        PurchaseType::Lease => {
            let months = Decimal::from(input.lease_term_months.unwrap_or(0));
            let payments = safe_decimal(input.lease_monthly_payment) * months;
            let drive_off = safe_decimal(input.lease_drive_off_cost);
            let lease_total = payments + drive_off;
            let lease_taxes = round_money(lease_total * tax_rate);
            let breakdown = AcquisitionBreakdown::Lease {
                lease_payments: round_money(payments),
                drive_off: round_money(drive_off),
                lease_taxes,
            };
            (lease_total + lease_taxes, breakdown)
        }
        // Unrecognized purchase types are priced as cash.
        PurchaseType::Cash | PurchaseType::Unrecognized => {
            let total = taxable_base + tax_amount;
            let breakdown = AcquisitionBreakdown::Cash {
                upfront_payment: round_money(total),
            };
            (total, breakdown)
        }
    }
}

/// Annual cost of one energy channel; zero unless both consumption and
/// unit price are non-zero.
fn channel_cost(distance_hundreds: Decimal, consumption: Decimal, price: Decimal) -> Decimal {
    if consumption.is_zero() || price.is_zero() {
        return zero_money();
    }
    round_money(distance_hundreds * consumption * price)
}
