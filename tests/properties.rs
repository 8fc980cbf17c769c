//! Property-based tests for the estimation engine.

use proptest::prelude::*;
use rust_decimal::Decimal;
use vehicle_cost_engine::decimal::round_money;
use vehicle_cost_engine::engine::estimate;
use vehicle_cost_engine::finance::schedule;
use vehicle_cost_engine::models::{EstimationInput, FuelType, PurchaseType};
use vehicle_cost_engine::validation::{validate, MAX_OWNERSHIP_YEARS, MAX_TERM_MONTHS};

/// Amounts from 0.00 to 1,000,000.00.
fn money() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Percentages from 0.000 to 30.000.
fn percent() -> impl Strategy<Value = Decimal> {
    (0i64..30_000i64).prop_map(|v| Decimal::new(v, 3))
}

fn purchase_type() -> impl Strategy<Value = PurchaseType> {
    prop_oneof![
        Just(PurchaseType::Cash),
        Just(PurchaseType::Finance),
        Just(PurchaseType::Lease),
    ]
}

fn fuel_type() -> impl Strategy<Value = FuelType> {
    prop_oneof![
        Just(FuelType::Gasoline),
        Just(FuelType::Diesel),
        Just(FuelType::Electric),
        Just(FuelType::Hybrid),
    ]
}

prop_compose! {
    fn any_input()(
        (years, price, incentives, tax) in (0u32..15, money(), money(), percent()),
        (kind, apr, term, down, lease_payment) in
            (purchase_type(), percent(), 1u32..96, money(), money()),
        distance in 0i64..60_000,
        fuel in fuel_type(),
        consumption in (0i64..2_000).prop_map(|v| Decimal::new(v, 2)),
        fuel_price in (0i64..5_000).prop_map(|v| Decimal::new(v, 3)),
        insurance in money(),
        residual in money(),
    ) -> EstimationInput {
        let mut input = EstimationInput::new("US", years, price);
        input.incentives_rebates = Some(incentives);
        input.local_tax_rate = Some(tax);
        input.purchase_type = kind;
        input.finance_interest_rate = Some(apr);
        input.finance_term_months = Some(term);
        input.finance_down_payment = Some(down);
        input.lease_term_months = Some(term);
        input.lease_monthly_payment = Some(lease_payment);
        input.annual_distance = Decimal::from(distance);
        input.fuel_type = fuel;
        input.fuel_consumption_per_100 = Some(consumption);
        input.fuel_price_per_liter = Some(fuel_price);
        input.insurance_cost_annual = Some(insurance);
        input.residual_value = Some(residual);
        input
    }
}

/// Values from zero up to and including `max_units` at `scale`,
/// with the ceiling itself drawn often.
fn up_to(max_units: i64, scale: u32) -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(Decimal::new(max_units, scale)),
        (0..=max_units).prop_map(move |v| Decimal::new(v, scale)),
    ]
}

fn up_to_count(max: u32) -> impl Strategy<Value = u32> {
    prop_oneof![Just(max), 1..=max]
}

prop_compose! {
    /// Inputs anywhere in the accepted range, ceilings included.
    fn accepted_input()(
        (years, price, incentives, tax) in (
            up_to_count(MAX_OWNERSHIP_YEARS),
            up_to(999_999_999_999, 2),
            up_to(999_999_999_999, 2),
            up_to(999_999, 3),
        ),
        (kind, apr, term, down) in (
            purchase_type(),
            up_to(999_999, 3),
            up_to_count(MAX_TERM_MONTHS),
            up_to(999_999_999_999, 2),
        ),
        (lease_payment, drive_off, charging, residual) in (
            up_to(9_999_999_999, 2),
            up_to(9_999_999_999, 2),
            up_to(9_999_999_999, 2),
            up_to(999_999_999_999, 2),
        ),
        (distance, fuel, consumption, electric_consumption) in (
            up_to(9_999_999, 0),
            fuel_type(),
            up_to(9_999_999, 2),
            up_to(9_999_999, 2),
        ),
        (fuel_price, electricity_price) in (up_to(9_999_999, 3), up_to(9_999_999, 4)),
        recurring in prop::array::uniform5(up_to(9_999_999_999, 2)),
    ) -> EstimationInput {
        let mut input = EstimationInput::new("US", years, price);
        input.incentives_rebates = Some(incentives);
        input.local_tax_rate = Some(tax);
        input.purchase_type = kind;
        input.finance_interest_rate = Some(apr);
        input.finance_term_months = Some(term);
        input.finance_down_payment = Some(down);
        input.lease_term_months = Some(term);
        input.lease_monthly_payment = Some(lease_payment);
        input.lease_drive_off_cost = Some(drive_off);
        input.charging_installation_cost = Some(charging);
        input.residual_value = Some(residual);
        input.annual_distance = distance;
        input.fuel_type = fuel;
        input.fuel_consumption_per_100 = Some(consumption);
        input.electricity_consumption_per_100 = Some(electric_consumption);
        input.fuel_price_per_liter = Some(fuel_price);
        input.electricity_price_per_kwh = Some(electricity_price);
        let [registration, insurance, maintenance, parking, other] = recurring;
        input.registration_fees_annual = Some(registration);
        input.insurance_cost_annual = Some(insurance);
        input.maintenance_cost_annual = Some(maintenance);
        input.parking_cost_annual = Some(parking);
        input.other_recurring_costs = Some(other);
        input
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Anything validation accepts, up to every ceiling, can be priced.
    #[test]
    fn prop_accepted_inputs_always_estimate(input in accepted_input()) {
        prop_assert_eq!(validate(&input), Ok(()));
        let result = estimate(&input);
        prop_assert_eq!(result.total_cost.scale(), 2);
        prop_assert_eq!(result.monthly_cost.scale(), 2);
    }

    /// Every headline amount carries exactly two fraction digits.
    #[test]
    fn prop_amounts_have_two_fraction_digits(input in any_input()) {
        let result = estimate(&input);
        prop_assert_eq!(result.total_cost.scale(), 2);
        prop_assert_eq!(result.monthly_cost.scale(), 2);
        prop_assert_eq!(result.annual_recurring_total.scale(), 2);
    }

    /// Identical input gives identical output.
    #[test]
    fn prop_estimate_is_deterministic(input in any_input()) {
        let first = estimate(&input);
        let second = estimate(&input);
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    /// Raising the residual value lowers the total by exactly that much.
    #[test]
    fn prop_residual_reduces_total_exactly(input in any_input(), delta in money()) {
        let base = estimate(&input);
        let mut raised = input.clone();
        raised.residual_value = Some(input.residual_value.unwrap_or_default() + delta);
        prop_assert_eq!(estimate(&raised).total_cost, base.total_cost - delta);
    }

    /// A zero-length horizon never divides by zero.
    #[test]
    fn prop_zero_years_zero_monthly(mut input in any_input()) {
        input.ownership_period_years = 0;
        prop_assert_eq!(estimate(&input).monthly_cost.to_string(), "0.00");
    }

    /// No fuel cost without a fuel price, whatever the fuel type says.
    #[test]
    fn prop_fuel_cost_needs_a_price(mut input in any_input()) {
        input.fuel_price_per_liter = Some(Decimal::ZERO);
        prop_assert!(estimate(&input).annual_fuel_cost.is_zero());
    }

    /// At 0% the schedule is plain division rounded to cents.
    #[test]
    fn prop_zero_rate_is_simple_division(principal in money(), term in 1u32..120) {
        let s = schedule(principal, Decimal::ZERO, term);
        let expected = round_money(principal / Decimal::from(term));
        prop_assert_eq!(s.monthly_payment, expected);
        prop_assert_eq!(s.total_paid, expected * Decimal::from(term));
    }

    /// Interest never makes a loan cheaper than its principal.
    #[test]
    fn prop_interest_costs_money(principal in money(), apr in percent(), term in 1u32..120) {
        let free = schedule(principal, Decimal::ZERO, term);
        let charged = schedule(principal, apr, term);
        prop_assert!(charged.monthly_payment >= free.monthly_payment);
    }
}
