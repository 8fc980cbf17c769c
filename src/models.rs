//! Data models for the vehicle cost engine.
//!
//! The `models` module defines the serialisable input and output
//! records of an estimate.  Inputs are deliberately lenient on the
//! wire (blank strings and `null` mean "absent") but strongly typed
//! once deserialised: every optional field is an `Option`, and the
//! engine treats an absent amount as exact zero.

use crate::decimal::{lenient, lenient_count, lenient_option, lenient_required_count};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How the vehicle is acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseType {
    /// Paid in full up front.
    Cash,
    /// Amortised loan after an optional down payment.
    Finance,
    /// Fixed monthly lease payments plus a drive-off amount.
    Lease,
    /// Any value the caller sent that is not one of the above.  The
    /// engine prices it as a cash purchase; validation rejects it.
    #[serde(other)]
    Unrecognized,
}

/// Primary energy source of the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Gasoline,
    Diesel,
    Electric,
    Hybrid,
}

impl FuelType {
    /// Whether the vehicle burns liquid fuel.
    pub fn burns_fuel(self) -> bool {
        matches!(self, Self::Gasoline | Self::Diesel | Self::Hybrid)
    }

    /// Whether the vehicle draws grid electricity.
    pub fn uses_electricity(self) -> bool {
        matches!(self, Self::Electric | Self::Hybrid)
    }
}

/// Input to the cost engine.
///
/// Distances and consumption figures are unit-agnostic: consumption
/// is expressed per 100 units of whatever distance unit
/// `annual_distance` uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationInput {
    /// ISO country code, e.g. `"US"`.  Uppercased by normalisation.
    pub country_code: String,
    /// Optional state or province used to refine regional lookups.
    #[serde(default)]
    pub region: Option<String>,
    /// ISO currency code.  Passed through to the result untouched.
    #[serde(default)]
    pub currency_code: Option<String>,

    /// Length of the ownership horizon in whole years.
    #[serde(deserialize_with = "lenient_required_count")]
    pub ownership_period_years: u32,

    #[serde(deserialize_with = "lenient")]
    pub purchase_price: Decimal,
    #[serde(default, deserialize_with = "lenient_option")]
    pub incentives_rebates: Option<Decimal>,
    /// Sales or VAT rate in percent (e.g. `8.25`).
    #[serde(default, deserialize_with = "lenient_option")]
    pub local_tax_rate: Option<Decimal>,
    pub purchase_type: PurchaseType,

    #[serde(default, deserialize_with = "lenient_option")]
    pub finance_down_payment: Option<Decimal>,
    /// Annual percentage rate in percent.
    #[serde(default, deserialize_with = "lenient_option")]
    pub finance_interest_rate: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub finance_term_months: Option<u32>,

    #[serde(default, deserialize_with = "lenient_count")]
    pub lease_term_months: Option<u32>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub lease_monthly_payment: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub lease_drive_off_cost: Option<Decimal>,

    #[serde(deserialize_with = "lenient")]
    pub annual_distance: Decimal,
    pub fuel_type: FuelType,
    #[serde(default, deserialize_with = "lenient_option")]
    pub fuel_consumption_per_100: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub electricity_consumption_per_100: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub fuel_price_per_liter: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub electricity_price_per_kwh: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient_option")]
    pub registration_fees_annual: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub insurance_cost_annual: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub maintenance_cost_annual: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub parking_cost_annual: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_option")]
    pub other_recurring_costs: Option<Decimal>,

    /// Expected resale value (owned) or residual obligation (lease).
    #[serde(default, deserialize_with = "lenient_option")]
    pub residual_value: Option<Decimal>,
    /// One-time cost of a home charger or similar infrastructure.
    #[serde(default, deserialize_with = "lenient_option")]
    pub charging_installation_cost: Option<Decimal>,
}

impl EstimationInput {
    /// A cash purchase of a gasoline vehicle with every optional field
    /// absent.  Handy as a starting point for callers and tests.
    pub fn new(
        country_code: impl Into<String>,
        ownership_period_years: u32,
        purchase_price: Decimal,
    ) -> Self {
        Self {
            country_code: country_code.into(),
            region: None,
            currency_code: None,
            ownership_period_years,
            purchase_price,
            incentives_rebates: None,
            local_tax_rate: None,
            purchase_type: PurchaseType::Cash,
            finance_down_payment: None,
            finance_interest_rate: None,
            finance_term_months: None,
            lease_term_months: None,
            lease_monthly_payment: None,
            lease_drive_off_cost: None,
            annual_distance: Decimal::ZERO,
            fuel_type: FuelType::Gasoline,
            fuel_consumption_per_100: None,
            electricity_consumption_per_100: None,
            fuel_price_per_liter: None,
            electricity_price_per_kwh: None,
            registration_fees_annual: None,
            insurance_cost_annual: None,
            maintenance_cost_annual: None,
            parking_cost_annual: None,
            other_recurring_costs: None,
            residual_value: None,
            charging_installation_cost: None,
        }
    }

    /// Returns a copy with country and currency codes trimmed and
    /// uppercased, and a blank region dropped.
    pub fn normalized(mut self) -> Self {
        self.country_code = self.country_code.trim().to_uppercase();
        self.currency_code = self
            .currency_code
            .map(|code| code.trim().to_uppercase())
            .filter(|code| !code.is_empty());
        self.region = self
            .region
            .map(|region| region.trim().to_string())
            .filter(|region| !region.is_empty());
        self
    }
}

/// Cost per category over the ownership horizon.
///
/// Every category except `energy` covers the whole horizon; `energy`
/// is the annual figure.  `residual_credit` is a reduction of the
/// total, presented as a positive amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub acquisition: Decimal,
    pub energy: Decimal,
    pub insurance: Decimal,
    pub maintenance: Decimal,
    pub registration: Decimal,
    pub parking: Decimal,
    pub other_recurring: Decimal,
    pub charging_infrastructure: Decimal,
    pub residual_credit: Decimal,
}

impl CostBreakdown {
    /// Display label and amount for each category, in report order.
    pub fn entries(&self) -> [(&'static str, Decimal); 9] {
        [
            ("Acquisition", self.acquisition),
            ("Energy", self.energy),
            ("Insurance", self.insurance),
            ("Maintenance", self.maintenance),
            ("Registration", self.registration),
            ("Parking", self.parking),
            ("Other recurring", self.other_recurring),
            ("Charging infrastructure", self.charging_infrastructure),
            ("Residual credit", self.residual_credit),
        ]
    }
}

/// How the acquisition total splits up for each purchase type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "purchase_type", rename_all = "lowercase")]
pub enum AcquisitionBreakdown {
    Cash {
        upfront_payment: Decimal,
    },
    Finance {
        down_payment: Decimal,
        financed_total: Decimal,
        taxes: Decimal,
    },
    Lease {
        lease_payments: Decimal,
        drive_off: Decimal,
        lease_taxes: Decimal,
    },
}

impl AcquisitionBreakdown {
    /// Display label and amount for each component.
    pub fn entries(&self) -> Vec<(&'static str, Decimal)> {
        match *self {
            Self::Cash { upfront_payment } => vec![("Upfront payment", upfront_payment)],
            Self::Finance {
                down_payment,
                financed_total,
                taxes,
            } => vec![
                ("Down payment", down_payment),
                ("Financed total", financed_total),
                ("Taxes", taxes),
            ],
            Self::Lease {
                lease_payments,
                drive_off,
                lease_taxes,
            } => vec![
                ("Lease payments", lease_payments),
                ("Drive-off", drive_off),
                ("Lease taxes", lease_taxes),
            ],
        }
    }
}

/// The outcome of an estimate.  All amounts carry two fraction digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationResult {
    /// Currency the amounts are expressed in, as supplied.
    pub currency_code: Option<String>,
    /// Net cost over the whole horizon, after the residual credit.
    pub total_cost: Decimal,
    /// `total_cost` spread over the horizon's months.
    pub monthly_cost: Decimal,
    /// Energy plus every recurring annual cost, for a single year.
    pub annual_recurring_total: Decimal,
    pub breakdown: CostBreakdown,
    pub annual_fuel_cost: Decimal,
    pub annual_electric_cost: Decimal,
    pub acquisition: AcquisitionBreakdown,
}
