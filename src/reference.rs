//! Regional reference data.
//!
//! Reference data supplies fallback values for an estimate (local
//! currency, fuel and electricity prices, sales tax) when the caller
//! leaves them blank.  The [`ReferenceDataSource`] trait abstracts
//! where the values come from; [`RegionalTable`] reads them from a
//! directory of JSON files and [`CachedSource`] memoises lookups per
//! region code.  Lookups never fail: missing data is simply `None`.

use crate::decimal::round_to;
use crate::models::EstimationInput;
use moka::sync::Cache;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

const LITERS_PER_US_GALLON: Decimal = dec!(3.78541);
const FUEL_PRICE_SCALE: u32 = 3;

/// Default number of region codes kept by [`CachedSource`].
pub const DEFAULT_CACHE_CAPACITY: u64 = 64;

/// Errors raised while loading reference data.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("failed to read reference data from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Suggested defaults for one region.  Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedData {
    pub currency_code: Option<String>,
    pub fuel_price_per_liter: Option<Decimal>,
    pub electricity_price_per_kwh: Option<Decimal>,
    pub tax_rate_percent: Option<Decimal>,
}

impl SuggestedData {
    /// Fill every field that is `None` here from `fallback`.
    fn or(self, fallback: SuggestedData) -> SuggestedData {
        SuggestedData {
            currency_code: self.currency_code.or(fallback.currency_code),
            fuel_price_per_liter: self.fuel_price_per_liter.or(fallback.fuel_price_per_liter),
            electricity_price_per_kwh: self
                .electricity_price_per_kwh
                .or(fallback.electricity_price_per_kwh),
            tax_rate_percent: self.tax_rate_percent.or(fallback.tax_rate_percent),
        }
    }
}

/// A provider of regional defaults.
///
/// Implementations must be thread-safe (`Send + Sync`) because the
/// HTTP layer shares a single source across all requests.
pub trait ReferenceDataSource: Send + Sync {
    /// Suggested values for `country_code`, optionally refined by
    /// `region`.  Codes are compared case-insensitively.
    fn suggest(&self, country_code: &str, region: Option<&str>) -> SuggestedData;
}

/// One reference record as stored on disk.
///
/// Fuel prices may be given per liter or per US gallon and tax rates
/// as a percentage or as a fraction; the per-liter and percentage
/// forms win when both are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalDefaults {
    pub country_code: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(default)]
    pub fuel_price_per_liter: Option<Decimal>,
    #[serde(default)]
    pub fuel_price_per_gallon: Option<Decimal>,
    #[serde(default)]
    pub electricity_price_per_kwh: Option<Decimal>,
    #[serde(default)]
    pub tax_rate_percent: Option<Decimal>,
    #[serde(default)]
    pub tax_rate_fraction: Option<Decimal>,
}

impl RegionalDefaults {
    fn key(&self) -> String {
        region_key(&self.country_code, self.region.as_deref())
    }

    /// Convert to suggestions, dropping zero values.
    fn to_suggested(&self) -> SuggestedData {
        let fuel_price = self
            .fuel_price_per_liter
            .or_else(|| {
                self.fuel_price_per_gallon
                    .map(|g| round_to(g / LITERS_PER_US_GALLON, FUEL_PRICE_SCALE))
            });
        let tax_rate = self
            .tax_rate_percent
            .or_else(|| self.tax_rate_fraction.map(|f| f * Decimal::ONE_HUNDRED));
        SuggestedData {
            currency_code: self
                .currency_code
                .as_deref()
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty()),
            fuel_price_per_liter: non_zero(fuel_price),
            electricity_price_per_kwh: non_zero(self.electricity_price_per_kwh),
            tax_rate_percent: non_zero(tax_rate),
        }
    }
}

fn non_zero(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|v| !v.is_zero())
}

/// Cache and table key: `"US"` or `"US/CA"`.
pub fn region_key(country_code: &str, region: Option<&str>) -> String {
    let country = country_code.trim().to_uppercase();
    match region.map(str::trim).filter(|r| !r.is_empty()) {
        Some(region) => format!("{country}/{}", region.to_uppercase()),
        None => country,
    }
}

/// An in-memory table of regional defaults.
///
/// Region records override the country record field by field, so a
/// state file only needs the values that differ from the national
/// ones.
#[derive(Debug, Clone, Default)]
pub struct RegionalTable {
    entries: HashMap<String, SuggestedData>,
}

impl RegionalTable {
    pub fn new(records: impl IntoIterator<Item = RegionalDefaults>) -> Self {
        let entries = records
            .into_iter()
            .map(|record| (record.key(), record.to_suggested()))
            .collect();
        Self { entries }
    }

    /// Load every `.json` file in `path` as a [`RegionalDefaults`].
    ///
    /// Files that fail to parse are logged and skipped.  A missing
    /// directory yields an empty table, so the service still runs
    /// without any reference data.
    pub fn load_from_dir(path: &Path) -> Result<Self, ReferenceError> {
        let io_err = |source| ReferenceError::Io {
            path: path.display().to_string(),
            source,
        };
        let mut records = Vec::new();
        if !path.is_dir() {
            warn!(path = %path.display(), "reference data directory not found");
            return Ok(Self::default());
        }
        for entry in std::fs::read_dir(path).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let file = entry.path();
            let is_json = file.extension().is_some_and(|ext| ext == "json");
            if !entry.file_type().map_err(io_err)?.is_file() || !is_json {
                continue;
            }
            let data = std::fs::read_to_string(&file).map_err(io_err)?;
            match serde_json::from_str::<RegionalDefaults>(&data) {
                Ok(record) => records.push(record),
                Err(err) => warn!(
                    file = %file.display(),
                    error = %err,
                    "skipping unreadable reference file"
                ),
            }
        }
        let table = Self::new(records);
        info!(path = %path.display(), regions = table.len(), "loaded regional reference data");
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ReferenceDataSource for RegionalTable {
    fn suggest(&self, country_code: &str, region: Option<&str>) -> SuggestedData {
        let national = self
            .entries
            .get(&region_key(country_code, None))
            .cloned()
            .unwrap_or_default();
        let regional = region
            .and_then(|r| self.entries.get(&region_key(country_code, Some(r))))
            .cloned();
        match regional {
            Some(regional) => regional.or(national),
            None => national,
        }
    }
}

/// Memoises another source, keyed by region code.
///
/// Capacity is bounded; entries otherwise live for the lifetime of
/// the process.
pub struct CachedSource<S> {
    inner: S,
    cache: Cache<String, SuggestedData>,
}

impl<S: ReferenceDataSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self::with_capacity(inner, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(inner: S, max_capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::new(max_capacity),
        }
    }
}

impl<S: ReferenceDataSource> ReferenceDataSource for CachedSource<S> {
    fn suggest(&self, country_code: &str, region: Option<&str>) -> SuggestedData {
        let key = region_key(country_code, region);
        self.cache.get_with(key, || {
            debug!(country_code, ?region, "reference cache miss");
            self.inner.suggest(country_code, region)
        })
    }
}

/// A suggested value that replaced a blank input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppliedSuggestion {
    CurrencyCode,
    FuelPrice,
    ElectricityPrice,
    TaxRate,
}

impl AppliedSuggestion {
    /// A notice suitable for showing to the user.
    pub fn message(self) -> &'static str {
        match self {
            Self::CurrencyCode => "Applied suggested local currency from available data.",
            Self::FuelPrice => "Applied suggested local fuel price from available data.",
            Self::ElectricityPrice => {
                "Applied suggested local electricity price from available data."
            }
            Self::TaxRate => "Applied suggested local tax rate from available data.",
        }
    }
}

/// Substitute suggestions for absent or zero inputs.
///
/// A non-zero value supplied by the caller always wins.  Returns the
/// suggestions that were applied, in field order.
pub fn apply_suggestions(
    input: &mut EstimationInput,
    suggested: &SuggestedData,
) -> Vec<AppliedSuggestion> {
    let mut applied = Vec::new();

    if input.currency_code.as_deref().is_none_or(str::is_empty) {
        if let Some(code) = &suggested.currency_code {
            input.currency_code = Some(code.clone());
            applied.push(AppliedSuggestion::CurrencyCode);
        }
    }
    if fill(&mut input.fuel_price_per_liter, suggested.fuel_price_per_liter) {
        applied.push(AppliedSuggestion::FuelPrice);
    }
    if fill(&mut input.electricity_price_per_kwh, suggested.electricity_price_per_kwh) {
        applied.push(AppliedSuggestion::ElectricityPrice);
    }
    if fill(&mut input.local_tax_rate, suggested.tax_rate_percent) {
        applied.push(AppliedSuggestion::TaxRate);
    }

    for suggestion in &applied {
        info!(country_code = %input.country_code, ?suggestion, "{}", suggestion.message());
    }
    applied
}

fn fill(slot: &mut Option<Decimal>, suggestion: Option<Decimal>) -> bool {
    let blank = slot.is_none_or(|v| v.is_zero());
    match suggestion {
        Some(value) if blank => {
            *slot = Some(value);
            true
        }
        _ => false,
    }
}
