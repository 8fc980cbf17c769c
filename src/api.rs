//! HTTP API for the vehicle cost engine.
//!
//! This module exposes a minimal REST API around the estimation
//! engine using the [`axum`](https://crates.io/crates/axum) framework.
//! Clients submit an [`EstimationInput`] and receive the estimate in
//! JSON.  Blank prices and tax rates are filled from the regional
//! reference data before the input is validated.

use crate::config::AppConfig;
use crate::engine::{estimate, estimate_batch};
use crate::error::ApiError;
use crate::models::{EstimationInput, EstimationResult};
use crate::reference::{
    apply_suggestions, AppliedSuggestion, CachedSource, ReferenceDataSource, RegionalTable,
    SuggestedData,
};
use crate::validation::{validate, FieldError, ValidationErrors};
use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across requests.
pub struct AppState {
    pub reference: Arc<dyn ReferenceDataSource>,
}

/// An input that has been normalised, completed from reference data
/// and validated.
#[derive(Debug, Clone)]
pub struct PreparedInput {
    pub input: EstimationInput,
    pub suggested: SuggestedData,
    pub applied: Vec<AppliedSuggestion>,
}

/// Normalise `input`, fill blanks from `reference`, then validate.
pub fn prepare_input(
    reference: &dyn ReferenceDataSource,
    input: EstimationInput,
) -> Result<PreparedInput, ValidationErrors> {
    let mut input = input.normalized();
    let suggested = reference.suggest(&input.country_code, input.region.as_deref());
    let applied = apply_suggestions(&mut input, &suggested);
    if let Err(errors) = validate(&input) {
        warn!(country_code = %input.country_code, %errors, "rejected estimation input");
        return Err(errors);
    }
    Ok(PreparedInput {
        input,
        suggested,
        applied,
    })
}

#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    pub result: EstimationResult,
    pub suggested: SuggestedData,
    pub applied_suggestions: Vec<AppliedSuggestion>,
    pub notices: Vec<&'static str>,
}

impl EstimateResponse {
    fn new(prepared: PreparedInput, result: EstimationResult) -> Self {
        let notices = prepared.applied.iter().map(|s| s.message()).collect();
        Self {
            result,
            suggested: prepared.suggested,
            applied_suggestions: prepared.applied,
            notices,
        }
    }
}

/// Outcome for one entry of a batch request.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchItem {
    Estimated(EstimateResponse),
    Invalid { fields: Vec<FieldError> },
}

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    pub country: String,
    #[serde(default)]
    pub region: Option<String>,
}

/// Build the API router around the given reference data source.
pub fn build_router(reference: Arc<dyn ReferenceDataSource>) -> Router {
    let state = Arc::new(AppState { reference });
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/estimate", post(estimate_handler))
        .route("/api/estimate/batch", post(batch_handler))
        .route("/api/suggestions", get(suggestions_handler))
        .with_state(state)
}

/// Handler for POST /api/estimate
async fn estimate_handler(
    State(app_state): State<Arc<AppState>>,
    Json(input): Json<EstimationInput>,
) -> Result<Json<EstimateResponse>, ApiError> {
    let prepared = prepare_input(app_state.reference.as_ref(), input)?;
    let result = estimate(&prepared.input);
    Ok(Json(EstimateResponse::new(prepared, result)))
}

/// Handler for POST /api/estimate/batch
///
/// Invalid entries are reported in place; the valid ones are priced
/// in parallel off the async runtime.
async fn batch_handler(
    State(app_state): State<Arc<AppState>>,
    Json(inputs): Json<Vec<EstimationInput>>,
) -> Result<Json<Vec<BatchItem>>, ApiError> {
    let prepared: Vec<_> = inputs
        .into_iter()
        .map(|input| prepare_input(app_state.reference.as_ref(), input))
        .collect();

    let items = tokio::task::spawn_blocking(move || {
        let valid: Vec<EstimationInput> = prepared
            .iter()
            .filter_map(|p| p.as_ref().ok().map(|p| p.input.clone()))
            .collect();
        let mut results = estimate_batch(&valid).into_iter();
        prepared
            .into_iter()
            .map(|p| match p {
                Ok(prepared) => results
                    .next()
                    .map(|result| BatchItem::Estimated(EstimateResponse::new(prepared, result))),
                Err(errors) => Some(BatchItem::Invalid { fields: errors.errors }),
            })
            .collect::<Option<Vec<_>>>()
    })
    .await
    .map_err(|err| ApiError::Internal(err.to_string()))?
    .ok_or_else(|| ApiError::Internal("batch results out of step with inputs".to_string()))?;

    Ok(Json(items))
}

/// Handler for GET /api/suggestions?country=XX&region=YY
async fn suggestions_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<SuggestionQuery>,
) -> Json<SuggestedData> {
    Json(app_state.reference.suggest(&query.country, query.region.as_deref()))
}

/// Launch the API server.  Loads reference data from the configured
/// directory, binds to the configured address and blocks until the
/// server terminates.
pub async fn serve(config: &AppConfig) -> Result<()> {
    let table = RegionalTable::load_from_dir(&config.reference.data_dir)?;
    let reference = CachedSource::with_capacity(table, config.reference.cache_capacity);
    let router = build_router(Arc::new(reference));

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "server listening");
    axum::serve(listener, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::RegionalDefaults;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn router() -> Router {
        let table = RegionalTable::new([RegionalDefaults {
            country_code: "US".into(),
            region: None,
            currency_code: Some("USD".into()),
            fuel_price_per_liter: Some(dec!(1.00)),
            fuel_price_per_gallon: None,
            electricity_price_per_kwh: Some(dec!(0.15)),
            tax_rate_percent: Some(dec!(10)),
            tax_rate_fraction: None,
        }]);
        build_router(Arc::new(CachedSource::new(table)))
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn cash_body() -> Value {
        json!({
            "country_code": "us",
            "ownership_period_years": 1,
            "purchase_price": "20000",
            "purchase_type": "cash",
            "annual_distance": 10000,
            "fuel_type": "gasoline",
            "fuel_consumption_per_100": "8",
            "local_tax_rate": ""
        })
    }

    #[tokio::test]
    async fn test_estimate_applies_suggestions() {
        let (status, body) = send(router(), post_json("/api/estimate", cash_body())).await;
        assert_eq!(status, StatusCode::OK);
        // 22000 acquisition plus 100 * 8 * 1.00 fuel.
        assert_eq!(body["result"]["total_cost"], "22800.00");
        assert_eq!(body["result"]["currency_code"], "USD");
        assert_eq!(body["result"]["acquisition"]["purchase_type"], "cash");
        assert_eq!(
            body["applied_suggestions"],
            json!(["currency_code", "fuel_price", "electricity_price", "tax_rate"])
        );
        assert_eq!(body["notices"].as_array().map(Vec::len), Some(4));
    }

    #[tokio::test]
    async fn test_estimate_rejects_missing_finance_fields() {
        let mut body = cash_body();
        body["purchase_type"] = json!("finance");
        let (status, body) = send(router(), post_json("/api/estimate", body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["fields"],
            json!([
                {"field": "finance_interest_rate", "code": "required"},
                {"field": "finance_term_months", "code": "required"}
            ])
        );
    }

    #[tokio::test]
    async fn test_batch_reports_each_entry() {
        let mut lease = cash_body();
        lease["purchase_type"] = json!("lease");
        let request = post_json("/api/estimate/batch", json!([cash_body(), lease]));
        let (status, body) = send(router(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["status"], "estimated");
        assert_eq!(body[0]["result"]["total_cost"], "22800.00");
        assert_eq!(body[1]["status"], "invalid");
        assert_eq!(body[1]["fields"][0]["field"], "lease_term_months");
    }

    #[tokio::test]
    async fn test_estimate_rejects_oversized_inputs() {
        let mut body = cash_body();
        body["purchase_type"] = json!("finance");
        body["finance_interest_rate"] = json!("0.0000000000000001");
        body["finance_term_months"] = json!(50_000_000);
        body["insurance_cost_annual"] = json!("10000000000000000000000000000");
        let (status, body) = send(router(), post_json("/api/estimate", body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body["fields"],
            json!([
                {"field": "insurance_cost_annual", "code": "out_of_range"},
                {"field": "finance_term_months", "code": "out_of_range"}
            ])
        );
    }

    #[tokio::test]
    async fn test_suggestions_endpoint() {
        let request = Request::builder()
            .uri("/api/suggestions?country=us")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["currency_code"], "USD");
        assert_eq!(body["tax_rate_percent"], "10");
    }
}
