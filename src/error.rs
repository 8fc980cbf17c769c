//! Errors surfaced by the HTTP layer.
//!
//! The engine itself has no failure path; everything here is raised
//! before it runs (validation) or around it (a failed worker task).
//! Start-up failures such as unreadable reference data never reach a
//! request and are reported through `anyhow` by [`crate::api::serve`].

use crate::validation::{FieldError, ValidationErrors};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid estimation input: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "<[FieldError]>::is_empty")]
    fields: &'a [FieldError],
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let fields: &[FieldError] = match &self {
            Self::Validation(errors) => &errors.errors,
            _ => &[],
        };
        let body = ErrorBody {
            error: self.to_string(),
            fields,
        };
        (status, Json(body)).into_response()
    }
}
