use crate::error::{FieldViolation, FoodCartError};
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Domain(#[from] FoodCartError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedPayload(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    violations: Vec<FieldViolation>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, violations) = match self {
            ApiError::MalformedPayload(ref reason) => (
                StatusCode::BAD_REQUEST,
                vec![FieldViolation::new("body", reason.clone())],
            ),
            ApiError::Domain(FoodCartError::Validation(ref found)) => {
                (StatusCode::BAD_REQUEST, found.clone())
            }
            ApiError::Domain(FoodCartError::NotFound { .. }) => (StatusCode::NOT_FOUND, Vec::new()),
            ApiError::Domain(FoodCartError::InvalidTransition { .. }) => {
                (StatusCode::CONFLICT, Vec::new())
            }
            ApiError::Domain(ref e) => {
                error!(error = %e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Vec::new())
            }
        };

        let body = ErrorBody {
            error: if status == StatusCode::INTERNAL_SERVER_ERROR {
                "Internal error".to_string()
            } else {
                self.to_string()
            },
            violations,
        };
        (status, Json(body)).into_response()
    }
}
