//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use hostmap_domain::error::HostmapError;
use hostmap_domain::validation::ValidationErrors;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldBody>,
}

#[derive(Serialize)]
struct FieldBody {
    path: String,
    reason: String,
}

/// Maps registry errors and unreadable request bodies to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    Domain(HostmapError),
    /// The body was not JSON at all, or not sent as JSON.
    Body(JsonRejection),
}

impl From<HostmapError> for ApiError {
    fn from(err: HostmapError) -> Self {
        Self::Domain(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(err: ValidationErrors) -> Self {
        Self::Domain(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Domain(HostmapError::Validation(errors)) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "validation failed".to_string(),
                    fields: errors
                        .iter()
                        .map(|err| FieldBody {
                            path: err.path.clone(),
                            reason: err.reason(),
                        })
                        .collect(),
                },
            ),
            Self::Domain(HostmapError::Conflict(err)) => {
                (StatusCode::CONFLICT, ErrorBody::message(err))
            }
            Self::Domain(HostmapError::NotFound(err)) => {
                (StatusCode::NOT_FOUND, ErrorBody::message(err))
            }
            Self::Domain(HostmapError::Storage(err)) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::message("internal server error"),
                )
            }
            Self::Body(rejection) => (
                rejection.status(),
                ErrorBody::message(rejection.body_text()),
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl ErrorBody {
    fn message(message: impl ToString) -> Self {
        Self {
            error: message.to_string(),
            fields: Vec::new(),
        }
    }
}

/// Rejection for mutating requests without a valid bearer token.
#[derive(Debug)]
pub struct Unauthorized;

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            [(axum::http::header::WWW_AUTHENTICATE, "Bearer")],
            Json(ErrorBody::message("missing or invalid bearer token")),
        )
            .into_response()
    }
}
