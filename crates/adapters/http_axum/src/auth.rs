//! Authenticated-caller extractor for mutating routes.
//!
//! The token is opaque: it is compared against the configured value and
//! never interpreted. Login flows live outside this service.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::Unauthorized;
use crate::state::AppState;

/// Proof that the request carried the configured bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedCaller;

impl<DR> FromRequestParts<AppState<DR>> for AuthenticatedCaller
where
    DR: Send + Sync + 'static,
{
    type Rejection = Unauthorized;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<DR>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.api_token.as_deref() else {
            return Ok(Self);
        };

        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));

        match presented {
            Some(token) if token == expected => Ok(Self),
            _ => Err(Unauthorized),
        }
    }
}
