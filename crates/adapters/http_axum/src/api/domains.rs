//! JSON REST handlers for domains.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use hostmap_app::ports::DomainRepository;
use hostmap_domain::domain::{Domain, DomainCandidate, PartialDomainCandidate};
use hostmap_domain::schema::VersionedDomain;

use crate::auth::AuthenticatedCaller;
use crate::error::ApiError;
use crate::extract::Payload;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<Vec<Domain>>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the get, update and replace endpoints.
pub enum DomainResponse {
    Ok(Json<Domain>),
}

impl IntoResponse for DomainResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the create and import endpoints.
pub enum CreateResponse {
    Created(Json<Domain>),
}

impl IntoResponse for CreateResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Created(json) => (StatusCode::CREATED, json).into_response(),
        }
    }
}

/// Possible responses from the delete endpoint.
pub enum DeleteResponse {
    NoContent,
}

impl IntoResponse for DeleteResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/domains`
pub async fn list<DR>(State(state): State<AppState<DR>>) -> Result<ListResponse, ApiError>
where
    DR: DomainRepository + Send + Sync + 'static,
{
    let domains = state.registry.list().await?;
    Ok(ListResponse::Ok(Json(domains)))
}

/// `GET /api/domains/:identifier`
pub async fn get<DR>(
    State(state): State<AppState<DR>>,
    Path(identifier): Path<String>,
) -> Result<DomainResponse, ApiError>
where
    DR: DomainRepository + Send + Sync + 'static,
{
    let domain = state.registry.get(&identifier).await?;
    Ok(DomainResponse::Ok(Json(domain)))
}

/// `POST /api/domains`
pub async fn create<DR>(
    _caller: AuthenticatedCaller,
    State(state): State<AppState<DR>>,
    Payload(candidate): Payload<DomainCandidate>,
) -> Result<CreateResponse, ApiError>
where
    DR: DomainRepository + Send + Sync + 'static,
{
    let created = state.registry.create(&candidate).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `POST /api/domains/import`
pub async fn import<DR>(
    _caller: AuthenticatedCaller,
    State(state): State<AppState<DR>>,
    Payload(payload): Payload<VersionedDomain>,
) -> Result<CreateResponse, ApiError>
where
    DR: DomainRepository + Send + Sync + 'static,
{
    let created = state.registry.import(payload).await?;
    Ok(CreateResponse::Created(Json(created)))
}

/// `PATCH /api/domains/:identifier`
pub async fn update<DR>(
    _caller: AuthenticatedCaller,
    State(state): State<AppState<DR>>,
    Path(identifier): Path<String>,
    Payload(candidate): Payload<PartialDomainCandidate>,
) -> Result<DomainResponse, ApiError>
where
    DR: DomainRepository + Send + Sync + 'static,
{
    let updated = state.registry.update(&identifier, &candidate).await?;
    Ok(DomainResponse::Ok(Json(updated)))
}

/// `PUT /api/domains/:identifier`
pub async fn replace<DR>(
    _caller: AuthenticatedCaller,
    State(state): State<AppState<DR>>,
    Path(identifier): Path<String>,
    Payload(candidate): Payload<DomainCandidate>,
) -> Result<DomainResponse, ApiError>
where
    DR: DomainRepository + Send + Sync + 'static,
{
    let replaced = state.registry.replace(&identifier, &candidate).await?;
    Ok(DomainResponse::Ok(Json(replaced)))
}

/// `DELETE /api/domains/:identifier`
pub async fn delete<DR>(
    _caller: AuthenticatedCaller,
    State(state): State<AppState<DR>>,
    Path(identifier): Path<String>,
) -> Result<DeleteResponse, ApiError>
where
    DR: DomainRepository + Send + Sync + 'static,
{
    state.registry.delete(&identifier).await?;
    Ok(DeleteResponse::NoContent)
}
