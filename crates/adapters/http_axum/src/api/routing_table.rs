//! Routing table export for downstream proxies.

use axum::Json;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};

use hostmap_app::ports::DomainRepository;
use hostmap_domain::routing_table::RoutingTable;

use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the routing table endpoints.
pub enum TableResponse {
    Json(Json<RoutingTable>),
    Nginx(String),
}

impl IntoResponse for TableResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Json(json) => json.into_response(),
            Self::Nginx(conf) => {
                ([(CONTENT_TYPE, "text/plain; charset=utf-8")], conf).into_response()
            }
        }
    }
}

/// `GET /api/routing-table`
pub async fn json<DR>(State(state): State<AppState<DR>>) -> Result<TableResponse, ApiError>
where
    DR: DomainRepository + Send + Sync + 'static,
{
    let table = state.registry.routing_table().await?;
    Ok(TableResponse::Json(Json(table)))
}

/// `GET /api/routing-table/nginx`
pub async fn nginx<DR>(State(state): State<AppState<DR>>) -> Result<TableResponse, ApiError>
where
    DR: DomainRepository + Send + Sync + 'static,
{
    let table = state.registry.routing_table().await?;
    Ok(TableResponse::Nginx(table.to_nginx_conf(&state.nginx)))
}
