//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod domains;
#[allow(clippy::missing_errors_doc)]
pub mod routing_table;

use axum::Router;
use axum::routing::{get, post};

use hostmap_app::ports::DomainRepository;

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<DR>() -> Router<AppState<DR>>
where
    DR: DomainRepository + Send + Sync + 'static,
{
    Router::new()
        // Domains
        .route(
            "/domains",
            get(domains::list::<DR>).post(domains::create::<DR>),
        )
        .route("/domains/import", post(domains::import::<DR>))
        .route(
            "/domains/{identifier}",
            get(domains::get::<DR>)
                .patch(domains::update::<DR>)
                .put(domains::replace::<DR>)
                .delete(domains::delete::<DR>),
        )
        // Routing table
        .route("/routing-table", get(routing_table::json::<DR>))
        .route("/routing-table/nginx", get(routing_table::nginx::<DR>))
}
