//! Axum router assembly.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use hostmap_app::ports::DomainRepository;

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests API routes under `/api` next to a `/health` check.
/// Includes a [`TraceLayer`] that logs each HTTP request/response at the
/// `DEBUG` level using the `tracing` ecosystem.
pub fn build<DR>(state: AppState<DR>) -> Router
where
    DR: DomainRepository + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use hostmap_app::services::domain_registry::DomainRegistry;
    use hostmap_domain::domain::{Domain, DomainName};
    use hostmap_domain::error::{HostmapError, NotFoundError};
    use hostmap_domain::host::Host;
    use hostmap_domain::routing_table::NginxOptions;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    struct StubDomainRepo;

    impl hostmap_app::ports::DomainRepository for StubDomainRepo {
        async fn get(&self, _identifier: &DomainName) -> Result<Option<Domain>, HostmapError> {
            Ok(None)
        }
        async fn get_all(&self) -> Result<Vec<Domain>, HostmapError> {
            Ok(vec![])
        }
        async fn insert(&self, mut domain: Domain) -> Result<Domain, HostmapError> {
            domain.revision = 1;
            Ok(domain)
        }
        async fn compare_and_swap(
            &self,
            identifier: &DomainName,
            _expected_revision: u32,
            _next: Domain,
        ) -> Result<Domain, HostmapError> {
            Err(NotFoundError::domain(identifier.as_str()).into())
        }
        async fn delete(&self, identifier: &DomainName) -> Result<(), HostmapError> {
            Err(NotFoundError::domain(identifier.as_str()).into())
        }
    }

    fn test_state() -> AppState<StubDomainRepo> {
        AppState::new(DomainRegistry::new(StubDomainRepo))
    }

    fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn valid_domain() -> Value {
        json!({
            "identifier": "api.example.com",
            "hosts": [{ "address": "http://localhost:4000", "pathPrefix": "/" }]
        })
    }

    #[tokio::test]
    async fn should_return_ok_when_health_check_called() {
        let app = build(test_state());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn should_list_empty_registry() {
        let response = build(test_state())
            .oneshot(
                Request::builder()
                    .uri("/api/domains")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn should_return_created_for_valid_domain() {
        let response = build(test_state())
            .oneshot(post_json("/api/domains", &valid_domain()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["identifier"], "api.example.com");
        assert_eq!(body["revision"], 1);
    }

    #[tokio::test]
    async fn should_return_field_errors_for_invalid_domain() {
        let response = build(test_state())
            .oneshot(post_json(
                "/api/domains",
                &json!({
                    "identifier": "api.example.com",
                    "hosts": [{ "address": "nope", "pathPrefix": "" }]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        let paths: Vec<&str> = body["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|field| field["path"].as_str().unwrap())
            .collect();
        assert_eq!(paths, ["hosts.0.address", "hosts.0.pathPrefix"]);
    }

    #[tokio::test]
    async fn should_report_wrongly_typed_field_as_field_error() {
        let response = build(test_state())
            .oneshot(post_json(
                "/api/domains",
                &json!({
                    "identifier": "api.example.com",
                    "hosts": [{ "address": 4000, "pathPrefix": "/" }]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(
            response.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("application/json")
        );
        let body = body_json(response).await;
        assert_eq!(body["error"], "validation failed");
        assert_eq!(body["fields"][0]["path"], "hosts.0.address");
    }

    #[tokio::test]
    async fn should_return_json_error_for_malformed_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/domains")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"identifier\": "))
            .unwrap();

        let response = build(test_state()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn should_return_not_found_for_missing_domain() {
        let response = build(test_state())
            .oneshot(
                Request::builder()
                    .uri("/api/domains/missing.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_reject_mutation_without_token_when_configured() {
        let app = build(test_state().with_api_token("s3cret"));

        let response = app
            .oneshot(post_json("/api/domains", &valid_domain()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn should_accept_mutation_with_matching_token() {
        let app = build(test_state().with_api_token("s3cret"));
        let mut request = post_json("/api/domains", &valid_domain());
        request.headers_mut().insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_static("Bearer s3cret"),
        );

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn should_render_nginx_conf_with_configured_options() {
        struct OneDomainRepo;

        impl hostmap_app::ports::DomainRepository for OneDomainRepo {
            async fn get(&self, _identifier: &DomainName) -> Result<Option<Domain>, HostmapError> {
                Ok(None)
            }
            async fn get_all(&self) -> Result<Vec<Domain>, HostmapError> {
                let domain = Domain::builder()
                    .identifier("api.example.com")
                    .host(
                        Host::builder()
                            .address("http://localhost:4000")
                            .path_prefix("/")
                            .build()?,
                    )
                    .build()?;
                Ok(vec![domain])
            }
            async fn insert(&self, domain: Domain) -> Result<Domain, HostmapError> {
                Ok(domain)
            }
            async fn compare_and_swap(
                &self,
                identifier: &DomainName,
                _expected_revision: u32,
                _next: Domain,
            ) -> Result<Domain, HostmapError> {
                Err(NotFoundError::domain(identifier.as_str()).into())
            }
            async fn delete(&self, identifier: &DomainName) -> Result<(), HostmapError> {
                Err(NotFoundError::domain(identifier.as_str()).into())
            }
        }

        let state = AppState::new(DomainRegistry::new(OneDomainRepo)).with_nginx_options(
            NginxOptions {
                tls: false,
                cert_dir: "/srv/certs".to_string(),
                client_max_body_size: "1m".to_string(),
            },
        );

        let response = build(state)
            .oneshot(
                Request::builder()
                    .uri("/api/routing-table/nginx")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let conf = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(conf.contains("server_name api.example.com www.api.example.com;"));
        assert!(conf.contains("client_max_body_size 1m;"));
        assert!(!conf.contains("ssl_certificate"));
    }

    #[tokio::test]
    async fn should_serve_reads_without_token() {
        let app = build(test_state().with_api_token("s3cret"));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/routing-table")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["virtualHosts"], json!([]));
    }
}
