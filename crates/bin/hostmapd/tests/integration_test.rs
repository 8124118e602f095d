//! End-to-end smoke tests for the full hostmapd stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, real repo,
//! real registry, real axum router) and exercises the HTTP layer via
//! `tower::ServiceExt::oneshot` — no TCP port is bound.

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use hostmap_adapter_http_axum::router;
use hostmap_adapter_http_axum::state::AppState;
use hostmap_adapter_storage_sqlite_sqlx::{Config, SqliteDomainRepository};
use hostmap_app::services::domain_registry::DomainRegistry;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Build a fully-wired router backed by an in-memory `SQLite` database.
async fn app() -> axum::Router {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");

    let repo = SqliteDomainRepository::new(db.pool().clone());
    let state = AppState::new(DomainRegistry::new(repo));

    router::build(state)
}

fn request(method: &str, uri: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, req).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn example_domain() -> Value {
    json!({
        "identifier": "example.com",
        "environment": "production",
        "hosts": [
            { "address": "http://localhost:3000", "pathPrefix": "/" },
            { "type": "websocket", "address": "ws://localhost:3001", "pathPrefix": "/ws" }
        ]
    })
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let app = app().await;

    let (status, body) = send(&app, request("GET", "/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

// ---------------------------------------------------------------------------
// Domains
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_create_and_fetch_domain() {
    let app = app().await;

    let (status, created) = send_json(
        &app,
        request("POST", "/api/domains", Some(&example_domain())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["identifier"], "example.com");
    assert_eq!(created["revision"], 1);
    assert_eq!(created["hosts"][0]["type"], "default");

    let (status, fetched) =
        send_json(&app, request("GET", "/api/domains/EXAMPLE.com", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn should_reject_identifier_differing_only_in_case() {
    let app = app().await;
    send(&app, request("POST", "/api/domains", Some(&example_domain()))).await;

    let mut duplicate = example_domain();
    duplicate["identifier"] = json!("Example.COM");
    let (status, body) = send_json(&app, request("POST", "/api/domains", Some(&duplicate))).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("example.com"));
}

#[tokio::test]
async fn should_report_every_invalid_field_without_persisting() {
    let app = app().await;

    let (status, body) = send_json(
        &app,
        request(
            "POST",
            "/api/domains",
            Some(&json!({
                "hosts": [
                    { "type": "carrier-pigeon", "address": "ftp://files", "pathPrefix": "/" },
                    { "address": "http://localhost:1" }
                ]
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let paths: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|field| field["path"].as_str().unwrap())
        .collect();
    assert_eq!(
        paths,
        [
            "identifier",
            "hosts.0.type",
            "hosts.0.address",
            "hosts.1.pathPrefix"
        ]
    );

    let (_, list) = send_json(&app, request("GET", "/api/domains", None)).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn should_replace_hosts_wholesale_on_patch() {
    let app = app().await;
    send(&app, request("POST", "/api/domains", Some(&example_domain()))).await;

    let (status, updated) = send_json(
        &app,
        request(
            "PATCH",
            "/api/domains/example.com",
            Some(&json!({
                "hosts": [{ "address": "https://backend.internal", "pathPrefix": "/" }]
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["revision"], 2);
    assert_eq!(updated["environment"], "production");
    assert_eq!(updated["hosts"].as_array().unwrap().len(), 1);
    assert_eq!(updated["hosts"][0]["address"], "https://backend.internal");
}

#[tokio::test]
async fn should_clear_environment_when_patched_with_null() {
    let app = app().await;
    send(&app, request("POST", "/api/domains", Some(&example_domain()))).await;

    let (status, updated) = send_json(
        &app,
        request(
            "PATCH",
            "/api/domains/example.com",
            Some(&json!({ "environment": null })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(updated.get("environment").is_none());
}

#[tokio::test]
async fn should_replace_domain_on_put() {
    let app = app().await;
    send(&app, request("POST", "/api/domains", Some(&example_domain()))).await;

    let (status, replaced) = send_json(
        &app,
        request(
            "PUT",
            "/api/domains/example.com",
            Some(&json!({
                "identifier": "example.com",
                "hosts": [{ "address": "http://localhost:8080", "pathPrefix": "/" }]
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(replaced.get("environment").is_none());
    assert_eq!(replaced["revision"], 2);
}

#[tokio::test]
async fn should_return_not_found_when_updating_missing_domain() {
    let app = app().await;

    let (status, _) = send_json(
        &app,
        request(
            "PATCH",
            "/api/domains/missing.example.com",
            Some(&json!({ "environment": "staging" })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_return_not_found_on_second_delete() {
    let app = app().await;
    send(&app, request("POST", "/api/domains", Some(&example_domain()))).await;

    let (first, _) = send(&app, request("DELETE", "/api/domains/example.com", None)).await;
    let (second, _) = send(&app, request("DELETE", "/api/domains/example.com", None)).await;
    let (lookup, _) = send(&app, request("GET", "/api/domains/example.com", None)).await;

    assert_eq!(first, StatusCode::NO_CONTENT);
    assert_eq!(second, StatusCode::NOT_FOUND);
    assert_eq!(lookup, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn should_list_domains_in_insertion_order() {
    let app = app().await;
    for identifier in ["b.example.com", "a.example.com", "c.example.com"] {
        let mut domain = example_domain();
        domain["identifier"] = json!(identifier);
        send(&app, request("POST", "/api/domains", Some(&domain))).await;
    }

    let (status, list) = send_json(&app, request("GET", "/api/domains", None)).await;

    assert_eq!(status, StatusCode::OK);
    let identifiers: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|domain| domain["identifier"].as_str().unwrap())
        .collect();
    assert_eq!(
        identifiers,
        ["b.example.com", "a.example.com", "c.example.com"]
    );
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_import_v1_payload() {
    let app = app().await;

    let (status, imported) = send_json(
        &app,
        request(
            "POST",
            "/api/domains/import",
            Some(&json!({
                "schemaVersion": "v1",
                "id": 7,
                "domain": "legacy.example.com",
                "hosts": [{ "type": "default", "host": "http://localhost:4000", "path": "/" }]
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(imported["identifier"], "legacy.example.com");
    assert_eq!(imported["hosts"][0]["pathPrefix"], "/");
    assert!(imported.get("id").is_none());
}

#[tokio::test]
async fn should_import_named_port_payload() {
    let app = app().await;

    let (status, imported) = send_json(
        &app,
        request(
            "POST",
            "/api/domains/import",
            Some(&json!({
                "schemaVersion": "v3-named-port",
                "identifier": "ports.example.com",
                "hosts": [{ "name": "web", "port": 8080, "prefix": "/" }]
            })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(imported["hosts"][0]["address"], "http://localhost:8080");
    assert_eq!(imported["hosts"][0]["name"], "web");
}

#[tokio::test]
async fn should_reject_import_without_schema_version() {
    let app = app().await;

    let (status, _) = send(
        &app,
        request("POST", "/api/domains/import", Some(&example_domain())),
    )
    .await;

    assert!(status.is_client_error());
}

// ---------------------------------------------------------------------------
// Routing table
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_export_routing_table_as_json() {
    let app = app().await;
    send(&app, request("POST", "/api/domains", Some(&example_domain()))).await;

    let (status, table) = send_json(&app, request("GET", "/api/routing-table", None)).await;

    assert_eq!(status, StatusCode::OK);
    let vhost = &table["virtualHosts"][0];
    assert_eq!(vhost["serverName"], "example.com");
    assert_eq!(vhost["routes"][0]["pathPrefix"], "/ws");
    assert_eq!(vhost["routes"][1]["pathPrefix"], "/");
}

#[tokio::test]
async fn should_export_routing_table_as_nginx_conf() {
    let app = app().await;
    send(&app, request("POST", "/api/domains", Some(&example_domain()))).await;

    let resp = app
        .clone()
        .oneshot(request("GET", "/api/routing-table/nginx", None))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(
        resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let conf = String::from_utf8(body.to_vec()).unwrap();
    assert!(conf.contains("server_name example.com www.example.com;"));
    assert!(conf.contains("listen 443 ssl http2;"));
    assert!(conf.contains("ssl_certificate /etc/letsencrypt/live/example.com/fullchain.pem;"));
    assert!(conf.contains("proxy_pass ws://localhost:3001;"));
}
