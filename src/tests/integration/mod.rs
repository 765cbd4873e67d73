//! HTTP integration tests
//!
//! Drive the full route tree with scripted adapters through `warp::test`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time::sleep;
use warp::Filter;

use crate::config::AppConfig;
use crate::domain::{GatewayStatus, SessionPhase, SessionSnapshot};
use crate::infrastructure::adapters::{ArtifactSource, GatewayApi};
use crate::infrastructure::http::models::ErrorReply;
use crate::infrastructure::http::HttpServer;
use crate::shared::error::InitiationError;
use crate::tests::common::{test_config, MockArtifacts, MockGateway};

fn routes_with_config(
    config: AppConfig,
    gateway: &Arc<MockGateway>,
    artifacts: &Arc<MockArtifacts>,
) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
    let gateway: Arc<dyn GatewayApi> = gateway.clone();
    let artifacts: Arc<dyn ArtifactSource> = artifacts.clone();
    HttpServer::from_parts(config, gateway, artifacts).create_routes()
}

fn routes(
    gateway: &Arc<MockGateway>,
    artifacts: &Arc<MockArtifacts>,
) -> impl Filter<Extract = impl warp::Reply, Error = std::convert::Infallible> + Clone {
    routes_with_config(test_config(), gateway, artifacts)
}

fn start_body(invoice_id: &str) -> serde_json::Value {
    json!({
        "invoice_id": invoice_id,
        "amount": 150000.0,
        "currency": "UZS",
        "provider": "click"
    })
}

fn parse_snapshot(body: &[u8]) -> SessionSnapshot {
    serde_json::from_slice(body).expect("snapshot body")
}

#[tokio::test(start_paused = true)]
async fn starting_a_payment_returns_the_redirect_url() {
    let gateway = MockGateway::new();
    let api = routes(&gateway, &MockArtifacts::new());

    let response = warp::test::request()
        .method("POST")
        .path("/payments")
        .json(&start_body("inv-9"))
        .reply(&api)
        .await;

    assert_eq!(response.status(), 200);
    let snapshot = parse_snapshot(response.body());
    assert_eq!(snapshot.invoice_id, "inv-9");
    assert_eq!(snapshot.state, SessionPhase::AwaitingRedirect);
    assert_eq!(snapshot.payment_url.as_deref(), Some("https://gw/pay/1"));
    assert_eq!(snapshot.provider_payment_id.as_deref(), Some("p1"));
}

#[tokio::test(start_paused = true)]
async fn rejected_initiation_maps_to_unprocessable_entity() {
    let gateway = MockGateway::new();
    gateway.set_create_reply(Err(InitiationError::Rejected(
        "insufficient_invoice_amount".to_string(),
    )));
    let api = routes(&gateway, &MockArtifacts::new());

    let response = warp::test::request()
        .method("POST")
        .path("/payments")
        .json(&start_body("inv-9"))
        .reply(&api)
        .await;

    assert_eq!(response.status(), 422);
    let error: ErrorReply = serde_json::from_slice(response.body()).unwrap();
    assert!(error.error.contains("insufficient_invoice_amount"));
}

#[tokio::test(start_paused = true)]
async fn polling_drives_the_session_to_succeeded() {
    let gateway = MockGateway::new();
    gateway.script_for(
        "inv-9",
        vec![Ok(GatewayStatus::Pending), Ok(GatewayStatus::Paid)],
    );
    let artifacts = MockArtifacts::new();
    let api = routes(&gateway, &artifacts);

    let response = warp::test::request()
        .method("POST")
        .path("/payments")
        .json(&start_body("inv-9"))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);

    let response = warp::test::request()
        .method("POST")
        .path("/payments/inv-9/poll")
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(parse_snapshot(response.body()).state, SessionPhase::Polling);

    let mut snapshot = parse_snapshot(response.body());
    for _ in 0..10_000 {
        if snapshot.state == SessionPhase::Succeeded {
            break;
        }
        sleep(Duration::from_millis(5)).await;
        let response = warp::test::request()
            .method("GET")
            .path("/payments/inv-9")
            .reply(&api)
            .await;
        snapshot = parse_snapshot(response.body());
    }

    assert_eq!(snapshot.state, SessionPhase::Succeeded);
    assert_eq!(snapshot.attempts_used, 2);
    assert_eq!(snapshot.artifacts.len(), 1);
    assert!(snapshot.artifact_warning.is_none());
}

#[tokio::test(start_paused = true)]
async fn manual_check_settles_without_waiting_for_the_timer() {
    let gateway = MockGateway::new();
    gateway.script_for("inv-9", vec![Ok(GatewayStatus::Cancelled)]);
    let mut config = test_config();
    config.polling.poll_interval_ms = 600_000; // only the manual check runs
    let api = routes_with_config(config, &gateway, &MockArtifacts::new());

    warp::test::request()
        .method("POST")
        .path("/payments")
        .json(&start_body("inv-9"))
        .reply(&api)
        .await;
    warp::test::request()
        .method("POST")
        .path("/payments/inv-9/poll")
        .reply(&api)
        .await;

    let response = warp::test::request()
        .method("POST")
        .path("/payments/inv-9/check")
        .reply(&api)
        .await;

    assert_eq!(response.status(), 200);
    let snapshot = parse_snapshot(response.body());
    assert_eq!(snapshot.state, SessionPhase::Failed);
    assert_eq!(snapshot.attempts_used, 1);
}

#[tokio::test(start_paused = true)]
async fn restart_resets_a_failed_session_over_http() {
    let gateway = MockGateway::new();
    gateway.set_create_reply(Err(InitiationError::Rejected("declined".to_string())));
    let api = routes(&gateway, &MockArtifacts::new());

    let response = warp::test::request()
        .method("POST")
        .path("/payments")
        .json(&start_body("inv-9"))
        .reply(&api)
        .await;
    assert_eq!(response.status(), 422);

    let response = warp::test::request()
        .method("POST")
        .path("/payments/inv-9/restart")
        .reply(&api)
        .await;
    assert_eq!(response.status(), 200);
    let snapshot = parse_snapshot(response.body());
    assert_eq!(snapshot.state, SessionPhase::Init);
    assert_eq!(snapshot.attempts_used, 0);
    assert!(snapshot.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn invalid_transitions_map_to_conflict() {
    let gateway = MockGateway::new();
    let api = routes(&gateway, &MockArtifacts::new());

    warp::test::request()
        .method("POST")
        .path("/payments")
        .json(&start_body("inv-9"))
        .reply(&api)
        .await;

    // restarting a session that is awaiting redirect is not a legal move
    let response = warp::test::request()
        .method("POST")
        .path("/payments/inv-9/restart")
        .reply(&api)
        .await;
    assert_eq!(response.status(), 409);

    // neither is a manual check before polling started
    let response = warp::test::request()
        .method("POST")
        .path("/payments/inv-9/check")
        .reply(&api)
        .await;
    assert_eq!(response.status(), 409);
}

#[tokio::test(start_paused = true)]
async fn unknown_invoice_maps_to_not_found() {
    let api = routes(&MockGateway::new(), &MockArtifacts::new());

    let response = warp::test::request()
        .method("GET")
        .path("/payments/ghost")
        .reply(&api)
        .await;
    assert_eq!(response.status(), 404);

    let error: ErrorReply = serde_json::from_slice(response.body()).unwrap();
    assert!(error.error.contains("ghost"));
}

#[tokio::test(start_paused = true)]
async fn closing_the_dialog_disposes_the_session() {
    let gateway = MockGateway::new();
    let api = routes(&gateway, &MockArtifacts::new());

    warp::test::request()
        .method("POST")
        .path("/payments")
        .json(&start_body("inv-9"))
        .reply(&api)
        .await;

    let response = warp::test::request()
        .method("DELETE")
        .path("/payments/inv-9")
        .reply(&api)
        .await;
    assert_eq!(response.status(), 204);

    let response = warp::test::request()
        .method("GET")
        .path("/payments/inv-9")
        .reply(&api)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test(start_paused = true)]
async fn malformed_body_maps_to_bad_request() {
    let api = routes(&MockGateway::new(), &MockArtifacts::new());

    let response = warp::test::request()
        .method("POST")
        .path("/payments")
        .header("content-type", "application/json")
        .body("{\"invoice_id\":")
        .reply(&api)
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test(start_paused = true)]
async fn rate_limit_applies_to_payment_starts() {
    let mut config = test_config();
    config.rate_limit.enabled = true;
    config.rate_limit.burst_size = 1;
    let gateway = MockGateway::new();
    let api = routes_with_config(config, &gateway, &MockArtifacts::new());

    let first = warp::test::request()
        .method("POST")
        .path("/payments")
        .header("x-forwarded-for", "10.0.0.7")
        .json(&start_body("inv-1"))
        .reply(&api)
        .await;
    assert_eq!(first.status(), 200);

    let second = warp::test::request()
        .method("POST")
        .path("/payments")
        .header("x-forwarded-for", "10.0.0.7")
        .json(&start_body("inv-2"))
        .reply(&api)
        .await;
    assert_eq!(second.status(), 429);
}

#[tokio::test(start_paused = true)]
async fn health_and_metrics_endpoints_respond() {
    let api = routes(&MockGateway::new(), &MockArtifacts::new());

    let response = warp::test::request().path("/health").reply(&api).await;
    assert_eq!(response.status(), 200);
    let health: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(health["status"], "healthy");

    let response = warp::test::request().path("/metrics").reply(&api).await;
    assert_eq!(response.status(), 200);
    let metrics: serde_json::Value = serde_json::from_slice(response.body()).unwrap();
    assert_eq!(metrics["sessions_opened"], 0);
}
