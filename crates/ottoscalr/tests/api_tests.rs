//! Integration tests for the probe and metrics endpoints

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ottoscalr::api;
use ottoscalr_lib::health::{Collaborator, EngineHealth};
use ottoscalr_lib::observability::EngineMetrics;
use tower::ServiceExt;

async fn probe(health: &EngineHealth, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = api::router(health.clone())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn scrape_metrics(health: &EngineHealth) -> (StatusCode, String) {
    let response = api::router(health.clone())
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("text/plain"));
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_healthz_starts_healthy() {
    let health = EngineHealth::new();

    let (status, body) = probe(&health, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["passes_completed"], 0);
}

#[tokio::test]
async fn test_healthz_stays_up_through_a_collaborator_outage() {
    let health = EngineHealth::new();
    health.collaborator_failed(Collaborator::MetricsSource, "connection refused");

    // An external outage must not get the pod restarted.
    let (status, body) = probe(&health, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["failing_collaborators"][0], "metrics_source");
}

#[tokio::test]
async fn test_healthz_returns_503_after_a_failure_run() {
    let health = EngineHealth::new();
    for _ in 0..5 {
        health.record_failed_pass("scrape timed out");
    }

    let (status, body) = probe(&health, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["last_error"], "scrape timed out");
}

#[tokio::test]
async fn test_healthz_recovers_after_a_successful_pass() {
    let health = EngineHealth::new();
    for _ in 0..5 {
        health.record_failed_pass("scrape timed out");
    }
    health.record_pass();

    let (status, body) = probe(&health, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["passes_completed"], 1);
}

#[tokio::test]
async fn test_readyz_returns_503_until_started() {
    let health = EngineHealth::new();

    let (status, body) = probe(&health, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["ready"], false);

    health.mark_started();
    let (status, body) = probe(&health, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
}

#[tokio::test]
async fn test_readyz_tracks_collaborator_outages() {
    let health = EngineHealth::new();
    health.mark_started();
    health.collaborator_failed(Collaborator::PolicyStore, "catalog unavailable");

    let (status, body) = probe(&health, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["reason"]
        .as_str()
        .unwrap()
        .contains("catalog unavailable"));

    health.collaborator_ok(Collaborator::PolicyStore);
    let (status, _) = probe(&health, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_exposes_the_engine_metrics() {
    let health = EngineHealth::new();

    let metrics = EngineMetrics::new();
    metrics.observe_reco_generation_latency("default", "checkout", "Deployment", "checkout", 0.2);
    metrics.observe_cpu_query_latency("default", "checkout", "Deployment", "checkout", 0.05);
    metrics.set_datapoints_present("default", "checkout", true);

    let (status, body) = scrape_metrics(&health).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("get_reco_generation_latency_seconds"));
    assert!(body.contains("get_avg_cpu_utilization_query_latency_seconds"));
    assert!(body.contains("minimum_percentage_of_datapoints_present"));
}

#[tokio::test]
async fn test_metrics_exposes_histogram_series() {
    let health = EngineHealth::new();

    let metrics = EngineMetrics::new();
    metrics.observe_reco_generation_latency("default", "checkout", "Deployment", "checkout", 0.4);

    let (_, body) = scrape_metrics(&health).await;
    assert!(body.contains("get_reco_generation_latency_seconds_bucket"));
    assert!(body.contains("get_reco_generation_latency_seconds_count"));
    assert!(body.contains("get_reco_generation_latency_seconds_sum"));
}
