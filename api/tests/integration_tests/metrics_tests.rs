//! Integration tests for the metrics exposition endpoint.

use axum::http::{header, StatusCode};
use shared::telemetry::EXPOSITION_CONTENT_TYPE;

use super::common::{get, get_raw, get_text, test_app};

#[tokio::test]
async fn test_exposition_content_type() {
    let (app, _state) = test_app();

    let (status, headers, _) = get_raw(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], EXPOSITION_CONTENT_TYPE);
}

#[tokio::test]
async fn test_exposition_reflects_traffic() {
    let (app, _state) = test_app();

    for _ in 0..3 {
        let (status, _) = get(app.clone(), "/api/users").await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = get(app.clone(), "/api/error").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (_, text) = get_text(app, "/metrics").await;

    assert!(text.contains(
        "http_requests_total{method=\"GET\",route=\"/api/users\",status=\"200\"} 3"
    ));
    assert!(text.contains(
        "http_requests_total{method=\"GET\",route=\"/api/error\",status=\"500\"} 1"
    ));
    assert!(text.contains("errors_total{type=\"server_error\"} 1"));
    assert!(text.contains("logs_generated_total{level=\"info\"}"));
    assert!(text.contains("logs_generated_total{level=\"error\"} 1"));
}

#[tokio::test]
async fn test_exposition_includes_host_and_process_gauges() {
    let (app, _state) = test_app();

    let (_, text) = get_text(app, "/metrics").await;

    assert!(text.contains("# TYPE system_cpu_usage gauge"));
    assert!(text.contains("# TYPE system_memory_usage gauge"));
    #[cfg(target_os = "linux")]
    for name in [
        "process_resident_memory_bytes",
        "process_virtual_memory_bytes",
        "process_start_time_seconds",
        "process_open_fds",
    ] {
        assert!(text.contains(&format!("# TYPE {name} gauge")), "missing {name}");
    }
}

#[tokio::test]
async fn test_exposition_includes_request_latency() {
    let (app, state) = test_app();

    for _ in 0..2 {
        let (status, _) = get(app.clone(), "/api/users?page=1").await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, text) = get_text(app, "/metrics").await;

    assert!(text.contains("# TYPE http_request_duration_seconds histogram"));
    assert!(text.contains(
        "http_request_duration_seconds_count{method=\"GET\",route=\"/api/users\"} 2"
    ));
    assert_eq!(
        state
            .registry()
            .observation_count("http_request_duration_seconds", &["GET", "/api/users"])
            .unwrap(),
        2
    );
}
