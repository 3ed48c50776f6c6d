use pdf_endpoints::adapters::http::BODY_LIMIT_BYTES;
use pdf_endpoints::utils::monitor::RenderMonitor;
use pdf_endpoints::{build_router, ServiceConfig};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

const ROUTES: [&str; 4] = [
    "/api/generate-pdf",
    "/api/pdf-chrome",
    "/api/pdf-screenshot",
    "/api/pdf-layout",
];

async fn spawn_server(config: ServiceConfig) -> String {
    let router = build_router(&config, Arc::new(RenderMonitor::new(false))).unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", address)
}

fn without_browser() -> ServiceConfig {
    ServiceConfig {
        chrome_path: Some(PathBuf::from("/nonexistent/chromium")),
        ..ServiceConfig::default()
    }
}

fn assert_cors(response: &reqwest::Response) {
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");
}

#[tokio::test]
async fn test_preflight_on_every_route() {
    let base = spawn_server(ServiceConfig::default()).await;
    let client = reqwest::Client::new();

    for route in ROUTES {
        let response = client
            .request(Method::OPTIONS, format!("{}{}", base, route))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", route);
        assert_cors(&response);
        assert!(response.bytes().await.unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let base = spawn_server(ServiceConfig::default()).await;
    let client = reqwest::Client::new();

    for route in ROUTES {
        let response = client.get(format!("{}{}", base, route)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", route);
        assert_cors(&response);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Method not allowed" }));
    }
}

#[tokio::test]
async fn test_missing_html_is_bad_request() {
    let base = spawn_server(ServiceConfig::default()).await;
    let client = reqwest::Client::new();

    for route in ROUTES {
        let response = client
            .post(format!("{}{}", base, route))
            .json(&json!({ "options": { "format": "A4" } }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", route);
        assert_cors(&response);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "HTML content is required");
    }
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let base = spawn_server(ServiceConfig::default()).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/pdf-layout", base))
        .header("content-type", "application/json")
        .body("{\"html\": ")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid request body");
    assert!(body["details"].as_str().is_some());
}

#[tokio::test]
async fn test_client_variant_returns_generator_page() {
    let base = spawn_server(ServiceConfig::default()).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/generate-pdf", base))
        .json(&json!({ "html": "<h1>Agreement</h1></script>" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(response.headers()["content-type"], "text/html; charset=utf-8");
    assert!(response.headers().get("content-disposition").is_none());

    let page = response.text().await.unwrap();
    assert!(page.contains("html2pdf.bundle.min.js"));
    assert!(page.contains("id=\"status\""));
    assert!(page.contains("<\\/script>"));
}

#[tokio::test]
async fn test_layout_variant_returns_pdf() {
    let base = spawn_server(ServiceConfig::default()).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/pdf-layout", base))
        .json(&json!({
            "html": "<html><head><title>Invoice</title></head><body><h1>Invoice</h1><p>Total: 10</p></body></html>",
            "options": { "filename": "invoice.pdf", "format": "letter" }
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_cors(&response);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"invoice.pdf\""
    );

    let bytes = response.bytes().await.unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
    let document = lopdf::Document::load_mem(&bytes).unwrap();
    assert_eq!(document.get_pages().len(), 1);
}

#[tokio::test]
async fn test_invalid_options_are_bad_request() {
    let base = spawn_server(ServiceConfig::default()).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/pdf-layout", base))
        .json(&json!({ "html": "<p>x</p>", "options": { "margin": { "top": "2em" } } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid render options");
}

#[tokio::test]
async fn test_browser_failure_is_server_error() {
    let base = spawn_server(without_browser()).await;
    let client = reqwest::Client::new();

    for route in ["/api/pdf-chrome", "/api/pdf-screenshot"] {
        let response = client
            .post(format!("{}{}", base, route))
            .json(&json!({ "html": "<p>x</p>" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", route);
        assert_cors(&response);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Failed to generate PDF");
        assert!(body["details"].as_str().unwrap().contains("not found"));
        assert!(body["timestamp"].as_str().is_some());
    }
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let router = build_router(&ServiceConfig::default(), Arc::new(RenderMonitor::new(false))).unwrap();
    let body = serde_json::to_vec(&json!({ "html": "a".repeat(BODY_LIMIT_BYTES + 1024) })).unwrap();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/pdf-layout")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    assert_eq!(response.headers()["access-control-allow-methods"], "POST, OPTIONS");
}

#[tokio::test]
async fn test_small_body_passes_body_limit() {
    let router = build_router(&ServiceConfig::default(), Arc::new(RenderMonitor::new(false))).unwrap();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/generate-pdf")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(r#"{"html":"<p>small</p>"}"#))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let base = spawn_server(ServiceConfig::default()).await;
    let response = reqwest::get(format!("{}/health", base)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
#[ignore = "requires a local Chromium (set CHROME_PATH)"]
async fn test_browser_variants_with_chromium() {
    let base = spawn_server(ServiceConfig {
        chrome_path: std::env::var_os("CHROME_PATH").map(PathBuf::from),
        ..ServiceConfig::default()
    })
    .await;
    let client = reqwest::Client::new();

    for route in ["/api/pdf-chrome", "/api/pdf-screenshot"] {
        let response = client
            .post(format!("{}{}", base, route))
            .json(&json!({
                "html": "<html><body><h1>Hello</h1><p>From Chromium</p></body></html>",
                "options": { "margin": { "top": "1in" }, "css": "h1 { color: navy }" }
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", route);
        assert!(response.bytes().await.unwrap().starts_with(b"%PDF-"));
    }
}
