use crate::adapters::browser::BrowserSettings;
use crate::app::renderers::{ChromeRenderer, ClientRenderer, LayoutRenderer, ScreenshotRenderer};
use crate::core::endpoint::{Endpoint, EndpointResponse};
use crate::domain::ports::{ConfigProvider, Renderer};
use crate::utils::error::Result;
use crate::utils::monitor::RenderMonitor;
use axum::body::{Body, Bytes};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::header::{self, HeaderValue};
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, MethodRouter};
use axum::{middleware, Json, Router};
use serde_json::json;
use std::sync::Arc;

/// Request bodies above this are refused with 413.
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub const CLIENT_ROUTE: &str = "/api/generate-pdf";
pub const CHROME_ROUTE: &str = "/api/pdf-chrome";
pub const SCREENSHOT_ROUTE: &str = "/api/pdf-screenshot";
pub const LAYOUT_ROUTE: &str = "/api/pdf-layout";

/// Mounts the four variants and `/health`.
pub fn build_router(config: &impl ConfigProvider, monitor: Arc<RenderMonitor>) -> Result<Router> {
    let settings = BrowserSettings::from_config(config);
    let client = ClientRenderer::new(config.client_script_url())?;

    let client = endpoint(client, &monitor);
    let chrome = endpoint(ChromeRenderer::new(settings.clone()), &monitor);
    let screenshot = endpoint(ScreenshotRenderer::new(settings), &monitor);
    let layout = endpoint(LayoutRenderer::new(config.layout_font_size()), &monitor);

    tracing::debug!(
        routes = ?[CLIENT_ROUTE, CHROME_ROUTE, SCREENSHOT_ROUTE, LAYOUT_ROUTE],
        "Mounting PDF endpoints"
    );

    Ok(Router::new()
        .route("/health", get(health))
        .route(CLIENT_ROUTE, endpoint_route(client))
        .route(CHROME_ROUTE, endpoint_route(chrome))
        .route(SCREENSHOT_ROUTE, endpoint_route(screenshot))
        .route(LAYOUT_ROUTE, endpoint_route(layout))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(middleware::map_response(add_cors_headers)))
}

fn endpoint(renderer: impl Renderer + 'static, monitor: &Arc<RenderMonitor>) -> Endpoint {
    Endpoint::new(Arc::new(renderer), monitor.clone())
}

/// Every method reaches the endpoint so that it can answer 405 itself.
fn endpoint_route(endpoint: Endpoint) -> MethodRouter {
    any(handle).with_state(endpoint)
}

async fn handle(State(endpoint): State<Endpoint>, method: Method, body: Bytes) -> Response {
    endpoint.handle(&method, &body).await.into_response()
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn add_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

impl IntoResponse for EndpointResponse {
    fn into_response(self) -> Response {
        let disposition = self.content_disposition();
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        if let Some(content_type) = self.content_type {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        if let Some(disposition) = disposition {
            match HeaderValue::from_str(&disposition) {
                Ok(value) => {
                    headers.insert(header::CONTENT_DISPOSITION, value);
                }
                Err(e) => tracing::warn!("⚠️ Dropping invalid Content-Disposition: {}", e),
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use axum::http::StatusCode;

    #[test]
    fn test_response_headers() {
        let response = EndpointResponse {
            status: StatusCode::OK,
            content_type: Some("application/pdf"),
            filename: Some("a.pdf".into()),
            body: b"%PDF-".to_vec(),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"a.pdf\""
        );
    }

    #[tokio::test]
    async fn test_cors_headers_added() {
        let response = add_cors_headers(StatusCode::NOT_FOUND.into_response()).await;
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_METHODS],
            "POST, OPTIONS"
        );
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Content-Type"
        );
    }

    #[test]
    fn test_router_builds_from_default_config() {
        let router = build_router(&ServiceConfig::default(), Arc::new(RenderMonitor::new(false)));
        assert!(router.is_ok());
    }
}
