//! The request envelope shared by every variant: method check, body parsing,
//! error mapping. Renderers only ever see a validated [`RenderJob`].

use crate::domain::model::{PdfRequest, RenderJob, RenderedDocument};
use crate::domain::ports::Renderer;
use crate::utils::error::PdfError;
use crate::utils::monitor::RenderMonitor;
use axum::http::{Method, StatusCode};
use chrono::{SecondsFormat, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

const JSON: &str = "application/json";

/// RFC 5987 `attr-char`: everything else in `filename*` is percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointResponse {
    pub status: StatusCode,
    pub content_type: Option<&'static str>,
    /// Set for downloads; becomes `Content-Disposition: attachment`.
    pub filename: Option<String>,
    pub body: Vec<u8>,
}

impl EndpointResponse {
    fn empty(status: StatusCode) -> Self {
        Self {
            status,
            content_type: None,
            filename: None,
            body: Vec::new(),
        }
    }

    fn json(status: StatusCode, value: serde_json::Value) -> Self {
        Self {
            status,
            content_type: Some(JSON),
            filename: None,
            body: value.to_string().into_bytes(),
        }
    }

    fn document(document: RenderedDocument) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: Some(document.kind.content_type()),
            filename: document.filename,
            body: document.body,
        }
    }

    /// Non-ASCII names get an ASCII `filename` fallback plus `filename*`.
    pub fn content_disposition(&self) -> Option<String> {
        let name = self.filename.as_deref()?;
        if name.is_ascii() {
            return Some(format!("attachment; filename=\"{}\"", name));
        }
        let fallback: String = name
            .chars()
            .map(|c| if c.is_ascii() { c } else { '_' })
            .collect();
        Some(format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            utf8_percent_encode(name, ATTR_CHAR)
        ))
    }
}

#[derive(Clone)]
pub struct Endpoint {
    renderer: Arc<dyn Renderer>,
    monitor: Arc<RenderMonitor>,
}

impl Endpoint {
    pub fn new(renderer: Arc<dyn Renderer>, monitor: Arc<RenderMonitor>) -> Self {
        Self { renderer, monitor }
    }

    pub fn name(&self) -> &'static str {
        self.renderer.name()
    }

    pub async fn handle(&self, method: &Method, body: &[u8]) -> EndpointResponse {
        if method == Method::OPTIONS {
            return EndpointResponse::empty(StatusCode::OK);
        }
        if method != Method::POST {
            tracing::debug!(variant = self.name(), %method, "Rejected method");
            return self.error_response(&PdfError::MethodNotAllowed);
        }

        let job = match PdfRequest::from_slice(body).and_then(PdfRequest::into_job) {
            Ok(job) => job,
            Err(e) => {
                tracing::info!(variant = self.name(), "⚠️ Rejected request: {}", e);
                return self.error_response(&e);
            }
        };

        self.render(&job).await
    }

    async fn render(&self, job: &RenderJob) -> EndpointResponse {
        let variant = self.name();
        tracing::info!(
            variant,
            html_bytes = job.html.len(),
            "🚀 Starting PDF generation"
        );

        let started = Instant::now();
        let sample = self.monitor.render_started(variant);
        let result = self.renderer.render(job).await;
        self.monitor.render_finished(variant, sample);

        match result {
            Ok(document) => {
                tracing::info!(
                    variant,
                    bytes = document.body.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "✅ Document generated"
                );
                EndpointResponse::document(document)
            }
            Err(e) => {
                tracing::error!(
                    variant,
                    category = ?e.category(),
                    "❌ Rendering failed: {}",
                    e
                );
                self.error_response(&e)
            }
        }
    }

    /// Client errors map to their 4xx body; anything else is the variant's
    /// 500 with the error attached.
    fn error_response(&self, error: &PdfError) -> EndpointResponse {
        if !error.is_client_error() {
            return EndpointResponse::json(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": self.renderer.failure_message(),
                    "details": error.to_string(),
                    "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                }),
            );
        }

        match error {
            PdfError::MethodNotAllowed => EndpointResponse::json(
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Method not allowed" }),
            ),
            PdfError::MissingHtml => EndpointResponse::json(
                StatusCode::BAD_REQUEST,
                json!({ "error": "HTML content is required" }),
            ),
            PdfError::InvalidBody(e) => EndpointResponse::json(
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid request body", "details": e.to_string() }),
            ),
            other => EndpointResponse::json(
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid render options", "details": other.to_string() }),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DocumentKind;
    use crate::utils::error::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubRenderer {
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Renderer for StubRenderer {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn render(&self, job: &RenderJob) -> Result<RenderedDocument> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PdfError::Timeout { seconds: 30 });
            }
            Ok(RenderedDocument::pdf(
                format!("%PDF-1.5 {}", job.html).into_bytes(),
                job.options.filename_or("document.pdf"),
            ))
        }
    }

    fn endpoint(fail: bool) -> (Endpoint, Arc<StubRenderer>) {
        let renderer = Arc::new(StubRenderer {
            fail,
            calls: AtomicUsize::new(0),
        });
        let endpoint = Endpoint::new(renderer.clone(), Arc::new(RenderMonitor::new(false)));
        (endpoint, renderer)
    }

    fn json_body(response: &EndpointResponse) -> serde_json::Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    #[tokio::test]
    async fn test_options_preflight() {
        let (endpoint, renderer) = endpoint(false);
        let response = endpoint.handle(&Method::OPTIONS, b"").await;
        assert_eq!(response.status, StatusCode::OK);
        assert!(response.body.is_empty());
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_methods_rejected() {
        let (endpoint, _) = endpoint(false);
        for method in [Method::GET, Method::PUT, Method::DELETE] {
            let response = endpoint.handle(&method, b"{\"html\":\"x\"}").await;
            assert_eq!(response.status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(json_body(&response), json!({ "error": "Method not allowed" }));
        }
    }

    #[tokio::test]
    async fn test_missing_html() {
        let (endpoint, renderer) = endpoint(false);
        let response = endpoint.handle(&Method::POST, b"{\"html\":\"   \"}").await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&response), json!({ "error": "HTML content is required" }));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_body_and_options() {
        let (endpoint, _) = endpoint(false);

        let response = endpoint.handle(&Method::POST, b"{oops").await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        let body = json_body(&response);
        assert_eq!(body["error"], "Invalid request body");
        assert!(body["details"].is_string());

        let response = endpoint
            .handle(&Method::POST, br#"{"html":"x","options":{"scale":9}}"#)
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(&response)["error"], "Invalid render options");
    }

    #[tokio::test]
    async fn test_success_is_a_download() {
        let (endpoint, _) = endpoint(false);
        let response = endpoint
            .handle(
                &Method::POST,
                br#"{"html":"<p>hi</p>","options":{"filename":"report.pdf"}}"#,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type, Some(DocumentKind::Pdf.content_type()));
        assert!(response.body.starts_with(b"%PDF-"));
        assert_eq!(
            response.content_disposition().as_deref(),
            Some("attachment; filename=\"report.pdf\"")
        );
    }

    #[tokio::test]
    async fn test_render_failure_is_500_with_details() {
        let (endpoint, _) = endpoint(true);
        let response = endpoint.handle(&Method::POST, br#"{"html":"<p>x</p>"}"#).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);

        let body = json_body(&response);
        assert_eq!(body["error"], "Failed to generate PDF");
        assert_eq!(body["details"], "Rendering timed out after 30s");
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    struct RejectingRenderer;

    #[async_trait]
    impl Renderer for RejectingRenderer {
        fn name(&self) -> &'static str {
            "rejecting"
        }

        async fn render(&self, _job: &RenderJob) -> Result<RenderedDocument> {
            Err(PdfError::invalid_option("margin", "margins leave no printable area"))
        }
    }

    #[tokio::test]
    async fn test_client_error_from_renderer_is_400() {
        let endpoint = Endpoint::new(
            Arc::new(RejectingRenderer),
            Arc::new(RenderMonitor::new(false)),
        );
        let response = endpoint.handle(&Method::POST, br#"{"html":"<p>x</p>"}"#).await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);

        let body = json_body(&response);
        assert_eq!(body["error"], "Invalid render options");
        assert!(body.get("timestamp").is_none());
    }

    #[test]
    fn test_non_ascii_filename_disposition() {
        let response = EndpointResponse {
            status: StatusCode::OK,
            content_type: Some(JSON),
            filename: Some("résumé 2024.pdf".into()),
            body: Vec::new(),
        };
        assert_eq!(
            response.content_disposition().as_deref(),
            Some("attachment; filename=\"r_sum_ 2024.pdf\"; filename*=UTF-8''r%C3%A9sum%C3%A9%202024.pdf")
        );
        assert!(response.content_disposition().unwrap().is_ascii());
    }
}
