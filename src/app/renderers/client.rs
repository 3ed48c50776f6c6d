//! Client-side conversion: instead of a PDF, answer with a page that loads
//! html2pdf.js and converts the submitted HTML inside the caller's browser.

use crate::core::document::document_title;
use crate::domain::model::{RenderJob, RenderedDocument};
use crate::domain::options::{Length, RenderOptions};
use crate::domain::ports::Renderer;
use crate::utils::error::Result;
use async_trait::async_trait;
use upon::{Engine, Template};

const PAGE_TEMPLATE: &str = include_str!("../../../templates/client_page.html");
const DEFAULT_FILENAME: &str = "agreement.pdf";
const DEFAULT_TITLE: &str = "PDF Generator";
const DEFAULT_MARGIN_MM: f64 = 10.0;

pub struct ClientRenderer {
    engine: Engine<'static>,
    template: Template<'static>,
    script_url: String,
}

impl ClientRenderer {
    pub fn new(script_url: impl Into<String>) -> Result<Self> {
        let mut engine = Engine::new();
        formatters::configure(&mut engine);
        let template = engine.compile(PAGE_TEMPLATE)?;
        Ok(Self {
            engine,
            template,
            script_url: script_url.into(),
        })
    }

    pub fn render_page(&self, html: &str, options: &RenderOptions) -> Result<String> {
        let page = self
            .template
            .render(
                &self.engine,
                upon::value! {
                    title: document_title(html).unwrap_or_else(|| DEFAULT_TITLE.to_string()),
                    script_url: self.script_url.as_str(),
                    preview: html,
                    source_json: script_safe_json(&serde_json::Value::from(html)),
                    settings_json: script_safe_json(&client_settings(options)),
                },
            )
            .to_string()?;
        Ok(page)
    }
}

#[async_trait]
impl Renderer for ClientRenderer {
    fn name(&self) -> &'static str {
        "client"
    }

    fn failure_message(&self) -> &'static str {
        "Failed to create PDF generator"
    }

    async fn render(&self, job: &RenderJob) -> Result<RenderedDocument> {
        let page = self.render_page(&job.html, &job.options)?;
        tracing::debug!(bytes = page.len(), "Client generator page rendered");
        Ok(RenderedDocument::html(page))
    }
}

/// html2pdf.js settings: margins in mm as `[top, left, bottom, right]`.
fn client_settings(options: &RenderOptions) -> serde_json::Value {
    let margins = options.margins_or(Length::from_mm(DEFAULT_MARGIN_MM));
    let mm = |length: Length| (length.millimeters() * 100.0).round() / 100.0;
    serde_json::json!({
        "margin": [mm(margins.top), mm(margins.left), mm(margins.bottom), mm(margins.right)],
        "filename": options.filename_or(DEFAULT_FILENAME),
        "format": options.format().as_str(),
        "orientation": if options.landscape() { "landscape" } else { "portrait" },
    })
}

/// JSON that can sit inside `<script>` without closing it.
fn script_safe_json(value: &serde_json::Value) -> String {
    value
        .to_string()
        .replace("</", "<\\/")
        .replace("<!--", "<\\!--")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

mod formatters {
    use std::fmt::Write;
    use upon::{fmt as upon_fmt, Engine, Value};

    fn html_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => {
                for c in s.chars() {
                    match c {
                        '&' => f.write_str("&amp;")?,
                        '<' => f.write_str("&lt;")?,
                        '>' => f.write_str("&gt;")?,
                        '"' => f.write_str("&quot;")?,
                        '\'' => f.write_str("&#39;")?,
                        c => f.write_char(c)?,
                    }
                }
            }
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    pub(super) fn configure(engine: &mut Engine<'_>) {
        engine.add_formatter("html", html_formatter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::options::{MarginOptions, PaperFormat};

    fn renderer() -> ClientRenderer {
        ClientRenderer::new(crate::config::DEFAULT_CLIENT_SCRIPT_URL).unwrap()
    }

    #[test]
    fn test_page_loads_script_and_status_box() {
        let page = renderer()
            .render_page("<p>Hello</p>", &RenderOptions::default())
            .unwrap();
        assert!(page.contains(
            "<script src=\"https://cdnjs.cloudflare.com/ajax/libs/html2pdf.js/0.10.1/html2pdf.bundle.min.js\">"
        ));
        assert!(page.contains("id=\"status\""));
        assert!(page.contains("Generate PDF"));
        assert!(page.contains("Show Preview"));
        assert!(page.contains("<div id=\"content\"><p>Hello</p></div>"));
        assert!(page.contains("const htmlContent = \"<p>Hello<\\/p>\";"));
    }

    #[test]
    fn test_embedded_source_cannot_close_script() {
        let html = "<p>x</p></script><script>alert(1)</script>";
        let page = renderer().render_page(html, &RenderOptions::default()).unwrap();
        let script = page.split("const htmlContent = ").nth(1).unwrap();
        let literal = script.split(";\n").next().unwrap();
        assert!(!literal.to_ascii_lowercase().contains("</script"));
        assert!(literal.contains("<\\/script>"));
    }

    #[test]
    fn test_settings_follow_options() {
        let options = RenderOptions {
            format: Some(PaperFormat::Letter),
            landscape: Some(true),
            filename: Some("invoice.pdf".into()),
            margin: Some(MarginOptions {
                top: Some(Length::from_mm(20.0)),
                ..Default::default()
            }),
            ..Default::default()
        };
        let settings = client_settings(&options);
        assert_eq!(settings["format"], "letter");
        assert_eq!(settings["orientation"], "landscape");
        assert_eq!(settings["filename"], "invoice.pdf");
        assert_eq!(settings["margin"], serde_json::json!([20.0, 10.0, 10.0, 10.0]));
    }

    #[test]
    fn test_default_settings() {
        let settings = client_settings(&RenderOptions::default());
        assert_eq!(settings["filename"], "agreement.pdf");
        assert_eq!(settings["format"], "a4");
        assert_eq!(settings["orientation"], "portrait");
    }

    #[test]
    fn test_title_taken_from_document_and_escaped() {
        let page = renderer()
            .render_page(
                "<html><head><title>Q&A <draft></title></head><body></body></html>",
                &RenderOptions::default(),
            )
            .unwrap();
        assert!(page.contains("<title>Q&amp;A &lt;draft&gt;</title>"));

        let untitled = renderer().render_page("<p/>", &RenderOptions::default()).unwrap();
        assert!(untitled.contains("<title>PDF Generator</title>"));
    }

    #[tokio::test]
    async fn test_renderer_returns_html_document() {
        let job = RenderJob {
            html: "<h1>Agreement</h1>".into(),
            options: RenderOptions::default(),
        };
        let document = renderer().render(&job).await.unwrap();
        assert_eq!(document.kind, crate::domain::model::DocumentKind::Html);
        assert!(document.filename.is_none());
        assert!(String::from_utf8(document.body).unwrap().starts_with("<!DOCTYPE html>"));
    }
}
