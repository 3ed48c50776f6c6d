use crate::adapters::browser::{with_session, BrowserSettings, LaunchProfile};
use crate::core::document::prepare_html;
use crate::domain::model::{RenderJob, RenderedDocument};
use crate::domain::options::{Length, RenderOptions};
use crate::domain::ports::Renderer;
use crate::utils::error::Result;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;

const DEFAULT_FILENAME: &str = "document.pdf";
const DEFAULT_MARGIN_MM: f64 = 10.0;

/// Headless Chromium with serverless launch flags, exported through
/// `Page.printToPDF`.
pub struct ChromeRenderer {
    settings: BrowserSettings,
}

impl ChromeRenderer {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    fn name(&self) -> &'static str {
        "chrome"
    }

    async fn render(&self, job: &RenderJob) -> Result<RenderedDocument> {
        let html = prepare_html(&job.html, &job.options);
        let params = print_params(&job.options);

        let pdf = with_session(
            &self.settings,
            LaunchProfile::Serverless,
            None,
            &html,
            |page| async move { Ok(page.pdf(params).await?) },
        )
        .await?;

        tracing::debug!(bytes = pdf.len(), "printToPDF finished");
        Ok(RenderedDocument::pdf(
            pdf,
            job.options.filename_or(DEFAULT_FILENAME),
        ))
    }
}

/// DevTools print parameters; every length is in inches.
pub(crate) fn print_params(options: &RenderOptions) -> PrintToPdfParams {
    // Portrait paper; Chrome applies `landscape` itself.
    let (width, height) = options.format().size_inches();
    let margins = options.margins_or(Length::from_mm(DEFAULT_MARGIN_MM));

    PrintToPdfParams {
        landscape: Some(options.landscape()),
        display_header_footer: options.display_header_footer,
        print_background: Some(options.print_background()),
        scale: options.scale,
        paper_width: Some(width),
        paper_height: Some(height),
        margin_top: Some(margins.top.inches()),
        margin_bottom: Some(margins.bottom.inches()),
        margin_left: Some(margins.left.inches()),
        margin_right: Some(margins.right.inches()),
        page_ranges: options.page_ranges.clone(),
        header_template: options.header_template.clone(),
        footer_template: options.footer_template.clone(),
        prefer_css_page_size: options.prefer_css_page_size,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::options::{MarginOptions, PaperFormat};
    use std::time::Duration;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-6).unwrap_or(false)
    }

    #[test]
    fn test_default_print_params() {
        let params = print_params(&RenderOptions::default());
        assert!(approx(params.paper_width, 8.27));
        assert!(approx(params.paper_height, 11.7));
        assert!(approx(params.margin_top, 10.0 / 25.4));
        assert!(approx(params.margin_left, 10.0 / 25.4));
        assert_eq!(params.print_background, Some(true));
        assert_eq!(params.landscape, Some(false));
        assert_eq!(params.scale, None);
    }

    #[test]
    fn test_print_params_follow_options() {
        let options = RenderOptions {
            format: Some(PaperFormat::Letter),
            landscape: Some(true),
            scale: Some(0.8),
            margin: Some(MarginOptions {
                top: Some(Length::from_inches(1.0)),
                ..Default::default()
            }),
            page_ranges: Some("1-2".into()),
            display_header_footer: Some(true),
            footer_template: Some("<span class=\"pageNumber\"></span>".into()),
            ..Default::default()
        };
        let params = print_params(&options);
        assert!(approx(params.paper_width, 8.5));
        assert!(approx(params.paper_height, 11.0));
        assert_eq!(params.landscape, Some(true));
        assert!(approx(params.margin_top, 1.0));
        assert_eq!(params.scale, Some(0.8));
        assert_eq!(params.page_ranges.as_deref(), Some("1-2"));
        assert_eq!(params.display_header_footer, Some(true));
    }

    fn local_settings() -> BrowserSettings {
        BrowserSettings {
            chrome_path: std::env::var_os("CHROME_PATH").map(Into::into),
            timeout: Duration::from_secs(30),
            settle_delay: Duration::from_millis(100),
            extra_args: vec![],
        }
    }

    #[tokio::test]
    #[ignore = "requires a local Chromium"]
    async fn test_renders_pdf_with_chromium() {
        let renderer = ChromeRenderer::new(local_settings());
        let job = RenderJob {
            html: "<html><body><h1>Hello</h1></body></html>".into(),
            options: RenderOptions::default(),
        };
        let document = renderer.render(&job).await.unwrap();
        assert!(document.body.starts_with(b"%PDF-"));
        assert_eq!(document.filename.as_deref(), Some("document.pdf"));
    }
}
