use crate::domain::model::{RenderJob, RenderedDocument};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

pub trait ConfigProvider: Send + Sync {
    /// Explicit Chrome/Chromium executable; discovered from `PATH` when `None`.
    fn chrome_path(&self) -> Option<&Path>;
    fn render_timeout(&self) -> Duration;
    /// Extra wait after the page has loaded, before export.
    fn settle_delay(&self) -> Duration;
    fn extra_browser_args(&self) -> &[String];
    fn client_script_url(&self) -> &str;
    fn layout_font_size(&self) -> f32;
}

#[async_trait]
pub trait Renderer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The `error` field of a 500 response.
    fn failure_message(&self) -> &'static str {
        "Failed to generate PDF"
    }

    async fn render(&self, job: &RenderJob) -> Result<RenderedDocument>;
}
