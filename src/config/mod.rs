#[cfg(feature = "cli")]
pub mod cli;
pub mod lambda;
pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_path, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(feature = "cli")]
pub use cli::CliConfig;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_SETTLE_MS: u64 = 500;
pub const DEFAULT_CLIENT_SCRIPT_URL: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/html2pdf.js/0.10.1/html2pdf.bundle.min.js";
pub const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Fully resolved settings for the HTTP service, after file, environment and
/// flag sources have been merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub chrome_path: Option<PathBuf>,
    pub timeout_secs: u64,
    pub settle_ms: u64,
    pub browser_args: Vec<String>,
    pub client_script_url: String,
    pub font_size: f32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            chrome_path: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            settle_ms: DEFAULT_SETTLE_MS,
            browser_args: Vec::new(),
            client_script_url: DEFAULT_CLIENT_SCRIPT_URL.to_string(),
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl ServiceConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl ConfigProvider for ServiceConfig {
    fn chrome_path(&self) -> Option<&Path> {
        self.chrome_path.as_deref()
    }

    fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    fn extra_browser_args(&self) -> &[String] {
        &self.browser_args
    }

    fn client_script_url(&self) -> &str {
        &self.client_script_url
    }

    fn layout_font_size(&self) -> f32 {
        self.font_size
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        crate::utils::validation::validate_non_empty_string("server.host", &self.host)?;
        validate_provider(self)?;
        tracing::debug!("✅ Service configuration validation passed");
        Ok(())
    }
}

/// 所有配置來源共用的驗證規則
pub(crate) fn validate_provider(config: &impl ConfigProvider) -> Result<()> {
    if let Some(path) = config.chrome_path() {
        validate_path("browser.chrome_path", &path.to_string_lossy())?;
    }

    validate_range(
        "browser.timeout_secs",
        config.render_timeout().as_secs(),
        1,
        300,
    )?;

    let settle_ms = u64::try_from(config.settle_delay().as_millis()).unwrap_or(u64::MAX);
    validate_range("browser.settle_ms", settle_ms, 0, 10_000)?;

    validate_url("client.script_url", config.client_script_url())?;

    validate_range("layout.font_size", config.layout_font_size(), 4.0, 72.0)?;

    Ok(())
}
