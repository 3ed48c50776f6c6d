use crate::config::{
    DEFAULT_CLIENT_SCRIPT_URL, DEFAULT_FONT_SIZE, DEFAULT_SETTLE_MS, DEFAULT_TIMEOUT_SECS,
};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{PdfError, Result};
use crate::utils::validation::Validate;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for the serverless deployment, read from the function's
/// environment.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaConfig {
    pub chrome_path: Option<PathBuf>,
    pub timeout_secs: u64,
    pub settle_ms: u64,
    pub browser_args: Vec<String>,
    pub client_script_url: String,
    pub font_size: f32,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 從任意 key/value 來源讀取，方便測試時不必修改行程環境變數
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            chrome_path: lookup("CHROME_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            timeout_secs: parse_number(&lookup, "RENDER_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            settle_ms: parse_number(&lookup, "SETTLE_MS", DEFAULT_SETTLE_MS)?,
            browser_args: lookup("BROWSER_ARGS")
                .map(|args| args.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            client_script_url: lookup("CLIENT_SCRIPT_URL")
                .unwrap_or_else(|| DEFAULT_CLIENT_SCRIPT_URL.to_string()),
            font_size: parse_number(&lookup, "LAYOUT_FONT_SIZE", DEFAULT_FONT_SIZE)?,
        })
    }
}

fn parse_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| PdfError::InvalidConfigValueError {
                field: key.to_string(),
                value: raw.clone(),
                reason: "expected a number".to_string(),
            }),
    }
}

impl ConfigProvider for LambdaConfig {
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

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        crate::config::validate_provider(self)?;
        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}
