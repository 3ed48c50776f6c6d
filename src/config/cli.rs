use crate::config::toml_config::TomlConfig;
use crate::config::ServiceConfig;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "pdf-endpoints")]
#[command(about = "HTTP endpoints that turn HTML into PDF documents")]
pub struct CliConfig {
    #[arg(long, help = "Address to bind (default 127.0.0.1)")]
    pub host: Option<String>,

    #[arg(long, short, help = "Port to listen on (default 3000)")]
    pub port: Option<u16>,

    #[arg(long, short, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "CHROME_PATH", help = "Chrome/Chromium executable")]
    pub chrome_path: Option<PathBuf>,

    #[arg(long, help = "Per-request browser timeout in seconds")]
    pub timeout_secs: Option<u64>,

    #[arg(long, help = "Wait after page load before export, in milliseconds")]
    pub settle_ms: Option<u64>,

    #[arg(long, help = "Override the html2pdf.js bundle URL of the client page")]
    pub client_script_url: Option<String>,

    #[arg(long = "browser-arg", allow_hyphen_values = true, help = "Extra Chromium flag (repeatable)")]
    pub browser_args: Vec<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log process resource usage around each render")]
    pub monitor: bool,
}

impl CliConfig {
    /// 合併配置：預設值 < TOML 檔案 < 命令列參數
    pub fn resolve(&self) -> Result<ServiceConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::debug!("Loading configuration file: {}", path.display());
                TomlConfig::from_file(path)?.to_service_config()
            }
            None => ServiceConfig::default(),
        };

        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(path) = &self.chrome_path {
            config.chrome_path = Some(path.clone());
        }
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(settle) = self.settle_ms {
            config.settle_ms = settle;
        }
        if let Some(url) = &self.client_script_url {
            config.client_script_url = url.clone();
        }
        if !self.browser_args.is_empty() {
            config.browser_args = self.browser_args.clone();
        }

        Ok(config)
    }
}
