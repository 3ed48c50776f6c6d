use crate::config::ServiceConfig;
use crate::utils::error::{PdfError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    // `${VAR_NAME}`
    Regex::new(r"\$\{([^}]+)\}").expect("static regex")
});

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server: Option<ServerSection>,
    pub browser: Option<BrowserSection>,
    pub client: Option<ClientSection>,
    pub layout: Option<LayoutSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserSection {
    pub chrome_path: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    pub settle_ms: Option<u64>,
    pub extra_args: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientSection {
    pub script_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutSection {
    pub font_size: Option<f32>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(PdfError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| PdfError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CHROME_PATH})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 將檔案中有設定的值覆蓋到 `config` 上
    pub fn apply_to(&self, config: &mut ServiceConfig) {
        if let Some(server) = &self.server {
            if let Some(host) = &server.host {
                config.host = host.clone();
            }
            if let Some(port) = server.port {
                config.port = port;
            }
        }

        if let Some(browser) = &self.browser {
            if let Some(path) = &browser.chrome_path {
                config.chrome_path = Some(path.clone());
            }
            if let Some(timeout) = browser.timeout_secs {
                config.timeout_secs = timeout;
            }
            if let Some(settle) = browser.settle_ms {
                config.settle_ms = settle;
            }
            if let Some(args) = &browser.extra_args {
                config.browser_args = args.clone();
            }
        }

        if let Some(script_url) = self.client.as_ref().and_then(|c| c.script_url.as_ref()) {
            config.client_script_url = script_url.clone();
        }

        if let Some(font_size) = self.layout.as_ref().and_then(|l| l.font_size) {
            config.font_size = font_size;
        }
    }

    pub fn to_service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::default();
        self.apply_to(&mut config);
        config
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.to_service_config().validate()
    }
}
