use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("HTML content is required")]
    MissingHtml,

    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Invalid render option `{field}`: {reason}")]
    InvalidOption { field: String, reason: String },

    #[error("Chrome/Chromium executable not found; set CHROME_PATH or --chrome-path")]
    BrowserNotFound,

    #[error("Browser launch failed: {message}")]
    BrowserLaunch { message: String },

    #[error("Browser protocol error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Rendering timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("PDF construction error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Template error: {0}")]
    Template(#[from] upon::Error),

    #[error("Layout error: {message}")]
    Layout { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Request,
    Browser,
    Rendering,
    System,
    Configuration,
}

impl PdfError {
    pub fn invalid_option(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MethodNotAllowed
            | Self::MissingHtml
            | Self::InvalidBody(_)
            | Self::InvalidOption { .. } => ErrorCategory::Request,
            Self::BrowserNotFound
            | Self::BrowserLaunch { .. }
            | Self::Browser(_)
            | Self::Timeout { .. } => ErrorCategory::Browser,
            Self::Pdf(_) | Self::Image(_) | Self::Template(_) | Self::Layout { .. } => {
                ErrorCategory::Rendering
            }
            Self::IoError(_) => ErrorCategory::System,
            Self::InvalidConfigValueError { .. }
            | Self::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    /// 呼叫端造成的錯誤 (4xx)
    pub fn is_client_error(&self) -> bool {
        self.category() == ErrorCategory::Request
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Request => "Check the request body and render options",
            ErrorCategory::Browser => match self {
                Self::BrowserNotFound => {
                    "Install Chromium or point CHROME_PATH / --chrome-path at the executable"
                }
                Self::Timeout { .. } => "Simplify the document or raise the render timeout",
                _ => "Check that the browser can start in this environment (sandbox, /dev/shm)",
            },
            ErrorCategory::Rendering => "The document could not be converted; check its content",
            ErrorCategory::System => "Check file permissions and available disk space",
            ErrorCategory::Configuration => "Fix the configuration value and restart",
        }
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;
