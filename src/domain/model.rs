use crate::domain::options::RenderOptions;
use crate::utils::error::{PdfError, Result};
use serde::Deserialize;

/// The JSON body every endpoint accepts: `{ "html": "...", "options": { ... } }`.
///
/// `options` stays untyped here so that a malformed option is reported as an
/// option problem, not as an unreadable body.
#[derive(Debug, Clone, Deserialize)]
pub struct PdfRequest {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub options: Option<serde_json::Value>,
}

impl PdfRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    /// Missing or whitespace-only `html` wins over any option error.
    pub fn into_job(self) -> Result<RenderJob> {
        let html = self
            .html
            .filter(|html| !html.trim().is_empty())
            .ok_or(PdfError::MissingHtml)?;

        let options = match self.options {
            None | Some(serde_json::Value::Null) => RenderOptions::default(),
            Some(value) => serde_json::from_value(value)
                .map_err(|e| PdfError::invalid_option("options", e.to_string()))?,
        };
        options.validate()?;

        Ok(RenderJob { html, options })
    }
}

/// A request that passed envelope validation.
#[derive(Debug, Clone)]
pub struct RenderJob {
    pub html: String,
    pub options: RenderOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Html,
}

impl DocumentKind {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Html => "text/html; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub kind: DocumentKind,
    pub body: Vec<u8>,
    /// Set for downloadable documents.
    pub filename: Option<String>,
}

impl RenderedDocument {
    pub fn pdf(body: Vec<u8>, filename: impl Into<String>) -> Self {
        Self {
            kind: DocumentKind::Pdf,
            body,
            filename: Some(filename.into()),
        }
    }

    pub fn html(body: String) -> Self {
        Self {
            kind: DocumentKind::Html,
            body: body.into_bytes(),
            filename: None,
        }
    }
}
