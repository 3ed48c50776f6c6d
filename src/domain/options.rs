use crate::utils::error::{PdfError, Result};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

pub const PX_PER_INCH: f64 = 96.0;
pub const PT_PER_INCH: f64 = 72.0;
pub const MM_PER_INCH: f64 = 25.4;

/// A CSS-style absolute length. Bare numbers are pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length {
    inches: f64,
}

impl Length {
    pub fn from_inches(inches: f64) -> Self {
        Self { inches }
    }

    pub fn from_mm(mm: f64) -> Self {
        Self::from_inches(mm / MM_PER_INCH)
    }

    pub fn from_points(pt: f64) -> Self {
        Self::from_inches(pt / PT_PER_INCH)
    }

    pub fn from_px(px: f64) -> Self {
        Self::from_inches(px / PX_PER_INCH)
    }

    pub fn inches(&self) -> f64 {
        self.inches
    }

    pub fn points(&self) -> f64 {
        self.inches * PT_PER_INCH
    }

    pub fn millimeters(&self) -> f64 {
        self.inches * MM_PER_INCH
    }
}

impl FromStr for Length {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        // The unit is the trailing letter run, so `1e-1in` keeps its exponent.
        let unit_len = s.bytes().rev().take_while(u8::is_ascii_alphabetic).count();
        let (number, unit) = s.split_at(s.len() - unit_len);
        let value: f64 = number
            .trim()
            .parse()
            .map_err(|_| format!("`{}` is not a valid length", s))?;
        if !value.is_finite() || value < 0.0 {
            return Err(format!("`{}` must be a non-negative length", s));
        }
        match unit.to_ascii_lowercase().as_str() {
            "" | "px" => Ok(Self::from_px(value)),
            "in" => Ok(Self::from_inches(value)),
            "cm" => Ok(Self::from_mm(value * 10.0)),
            "mm" => Ok(Self::from_mm(value)),
            "pt" => Ok(Self::from_points(value)),
            other => Err(format!("unknown unit `{}`", other)),
        }
    }
}

impl<'de> Deserialize<'de> for Length {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(px) if px.is_finite() && px >= 0.0 => Ok(Length::from_px(px)),
            Raw::Number(px) => Err(serde::de::Error::custom(format!(
                "`{}` must be a non-negative length",
                px
            ))),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Paper sizes accepted by `options.format`, with the same dimensions the
/// headless-browser print path uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaperFormat {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    #[default]
    A4,
    A5,
    A6,
}

impl PaperFormat {
    /// (width, height) in inches, portrait.
    pub fn size_inches(&self) -> (f64, f64) {
        match self {
            Self::Letter => (8.5, 11.0),
            Self::Legal => (8.5, 14.0),
            Self::Tabloid => (11.0, 17.0),
            Self::Ledger => (17.0, 11.0),
            Self::A0 => (33.1, 46.8),
            Self::A1 => (23.4, 33.1),
            Self::A2 => (16.54, 23.4),
            Self::A3 => (11.7, 16.54),
            Self::A4 => (8.27, 11.7),
            Self::A5 => (5.83, 8.27),
            Self::A6 => (4.13, 5.83),
        }
    }

    /// jsPDF format name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Letter => "letter",
            Self::Legal => "legal",
            Self::Tabloid => "tabloid",
            Self::Ledger => "ledger",
            Self::A0 => "a0",
            Self::A1 => "a1",
            Self::A2 => "a2",
            Self::A3 => "a3",
            Self::A4 => "a4",
            Self::A5 => "a5",
            Self::A6 => "a6",
        }
    }
}

impl FromStr for PaperFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            "tabloid" => Ok(Self::Tabloid),
            "ledger" => Ok(Self::Ledger),
            "a0" => Ok(Self::A0),
            "a1" => Ok(Self::A1),
            "a2" => Ok(Self::A2),
            "a3" => Ok(Self::A3),
            "a4" => Ok(Self::A4),
            "a5" => Ok(Self::A5),
            "a6" => Ok(Self::A6),
            other => Err(format!("unknown paper format `{}`", other)),
        }
    }
}

impl fmt::Display for PaperFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PaperFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MarginOptions {
    pub top: Option<Length>,
    pub right: Option<Length>,
    pub bottom: Option<Length>,
    pub left: Option<Length>,
}

/// Resolved margins, every side set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Margins {
    pub fn uniform(length: Length) -> Self {
        Self {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub format: Option<PaperFormat>,
    pub landscape: Option<bool>,
    pub print_background: Option<bool>,
    pub margin: Option<MarginOptions>,
    pub scale: Option<f64>,
    pub display_header_footer: Option<bool>,
    pub header_template: Option<String>,
    pub footer_template: Option<String>,
    #[serde(rename = "preferCSSPageSize", alias = "preferCssPageSize")]
    pub prefer_css_page_size: Option<bool>,
    pub page_ranges: Option<String>,
    pub filename: Option<String>,
    pub base_url: Option<String>,
    pub css: Option<String>,
    pub device_scale_factor: Option<f64>,
    pub font_size: Option<f32>,
}

impl RenderOptions {
    pub fn format(&self) -> PaperFormat {
        self.format.unwrap_or_default()
    }

    pub fn landscape(&self) -> bool {
        self.landscape.unwrap_or(false)
    }

    pub fn print_background(&self) -> bool {
        self.print_background.unwrap_or(true)
    }

    /// Page (width, height) after orientation, as lengths.
    pub fn page_size(&self) -> (Length, Length) {
        let (w, h) = self.format().size_inches();
        let (w, h) = if self.landscape() == (w < h) { (h, w) } else { (w, h) };
        (Length::from_inches(w), Length::from_inches(h))
    }

    /// Margins with any unset side filled from `default`.
    pub fn margins_or(&self, default: Length) -> Margins {
        let margin = self.margin.clone().unwrap_or_default();
        Margins {
            top: margin.top.unwrap_or(default),
            right: margin.right.unwrap_or(default),
            bottom: margin.bottom.unwrap_or(default),
            left: margin.left.unwrap_or(default),
        }
    }

    pub fn filename_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.filename
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(default)
    }

    /// Checks the values serde cannot; runs before any renderer sees the options.
    pub fn validate(&self) -> Result<()> {
        if let Some(scale) = self.scale {
            if !(0.1..=2.0).contains(&scale) {
                return Err(PdfError::invalid_option(
                    "scale",
                    format!("{} is outside 0.1..=2.0", scale),
                ));
            }
        }

        if let Some(factor) = self.device_scale_factor {
            if !(0.5..=4.0).contains(&factor) {
                return Err(PdfError::invalid_option(
                    "deviceScaleFactor",
                    format!("{} is outside 0.5..=4.0", factor),
                ));
            }
        }

        if let Some(size) = self.font_size {
            if !(4.0..=72.0).contains(&size) {
                return Err(PdfError::invalid_option(
                    "fontSize",
                    format!("{} is outside 4..=72", size),
                ));
            }
        }

        if let Some(base) = &self.base_url {
            crate::utils::validation::validate_url("baseUrl", base)
                .map_err(|e| PdfError::invalid_option("baseUrl", e.to_string()))?;
        }

        if let Some(name) = &self.filename {
            if name.contains(['"', '/', '\\', '\r', '\n']) {
                return Err(PdfError::invalid_option(
                    "filename",
                    "must not contain quotes, slashes or line breaks",
                ));
            }
        }

        let (width, height) = self.page_size();
        let margins = self.margins_or(Length::from_inches(0.0));
        if margins.left.inches() + margins.right.inches() >= width.inches()
            || margins.top.inches() + margins.bottom.inches() >= height.inches()
        {
            return Err(PdfError::invalid_option(
                "margin",
                "margins leave no printable area",
            ));
        }

        Ok(())
    }
}
