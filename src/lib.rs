pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::http::build_router;
pub use config::{lambda::LambdaConfig, ServiceConfig};
pub use domain::model::{RenderJob, RenderedDocument};
pub use domain::options::RenderOptions;
pub use utils::error::{PdfError, Result};
