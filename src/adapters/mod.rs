// Adapters layer: concrete implementations for external systems (browser process, http)

pub mod browser;
pub mod chrome;
pub mod http;
