//! One [`Renderer`](crate::domain::ports::Renderer) per endpoint variant.

pub mod chrome;
pub mod client;
pub mod layout;
pub mod screenshot;

pub use chrome::ChromeRenderer;
pub use client::ClientRenderer;
pub use layout::LayoutRenderer;
pub use screenshot::ScreenshotRenderer;
