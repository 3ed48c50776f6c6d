pub mod document;
pub mod endpoint;
pub mod pdf;

pub use crate::domain::ports::{ConfigProvider, Renderer};
pub use crate::utils::error::Result;
pub use endpoint::{Endpoint, EndpointResponse};
