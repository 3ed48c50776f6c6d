// Domain layer: request/response models, render options and ports (interfaces).

pub mod model;
pub mod options;
pub mod ports;
