pub mod renderers;
