//! Command line and configuration file parsing

pub mod args;
pub mod config;

pub use args::Args;
pub use config::{default_config_path, FileConfig};
