//! Assembles the labeling configuration from built-in defaults, an optional
//! TOML file, `-S` overrides and command-line flags.

pub mod builder;
pub mod defaults;
pub mod file;
pub mod models;

pub use builder::build_config;
pub use models::AppConfig;
