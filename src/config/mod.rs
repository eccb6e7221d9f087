/// Document store connection and table creation
pub mod database;

/// Application settings from the environment and config.toml
pub mod settings;

pub use settings::{AppConfig, WebConfig, load_app_configuration};
