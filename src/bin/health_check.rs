//! Deployment health check: verifies the environment and writes `health_status.json`.

use dotenvy::dotenv;
use ducky_shop::{
    config::settings::process_env,
    health::{self, HEALTH_STATUS_FILE},
    supervisor,
};
use std::path::Path;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    dotenv().ok();

    let required_files = match supervisor::bot_binary_path(process_env("BOT_BINARY")) {
        Ok(path) => vec![path],
        Err(e) => {
            error!("Could not locate the bot binary: {}", e);
            Vec::new()
        }
    };

    let status = health::check(process_env, &required_files);
    if let Err(e) = health::write_status(Path::new(HEALTH_STATUS_FILE), &status) {
        error!("Could not write {}: {}", HEALTH_STATUS_FILE, e);
    }
    match serde_json::to_string_pretty(&status) {
        Ok(json) => println!("{json}"),
        Err(e) => error!("Could not serialize health status: {}", e),
    }

    std::process::exit(i32::from(!status.is_healthy()));
}
