//! Keeps the bot running: restarts it with jitter and exponential backoff.

use dotenvy::dotenv;
use ducky_shop::{
    config::settings::process_env,
    supervisor::{self, BackoffPolicy},
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    dotenv().ok();

    if process_env("DISCORD_TOKEN").is_none() {
        error!("DISCORD_TOKEN is not set, refusing to start the bot");
        std::process::exit(1);
    }

    let binary = match supervisor::bot_binary_path(process_env("BOT_BINARY")) {
        Ok(path) => path,
        Err(e) => {
            error!("Could not locate the bot binary: {}", e);
            std::process::exit(1);
        }
    };
    info!("Supervising {}", binary.display());

    let policy = BackoffPolicy::default();
    let binary = binary.as_path();
    let run = supervisor::supervise(
        &policy,
        move |_| supervisor::launch_bot(binary),
        tokio::time::sleep,
    );

    let code = tokio::select! {
        outcome = run => outcome.exit_code(),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping the bot");
            0
        }
    };
    std::process::exit(code);
}
