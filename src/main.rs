use ducky_shop::{
    bot::{self, BotData},
    config::{self, database},
    core::seed,
    errors::{Error, Result},
    store::Store,
    web::{self, StatusState},
};
use dotenvy::dotenv;
use std::sync::atomic::AtomicBool;
use std::{env, sync::Arc};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, env vars can also be set externally
    dotenv().ok();

    // 3. Load the main application configuration
    let app_config = Arc::new(
        config::load_app_configuration()
            .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?,
    );
    info!("Successfully processed application configuration.");

    // 4. Connect the document store, falling back to JSON files
    let db = database::connect_document_store(app_config.database_url.as_deref()).await;
    let store = Arc::new(Store::new(db, app_config.data_dir.clone()));

    // 5. Seed empty tables from the mirror files or the defaults
    let report = seed::initialize_store(&store)
        .await
        .inspect_err(|e| error!("Failed to initialize the document store: {}", e))?;
    info!("Store ready: {:?}", report);

    // 6. Status server for the hosting platform
    let connected = Arc::new(AtomicBool::new(false));
    if app_config.web.enabled {
        let state = StatusState::new(Arc::clone(&store), Arc::clone(&connected));
        let port = app_config.web.port;
        let static_dir = app_config.static_dir.clone();
        tokio::spawn(async move {
            if let Err(e) = web::start_status_server(port, state, static_dir).await {
                error!("Status server stopped: {}", e);
            }
        });
    }

    // 7. Run the bot
    // DISCORD_TOKEN is loaded here, directly before use, not stored in AppConfig
    let token = env::var("DISCORD_TOKEN")
        .inspect_err(|e| error!("DISCORD_TOKEN not found: {}", e))
        .map_err(Error::EnvVar)?;

    let data = BotData::new(store, app_config, connected);
    bot::run_bot(token, data).await
}
