//! Status server for hosting platforms.
//!
//! Hosting platforms such as Render expect a bound port. The server answers:
//! * `/`          - status page with the payment QR code (HTML)
//! * `/status`    - bot status (JSON)
//! * `/health`    - liveness check (JSON)
//! * `/static/*`  - files from the static directory
//!
//! Anything else is a 404 page.

use crate::{core::settings, errors::Result, store::Store};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json},
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tracing::info;

/// Shared state for the status server.
#[derive(Debug, Clone)]
pub struct StatusState {
    store: Arc<Store>,
    connected: Arc<AtomicBool>,
    started: Instant,
}

impl StatusState {
    /// `connected` is flipped by the bot when the gateway session is ready.
    pub fn new(store: Arc<Store>, connected: Arc<AtomicBool>) -> Self {
        Self {
            store,
            connected,
            started: Instant::now(),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

/// Body of `/status`.
#[derive(Debug, Serialize)]
pub struct BotStatus {
    /// Always `online` while the server answers
    pub status: &'static str,
    /// Seconds since the server started
    pub uptime: u64,
    /// Whether the gateway has reported ready
    pub discord_connected: bool,
}

/// Builds the router. Exposed separately from [`start_status_server`] for tests.
pub fn router(state: StatusState, static_dir: &Path) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(not_found_handler)
        .with_state(state)
}

/// Creates the static directory and serves until the task is dropped.
///
/// # Errors
/// Returns an error if the static directory cannot be created or the port cannot be
/// bound.
pub async fn start_status_server(port: u16, state: StatusState, static_dir: PathBuf) -> Result<()> {
    tokio::fs::create_dir_all(static_dir.join("images")).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(state, &static_dir);

    info!("Starting status server on http://{}", addr);
    info!("  /          - Status page (HTML)");
    info!("  /status    - Bot status (JSON)");
    info!("  /health    - Health check");
    info!("  /static/*  - Files from {:?}", static_dir);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index_handler(State(state): State<StatusState>) -> Html<String> {
    let qr_url = settings::load_qrcode_url(&state.store).await;
    Html(render_index(state.is_connected(), &qr_url))
}

async fn status_handler(State(state): State<StatusState>) -> Json<BotStatus> {
    Json(BotStatus {
        status: "online",
        uptime: state.started.elapsed().as_secs(),
        discord_connected: state.is_connected(),
    })
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Html("<html><head><title>404 Not Found</title></head><body><h1>404 Not Found</h1></body></html>"),
    )
}

fn render_index(connected: bool, qr_url: &str) -> String {
    let (class, label) = if connected {
        ("online", "ONLINE")
    } else {
        ("offline", "OFFLINE")
    };
    let qr_image = if qr_url.is_empty() {
        String::new()
    } else {
        format!(
            r#"<p><img src="{}" alt="QR Payment" width="300"></p>"#,
            html_escape(qr_url)
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Ducky Shop</title>
<style>
body {{ font-family: Arial, sans-serif; margin: 0; padding: 20px; background-color: #f5f5f5; }}
.container {{ max-width: 800px; margin: 0 auto; background-color: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
h1 {{ color: #7289DA; }}
.status {{ padding: 10px; margin-top: 20px; border-radius: 4px; color: white; }}
.online {{ background-color: #43B581; }}
.offline {{ background-color: #F04747; }}
.qr-section {{ margin-top: 20px; text-align: center; }}
</style>
</head>
<body>
<div class="container">
<h1>Ducky Shop</h1>
<div class="status {class}">Bot is currently {label}</div>
<div class="qr-section">
<h2>QR Code</h2>
{qr_image}
</div>
</div>
</body>
</html>"#
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
