//! AWC · Challenge Tracker Backend
//!
//! - Axum HTTP API for importing challenges and editing challenge codes
//! - Optional AniList forum integration (enabled by default)
//!
//! Important env variables:
//!   PORT            : u16 (default 3000)
//!   AWC_CONFIG_PATH : path to TOML config ([forum], [codec])
//!   LOG_LEVEL       : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use awc_backend::{build_router, telemetry, AppState};

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (in-memory store, forum client, config).
  let state = Arc::new(AppState::new());

  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "awc_backend", %addr, dialect = ?state.config.codec.dialect, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
