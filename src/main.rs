//! Lesson Flow · lesson attempt service
//!
//! - Axum HTTP + WebSocket API driving lesson-flow engines
//! - Practice/question pairs per step, then a 5-question final quiz
//! - Best-effort score submission to the learning backend
//!
//! Important env variables:
//!   PORT             : u16 (default 3000)
//!   BACKEND_BASE_URL : score backend, overrides the TOML value
//!   FLOW_CONFIG_PATH : path to TOML config (backend + optional lesson bank)
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

mod telemetry;
mod util;
mod error;
mod domain;
mod config;
mod seeds;
mod quiz;
mod engine;
mod backend;
mod state;
mod protocol;
mod logic;
mod routes;
#[cfg(test)]
mod test_support;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Lesson bank, live flows, score client.
  let state = Arc::new(AppState::new()?);

  let app = build_router(state);

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "lesson_flow", %addr, "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "lesson_flow", error = %e, "Failed to listen for shutdown signal");
  }
  info!(target: "lesson_flow", "Shutting down");
}
