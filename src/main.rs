//! ReadFit · Reading Practice Backend
//!
//! - Axum HTTP + WebSocket API
//! - Optional OpenAI, Unsplash, Firebase Auth and Firestore integrations (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT                 : u16 (default 3000)
//!   OPENAI_API_KEY       : enables AI distractors, feedback, quizzes and images
//!   OPENAI_BASE_URL      : default "https://api.openai.com/v1"
//!   OPENAI_TEXT_MODEL    : default "gpt-4o-mini"
//!   OPENAI_IMAGE_MODEL   : default "dall-e-3"
//!   OPENAI_MAX_TOKENS    : optional completion cap for chat calls
//!   UNSPLASH_ACCESS_KEY  : enables the stock photo fallback
//!   FIREBASE_WEB_API_KEY : teacher email/password sign-in
//!   FIRESTORE_PROJECT_ID : enables Firestore (in-memory store otherwise)
//!   FIRESTORE_BASE_URL   : default "https://firestore.googleapis.com/v1"
//!   FIRESTORE_TOKEN      : bearer token for Firestore REST calls
//!   READFIT_CONFIG_PATH  : path to TOML config (prompts + settings)
//!   LOG_LEVEL            : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT           : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use readfit_backend::{build_router, state::spawn_idle_sweeper, telemetry, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Shared application state (store, identity, AI clients, prompts, sessions).
  let state = Arc::new(AppState::new());
  spawn_idle_sweeper(&state);

  let app = build_router(state.clone());

  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "readfit_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
