//! §4.N HTTP/JSON + WebSocket server: routes requests to the stores under
//! `/api`, hosts the `/ws` broadcaster stream, and serves the static web
//! client with SPA fallback.

pub mod broadcaster;
pub mod error;
pub mod routes;
pub mod snapshot;
pub mod state;
pub mod ws;
mod static_files;

use std::time::Duration;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Interval the broadcaster ticks at (§4.M).
pub const BROADCAST_INTERVAL: Duration = Duration::from_secs(2);

/// Builds the full router: `/api/*`, `/ws`, and the static client fallback.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let public_dir = state.paths.root().join("public");

    Router::new()
        .nest("/api", routes::router())
        .route("/ws", get(ws::handler))
        .merge(static_files::router(&public_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Spawns the background broadcaster ticker. Returns a handle to signal
/// shutdown and the join handle to await on.
pub fn spawn_broadcaster(state: AppState) -> (tokio::sync::watch::Sender<bool>, tokio::task::JoinHandle<()>) {
    let (tx, rx) = tokio::sync::watch::channel(false);
    let handle = tokio::spawn(broadcaster::run_ticker(state, BROADCAST_INTERVAL, rx));
    (tx, handle)
}
