//! Serves the built web client from `public/`, falling back to
//! `index.html` for hash-routed client paths that don't map to a file.

use std::path::Path;

use axum::Router;
use tower_http::services::{ServeDir, ServeFile};

use crate::state::AppState;

pub fn router(public_dir: &Path) -> Router<AppState> {
    let index = public_dir.join("index.html");
    let serve_dir = ServeDir::new(public_dir).fallback(ServeFile::new(index));
    Router::new().fallback_service(serve_dir)
}
