use std::{path::PathBuf, sync::Arc};

use axum::Router;
use tower_http::services::ServeDir;

use crate::state::AppState;

pub mod record;

pub const ASSETS_PATH: &str = "/admin/assets";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(record::router())
        .nest_service(ASSETS_PATH, ServeDir::new(resolve_public_dir()))
}

/// `APP_PUBLIC_DIR`, then `./public`, then `public/` next to the binary.
fn resolve_public_dir() -> PathBuf {
    if let Some(path) = std::env::var_os("APP_PUBLIC_DIR") {
        return PathBuf::from(path);
    }

    let candidates = [
        std::env::current_dir().ok(),
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf())),
    ];
    candidates
        .into_iter()
        .flatten()
        .map(|dir| dir.join("public"))
        .find(|candidate| candidate.exists())
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("public"))
}
