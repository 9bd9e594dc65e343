use std::sync::Arc;

use axum::Router;

use super::views;
use crate::{
    loader::{LoadReport, load_modules},
    modules::MODULES,
    state::AppState,
};

/// Every auto-loaded module plus the admin views, bound to `state`.
pub fn router_with_report(state: Arc<AppState>) -> (Router, LoadReport) {
    let api_prefix = state.config.api_prefix();
    let (modules, report) = load_modules(MODULES, &api_prefix, Router::new());
    let app = Router::new()
        .merge(modules)
        .merge(views::router())
        .with_state(state);
    (app, report)
}

pub fn router(state: Arc<AppState>) -> Router {
    router_with_report(state).0
}
