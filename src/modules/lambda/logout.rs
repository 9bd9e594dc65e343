use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    routing::post,
};

use super::{ensure_allowed, invalid_body, register_action};
use crate::{
    auth::Role,
    loader::ModuleScope,
    response::{ApiResult, JsonApiResponse, NoPayload},
    services::{ServiceContext, auth_service::TokenInput},
    state::AppState,
};

const ACTION: &str = "logout";

pub fn register(scope: &mut ModuleScope) -> anyhow::Result<()> {
    register_action(scope, ACTION, |role| {
        post(
            move |State(state): State<Arc<AppState>>,
                  payload: Result<Json<TokenInput>, JsonRejection>| logout(state, role, payload),
        )
    });
    Ok(())
}

/// Revokes the refresh token. Unknown tokens still log out cleanly.
async fn logout(
    state: Arc<AppState>,
    role: Role,
    payload: Result<Json<TokenInput>, JsonRejection>,
) -> ApiResult<NoPayload> {
    ensure_allowed(role, ACTION)?;
    let Json(input) = payload.map_err(invalid_body)?;

    ServiceContext::from_state(&state)
        .auth(&state)
        .logout(input.refresh_token)
        .await?;
    JsonApiResponse::<NoPayload>::message("Logged out")
}
