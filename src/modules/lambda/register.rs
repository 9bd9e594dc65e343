use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::post,
};
use serde_json::Value as JsonValue;

use super::{ensure_allowed, invalid_body, register_action};
use crate::{
    auth::Role,
    loader::ModuleScope,
    response::{ApiResult, JsonApiResponse, ModelBody},
    services::{ServiceContext, auth_service::RegisterInput},
    state::AppState,
};

const ACTION: &str = "register";

pub fn register(scope: &mut ModuleScope) -> anyhow::Result<()> {
    register_action(scope, ACTION, |role| {
        post(
            move |State(state): State<Arc<AppState>>,
                  payload: Result<Json<RegisterInput>, JsonRejection>| {
                sign_up(state, role, payload)
            },
        )
    });
    Ok(())
}

async fn sign_up(
    state: Arc<AppState>,
    role: Role,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> ApiResult<ModelBody<JsonValue>> {
    ensure_allowed(role, ACTION)?;
    let Json(input) = payload.map_err(invalid_body)?;

    let user = ServiceContext::from_state(&state)
        .auth(&state)
        .register(role, input)
        .await?;
    JsonApiResponse::with_status(
        StatusCode::CREATED,
        ModelBody {
            model: user.to_public_json(),
        },
    )
    .map(|response| response.with_message("Registration successful"))
}
