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
    response::{ApiResult, JsonApiResponse},
    services::{
        ServiceContext,
        auth_service::{LoginInput, SessionBody},
    },
    state::AppState,
};

const ACTION: &str = "login";

pub fn register(scope: &mut ModuleScope) -> anyhow::Result<()> {
    register_action(scope, ACTION, |role| {
        post(
            move |State(state): State<Arc<AppState>>,
                  payload: Result<Json<LoginInput>, JsonRejection>| login(state, role, payload),
        )
    });
    Ok(())
}

async fn login(
    state: Arc<AppState>,
    role: Role,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> ApiResult<SessionBody> {
    ensure_allowed(role, ACTION)?;
    let Json(input) = payload.map_err(invalid_body)?;

    let session = ServiceContext::from_state(&state)
        .auth(&state)
        .login(role, input)
        .await?;
    JsonApiResponse::ok(SessionBody::from(session))
}
