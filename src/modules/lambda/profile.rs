use std::sync::Arc;

use axum::{extract::State, routing::get};

use super::{ensure_allowed, register_action};
use crate::{
    auth::{Claims, Role},
    db::dao::Row,
    error::AppError,
    loader::ModuleScope,
    response::{ApiResult, JsonApiResponse, ModelBody},
    services::ServiceContext,
    state::AppState,
};

const ACTION: &str = "profile";

pub fn register(scope: &mut ModuleScope) -> anyhow::Result<()> {
    register_action(scope, ACTION, |role| {
        get(move |State(state): State<Arc<AppState>>, claims: Claims| profile(state, role, claims))
    });
    Ok(())
}

async fn profile(state: Arc<AppState>, role: Role, claims: Claims) -> ApiResult<ModelBody<Row>> {
    ensure_allowed(role, ACTION)?;
    if claims.role != role {
        return Err(AppError::forbidden(format!(
            "Token issued for {} cannot read the {role} profile",
            claims.role
        )));
    }

    let row = ServiceContext::from_state(&state)
        .auth(&state)
        .profile(&claims)
        .await?;
    JsonApiResponse::model(row)
}
