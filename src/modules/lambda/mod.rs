//! Per-role auth actions under `/{role}/lambda/{action}`. Every action is
//! mounted for every role; the role descriptor decides who may call it.

use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, routing::MethodRouter};

use crate::{auth::Role, error::AppError, loader::ModuleScope, state::AppState};

pub mod login;
pub mod logout;
pub mod profile;
pub mod refresh;
pub mod register;

pub fn lambda_path(role: Role, action: &str) -> String {
    format!("/{}/lambda/{action}", role.as_str())
}

pub(crate) fn register_action<F>(scope: &mut ModuleScope, action: &str, route: F)
where
    F: Fn(Role) -> MethodRouter<Arc<AppState>>,
{
    for role in Role::ALL {
        scope.route(&lambda_path(role, action), route(role));
    }
}

pub(crate) fn ensure_allowed(role: Role, action: &str) -> Result<(), AppError> {
    if role.descriptor().allows_route(action) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!("Role {role} cannot call {action}")))
    }
}

pub(crate) fn invalid_body(err: JsonRejection) -> AppError {
    AppError::bad_request(format!("Invalid payload: {}", err.body_text()))
}
