use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header},
};

use crate::{
    auth::{Claims, jwt::decode_token},
    error::AppError,
    state::AppState,
};

/// The token from an `Authorization: Bearer ...` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// Auth guard: validate the bearer JWT and return its claims.
impl FromRequestParts<Arc<AppState>> for Claims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<Claims>().cloned() {
            return Ok(claims);
        }

        let token = bearer_token(&parts.headers)
            .ok_or_else(|| AppError::unauthorized("Missing/invalid Authorization header"))?;
        let claims = decode_token(&state.jwt, token)?;

        parts.extensions.insert(claims.clone());
        Ok(claims)
    }
}
