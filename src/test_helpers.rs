//! Shared fixtures for unit and integration tests.

use std::{collections::BTreeMap, sync::Arc};

use axum::{Router, middleware};
use sea_orm::{DatabaseConnection, sea_query::Value};

use crate::{
    auth::{
        Role,
        jwt::{JwtKeys, encode_token, make_access_claims},
    },
    config::{AppConfig, AuthConfig},
    middleware::{catch_panic_layer, json_error_middleware},
    routes::router,
    state::AppState,
};

pub const TEST_SECRET: &str = "test-secret";
pub const TEST_USER_ID: &str = "11111111-1111-4111-8111-111111111111";

pub type MockRow = BTreeMap<&'static str, Value>;

pub fn test_config() -> AppConfig {
    AppConfig {
        auth: Some(AuthConfig {
            jwt_secret: TEST_SECRET.to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "adminpassword".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_days: 30,
        }),
        ..AppConfig::default()
    }
}

pub fn test_state(db: DatabaseConnection) -> Arc<AppState> {
    AppState::new(test_config(), db).expect("build test state")
}

/// The full app with the same error layers `main` installs.
pub fn test_router(db: DatabaseConnection) -> Router {
    router(test_state(db))
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
}

pub fn api_path(path: &str) -> String {
    format!("{}{}", test_config().api_prefix(), path)
}

/// `Bearer ...` header value for a token signed with the test secret.
pub fn bearer(role: Role) -> String {
    let claims = make_access_claims(TEST_USER_ID, role, "someone@example.com", 900);
    let token = encode_token(&JwtKeys::from_secret(TEST_SECRET.as_bytes()), &claims)
        .expect("encode test token");
    format!("Bearer {token}")
}

/// A row with the columns every table carries.
pub fn mock_row(id: &str, columns: &[(&'static str, Value)]) -> MockRow {
    let mut row = BTreeMap::from([
        ("id", Value::from(id.to_string())),
        ("created_at", Value::from("2026-01-01T00:00:00Z".to_string())),
        ("updated_at", Value::from("2026-01-01T00:00:00Z".to_string())),
    ]);
    row.extend(columns.iter().cloned());
    row
}
