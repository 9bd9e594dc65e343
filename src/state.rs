use std::sync::Arc;

use anyhow::Context;
use sea_orm::DatabaseConnection;

use crate::{auth::jwt::JwtKeys, config::AppConfig};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub jwt: JwtKeys,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<Arc<Self>> {
        let secret = config
            .auth
            .as_ref()
            .map(|auth| auth.jwt_secret.clone())
            .context("auth config is required (set APP_AUTH__JWT_SECRET)")?;
        let jwt = JwtKeys::from_secret(secret.as_bytes());
        Ok(Arc::new(Self { config, db, jwt }))
    }

    pub fn access_ttl_secs(&self) -> u64 {
        self.config
            .auth
            .as_ref()
            .map(|auth| auth.access_ttl_secs)
            .unwrap_or(crate::config::defaults::DEFAULT_ACCESS_TTL_SECS as u64)
    }

    pub fn refresh_ttl_days(&self) -> i64 {
        self.config
            .auth
            .as_ref()
            .map(|auth| auth.refresh_ttl_days)
            .unwrap_or(crate::config::defaults::DEFAULT_REFRESH_TTL_DAYS)
    }
}
