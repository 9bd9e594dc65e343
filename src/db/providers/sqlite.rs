use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};

use super::registry::{DbProvider, DbProviderId, pool_options};
use crate::config::DatabaseConfig;

const SQLITE_BUSY_TIMEOUT_MS: u64 = 5_000;

pub struct SqliteDbProvider;

impl SqliteDbProvider {
    /// File databases are created on first connect unless the url picks a mode.
    fn connect_url(url: &str) -> String {
        let url = url.trim();
        if url.contains("mode=") || url.contains(":memory:") {
            return url.to_string();
        }
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}mode=rwc")
    }

    /// Every connection to an in-memory url opens its own empty database,
    /// so those pools hold exactly one connection.
    fn connect_options(cfg: &DatabaseConfig) -> ConnectOptions {
        let url = Self::connect_url(&cfg.url);
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut options = pool_options(cfg, url);
        if in_memory {
            options.max_connections(1).min_connections(1);
        }
        options
    }
}

#[async_trait]
impl DbProvider for SqliteDbProvider {
    fn id(&self) -> DbProviderId {
        DbProviderId::Sqlite
    }

    fn supports_url(&self, url: &str) -> bool {
        url.trim().to_ascii_lowercase().starts_with("sqlite:")
    }

    async fn connect(&self, cfg: &DatabaseConfig) -> Result<DatabaseConnection> {
        Ok(Database::connect(Self::connect_options(cfg)).await?)
    }

    async fn post_connect(&self, db: &DatabaseConnection, _cfg: &DatabaseConfig) -> Result<()> {
        db.execute_unprepared("PRAGMA foreign_keys = ON").await?;
        db.execute_unprepared(&format!("PRAGMA busy_timeout = {SQLITE_BUSY_TIMEOUT_MS}"))
            .await?;
        Ok(())
    }
}
