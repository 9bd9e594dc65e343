use sea_orm::DatabaseConnection;
use tracing::info;

use super::providers::DbProviders;
use crate::{config::DatabaseConfig, schema::ddl};

pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<DatabaseConnection> {
    let provider = DbProviders::builtin()?.resolve(&cfg.url)?;
    info!(provider = provider.id().as_str(), "connecting to database");

    let db = provider.connect(cfg).await?;
    provider.post_connect(&db, cfg).await?;

    info!("syncing database schema from table descriptors");
    ddl::sync(&db).await?;
    Ok(db)
}
