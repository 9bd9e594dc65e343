use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue, json};
use uuid::Uuid;

use super::{ColumnFilter, DaoLayerError, DaoResult, Row, TableDao, table_dao::parse_timestamp};
use crate::schema::tables;

const STATUS_REVOKED: i64 = 0;
const STATUS_ACTIVE: i64 = 1;

#[derive(Debug, Clone, Deserialize)]
pub struct TokenRecord {
    pub id: String,
    pub user_id: String,
    pub token: String,
    pub expire_at: JsonValue,
    pub status: i64,
}

impl TokenRecord {
    fn from_row(row: Row) -> DaoResult<Self> {
        serde_json::from_value(JsonValue::Object(row))
            .map_err(|err| DaoLayerError::Decode(format!("token: {err}")))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expire_at.as_str().and_then(parse_timestamp)
    }

    /// Active and not past its expiry; an unreadable expiry counts as expired.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == STATUS_ACTIVE && self.expires_at().is_some_and(|expires| expires > now)
    }
}

/// Refresh tokens: opaque UUID strings persisted in the `token` table.
#[derive(Clone)]
pub struct TokenDao {
    table: TableDao,
}

impl TokenDao {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            table: TableDao::new(db, &tables::TOKEN),
        }
    }

    pub async fn create_refresh_token(&self, user_id: &str, ttl_days: i64) -> DaoResult<TokenRecord> {
        let expire_at = Utc::now() + Duration::days(ttl_days);
        let mut values = Map::new();
        values.insert("user_id".to_string(), json!(user_id));
        values.insert("token".to_string(), json!(Uuid::new_v4().to_string()));
        values.insert("expire_at".to_string(), json!(expire_at.to_rfc3339()));
        values.insert("status".to_string(), json!(STATUS_ACTIVE));
        TokenRecord::from_row(self.table.create(values).await?)
    }

    pub async fn find_active(&self, token: &str) -> DaoResult<Option<TokenRecord>> {
        let filters = [
            ColumnFilter::eq("token", token.to_string()),
            ColumnFilter::eq("status", STATUS_ACTIVE),
        ];
        self.table
            .find(1, 1, &filters)
            .await?
            .data
            .into_iter()
            .next()
            .map(TokenRecord::from_row)
            .transpose()
    }

    /// Flips an active token to revoked in one statement. `false` means the
    /// token is unknown or was already revoked, possibly by a concurrent call.
    pub async fn revoke(&self, token: &str) -> DaoResult<bool> {
        let mut values = Map::new();
        values.insert("status".to_string(), json!(STATUS_REVOKED));
        let filters = [
            ColumnFilter::eq("token", token.to_string()),
            ColumnFilter::eq("status", STATUS_ACTIVE),
        ];
        let updated = self.table.update_where(&filters, values).await?;
        Ok(updated.is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, sea_query::Value};

    use super::TokenDao;
    use crate::db::dao::DaoLayerError;

    fn token_row(token: &str, status: i64, expire_at: &str) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("id", Value::from("t1".to_string())),
            ("user_id", Value::from("u1".to_string())),
            ("token", Value::from(token.to_string())),
            ("expire_at", Value::from(expire_at.to_string())),
            ("status", Value::from(status)),
        ])
    }

    #[tokio::test]
    async fn created_token_is_usable_until_expiry() {
        let expire_at = (Utc::now() + Duration::days(30)).to_rfc3339();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[token_row("abc", 1, &expire_at)]])
            .into_connection();
        let dao = TokenDao::new(&db);

        let token = dao.create_refresh_token("u1", 30).await.expect("insert");

        assert!(token.is_usable(Utc::now()));
        assert!(!token.is_usable(Utc::now() + Duration::days(31)));
    }

    #[tokio::test]
    async fn revoked_or_unparseable_tokens_are_not_usable() {
        let expire_at = (Utc::now() + Duration::days(1)).to_rfc3339();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                [token_row("abc", 0, &expire_at)],
                [token_row("def", 1, "garbage")],
            ])
            .into_connection();
        let dao = TokenDao::new(&db);

        let revoked = dao.find_active("abc").await.expect("query").expect("row");
        let garbled = dao.find_active("def").await.expect("query").expect("row");

        assert!(!revoked.is_usable(Utc::now()));
        assert!(!garbled.is_usable(Utc::now()));
    }

    #[tokio::test]
    async fn revoke_reports_missing_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .into_connection();
        let dao = TokenDao::new(&db);

        assert!(!dao.revoke("nope").await.expect("update"));
    }

    #[tokio::test]
    async fn revoke_only_touches_active_tokens() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .into_connection();
        let dao = TokenDao::new(&db);

        assert!(!dao.revoke("abc").await.expect("update"));

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.contains(r#"UPDATE \"token\""#), "{log}");
        assert!(log.contains(r#"AND \"status\" = "#), "{log}");
    }

    #[tokio::test]
    async fn db_errors_surface_as_dao_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let dao = TokenDao::new(&db);

        let err = dao.find_active("abc").await.expect_err("should fail");
        assert!(matches!(err, DaoLayerError::Db(_)));
    }
}
