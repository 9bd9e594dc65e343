use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, sea_query::Value};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue, json};

use super::{DaoLayerError, DaoResult, Row, TableDao};
use crate::schema::tables;

pub const STATUS_ACTIVE: i64 = 1;
pub const VERIFIED: i64 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub status: i64,
    pub verify: i64,
}

impl UserRecord {
    fn from_row(row: Row) -> DaoResult<Self> {
        serde_json::from_value(JsonValue::Object(row))
            .map_err(|err| DaoLayerError::Decode(format!("user: {err}")))
    }

    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }

    pub fn is_verified(&self) -> bool {
        self.verify == VERIFIED
    }
}

#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub status: i64,
    pub verify: i64,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[derive(Clone)]
pub struct UserDao {
    table: TableDao,
}

impl UserDao {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            table: TableDao::new(db, &tables::USER),
        }
    }

    /// Emails are stored and matched lowercased.
    pub async fn find_by_email(&self, email: &str) -> DaoResult<Option<UserRecord>> {
        self.table
            .find_one_by("email", Value::from(normalize_email(email)))
            .await?
            .map(UserRecord::from_row)
            .transpose()
    }

    pub async fn find_by_id(&self, id: &str) -> DaoResult<UserRecord> {
        UserRecord::from_row(self.table.find_by_id(id).await?)
    }

    /// The raw row, for responses that go through the table's field rules.
    pub async fn find_row(&self, id: &str) -> DaoResult<Row> {
        self.table.find_by_id(id).await
    }

    pub async fn create_user(&self, user: NewUser<'_>) -> DaoResult<UserRecord> {
        let mut values = Map::new();
        values.insert("email".to_string(), json!(normalize_email(user.email)));
        values.insert("password".to_string(), json!(user.password_hash));
        values.insert("role".to_string(), json!(user.role));
        values.insert("first_name".to_string(), json!(user.first_name));
        values.insert("last_name".to_string(), json!(user.last_name));
        values.insert("phone".to_string(), json!(user.phone));
        values.insert("status".to_string(), json!(user.status));
        values.insert("verify".to_string(), json!(user.verify));
        UserRecord::from_row(self.table.create(values).await?)
    }

    pub async fn set_last_login(&self, id: &str, at: DateTime<Utc>) -> DaoResult<()> {
        let mut values = Map::new();
        values.insert("last_login_at".to_string(), json!(at.to_rfc3339()));
        self.table.update(id, values).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, sea_query::Value};

    use super::{NewUser, UserDao};
    use crate::db::dao::DaoLayerError;

    fn user_row(id: &str, email: &str) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("id", Value::from(id.to_string())),
            ("email", Value::from(email.to_string())),
            ("password", Value::from("$argon2id$stub".to_string())),
            ("role", Value::from("client".to_string())),
            ("first_name", Value::from(None::<String>)),
            ("last_name", Value::from(None::<String>)),
            ("phone", Value::from(None::<String>)),
            ("status", Value::from(1i64)),
            ("verify", Value::from(0i64)),
        ])
    }

    #[tokio::test]
    async fn find_by_email_returns_first_match() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user_row("u1", "alice@example.com")]])
            .into_connection();
        let dao = UserDao::new(&db);

        let user = dao
            .find_by_email("alice@example.com")
            .await
            .expect("query should succeed")
            .expect("user should exist");
        assert_eq!(user.id, "u1");
        assert!(user.is_active());
        assert!(!user.is_verified());
    }

    #[tokio::test]
    async fn email_lookups_and_inserts_are_lowercased() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                [user_row("u3", "carol@example.com")],
                [user_row("u3", "carol@example.com")],
            ])
            .into_connection();
        let dao = UserDao::new(&db);

        dao.find_by_email("  Carol@Example.COM ")
            .await
            .expect("query should succeed")
            .expect("user should exist");
        dao.create_user(NewUser {
            email: "Carol@Example.com",
            password_hash: "$argon2id$stub",
            role: "client",
            first_name: None,
            last_name: None,
            phone: None,
            status: 1,
            verify: 0,
        })
        .await
        .expect("insert should succeed");

        let log = format!("{:?}", db.into_transaction_log());
        assert!(log.matches("carol@example.com").count() >= 2, "{log}");
        assert!(!log.contains("Carol@"), "{log}");
    }

    #[tokio::test]
    async fn find_by_email_returns_none_when_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .into_connection();
        let dao = UserDao::new(&db);

        let result = dao
            .find_by_email("missing@example.com")
            .await
            .expect("query should succeed");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn create_user_decodes_returned_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user_row("u2", "bob@example.com")]])
            .into_connection();
        let dao = UserDao::new(&db);

        let user = dao
            .create_user(NewUser {
                email: "bob@example.com",
                password_hash: "$argon2id$stub",
                role: "client",
                first_name: None,
                last_name: None,
                phone: None,
                status: 1,
                verify: 0,
            })
            .await
            .expect("insert should succeed");
        assert_eq!(user.email, "bob@example.com");
    }

    #[tokio::test]
    async fn set_last_login_propagates_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<BTreeMap<&str, Value>>::new()])
            .into_connection();
        let dao = UserDao::new(&db);

        let err = dao
            .set_last_login("missing", Utc::now())
            .await
            .expect_err("update should fail");
        assert!(matches!(err, DaoLayerError::NotFound { id, .. } if id == "missing"));
    }
}
