use chrono::Utc;
use serde_json::Value as JsonValue;

use crate::{
    auth::{
        Claims, Role, TokenBundle,
        jwt::{JwtKeys, encode_token, make_access_claims},
        password::{hash_password, verify_password},
    },
    config::AuthConfig,
    db::dao::{DaoLayerError, NewUser, Row, TokenDao, UserDao, UserRecord, user_dao},
    error::AppError,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RegisterInput {
    pub email: Option<String>,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

/// Body of `refresh` and `logout`.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct TokenInput {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub tokens: TokenBundle,
    pub user: UserRecord,
}

/// Login, registration and token lifecycle for one lambda role.
#[derive(Clone)]
pub struct AuthService {
    users: UserDao,
    tokens: TokenDao,
    jwt: JwtKeys,
    access_ttl_secs: u64,
    refresh_ttl_days: i64,
}

/// Storage failures surface with their underlying message.
fn storage_error(err: DaoLayerError) -> AppError {
    match err {
        DaoLayerError::Db(db_err) => AppError::internal(db_err.to_string()),
        other => AppError::from(other),
    }
}

fn required<'a>(value: &'a Option<String>, message: &str) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_request(message))
}

impl AuthService {
    pub fn new(
        users: UserDao,
        tokens: TokenDao,
        jwt: JwtKeys,
        access_ttl_secs: u64,
        refresh_ttl_days: i64,
    ) -> Self {
        Self {
            users,
            tokens,
            jwt,
            access_ttl_secs,
            refresh_ttl_days,
        }
    }

    async fn issue_tokens(&self, user: &UserRecord, role: Role) -> Result<TokenBundle, AppError> {
        let claims = make_access_claims(&user.id, role, &user.email, self.access_ttl_secs);
        let access_token = encode_token(&self.jwt, &claims)?;
        let refresh = self
            .tokens
            .create_refresh_token(&user.id, self.refresh_ttl_days)
            .await
            .map_err(storage_error)?;

        Ok(TokenBundle {
            access_token,
            refresh_token: refresh.token,
            expire_at: claims.exp,
        })
    }

    /// Field presence is checked before any lookup; every credential mismatch
    /// (unknown email, wrong password, other role) reads the same.
    pub async fn login(&self, role: Role, input: LoginInput) -> Result<Session, AppError> {
        let email = required(&input.email, "Email is required")?;
        let password = required(&input.password, "Password is required")?;

        let user = self
            .users
            .find_by_email(email)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| AppError::unauthorized(INVALID_CREDENTIALS))?;

        if !verify_password(password, &user.password) || user.role != role.as_str() {
            tracing::debug!(user_id = %user.id, role = %role, "login rejected");
            return Err(AppError::unauthorized(INVALID_CREDENTIALS));
        }
        if !user.is_active() {
            return Err(AppError::unauthorized("Account is inactive"));
        }
        if !user.is_verified() {
            return Err(AppError::unauthorized("Account is not verified"));
        }

        self.users
            .set_last_login(&user.id, Utc::now())
            .await
            .map_err(storage_error)?;
        let tokens = self.issue_tokens(&user, role).await?;
        tracing::info!(user_id = %user.id, role = %role, "login succeeded");
        Ok(Session { tokens, user })
    }

    pub async fn register(&self, role: Role, input: RegisterInput) -> Result<UserRecord, AppError> {
        let email = user_dao::normalize_email(required(&input.email, "Email is required")?);
        let password = required(&input.password, "Password is required")?;

        if self
            .users
            .find_by_email(&email)
            .await
            .map_err(storage_error)?
            .is_some()
        {
            return Err(AppError::conflict("User already exists"));
        }

        let password_hash = hash_password(password)?;
        let user = self
            .users
            .create_user(NewUser {
                email: &email,
                password_hash: &password_hash,
                role: role.as_str(),
                first_name: input.first_name.as_deref(),
                last_name: input.last_name.as_deref(),
                phone: input.phone.as_deref(),
                status: user_dao::STATUS_ACTIVE,
                verify: 0,
            })
            .await
            .map_err(storage_error)?;
        tracing::info!(user_id = %user.id, role = %role, "user registered");
        Ok(user)
    }

    /// The caller's own user row without the password hash.
    pub async fn profile(&self, claims: &Claims) -> Result<Row, AppError> {
        let mut row = self.users.find_row(&claims.sub).await.map_err(|err| match err {
            DaoLayerError::NotFound { .. } => AppError::unauthorized("Account no longer exists"),
            other => storage_error(other),
        })?;
        row.remove("password");
        Ok(row)
    }

    /// Rotates a refresh token: the presented one is revoked and a new pair issued.
    pub async fn refresh(&self, role: Role, refresh_token: Option<String>) -> Result<Session, AppError> {
        let refresh_token = required(&refresh_token, "Refresh token is required")?;
        let token = self
            .tokens
            .find_active(refresh_token)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

        if !token.is_usable(Utc::now()) {
            return Err(AppError::unauthorized("Refresh token expired"));
        }

        let user = self
            .users
            .find_by_id(&token.user_id)
            .await
            .map_err(|err| match err {
                DaoLayerError::NotFound { .. } => AppError::unauthorized("Invalid refresh token"),
                other => storage_error(other),
            })?;
        if user.role != role.as_str() {
            return Err(AppError::unauthorized("Invalid refresh token"));
        }
        if !user.is_active() {
            return Err(AppError::unauthorized("Account is inactive"));
        }

        // only the caller whose revoke lands gets a new pair
        if !self.tokens.revoke(refresh_token).await.map_err(storage_error)? {
            tracing::warn!(user_id = %user.id, "refresh token already consumed");
            return Err(AppError::unauthorized("Invalid refresh token"));
        }
        let tokens = self.issue_tokens(&user, role).await?;
        Ok(Session { tokens, user })
    }

    pub async fn logout(&self, refresh_token: Option<String>) -> Result<(), AppError> {
        let refresh_token = required(&refresh_token, "Refresh token is required")?;
        if !self.tokens.revoke(refresh_token).await.map_err(storage_error)? {
            tracing::debug!("logout with unknown refresh token");
        }
        Ok(())
    }

    /// Ensures the configured back-office account exists, active and verified.
    pub async fn seed_admin(&self, cfg: &AuthConfig) -> anyhow::Result<()> {
        if let Some(existing) = self
            .users
            .find_by_email(&cfg.admin_email)
            .await
            .map_err(|err| anyhow::anyhow!("{err}"))?
        {
            tracing::info!("admin user already present: {}", existing.email);
            return Ok(());
        }

        let hash = hash_password(&cfg.admin_password)
            .map_err(|err| anyhow::anyhow!("admin seed hash error: {err}"))?;
        let user = self
            .users
            .create_user(NewUser {
                email: &cfg.admin_email,
                password_hash: &hash,
                role: Role::Admin.as_str(),
                first_name: Some("Admin"),
                last_name: None,
                phone: None,
                status: user_dao::STATUS_ACTIVE,
                verify: user_dao::VERIFIED,
            })
            .await
            .map_err(|err| anyhow::anyhow!("{err}"))?;
        tracing::info!("seeded admin user {}", user.email);
        Ok(())
    }
}

/// Response body of `login` and `refresh`.
#[derive(Debug, serde::Serialize)]
pub struct SessionBody {
    pub access_token: String,
    pub refresh_token: String,
    pub expire_at: u64,
    pub user_id: String,
    pub role: String,
    pub email: String,
}

impl From<Session> for SessionBody {
    fn from(session: Session) -> Self {
        Self {
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
            expire_at: session.tokens.expire_at,
            user_id: session.user.id,
            role: session.user.role,
            email: session.user.email,
        }
    }
}

impl UserRecord {
    /// Public view of a user for lambda responses.
    pub fn to_public_json(&self) -> JsonValue {
        serde_json::json!({
            "id": self.id,
            "email": self.email,
            "role": self.role,
            "first_name": self.first_name,
            "last_name": self.last_name,
            "phone": self.phone,
            "status": self.status,
            "verify": self.verify,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, sea_query::Value};

    use super::{AuthService, LoginInput, RegisterInput};
    use crate::{
        auth::{Role, jwt::{JwtKeys, decode_token}, password::hash_password},
        db::dao::{TokenDao, UserDao},
        error::AppError,
    };

    struct ServiceFixtureBuilder {
        mock: MockDatabase,
    }

    impl ServiceFixtureBuilder {
        fn new() -> Self {
            Self {
                mock: MockDatabase::new(DatabaseBackend::Postgres),
            }
        }

        fn with_rows(mut self, rows: Vec<BTreeMap<&'static str, Value>>) -> Self {
            self.mock = self.mock.append_query_results([rows]);
            self
        }

        fn with_error(mut self, err: DbErr) -> Self {
            self.mock = self.mock.append_query_errors([err]);
            self
        }

        fn build(self) -> AuthService {
            let db = self.mock.into_connection();
            AuthService::new(
                UserDao::new(&db),
                TokenDao::new(&db),
                JwtKeys::from_secret(b"test-secret"),
                900,
                30,
            )
        }
    }

    fn user_row(password: &str, role: &str, status: i64, verify: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("id", Value::from("11111111-1111-4111-8111-111111111111".to_string())),
            ("email", Value::from("client@example.com".to_string())),
            ("password", Value::from(hash_password(password).expect("hash"))),
            ("role", Value::from(role.to_string())),
            ("first_name", Value::from(None::<String>)),
            ("last_name", Value::from(None::<String>)),
            ("phone", Value::from(None::<String>)),
            ("status", Value::from(status)),
            ("verify", Value::from(verify)),
        ])
    }

    fn token_row() -> BTreeMap<&'static str, Value> {
        BTreeMap::from([
            ("id", Value::from("t1".to_string())),
            ("user_id", Value::from("11111111-1111-4111-8111-111111111111".to_string())),
            ("token", Value::from("refresh-1".to_string())),
            ("expire_at", Value::from("2099-01-01T00:00:00Z".to_string())),
            ("status", Value::from(1i64)),
        ])
    }

    fn login(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        }
    }

    #[tokio::test]
    async fn login_issues_tokens_for_active_verified_user() {
        let user = user_row("password123", "client", 1, 1);
        let service = ServiceFixtureBuilder::new()
            .with_rows(vec![user.clone()])
            .with_rows(vec![user])
            .with_rows(vec![token_row()])
            .build();

        let session = service
            .login(Role::Client, login("client@example.com", "password123"))
            .await
            .expect("login should succeed");

        assert_eq!(session.tokens.refresh_token, "refresh-1");
        let claims = decode_token(&JwtKeys::from_secret(b"test-secret"), &session.tokens.access_token)
            .expect("access token should decode");
        assert_eq!(claims.sub, session.user.id);
        assert_eq!(claims.role, Role::Client);
        assert_eq!(claims.exp, session.tokens.expire_at);
    }

    #[tokio::test]
    async fn missing_fields_fail_before_any_lookup() {
        // no query results queued: any lookup would error
        let service = ServiceFixtureBuilder::new().build();

        let err = service
            .login(Role::Client, LoginInput { email: None, password: Some("x".into()) })
            .await
            .expect_err("missing email");
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Email is required"));

        let err = service
            .login(Role::Client, login("client@example.com", "  "))
            .await
            .expect_err("blank password");
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Password is required"));
    }

    #[tokio::test]
    async fn credential_mismatches_share_one_message() {
        let service = ServiceFixtureBuilder::new()
            .with_rows(vec![])
            .with_rows(vec![user_row("password123", "client", 1, 1)])
            .with_rows(vec![user_row("password123", "client", 1, 1)])
            .build();

        for input in [
            login("nobody@example.com", "password123"),
            login("client@example.com", "wrong-password"),
        ] {
            let err = service.login(Role::Client, input).await.expect_err("should fail");
            assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid credentials"));
        }

        let err = service
            .login(Role::Admin, login("client@example.com", "password123"))
            .await
            .expect_err("role mismatch");
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid credentials"));
    }

    #[tokio::test]
    async fn inactive_and_unverified_accounts_are_rejected() {
        let service = ServiceFixtureBuilder::new()
            .with_rows(vec![user_row("password123", "client", 0, 1)])
            .with_rows(vec![user_row("password123", "client", 1, 0)])
            .build();

        let err = service
            .login(Role::Client, login("client@example.com", "password123"))
            .await
            .expect_err("inactive");
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Account is inactive"));

        let err = service
            .login(Role::Client, login("client@example.com", "password123"))
            .await
            .expect_err("unverified");
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Account is not verified"));
    }

    #[tokio::test]
    async fn storage_failure_is_internal_with_message() {
        let service = ServiceFixtureBuilder::new()
            .with_error(DbErr::Custom("connection refused".to_string()))
            .build();

        let err = service
            .login(Role::Client, login("client@example.com", "password123"))
            .await
            .expect_err("db failure");
        assert!(matches!(err, AppError::Internal(ref m) if m.contains("connection refused")));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let service = ServiceFixtureBuilder::new()
            .with_rows(vec![user_row("password123", "client", 1, 0)])
            .build();

        let err = service
            .register(
                Role::Client,
                RegisterInput {
                    email: Some("client@example.com".to_string()),
                    password: Some("password123".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect_err("duplicate");
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn refresh_rotates_token() {
        let service = ServiceFixtureBuilder::new()
            .with_rows(vec![token_row()])
            .with_rows(vec![user_row("password123", "client", 1, 1)])
            .with_rows(vec![token_row()])
            .with_rows(vec![token_row()])
            .build();

        let session = service
            .refresh(Role::Client, Some("refresh-1".to_string()))
            .await
            .expect("refresh should succeed");
        assert_eq!(session.user.role, "client");
    }

    #[tokio::test]
    async fn refresh_losing_the_revoke_gets_no_tokens() {
        // the token reads as active, but another refresh revokes it first
        let service = ServiceFixtureBuilder::new()
            .with_rows(vec![token_row()])
            .with_rows(vec![user_row("password123", "client", 1, 1)])
            .with_rows(vec![])
            .build();

        let err = service
            .refresh(Role::Client, Some("refresh-1".to_string()))
            .await
            .expect_err("already consumed");
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid refresh token"));
    }

    #[tokio::test]
    async fn unknown_refresh_token_is_unauthorized() {
        let service = ServiceFixtureBuilder::new().with_rows(vec![]).build();

        let err = service
            .refresh(Role::Client, Some("missing".to_string()))
            .await
            .expect_err("unknown token");
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
