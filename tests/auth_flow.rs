use axum::{
    body::{self, Body},
    http::{Request, StatusCode, header},
    response::Response,
};
use sea_orm::{DatabaseBackend, MockDatabase, sea_query::Value};
use serde_json::{Value as JsonValue, json};
use tower::ServiceExt; // for `oneshot`

use longtermhire::{
    auth::{Role, jwt::{JwtKeys, decode_token}, password},
    test_helpers::{MockRow, TEST_SECRET, TEST_USER_ID, api_path, bearer, mock_row, test_router},
};

fn user_row(password_value: &str, role: &str, status: i64, verify: i64) -> MockRow {
    mock_row(
        TEST_USER_ID,
        &[
            ("email", Value::from("client@example.com".to_string())),
            ("password", Value::from(password::hash_password(password_value).unwrap())),
            ("role", Value::from(role.to_string())),
            ("first_name", Value::from(Some("Casey".to_string()))),
            ("last_name", Value::from(None::<String>)),
            ("phone", Value::from(None::<String>)),
            ("status", Value::from(status)),
            ("verify", Value::from(verify)),
            ("last_login_at", Value::from(None::<String>)),
        ],
    )
}

fn token_row() -> MockRow {
    mock_row(
        "22222222-2222-4222-8222-222222222222",
        &[
            ("user_id", Value::from(TEST_USER_ID.to_string())),
            ("token", Value::from("refresh-1".to_string())),
            ("expire_at", Value::from("2099-01-01T00:00:00Z".to_string())),
            ("status", Value::from(1i64)),
        ],
    )
}

fn post_json(path: &str, payload: JsonValue) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(api_path(path))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn json_body(res: Response) -> JsonValue {
    let bytes = body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn login_returns_token_pair() {
    let user = user_row("password123", "client", 1, 1);
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user.clone()], vec![user], vec![token_row()]])
        .into_connection();

    let res = test_router(db)
        .oneshot(post_json(
            "/client/lambda/login",
            json!({"email": "client@example.com", "password": "password123"}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["error"], false);
    assert_eq!(json["refresh_token"], "refresh-1");
    assert_eq!(json["user_id"], TEST_USER_ID);
    assert_eq!(json["role"], "client");
    assert_eq!(json["email"], "client@example.com");

    let token = json["access_token"].as_str().expect("access token");
    let claims = decode_token(&JwtKeys::from_secret(TEST_SECRET.as_bytes()), token).unwrap();
    assert_eq!(claims.role, Role::Client);
    assert_eq!(json["expire_at"], claims.exp);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_row("password123", "client", 1, 1)]])
        .into_connection();

    let res = test_router(db)
        .oneshot(post_json(
            "/client/lambda/login",
            json!({"email": "client@example.com", "password": "not-the-password"}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(res).await;
    assert_eq!(json, json!({"error": true, "message": "Invalid credentials"}));
}

#[tokio::test]
async fn login_of_inactive_account_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_row("password123", "client", 0, 1)]])
        .into_connection();

    let res = test_router(db)
        .oneshot(post_json(
            "/client/lambda/login",
            json!({"email": "client@example.com", "password": "password123"}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(res).await["message"], "Account is inactive");
}

#[tokio::test]
async fn login_with_missing_field_fails_before_lookup() {
    // nothing queued: a lookup would surface as a 500
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let res = test_router(db)
        .oneshot(post_json("/client/lambda/login", json!({"email": "client@example.com"})))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(res).await["message"], "Password is required");
}

#[tokio::test]
async fn admin_role_cannot_register() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let res = test_router(db)
        .oneshot(post_json(
            "/admin/lambda/register",
            json!({"email": "new@example.com", "password": "password123"}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_role_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let res = test_router(db)
        .oneshot(post_json("/supplier/lambda/login", json!({})))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(res).await["error"], true);
}

#[tokio::test]
async fn register_creates_unverified_client() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![], vec![user_row("password123", "client", 1, 0)]])
        .into_connection();

    let res = test_router(db)
        .oneshot(post_json(
            "/client/lambda/register",
            json!({"email": "Client@Example.com", "password": "password123", "first_name": "Casey"}),
        ))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CREATED);
    let json = json_body(res).await;
    assert_eq!(json["model"]["verify"], 0);
    assert!(json["model"].get("password").is_none());
}

#[tokio::test]
async fn profile_requires_token_and_hides_password() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_row("password123", "client", 1, 1)]])
        .into_connection();
    let app = test_router(db);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(api_path("/client/lambda/profile"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
        .oneshot(
            Request::builder()
                .uri(api_path("/client/lambda/profile"))
                .header(header::AUTHORIZATION, bearer(Role::Client))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["model"]["email"], "client@example.com");
    assert!(json["model"].get("password").is_none());
}

#[tokio::test]
async fn logout_with_unknown_token_still_succeeds() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<MockRow>::new()])
        .into_connection();

    let res = test_router(db)
        .oneshot(post_json("/client/lambda/logout", json!({"refresh_token": "gone"})))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, json!({"error": false, "message": "Logged out"}));
}
