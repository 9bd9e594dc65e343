use axum::{
    body::{self, Body},
    http::{Request, StatusCode, header},
    response::Response,
};
use sea_orm::{DatabaseBackend, MockDatabase, sea_query::Value};
use tower::ServiceExt;

use longtermhire::{
    auth::Role,
    test_helpers::{MockRow, bearer, mock_row, test_router},
};

const REQUEST_ID: &str = "55555555-5555-4555-8555-555555555555";

fn hire_request_row() -> MockRow {
    mock_row(
        REQUEST_ID,
        &[
            ("client_id", Value::from("66666666-6666-4666-8666-666666666666".to_string())),
            ("equipment_id", Value::from("77777777-7777-4777-8777-777777777777".to_string())),
            ("start_date", Value::from("2026-03-01T00:00:00Z".to_string())),
            ("end_date", Value::from(None::<String>)),
            ("duration_weeks", Value::from(12i64)),
            ("quoted_rate", Value::from(2100.0f64)),
            ("status", Value::from(2i64)),
            ("notes", Value::from("<b>urgent</b>".to_string())),
        ],
    )
}

async fn text_body(res: Response) -> String {
    let bytes = body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn clears_cookie(res: &Response) -> bool {
    res.headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("access_token=;") && value.contains("Max-Age=0"))
}

#[tokio::test]
async fn renders_record_with_labels_from_cookie_session() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![hire_request_row()]])
        .into_connection();
    let token = bearer(Role::Admin).trim_start_matches("Bearer ").to_string();

    let res = test_router(db)
        .oneshot(
            Request::builder()
                .uri(format!("/admin/hire_request/{REQUEST_ID}"))
                .header(header::COOKIE, format!("access_token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let html = text_body(res).await;
    assert!(html.contains("Hire Request"), "{html}");
    assert!(html.contains("Duration (weeks)"), "{html}");
    assert!(html.contains("Approved"), "{html}");
    assert!(html.contains("&lt;b&gt;urgent&lt;/b&gt;"), "{html}");
}

#[tokio::test]
async fn missing_session_renders_expired_page() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let res = test_router(db)
        .oneshot(
            Request::builder()
                .uri(format!("/admin/hire_request/{REQUEST_ID}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(clears_cookie(&res));
    assert!(text_body(res).await.contains("Session expired"));
}

#[tokio::test]
async fn fetch_errors_also_expire_the_session() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<MockRow>::new()])
        .into_connection();
    let app = test_router(db);

    for uri in [
        format!("/admin/hire_request/{REQUEST_ID}"),
        format!("/admin/warehouse/{REQUEST_ID}"),
        format!("/admin/token/{REQUEST_ID}"),
    ] {
        let role = if uri.contains("token") { Role::Client } else { Role::Admin };
        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(&uri)
                    .header(header::AUTHORIZATION, bearer(role))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert!(clears_cookie(&res), "{uri}");
    }
}
