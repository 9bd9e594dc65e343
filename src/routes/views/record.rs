use std::sync::Arc;

use askama::Template;
use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde_json::Value as JsonValue;

use super::ASSETS_PATH;
use crate::{
    auth::{Claims, jwt::decode_token},
    db::dao::Row,
    error::AppError,
    middleware::bearer_token,
    schema::{TableSchema, registry, roles::Operation},
    services::{ServiceContext, crud_service::RowView},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "access_token";
const CLEAR_SESSION_COOKIE: &str = "access_token=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax";

struct FieldRow {
    label: &'static str,
    value: String,
}

#[derive(Template)]
#[template(path = "record.html")]
struct RecordTemplate<'a> {
    project: &'a str,
    assets: &'a str,
    table_label: &'a str,
    id: &'a str,
    fields: Vec<FieldRow>,
}

#[derive(Template)]
#[template(path = "session_expired.html")]
struct SessionExpiredTemplate<'a> {
    project: &'a str,
    assets: &'a str,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/admin/{table}/{id}", get(record_view))
}

/// Fetch-and-render of a single record. Whatever goes wrong, the visitor
/// gets the session expired page and loses the session cookie.
async fn record_view(
    State(state): State<Arc<AppState>>,
    Path((table, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let project = state.config.general.project.as_str();
    match load_record(&state, &headers, &table, &id).await {
        Ok((schema, row)) => {
            let page = RecordTemplate {
                project,
                assets: ASSETS_PATH,
                table_label: schema.label,
                id: &id,
                fields: field_rows(schema, &row),
            };
            match page.render() {
                Ok(html) => Html(html).into_response(),
                Err(err) => {
                    tracing::error!(table = schema.name, %id, error = %err, "record view render failed");
                    (StatusCode::INTERNAL_SERVER_ERROR, Html("failed to render record".to_string()))
                        .into_response()
                }
            }
        }
        Err(err) => {
            tracing::debug!(%table, %id, error = %err, "record view fell back to session expired");
            session_expired(project)
        }
    }
}

async fn load_record(
    state: &AppState,
    headers: &HeaderMap,
    table: &str,
    id: &str,
) -> Result<(&'static TableSchema, Row), AppError> {
    let claims = session_claims(state, headers)?;
    let schema = registry::table(table)
        .ok_or_else(|| AppError::not_found(format!("Unknown table: {table}")))?;
    let permission = claims
        .role
        .descriptor()
        .permission(schema.name)
        .filter(|permission| permission.allows(Operation::Get))
        .ok_or_else(|| AppError::forbidden(format!("Role {} may not view {table}", claims.role)))?;

    let row = ServiceContext::from_state(state)
        .table(schema)
        .for_caller(&claims.sub)
        .get(id, RowView { permission, transform: true })
        .await?;
    Ok((schema, row))
}

/// Claims from the bearer header, falling back to the session cookie.
fn session_claims(state: &AppState, headers: &HeaderMap) -> Result<Claims, AppError> {
    let token = bearer_token(headers)
        .map(str::to_string)
        .or_else(|| cookie_value(headers, SESSION_COOKIE))
        .ok_or_else(|| AppError::unauthorized("No session"))?;
    decode_token(&state.jwt, &token)
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn field_rows(schema: &TableSchema, row: &Row) -> Vec<FieldRow> {
    schema
        .schema()
        .iter()
        .filter_map(|field| {
            let value = row.get(field.name)?;
            Some(FieldRow {
                label: field.label,
                value: display_value(value),
            })
        })
        .collect()
}

fn display_value(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn session_expired(project: &str) -> Response {
    let page = SessionExpiredTemplate {
        project,
        assets: ASSETS_PATH,
    };
    let body = page.render().unwrap_or_else(|err| {
        tracing::error!(error = %err, "session expired render failed");
        "Session expired".to_string()
    });
    let mut response = (StatusCode::UNAUTHORIZED, Html(body)).into_response();
    response
        .headers_mut()
        .insert(header::SET_COOKIE, HeaderValue::from_static(CLEAR_SESSION_COOKIE));
    response
}
