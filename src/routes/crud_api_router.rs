use std::{collections::HashMap, sync::Arc};

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    routing::{MethodRouter, delete, get, post, put},
};
use serde_json::Value as JsonValue;

use crate::{
    auth::Claims,
    error::AppError,
    response::{ApiResult, JsonApiResponse, ModelBody, ModelsBody, NoPayload},
    schema::{
        TableSchema,
        roles::{ModelPermission, Operation},
    },
    services::{
        ServiceContext,
        crud_service::{CrudErrors, RowView, parse_bool},
    },
    state::AppState,
};

type AppMethodRouter = MethodRouter<Arc<AppState>>;

const DEFAULT_PAGE_SIZE: u64 = 25;
const INVALID_PAYLOAD_MESSAGE: &str = "Invalid payload";
const INVALID_QUERY_MESSAGE: &str = "Invalid query";

/// Query keys the list and get handlers consume themselves; everything else
/// is a column filter.
const RESERVED_KEYS: [&str; 3] = ["page", "page_size", "transform"];

/// Builds the five CRUD routes for one table. Every route needs a bearer
/// token whose role allows the operation on this table.
#[derive(Clone)]
pub struct CrudApiRouter {
    schema: &'static TableSchema,
    allowed: Vec<Operation>,
    errors: CrudErrors,
}

impl CrudApiRouter {
    pub fn new(schema: &'static TableSchema) -> Self {
        Self {
            schema,
            allowed: Operation::ALL.to_vec(),
            errors: CrudErrors::default(),
        }
    }

    pub fn set_allowed_methods(mut self, operations: &[Operation]) -> Self {
        self.allowed = operations.to_vec();
        self
    }

    pub fn set_errors(mut self, errors: CrudErrors) -> Self {
        self.errors = errors;
        self
    }

    /// Routes under `{api_prefix}/{table}` and `{api_prefix}/{table}/{id}`.
    pub fn router(&self, api_prefix: &str) -> Router<Arc<AppState>> {
        let base = format!("{api_prefix}/{}", self.schema.name);
        let id_path = format!("{base}/{{id}}");
        let mut router = Router::new();

        for operation in &self.allowed {
            let (path, route) = match operation {
                Operation::List => (&base, self.list_route()),
                Operation::Create => (&base, self.create_route()),
                Operation::Get => (&id_path, self.get_route()),
                Operation::Update => (&id_path, self.update_route()),
                Operation::Delete => (&id_path, self.delete_route()),
            };
            router = router.route(path, route);
        }
        router
    }

    fn list_route(&self) -> AppMethodRouter {
        let (schema, errors) = (self.schema, self.errors);
        get(
            move |State(state): State<Arc<AppState>>,
                  claims: Claims,
                  query: Result<Query<HashMap<String, String>>, QueryRejection>| async move {
                let permission = authorize(&claims, schema, Operation::List)?;
                let Query(mut query) = query.map_err(|err| {
                    AppError::bad_request(format!("{INVALID_QUERY_MESSAGE}: {err}"))
                })?;
                let options = ListOptions::take_from(&mut query)?;

                let service = ServiceContext::from_state(&state)
                    .table(schema)
                    .with_errors(errors)
                    .for_caller(&claims.sub);
                let view = RowView { permission, transform: options.transform };
                let response = service
                    .list(options.page, options.page_size, query, view)
                    .await?;

                JsonApiResponse::ok(ModelsBody {
                    models: response.data,
                    page: response.page,
                    page_size: response.page_size,
                    has_next: response.has_next,
                })
            },
        )
    }

    fn get_route(&self) -> AppMethodRouter {
        let (schema, errors) = (self.schema, self.errors);
        get(
            move |State(state): State<Arc<AppState>>,
                  claims: Claims,
                  Path(id): Path<String>,
                  query: Result<Query<HashMap<String, String>>, QueryRejection>| async move {
                let permission = authorize(&claims, schema, Operation::Get)?;
                let Query(mut query) = query.map_err(|err| {
                    AppError::bad_request(format!("{INVALID_QUERY_MESSAGE}: {err}"))
                })?;
                let transform = take_transform(&mut query)?;

                let service = ServiceContext::from_state(&state)
                    .table(schema)
                    .with_errors(errors)
                    .for_caller(&claims.sub);
                let row = service.get(&id, RowView { permission, transform }).await?;
                JsonApiResponse::model(row)
            },
        )
    }

    fn create_route(&self) -> AppMethodRouter {
        let (schema, errors) = (self.schema, self.errors);
        post(
            move |State(state): State<Arc<AppState>>,
                  claims: Claims,
                  payload: Result<Json<JsonValue>, JsonRejection>| async move {
                let permission = authorize(&claims, schema, Operation::Create)?;
                let Json(payload) = payload.map_err(invalid_payload)?;

                let service = ServiceContext::from_state(&state)
                    .table(schema)
                    .with_errors(errors)
                    .for_caller(&claims.sub);
                let row = service
                    .create(payload, RowView { permission, transform: false })
                    .await?;
                tracing::info!(table = schema.name, user_id = %claims.sub, "record created");
                JsonApiResponse::with_status(StatusCode::CREATED, ModelBody { model: row })
            },
        )
    }

    fn update_route(&self) -> AppMethodRouter {
        let (schema, errors) = (self.schema, self.errors);
        put(
            move |State(state): State<Arc<AppState>>,
                  claims: Claims,
                  Path(id): Path<String>,
                  payload: Result<Json<JsonValue>, JsonRejection>| async move {
                let permission = authorize(&claims, schema, Operation::Update)?;
                let Json(payload) = payload.map_err(invalid_payload)?;

                let service = ServiceContext::from_state(&state)
                    .table(schema)
                    .with_errors(errors)
                    .for_caller(&claims.sub);
                let row = service
                    .update(&id, payload, RowView { permission, transform: false })
                    .await?;
                JsonApiResponse::model(row)
            },
        )
    }

    fn delete_route(&self) -> AppMethodRouter {
        let (schema, errors) = (self.schema, self.errors);
        delete(
            move |State(state): State<Arc<AppState>>,
                  claims: Claims,
                  Path(id): Path<String>| async move {
                authorize(&claims, schema, Operation::Delete)?;
                let service = ServiceContext::from_state(&state)
                    .table(schema)
                    .with_errors(errors)
                    .for_caller(&claims.sub);
                service.delete(&id).await?;
                tracing::info!(table = schema.name, %id, user_id = %claims.sub, "record deleted");
                deleted_response(schema)
            },
        )
    }
}

fn deleted_response(schema: &TableSchema) -> ApiResult<NoPayload> {
    JsonApiResponse::<NoPayload>::message(format!("{} deleted", schema.label))
}

fn invalid_payload(err: JsonRejection) -> AppError {
    AppError::bad_request(format!("{INVALID_PAYLOAD_MESSAGE}: {}", err.body_text()))
}

/// The caller's permission on `schema` when it covers `operation`.
fn authorize(
    claims: &Claims,
    schema: &TableSchema,
    operation: Operation,
) -> Result<&'static ModelPermission, AppError> {
    claims
        .role
        .descriptor()
        .permission(schema.name)
        .filter(|permission| permission.allows(operation))
        .ok_or_else(|| {
            AppError::forbidden(format!(
                "Role {} may not {} {}",
                claims.role,
                operation.as_str(),
                schema.name
            ))
        })
}

#[derive(Debug, PartialEq, Eq)]
struct ListOptions {
    page: u64,
    page_size: u64,
    transform: bool,
}

impl ListOptions {
    /// Removes the reserved keys from `query`, leaving only filters behind.
    fn take_from(query: &mut HashMap<String, String>) -> Result<Self, AppError> {
        let page = take_number(query, RESERVED_KEYS[0])?.unwrap_or(1);
        let page_size = take_number(query, RESERVED_KEYS[1])?.unwrap_or(DEFAULT_PAGE_SIZE);
        let transform = take_transform(query)?;
        Ok(Self {
            page,
            page_size,
            transform,
        })
    }
}

fn take_number(query: &mut HashMap<String, String>, key: &str) -> Result<Option<u64>, AppError> {
    query
        .remove(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|_| AppError::bad_request(format!("{INVALID_QUERY_MESSAGE}: {key} must be a positive integer")))
        })
        .transpose()
}

fn take_transform(query: &mut HashMap<String, String>) -> Result<bool, AppError> {
    match query.remove(RESERVED_KEYS[2]) {
        None => Ok(false),
        Some(raw) => parse_bool(&raw).ok_or_else(|| {
            AppError::bad_request(format!("{INVALID_QUERY_MESSAGE}: transform must be a boolean"))
        }),
    }
}
