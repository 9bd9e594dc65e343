use std::collections::HashMap;

use sea_orm::{
    DbErr, SqlErr,
    sea_query::Value as QueryValue,
};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use crate::{
    db::dao::{
        ColumnFilter, CompareOp, DaoLayerError, FilterOp, PaginatedResponse, Row, TableDao,
        table_dao::parse_timestamp,
    },
    error::AppError,
    schema::{
        FieldDescriptor, FieldType, Rule, TableSchema, registry,
        roles::{ModelPermission, OwnerScope},
    },
};

#[derive(Clone, Copy)]
pub struct CrudErrors {
    pub create_failed: &'static str,
    pub find_failed: &'static str,
    pub not_found: &'static str,
    pub update_failed: &'static str,
    pub delete_failed: &'static str,
}

impl Default for CrudErrors {
    fn default() -> Self {
        Self {
            create_failed: "Create failed",
            find_failed: "Find failed",
            not_found: "Resource not found",
            update_failed: "Update failed",
            delete_failed: "Delete failed",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub enum CrudOp {
    Create,
    Find,
    List,
    Update,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

const INVALID_FILTER_MESSAGE: &str = "Invalid filter";
const INVALID_FILTER_VALUE_MESSAGE: &str = "Invalid filter value";

/// How a row is shown to one caller.
#[derive(Clone, Copy)]
pub struct RowView {
    pub permission: &'static ModelPermission,
    pub transform: bool,
}

impl RowView {
    pub fn present(&self, schema: &TableSchema, mut row: Row) -> Row {
        self.permission.strip(&mut row);
        if self.transform {
            schema.transform_row(&mut row);
        }
        row
    }
}

/// CRUD over one table, driven entirely by its descriptor.
#[derive(Clone)]
pub struct CrudService {
    dao: TableDao,
    errors: CrudErrors,
    caller: Option<String>,
}

impl CrudService {
    pub fn new(dao: TableDao) -> Self {
        Self {
            dao,
            errors: CrudErrors::default(),
            caller: None,
        }
    }

    pub fn with_errors(mut self, errors: CrudErrors) -> Self {
        self.errors = errors;
        self
    }

    /// User id checked against owner-scoped permissions.
    pub fn for_caller(mut self, user_id: &str) -> Self {
        self.caller = Some(user_id.to_string());
        self
    }

    pub fn schema(&self) -> &'static TableSchema {
        self.dao.schema()
    }

    pub fn map_error(&self, op: CrudOp, err: DaoLayerError) -> AppError {
        let errors = self.errors;
        match err {
            DaoLayerError::Db(db_err) => {
                if let Some(mapped) = constraint_error(&db_err) {
                    return mapped;
                }
                let context = match op {
                    CrudOp::Create => errors.create_failed,
                    CrudOp::Find | CrudOp::List => errors.find_failed,
                    CrudOp::Update => errors.update_failed,
                    CrudOp::Delete => errors.delete_failed,
                };
                tracing::error!(table = self.schema().name, ?op, error = %db_err, "{context}");
                AppError::internal(format!("{context}. Please check the logs for more details"))
            }
            DaoLayerError::NotFound { .. } => AppError::not_found(errors.not_found),
            DaoLayerError::InvalidPagination { .. } | DaoLayerError::InvalidValue { .. } => {
                AppError::bad_request(err.to_string())
            }
            DaoLayerError::Decode(reason) => {
                tracing::error!(table = self.schema().name, ?op, %reason, "row decode failed");
                AppError::internal(errors.find_failed)
            }
        }
    }

    pub async fn list(
        &self,
        page: u64,
        page_size: u64,
        filters: HashMap<String, String>,
        view: RowView,
    ) -> Result<PaginatedResponse<Row>, AppError> {
        let mut column_filters = build_column_filters(self.schema(), view.permission, filters)?;
        if let Some((scope, owned)) = self.owned_ids(view.permission).await? {
            let owned = owned.into_iter().map(QueryValue::from).collect();
            column_filters.push(ColumnFilter {
                column: scope.column,
                op: FilterOp::In(owned),
            });
        }
        let mut response = self
            .dao
            .find(page, page_size, &column_filters)
            .await
            .map_err(|err| self.map_error(CrudOp::List, err))?;
        response.data = response
            .data
            .into_iter()
            .map(|row| view.present(self.schema(), row))
            .collect();
        Ok(response)
    }

    pub async fn get(&self, id: &str, view: RowView) -> Result<Row, AppError> {
        let id = parse_id(id)?;
        let row = self
            .dao
            .find_by_id(&id)
            .await
            .map_err(|err| self.map_error(CrudOp::Find, err))?;
        self.ensure_owned(view.permission, &row, AppError::not_found(self.errors.not_found))
            .await?;
        Ok(view.present(self.schema(), row))
    }

    pub async fn create(&self, payload: JsonValue, view: RowView) -> Result<Row, AppError> {
        let values = validate_payload(self.schema(), view.permission, payload, WriteMode::Create)?;
        if let Some(scope) = view.permission.owner {
            let forbidden = AppError::forbidden(format!(
                "{} must reference one of your {} records",
                scope.column, scope.table
            ));
            self.ensure_owned(view.permission, &values, forbidden).await?;
        }
        let row = self
            .dao
            .create(values)
            .await
            .map_err(|err| self.map_error(CrudOp::Create, err))?;
        Ok(view.present(self.schema(), row))
    }

    pub async fn update(&self, id: &str, payload: JsonValue, view: RowView) -> Result<Row, AppError> {
        let id = parse_id(id)?;
        let values = validate_payload(self.schema(), view.permission, payload, WriteMode::Update)?;
        if let Some(scope) = view.permission.owner {
            let existing = self
                .dao
                .find_by_id(&id)
                .await
                .map_err(|err| self.map_error(CrudOp::Find, err))?;
            let not_found = AppError::not_found(self.errors.not_found);
            self.ensure_owned(view.permission, &existing, not_found).await?;
            if values.contains_key(scope.column) {
                let forbidden = AppError::forbidden(format!(
                    "{} must reference one of your {} records",
                    scope.column, scope.table
                ));
                self.ensure_owned(view.permission, &values, forbidden).await?;
            }
        }
        let row = self
            .dao
            .update(&id, values)
            .await
            .map_err(|err| self.map_error(CrudOp::Update, err))?;
        Ok(view.present(self.schema(), row))
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let id = parse_id(id)?;
        self.dao
            .delete(&id)
            .await
            .map(|_| ())
            .map_err(|err| self.map_error(CrudOp::Delete, err))
    }
}

impl CrudService {
    /// Ids of the owner rows that belong to the caller, when `permission`
    /// is owner scoped. A service without a caller owns nothing.
    async fn owned_ids(
        &self,
        permission: &ModelPermission,
    ) -> Result<Option<(OwnerScope, Vec<String>)>, AppError> {
        let Some(scope) = permission.owner else {
            return Ok(None);
        };
        let Some(caller) = self.caller.as_deref() else {
            return Ok(Some((scope, Vec::new())));
        };
        let owner_schema = registry::table(scope.table).ok_or_else(|| {
            AppError::internal(format!("Unknown owner table: {}", scope.table))
        })?;
        let owners = TableDao::new(self.dao.db(), owner_schema)
            .find(
                1,
                TableDao::MAX_PAGE_SIZE,
                &[ColumnFilter::eq(scope.user_column, caller.to_string())],
            )
            .await
            .map_err(|err| self.map_error(CrudOp::Find, err))?;
        let ids = owners
            .data
            .iter()
            .filter_map(|row| row.get("id").and_then(JsonValue::as_str))
            .map(str::to_string)
            .collect();
        Ok(Some((scope, ids)))
    }

    async fn ensure_owned(
        &self,
        permission: &ModelPermission,
        row: &Row,
        denied: AppError,
    ) -> Result<(), AppError> {
        let Some((scope, owned)) = self.owned_ids(permission).await? else {
            return Ok(());
        };
        let owner = row.get(scope.column).and_then(JsonValue::as_str);
        match owner {
            Some(owner) if owned.iter().any(|id| id == owner) => Ok(()),
            _ => {
                tracing::warn!(
                    table = self.schema().name,
                    caller = self.caller.as_deref().unwrap_or("-"),
                    "row outside the caller's ownership scope"
                );
                Err(denied)
            }
        }
    }
}

fn constraint_error(err: &DbErr) -> Option<AppError> {
    match err.sql_err()? {
        SqlErr::UniqueConstraintViolation(_) => {
            Some(AppError::conflict("A record with the same value already exists"))
        }
        SqlErr::ForeignKeyConstraintViolation(_) => {
            Some(AppError::bad_request("Referenced record does not exist"))
        }
        _ => None,
    }
}

pub fn parse_id(raw: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| AppError::bad_request(format!("Invalid id: {raw}")))
}

/// Checks a write payload against the table descriptor and the caller's
/// permission, returning the normalized values to persist.
pub fn validate_payload(
    schema: &TableSchema,
    permission: &ModelPermission,
    payload: JsonValue,
    mode: WriteMode,
) -> Result<Row, AppError> {
    let JsonValue::Object(payload) = payload else {
        return Err(AppError::bad_request("Invalid payload: expected a JSON object"));
    };

    let mut errors: Vec<String> = Vec::new();
    let mut values = Map::new();

    for (key, value) in payload {
        let Some(field) = schema.field(&key) else {
            errors.push(format!("Unknown field: {key}"));
            continue;
        };
        if permission.is_blacklisted(field.name) {
            errors.push(format!("Field not allowed: {key}"));
            continue;
        }
        if field.is_read_only() {
            errors.push(format!("Field is read-only: {key}"));
            continue;
        }
        match coerce(field, value) {
            Ok(value) => {
                values.insert(key, value);
            }
            Err(reason) => errors.push(reason),
        }
    }

    if mode == WriteMode::Create {
        for field in schema.fields {
            if field.is_read_only() || values.contains_key(field.name) {
                continue;
            }
            if field.is_required() && field.default.is_none() {
                errors.push(format!("{} is required", field.label));
            }
        }
    }

    if mode == WriteMode::Update && values.is_empty() && errors.is_empty() {
        errors.push("Nothing to update".to_string());
    }

    if errors.is_empty() {
        Ok(values)
    } else {
        Err(AppError::bad_request(errors.join("; ")))
    }
}

fn coerce(field: &FieldDescriptor, value: JsonValue) -> Result<JsonValue, String> {
    let label = field.label;
    if value.is_null() {
        return if field.is_required() {
            Err(format!("{label} is required"))
        } else {
            Ok(JsonValue::Null)
        };
    }

    match field.field_type {
        FieldType::PrimaryKey | FieldType::ForeignKey(_) => {
            let raw = value.as_str().ok_or_else(|| format!("{label} must be an id"))?;
            let id = Uuid::parse_str(raw.trim()).map_err(|_| format!("{label} must be a valid id"))?;
            Ok(JsonValue::String(id.to_string()))
        }
        FieldType::String | FieldType::Text => {
            let raw = value
                .as_str()
                .ok_or_else(|| format!("{label} must be a string"))?
                .trim()
                .to_string();
            check_text_rules(field, &raw)?;
            Ok(JsonValue::String(raw))
        }
        FieldType::Integer | FieldType::Mapping => {
            let number = as_integer(&value).ok_or_else(|| format!("{label} must be an integer"))?;
            match field.mapping {
                Some(mapping) if !mapping.contains(number) => Err(format!(
                    "{label} must be one of {}",
                    mapping
                        .entries
                        .iter()
                        .map(|(code, name)| format!("{code} ({name})"))
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
                None if field.field_type == FieldType::Mapping => {
                    Err(format!("{label} has no mapping"))
                }
                _ => {
                    check_number_rules(field, number as f64)?;
                    Ok(JsonValue::from(number))
                }
            }
        }
        FieldType::Boolean => match &value {
            JsonValue::Bool(flag) => Ok(JsonValue::Bool(*flag)),
            JsonValue::String(raw) => parse_bool(raw)
                .map(JsonValue::Bool)
                .ok_or_else(|| format!("{label} must be a boolean")),
            _ => Err(format!("{label} must be a boolean")),
        },
        FieldType::Decimal => {
            let number = match &value {
                JsonValue::Number(number) => number.as_f64(),
                JsonValue::String(raw) => raw.trim().parse::<f64>().ok(),
                _ => None,
            }
            .filter(|number| number.is_finite())
            .ok_or_else(|| format!("{label} must be a number"))?;
            check_number_rules(field, number)?;
            Ok(JsonValue::from(number))
        }
        FieldType::Timestamp => {
            let parsed = value
                .as_str()
                .and_then(parse_timestamp)
                .ok_or_else(|| format!("{label} must be an RFC 3339 timestamp"))?;
            Ok(JsonValue::String(parsed.to_rfc3339()))
        }
        FieldType::Json => match value {
            JsonValue::Object(_) | JsonValue::Array(_) => Ok(value),
            _ => Err(format!("{label} must be a JSON object or array")),
        },
    }
}

fn as_integer(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(number) => number.as_i64(),
        JsonValue::String(raw) => raw.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn check_text_rules(field: &FieldDescriptor, raw: &str) -> Result<(), String> {
    let label = field.label;
    let length = raw.chars().count();
    for rule in field.rules {
        match *rule {
            Rule::Required if raw.is_empty() => return Err(format!("{label} is required")),
            Rule::Email if !is_email(raw) => return Err(format!("{label} must be a valid email")),
            Rule::MinLength(min) if length < min => {
                return Err(format!("{label} must be at least {min} characters"));
            }
            Rule::MaxLength(max) if length > max => {
                return Err(format!("{label} must be at most {max} characters"));
            }
            Rule::OneOf(allowed) if !allowed.contains(&raw) => {
                return Err(format!("{label} must be one of {}", allowed.join(", ")));
            }
            _ => {}
        }
    }
    Ok(())
}

fn check_number_rules(field: &FieldDescriptor, number: f64) -> Result<(), String> {
    let label = field.label;
    for rule in field.rules {
        match *rule {
            Rule::Min(min) if number < min => return Err(format!("{label} must be >= {min}")),
            Rule::Max(max) if number > max => return Err(format!("{label} must be <= {max}")),
            _ => {}
        }
    }
    Ok(())
}

fn is_email(raw: &str) -> bool {
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !raw.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

/// Parses `?field=value` list filters against the table descriptor.
pub fn build_column_filters(
    schema: &TableSchema,
    permission: &ModelPermission,
    filters: HashMap<String, String>,
) -> Result<Vec<ColumnFilter>, AppError> {
    let mut parsed = Vec::with_capacity(filters.len());
    for (key, value) in filters {
        let field = schema.field(&key).ok_or_else(invalid_filter)?;
        if permission.is_blacklisted(field.name) {
            return Err(invalid_filter());
        }
        let op = match field.field_type {
            FieldType::PrimaryKey | FieldType::ForeignKey(_) => {
                ensure_no_wildcard(&value)?;
                FilterOp::Eq(QueryValue::from(value.trim().to_string()))
            }
            FieldType::String | FieldType::Text => parse_string_filter(&value)?,
            FieldType::Boolean => {
                let flag = parse_bool(&value).ok_or_else(invalid_filter_value)?;
                FilterOp::Eq(QueryValue::from(flag))
            }
            FieldType::Json => return Err(invalid_filter()),
            _ => parse_ordered_filter(&value, |raw| parse_scalar(field, raw))?,
        };
        parsed.push(ColumnFilter {
            column: field.name,
            op,
        });
    }
    Ok(parsed)
}

fn parse_scalar(field: &FieldDescriptor, raw: &str) -> Result<QueryValue, AppError> {
    let raw = raw.trim();
    match field.field_type {
        FieldType::Integer => raw
            .parse::<i64>()
            .map(QueryValue::from)
            .map_err(invalid_filter_value_with),
        FieldType::Mapping => {
            if let Ok(code) = raw.parse::<i64>() {
                return Ok(QueryValue::from(code));
            }
            field
                .mapping
                .and_then(|mapping| {
                    mapping
                        .entries
                        .iter()
                        .find(|(_, label)| label.eq_ignore_ascii_case(raw))
                        .map(|(code, _)| QueryValue::from(*code))
                })
                .ok_or_else(|| invalid_filter_value_with(format!("unknown code {raw}")))
        }
        FieldType::Decimal => raw
            .parse::<f64>()
            .map(QueryValue::from)
            .map_err(invalid_filter_value_with),
        FieldType::Timestamp => parse_timestamp(raw)
            .map(QueryValue::from)
            .ok_or_else(|| invalid_filter_value_with(format!("Unrecognized datetime format: {raw}"))),
        _ => Err(invalid_filter()),
    }
}

fn invalid_filter() -> AppError {
    AppError::bad_request(INVALID_FILTER_MESSAGE)
}

fn invalid_filter_value() -> AppError {
    AppError::bad_request(INVALID_FILTER_VALUE_MESSAGE)
}

fn invalid_filter_value_with(detail: impl std::fmt::Display) -> AppError {
    AppError::bad_request(format!("{INVALID_FILTER_VALUE_MESSAGE}: {detail}"))
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn ensure_no_wildcard(raw: &str) -> Result<(), AppError> {
    if raw.contains('*') {
        return Err(invalid_filter_value());
    }
    Ok(())
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '%' => escaped.push_str("\\%"),
            '_' => escaped.push_str("\\_"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn parse_string_filter(raw: &str) -> Result<FilterOp, AppError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "*" {
        return Err(invalid_filter_value());
    }

    let leading = raw.starts_with('*');
    let trailing = raw.ends_with('*');
    let inner = raw.trim_matches('*');
    if inner.is_empty() || inner.contains('*') {
        return Err(invalid_filter_value());
    }

    if !leading && !trailing {
        return Ok(FilterOp::Eq(QueryValue::from(inner.to_string())));
    }

    let escaped = escape_like(inner);
    let pattern = match (leading, trailing) {
        (true, true) => format!("%{escaped}%"),
        (true, false) => format!("%{escaped}"),
        _ => format!("{escaped}%"),
    };
    Ok(FilterOp::Like {
        pattern,
        escape: '\\',
    })
}

fn parse_comparison(raw: &str) -> Option<(CompareOp, &str)> {
    let raw = raw.trim_start();
    if let Some(rest) = raw.strip_prefix(">=") {
        return Some((CompareOp::Gte, rest.trim_start()));
    }
    if let Some(rest) = raw.strip_prefix("<=") {
        return Some((CompareOp::Lte, rest.trim_start()));
    }
    if let Some(rest) = raw.strip_prefix('>') {
        return Some((CompareOp::Gt, rest.trim_start()));
    }
    if let Some(rest) = raw.strip_prefix('<') {
        return Some((CompareOp::Lt, rest.trim_start()));
    }
    None
}

fn parse_range(raw: &str) -> Result<Option<(&str, &str)>, AppError> {
    let raw = raw.trim();
    let Some(idx) = raw.find("..") else {
        return Ok(None);
    };
    let (min, max) = (raw[..idx].trim(), raw[idx + 2..].trim());
    if min.is_empty() || max.is_empty() || max.contains("..") {
        return Err(invalid_filter_value());
    }
    Ok(Some((min, max)))
}

/// `>=x`, `<x`, `a..b` or a plain value for ordered column types.
fn parse_ordered_filter(
    raw: &str,
    parse: impl Fn(&str) -> Result<QueryValue, AppError>,
) -> Result<FilterOp, AppError> {
    ensure_no_wildcard(raw)?;
    if let Some((op, rest)) = parse_comparison(raw) {
        return Ok(FilterOp::Compare {
            op,
            value: parse(rest)?,
        });
    }
    if let Some((min, max)) = parse_range(raw)? {
        return Ok(FilterOp::Between {
            min: parse(min)?,
            max: parse(max)?,
        });
    }
    Ok(FilterOp::Eq(parse(raw)?))
}
