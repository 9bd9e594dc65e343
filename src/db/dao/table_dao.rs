use chrono::{DateTime, NaiveDateTime, Utc};
use sea_orm::{
    DatabaseConnection, DbErr, FromQueryResult, Statement,
    sea_query::{
        Alias, Asterisk, Expr, ExprTrait, LikeExpr, Order, Query, SelectStatement, Value,
    },
};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use super::error::{DaoLayerError, DaoResult};
use crate::schema::{CREATED_AT, DefaultValue, FieldDescriptor, FieldType, TableSchema, UPDATED_AT};

/// One table row keyed by column name.
pub type Row = Map<String, JsonValue>;

#[derive(Debug, serde::Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub has_next: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Eq(Value),
    Compare { op: CompareOp, value: Value },
    Like { pattern: String, escape: char },
    Between { min: Value, max: Value },
    In(Vec<Value>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFilter {
    pub column: &'static str,
    pub op: FilterOp,
}

impl ColumnFilter {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            op: FilterOp::Eq(value.into()),
        }
    }
}

/// Repository over one descriptor-defined table.
#[derive(Clone)]
pub struct TableDao {
    db: DatabaseConnection,
    schema: &'static TableSchema,
}

impl TableDao {
    pub const MAX_PAGE_SIZE: u64 = 100;

    pub fn new(db: &DatabaseConnection, schema: &'static TableSchema) -> Self {
        Self {
            db: db.clone(),
            schema,
        }
    }

    pub fn schema(&self) -> &'static TableSchema {
        self.schema
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    fn table(&self) -> Alias {
        Alias::new(self.schema.name)
    }

    fn not_found(&self, id: &str) -> DaoLayerError {
        DaoLayerError::NotFound {
            entity: self.schema.label,
            id: id.to_string(),
        }
    }

    /// Inserts a row; `id`, timestamps and declared defaults are filled in here.
    pub async fn create(&self, mut values: Row) -> DaoResult<Row> {
        let now = Utc::now();
        values.insert("id".to_string(), JsonValue::String(Uuid::new_v4().to_string()));
        values.insert(CREATED_AT.name.to_string(), JsonValue::String(now.to_rfc3339()));
        values.insert(UPDATED_AT.name.to_string(), JsonValue::String(now.to_rfc3339()));
        for field in self.schema.fields {
            if values.contains_key(field.name) {
                continue;
            }
            if let Some(default) = field.default {
                values.insert(field.name.to_string(), default_json(default, now));
            }
        }

        let mut columns = Vec::with_capacity(values.len());
        let mut exprs = Vec::with_capacity(values.len());
        for field in self.schema.fields {
            if let Some(value) = values.get(field.name) {
                columns.push(Alias::new(field.name));
                exprs.push(Expr::val(to_db_value(field, value)?));
            }
        }

        let mut stmt = Query::insert();
        stmt.into_table(self.table()).columns(columns);
        stmt.values(exprs)
            .map_err(|err| DaoLayerError::Db(DbErr::Custom(err.to_string())))?;
        stmt.returning_all();

        let statement = self.db.get_database_backend().build(&stmt);
        self.fetch_one(statement)
            .await?
            .ok_or_else(|| DaoLayerError::Db(DbErr::RecordNotInserted))
    }

    pub async fn find_by_id(&self, id: &str) -> DaoResult<Row> {
        self.find_one_by("id", Value::from(id.to_string()))
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    pub async fn find_one_by(&self, column: &'static str, value: Value) -> DaoResult<Option<Row>> {
        let response = self.find(1, 1, &[ColumnFilter::eq(column, value)]).await?;
        Ok(response.data.into_iter().next())
    }

    /// Newest rows first; fetches one extra row to compute `has_next`.
    pub async fn find(
        &self,
        page: u64,
        page_size: u64,
        filters: &[ColumnFilter],
    ) -> DaoResult<PaginatedResponse<Row>> {
        if page == 0 || page_size == 0 || page_size > Self::MAX_PAGE_SIZE {
            return Err(DaoLayerError::InvalidPagination { page, page_size });
        }

        let mut stmt = Query::select();
        stmt.column(Asterisk).from(self.table());
        apply_filters(&mut stmt, filters);
        stmt.order_by(Alias::new(CREATED_AT.name), Order::Desc)
            .limit(page_size.saturating_add(1))
            .offset(page.saturating_sub(1).saturating_mul(page_size));

        let statement = self.db.get_database_backend().build(&stmt);
        let mut data = self.fetch_all(statement).await?;

        let has_next = data.len() > page_size as usize;
        if has_next {
            data.truncate(page_size as usize);
        }

        Ok(PaginatedResponse {
            data,
            page,
            page_size,
            has_next,
        })
    }

    pub async fn update(&self, id: &str, values: Row) -> DaoResult<Row> {
        self.update_where(&[ColumnFilter::eq("id", id.to_string())], values)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    /// Updates every row matching all `filters`, returning the first one.
    /// `None` means no row matched.
    pub async fn update_where(
        &self,
        filters: &[ColumnFilter],
        values: Row,
    ) -> DaoResult<Option<Row>> {
        let mut stmt = Query::update();
        stmt.table(self.table());
        for field in self.schema.fields {
            if field.is_read_only() {
                continue;
            }
            if let Some(value) = values.get(field.name) {
                stmt.value(Alias::new(field.name), to_db_value(field, value)?);
            }
        }
        stmt.value(Alias::new(UPDATED_AT.name), Value::from(Utc::now()));
        for filter in filters {
            stmt.and_where(filter_condition(filter));
        }
        stmt.returning_all();

        let statement = self.db.get_database_backend().build(&stmt);
        self.fetch_one(statement).await
    }

    pub async fn delete(&self, id: &str) -> DaoResult<Row> {
        let mut stmt = Query::delete();
        stmt.from_table(self.table())
            .and_where(Expr::col(Alias::new("id")).eq(id.to_string()))
            .returning_all();

        let statement = self.db.get_database_backend().build(&stmt);
        self.fetch_one(statement)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    async fn fetch_all(&self, statement: Statement) -> DaoResult<Vec<Row>> {
        JsonValue::find_by_statement(statement)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|value| self.into_row(value))
            .collect()
    }

    async fn fetch_one(&self, statement: Statement) -> DaoResult<Option<Row>> {
        JsonValue::find_by_statement(statement)
            .one(&self.db)
            .await?
            .map(|value| self.into_row(value))
            .transpose()
    }

    /// SQLite hands json columns back as text; those are parsed back into
    /// JSON so every backend returns the same shape. Text that is not JSON
    /// stays a string.
    fn into_row(&self, value: JsonValue) -> DaoResult<Row> {
        let JsonValue::Object(mut row) = value else {
            return Err(DaoLayerError::Decode(format!("expected an object, got {value}")));
        };
        for field in self.schema.fields {
            if field.field_type != FieldType::Json {
                continue;
            }
            let parsed = match row.get(field.name) {
                Some(JsonValue::String(raw)) => serde_json::from_str::<JsonValue>(raw).ok(),
                _ => None,
            };
            if let Some(parsed) = parsed {
                row.insert(field.name.to_string(), parsed);
            }
        }
        Ok(row)
    }
}

fn apply_filters(stmt: &mut SelectStatement, filters: &[ColumnFilter]) {
    for filter in filters {
        stmt.and_where(filter_condition(filter));
    }
}

fn filter_condition(filter: &ColumnFilter) -> Expr {
    let column = Expr::col(Alias::new(filter.column));
    match &filter.op {
        FilterOp::Eq(value) => column.eq(value.clone()),
        FilterOp::Compare { op, value } => match op {
            CompareOp::Lt => column.lt(value.clone()),
            CompareOp::Lte => column.lte(value.clone()),
            CompareOp::Gt => column.gt(value.clone()),
            CompareOp::Gte => column.gte(value.clone()),
        },
        FilterOp::Like { pattern, escape } => {
            column.like(LikeExpr::new(pattern.as_str()).escape(*escape))
        }
        FilterOp::Between { min, max } => column.between(min.clone(), max.clone()),
        FilterOp::In(values) => column.is_in(values.iter().cloned()),
    }
}

fn default_json(default: DefaultValue, now: DateTime<Utc>) -> JsonValue {
    match default {
        DefaultValue::Integer(value) => JsonValue::from(value),
        DefaultValue::Boolean(value) => JsonValue::Bool(value),
        DefaultValue::Text(value) => JsonValue::String(value.to_string()),
        DefaultValue::Now => JsonValue::String(now.to_rfc3339()),
    }
}

/// Converts an already validated JSON value into the bind value for `field`.
pub fn to_db_value(field: &FieldDescriptor, value: &JsonValue) -> DaoResult<Value> {
    let invalid = |reason: &str| DaoLayerError::InvalidValue {
        field: field.name.to_string(),
        reason: reason.to_string(),
    };

    if value.is_null() {
        return Ok(null_value(field.field_type));
    }

    let converted = match field.field_type {
        FieldType::PrimaryKey
        | FieldType::ForeignKey(_)
        | FieldType::String
        | FieldType::Text => Value::from(
            value
                .as_str()
                .ok_or_else(|| invalid("expected a string"))?
                .to_string(),
        ),
        FieldType::Integer | FieldType::Mapping => {
            Value::from(value.as_i64().ok_or_else(|| invalid("expected an integer"))?)
        }
        FieldType::Boolean => {
            Value::from(value.as_bool().ok_or_else(|| invalid("expected a boolean"))?)
        }
        FieldType::Decimal => {
            Value::from(value.as_f64().ok_or_else(|| invalid("expected a number"))?)
        }
        FieldType::Timestamp => {
            let raw = value.as_str().ok_or_else(|| invalid("expected a timestamp"))?;
            Value::from(parse_timestamp(raw).ok_or_else(|| invalid("expected RFC 3339"))?)
        }
        FieldType::Json => Value::from(value.clone()),
    };
    Ok(converted)
}

fn null_value(field_type: FieldType) -> Value {
    match field_type {
        FieldType::PrimaryKey
        | FieldType::ForeignKey(_)
        | FieldType::String
        | FieldType::Text => Value::from(None::<String>),
        FieldType::Integer | FieldType::Mapping => Value::from(None::<i64>),
        FieldType::Boolean => Value::from(None::<bool>),
        FieldType::Decimal => Value::from(None::<f64>),
        FieldType::Timestamp => Value::from(None::<DateTime<Utc>>),
        FieldType::Json => Value::from(None::<JsonValue>),
    }
}

/// Accepts RFC 3339 plus the space separated forms SQLite hands back.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f %:z"] {
        if let Ok(parsed) = DateTime::parse_from_str(raw, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }
    None
}
