use anyhow::Context;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend,
    sea_query::{
        Alias, ColumnDef, ForeignKey, ForeignKeyAction, MysqlQueryBuilder, PostgresQueryBuilder,
        SqliteQueryBuilder, Table, TableCreateStatement,
    },
};

use super::{FieldType, TableSchema, registry};

const ID_LEN: u32 = 36;
const STRING_LEN: u32 = 255;

pub fn create_statement(table: &TableSchema) -> TableCreateStatement {
    let mut stmt = Table::create();
    stmt.table(Alias::new(table.name)).if_not_exists();

    for field in table.fields {
        let mut column = ColumnDef::new(Alias::new(field.name));
        match field.field_type {
            FieldType::PrimaryKey => {
                column.string_len(ID_LEN).primary_key();
            }
            FieldType::ForeignKey(_) => {
                column.string_len(ID_LEN);
            }
            FieldType::Integer | FieldType::Mapping => {
                column.big_integer();
            }
            FieldType::String => {
                column.string_len(STRING_LEN);
            }
            FieldType::Text => {
                column.text();
            }
            FieldType::Boolean => {
                column.boolean();
            }
            FieldType::Timestamp => {
                column.timestamp_with_time_zone();
            }
            FieldType::Json => {
                column.json();
            }
            FieldType::Decimal => {
                column.double();
            }
        }
        if field.is_required() {
            column.not_null();
        }
        if field.unique {
            column.unique_key();
        }
        stmt.col(column);
    }

    for field in table.fields {
        if let FieldType::ForeignKey(target) = field.field_type {
            stmt.foreign_key(
                ForeignKey::create()
                    .from(Alias::new(table.name), Alias::new(field.name))
                    .to(Alias::new(target), Alias::new("id"))
                    .on_delete(ForeignKeyAction::Cascade),
            );
        }
    }

    stmt
}

pub fn render(backend: DbBackend, stmt: &TableCreateStatement) -> String {
    match backend {
        DbBackend::Postgres => stmt.to_string(PostgresQueryBuilder),
        DbBackend::Sqlite => stmt.to_string(SqliteQueryBuilder),
        _ => stmt.to_string(MysqlQueryBuilder),
    }
}

/// Creates every registered table that does not exist yet, in dependency order.
pub async fn sync(db: &DatabaseConnection) -> anyhow::Result<()> {
    let backend = db.get_database_backend();
    for table in registry::tables() {
        let sql = render(backend, &create_statement(table));
        db.execute_unprepared(&sql)
            .await
            .with_context(|| format!("failed to create table {}", table.name))?;
        tracing::debug!(table = table.name, "table ensured");
    }
    tracing::info!(tables = registry::tables().len(), "database schema synced");
    Ok(())
}

#[cfg(test)]
mod tests {
    use sea_orm::DbBackend;

    use super::{create_statement, render};
    use crate::schema::tables;

    #[test]
    fn renders_postgres_table_with_foreign_key() {
        let sql = render(DbBackend::Postgres, &create_statement(&tables::EQUIPMENT));

        assert!(sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "equipment""#), "{sql}");
        assert!(sql.contains(r#""id" varchar(36)"#), "{sql}");
        assert!(sql.contains("PRIMARY KEY"), "{sql}");
        assert!(sql.contains(r#""availability" bigint NOT NULL"#), "{sql}");
        assert!(sql.contains(r#"REFERENCES "category" ("id")"#), "{sql}");
        assert!(sql.contains("ON DELETE CASCADE"), "{sql}");
    }

    #[test]
    fn renders_unique_email_for_users() {
        let sql = render(DbBackend::Sqlite, &create_statement(&tables::USER));

        let email = sql.split(r#""email""#).nth(1).expect("email column");
        let email = email.split(',').next().unwrap_or_default();
        assert!(email.contains("NOT NULL") && email.contains("UNIQUE"), "{sql}");
        assert!(!sql.contains("FOREIGN KEY"), "{sql}");
    }
}
