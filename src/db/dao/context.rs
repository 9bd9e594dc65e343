use sea_orm::DatabaseConnection;

use super::{TableDao, TokenDao, UserDao};
use crate::schema::TableSchema;

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn table(&self, schema: &'static TableSchema) -> TableDao {
        TableDao::new(&self.db, schema)
    }

    pub fn user(&self) -> UserDao {
        UserDao::new(&self.db)
    }

    pub fn token(&self) -> TokenDao {
        TokenDao::new(&self.db)
    }
}
