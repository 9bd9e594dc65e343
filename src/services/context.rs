use sea_orm::DatabaseConnection;

use crate::{
    db::dao::DaoContext,
    schema::TableSchema,
    services::{auth_service::AuthService, crud_service::CrudService},
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            daos: DaoContext::new(db),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db)
    }

    pub fn table(&self, schema: &'static TableSchema) -> CrudService {
        CrudService::new(self.daos.table(schema))
    }

    pub fn auth(&self, state: &AppState) -> AuthService {
        AuthService::new(
            self.daos.user(),
            self.daos.token(),
            state.jwt.clone(),
            state.access_ttl_secs(),
            state.refresh_ttl_days(),
        )
    }
}
