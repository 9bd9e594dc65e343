use anyhow::Context;

use crate::{
    loader::ModuleScope,
    routes::CrudApiRouter,
    schema::{registry, roles::Operation},
    services::crud_service::CrudErrors,
};

/// Users are created through `register` (or the admin seed), never here.
pub fn register(scope: &mut ModuleScope) -> anyhow::Result<()> {
    let schema = registry::table("user").context("user table is not registered")?;
    let errors = CrudErrors {
        not_found: "User not found",
        ..CrudErrors::default()
    };
    let router = CrudApiRouter::new(schema)
        .set_allowed_methods(&[
            Operation::List,
            Operation::Get,
            Operation::Update,
            Operation::Delete,
        ])
        .set_errors(errors)
        .router(scope.api_prefix());
    scope.mount(router);
    Ok(())
}
