use anyhow::Context;

use crate::{
    loader::ModuleScope,
    routes::CrudApiRouter,
    schema::registry,
    services::crud_service::CrudErrors,
};

pub fn register(scope: &mut ModuleScope) -> anyhow::Result<()> {
    let schema = registry::table("equipment").context("equipment table is not registered")?;
    let errors = CrudErrors {
        not_found: "Equipment not found",
        ..CrudErrors::default()
    };
    let router = CrudApiRouter::new(schema)
        .set_errors(errors)
        .router(scope.api_prefix());
    scope.mount(router);
    Ok(())
}
