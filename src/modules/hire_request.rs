use anyhow::{Context, ensure};

use crate::{
    loader::ModuleScope,
    routes::CrudApiRouter,
    schema::registry,
    services::crud_service::CrudErrors,
};

pub fn register(scope: &mut ModuleScope) -> anyhow::Result<()> {
    let schema = registry::table("hire_request").context("hire_request table is not registered")?;
    // both sides of a hire must be routable for the foreign keys to make sense
    for parent in ["client", "equipment"] {
        ensure!(registry::table(parent).is_some(), "hire_request needs the {parent} table");
    }

    let errors = CrudErrors {
        create_failed: "Hire request could not be created",
        not_found: "Hire request not found",
        ..CrudErrors::default()
    };
    let router = CrudApiRouter::new(schema)
        .set_errors(errors)
        .router(scope.api_prefix());
    scope.mount(router);
    Ok(())
}
