use anyhow::Context;

use crate::{loader::ModuleScope, routes::CrudApiRouter, schema::registry};

pub fn register(scope: &mut ModuleScope) -> anyhow::Result<()> {
    let schema = registry::table("category").context("category table is not registered")?;
    let router = CrudApiRouter::new(schema).router(scope.api_prefix());
    scope.mount(router);
    Ok(())
}
