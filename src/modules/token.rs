use anyhow::Context;

use crate::{
    loader::ModuleScope,
    routes::CrudApiRouter,
    schema::{registry, roles::Operation},
};

/// Tokens are issued by the auth lambdas only; staff can inspect and revoke.
pub fn register(scope: &mut ModuleScope) -> anyhow::Result<()> {
    let schema = registry::table("token").context("token table is not registered")?;
    let router = CrudApiRouter::new(schema)
        .set_allowed_methods(&[Operation::List, Operation::Get, Operation::Delete])
        .router(scope.api_prefix());
    scope.mount(router);
    Ok(())
}
