pub mod crud_api_router;
mod entry;
pub mod views;

pub use crud_api_router::CrudApiRouter;
pub use entry::{router, router_with_report};
