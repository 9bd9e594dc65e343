pub mod auth_service;
pub mod context;
pub mod crud_service;

pub use context::ServiceContext;
