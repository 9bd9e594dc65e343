pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod loader;
pub mod logging;
pub mod middleware;
pub mod modules;
pub mod response;
pub mod routes;
pub mod schema;
pub mod services;
pub mod state;
pub mod test_helpers;
