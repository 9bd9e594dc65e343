//! Connection backends, picked by the scheme of `database.url`.

mod postgres;
mod registry;
mod sqlite;

pub use postgres::PostgresDbProvider;
pub use registry::{DbProvider, DbProviderId, DbProviders, pool_options};
pub use sqlite::SqliteDbProvider;
