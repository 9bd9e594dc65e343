mod context;
pub mod error;
pub mod table_dao;
pub mod token_dao;
pub mod user_dao;

pub use context::DaoContext;
pub use error::{DaoLayerError, DaoResult};
pub use table_dao::{ColumnFilter, CompareOp, FilterOp, PaginatedResponse, Row, TableDao};
pub use token_dao::{TokenDao, TokenRecord};
pub use user_dao::{NewUser, UserDao, UserRecord};
