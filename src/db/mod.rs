//! Persistence module split across logical submodules. `connection` owns the
//! handle and schema, `books` and `authors` carry the query and mutation
//! methods, `error` defines the typed failure surface.

mod authors;
mod books;
mod connection;
mod error;

pub use connection::{default_db_path, CatalogDb};
pub use error::{DbError, DbResult};
