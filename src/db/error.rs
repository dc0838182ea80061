//! Error types for the data-access layer. One generic data-access variant
//! covers query and mutation failures; the only operation-specific kinds are
//! "book not found" on delete and the link insert that references a missing
//! side, because the UI words those differently.

use thiserror::Error;

/// Everything the catalog database can fail with. Each variant carries a
/// human-readable message, and wraps the rusqlite cause where one exists so
/// the full chain stays available for diagnostics.
#[derive(Debug, Error)]
pub enum DbError {
    /// A query or mutation ran before `connect`, or after `disconnect`.
    #[error("catalog database is not connected")]
    NotConnected,

    /// Opening the database file or preparing the schema failed.
    #[error("failed to open catalog database at {path}")]
    Connection {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Closing the connection failed. The handle returns to the disconnected
    /// state regardless, so a retry means a fresh `connect`.
    #[error("failed to close catalog database")]
    Disconnection(#[source] rusqlite::Error),

    /// Generic query/insert/delete failure with a description of what was
    /// being attempted.
    #[error("{context}")]
    DataAccess {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Delete matched zero book rows.
    #[error("no book found with id {0}")]
    BookNotFound(i64),

    /// Association insert referenced an author or book that does not exist.
    #[error("cannot link author {author_id} to book {book_id}: both must already exist")]
    Link {
        author_id: i64,
        book_id: i64,
        #[source]
        source: rusqlite::Error,
    },
}

/// Result alias used across the data-access layer.
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Adapter for `map_err` call sites: tags a rusqlite error with a short
    /// description of the failed operation.
    pub(crate) fn data_access(context: &'static str) -> impl FnOnce(rusqlite::Error) -> DbError {
        move |source| DbError::DataAccess { context, source }
    }
}
