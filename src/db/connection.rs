use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;
use rusqlite::Connection;

use super::error::{DbError, DbResult};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".library-catalog-manager";
/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "catalog.sqlite";

/// Handle around the single shared catalog connection. The handle has exactly
/// two states: disconnected (`conn` is `None`) and connected. Every query and
/// mutation method requires the connected state and fails with
/// [`DbError::NotConnected`] otherwise; the caller owns the lifecycle and is
/// expected to connect on startup and disconnect on shutdown.
pub struct CatalogDb {
    conn: Option<Connection>,
}

impl CatalogDb {
    /// Create a handle in the disconnected state.
    pub fn new() -> Self {
        Self { conn: None }
    }

    /// Open the SQLite database at `path`, enable foreign keys, and create
    /// the schema if this is a fresh file. Connecting while already connected
    /// releases the previous connection first and then acquires a new one, so
    /// a repeated connect behaves like a reconnect rather than leaking the
    /// old handle.
    pub fn connect(&mut self, path: &Path) -> DbResult<()> {
        self.disconnect()?;

        let conn = Connection::open(path).map_err(|source| DbError::Connection {
            path: path.display().to_string(),
            source,
        })?;
        apply_schema(&conn).map_err(|source| DbError::Connection {
            path: path.display().to_string(),
            source,
        })?;

        self.conn = Some(conn);
        Ok(())
    }

    /// Same setup against an in-memory database. Tests run against this so
    /// they exercise the identical schema and pragmas as a real file.
    pub fn connect_in_memory(&mut self) -> DbResult<()> {
        self.disconnect()?;

        let conn = Connection::open_in_memory().map_err(|source| DbError::Connection {
            path: ":memory:".to_string(),
            source,
        })?;
        apply_schema(&conn).map_err(|source| DbError::Connection {
            path: ":memory:".to_string(),
            source,
        })?;

        self.conn = Some(conn);
        Ok(())
    }

    /// Close the connection if one is open. Calling this while already
    /// disconnected is a no-op. On a close failure the handle still ends up
    /// disconnected; the connection is dropped rather than restored.
    pub fn disconnect(&mut self) -> DbResult<()> {
        if let Some(conn) = self.conn.take() {
            if let Err((_conn, source)) = conn.close() {
                return Err(DbError::Disconnection(source));
            }
        }
        Ok(())
    }

    /// Whether the handle currently holds a live connection.
    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Borrow the live connection, or fail when disconnected. Every query
    /// method in the sibling modules goes through this accessor.
    pub(crate) fn conn(&self) -> DbResult<&Connection> {
        self.conn.as_ref().ok_or(DbError::NotConnected)
    }
}

impl Default for CatalogDb {
    fn default() -> Self {
        Self::new()
    }
}

/// Enable referential integrity and create the three catalog tables when they
/// do not exist yet. Deletion of a book intentionally has no cascade: the
/// delete operation removes association rows itself before the book row.
fn apply_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            book_id INTEGER PRIMARY KEY,
            isbn TEXT NOT NULL UNIQUE,
            title TEXT NOT NULL,
            published DATE NOT NULL,
            rating INTEGER NOT NULL,
            genre TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS authors (
            author_id INTEGER PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            birth_date DATE NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS author_of_book (
            author_id INTEGER NOT NULL,
            book_id INTEGER NOT NULL,
            PRIMARY KEY (author_id, book_id),
            FOREIGN KEY(author_id) REFERENCES authors(author_id),
            FOREIGN KEY(book_id) REFERENCES books(book_id)
        )",
        [],
    )?;

    Ok(())
}

/// Resolve the absolute path to the SQLite database inside the user's home,
/// creating the data directory when missing.
pub fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    let dir = base_dirs.home_dir().join(DATA_DIR_NAME);
    fs::create_dir_all(&dir).context("failed to create data directory")?;
    Ok(dir.join(DB_FILE_NAME))
}
