//! Core library surface for the library catalog manager.
//!
//! The public modules exposed here provide an intentionally small API so the
//! `bin` target as well as potential external tooling can reuse the same
//! pieces: the data-access handle, the orchestration layer on top of it, and
//! the terminal front end.
pub mod controller;
pub mod db;
pub mod models;
pub mod ui;

/// The persistence handle and its failure surface.
pub use db::{default_db_path, CatalogDb, DbError};

/// The orchestration layer the interface talks to.
pub use controller::Controller;

/// The primary domain types that other layers manipulate.
pub use models::{Author, Book, Genre, SearchMode};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
