//! Binary entry point that glues the SQLite-backed catalog to the TUI. The
//! bootstrapping pipeline: resolve the database location, connect the handle,
//! hydrate the initial book list, and drive the Ratatui event loop until the
//! user exits. The connection is released on the way out regardless of how
//! the loop ended.
use library_catalog_manager::{default_db_path, run_app, App, CatalogDb, Controller};

fn main() -> anyhow::Result<()> {
    let db_path = default_db_path()?;

    let mut db = CatalogDb::new();
    db.connect(&db_path)?;

    let controller = Controller::new(db);
    let books = controller.all_books()?;

    let mut app = App::new(controller, books);
    let result = run_app(&mut app);
    app.shutdown()?;
    result
}
