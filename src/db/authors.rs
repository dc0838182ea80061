use rusqlite::{params, ErrorCode, Row};

use crate::models::Author;

use super::connection::CatalogDb;
use super::error::{DbError, DbResult};

impl CatalogDb {
    /// Authors linked to a specific book through the association table.
    /// Returns an empty list for a book with no links (or no such book).
    pub fn authors_for_book(&self, book_id: i64) -> DbResult<Vec<Author>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT a.author_id, a.first_name, a.last_name, a.birth_date
                 FROM authors a
                 INNER JOIN author_of_book ab ON ab.author_id = a.author_id
                 WHERE ab.book_id = ?1
                 ORDER BY a.last_name COLLATE NOCASE, a.first_name COLLATE NOCASE",
            )
            .map_err(DbError::data_access("failed to load authors for book"))?;

        let authors = stmt
            .query_map([book_id], author_from_row)
            .map_err(DbError::data_access("failed to load authors for book"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::data_access("failed to load authors for book"))?;

        Ok(authors)
    }

    /// Every author in the catalog, name-ordered for the authors screen.
    pub fn all_authors(&self) -> DbResult<Vec<Author>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT author_id, first_name, last_name, birth_date
                 FROM authors
                 ORDER BY last_name COLLATE NOCASE, first_name COLLATE NOCASE",
            )
            .map_err(DbError::data_access("failed to load authors"))?;

        let authors = stmt
            .query_map([], author_from_row)
            .map_err(DbError::data_access("failed to load authors"))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::data_access("failed to load authors"))?;

        Ok(authors)
    }

    /// Insert one author row.
    pub fn add_author(&self, author: &Author) -> DbResult<()> {
        self.conn()?
            .execute(
                "INSERT INTO authors (author_id, first_name, last_name, birth_date)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    author.author_id,
                    author.first_name,
                    author.last_name,
                    author.birth_date,
                ],
            )
            .map_err(DbError::data_access("failed to insert author"))?;
        Ok(())
    }

    /// Create an association row between an existing author and an existing
    /// book. Repeating an existing link is a no-op; referencing a missing
    /// author or book fails with [`DbError::Link`].
    pub fn add_author_to_book(&self, author_id: i64, book_id: i64) -> DbResult<()> {
        self.conn()?
            .execute(
                "INSERT OR IGNORE INTO author_of_book (author_id, book_id) VALUES (?1, ?2)",
                params![author_id, book_id],
            )
            .map_err(|source| map_link_error(author_id, book_id, source))?;
        Ok(())
    }
}

/// Map one result row onto an [`Author`].
fn author_from_row(row: &Row<'_>) -> rusqlite::Result<Author> {
    Ok(Author {
        author_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        birth_date: row.get(3)?,
    })
}

/// Coerce the foreign-key constraint failure on a link insert into the typed
/// link error naming both sides; anything else stays a generic data-access
/// failure.
fn map_link_error(author_id: i64, book_id: i64, source: rusqlite::Error) -> DbError {
    if matches!(
        source.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    ) {
        DbError::Link {
            author_id,
            book_id,
            source,
        }
    } else {
        DbError::data_access("failed to link author to book")(source)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::models::{Book, Genre};

    use super::*;

    fn test_db() -> CatalogDb {
        let mut db = CatalogDb::new();
        db.connect_in_memory().unwrap();
        db
    }

    fn doe() -> Author {
        Author {
            author_id: 1,
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            birth_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
        }
    }

    fn sample_book() -> Book {
        Book {
            book_id: 10,
            isbn: "123".into(),
            title: "Go".into(),
            published: NaiveDate::from_ymd_opt(2015, 11, 18).unwrap(),
            rating: 4,
            genre: Genre::Fiction,
            authors: Vec::new(),
        }
    }

    #[test]
    fn operations_fail_when_disconnected() {
        let db = CatalogDb::new();
        assert!(matches!(db.all_authors(), Err(DbError::NotConnected)));
        assert!(matches!(db.authors_for_book(1), Err(DbError::NotConnected)));
        assert!(matches!(db.add_author(&doe()), Err(DbError::NotConnected)));
        assert!(matches!(
            db.add_author_to_book(1, 1),
            Err(DbError::NotConnected)
        ));
    }

    #[test]
    fn all_authors_is_empty_on_fresh_store() {
        let db = test_db();
        assert!(db.all_authors().unwrap().is_empty());
    }

    #[test]
    fn add_author_then_fetch_returns_inserted_fields() {
        let db = test_db();
        db.add_author(&doe()).unwrap();
        assert_eq!(db.all_authors().unwrap(), vec![doe()]);
    }

    #[test]
    fn authors_for_unlinked_book_is_empty() {
        let db = test_db();
        db.add_book(&sample_book()).unwrap();
        assert!(db.authors_for_book(10).unwrap().is_empty());
        assert!(db.authors_for_book(999).unwrap().is_empty());
    }

    #[test]
    fn link_requires_both_sides_to_exist() {
        let db = test_db();
        db.add_author(&doe()).unwrap();

        // Book 10 does not exist yet.
        let err = db.add_author_to_book(1, 10).unwrap_err();
        assert!(matches!(
            err,
            DbError::Link {
                author_id: 1,
                book_id: 10,
                ..
            }
        ));

        db.add_book(&sample_book()).unwrap();
        let err = db.add_author_to_book(2, 10).unwrap_err();
        assert!(matches!(err, DbError::Link { author_id: 2, .. }));
    }

    #[test]
    fn repeated_link_is_a_no_op() {
        let db = test_db();
        db.add_author(&doe()).unwrap();
        db.add_book(&sample_book()).unwrap();

        db.add_author_to_book(1, 10).unwrap();
        db.add_author_to_book(1, 10).unwrap();

        assert_eq!(db.authors_for_book(10).unwrap().len(), 1);
    }

    #[test]
    fn authors_are_ordered_by_name() {
        let db = test_db();
        let mut second = doe();
        second.author_id = 2;
        second.first_name = "Amy".into();
        second.last_name = "Adams".into();
        db.add_author(&doe()).unwrap();
        db.add_author(&second).unwrap();

        let authors = db.all_authors().unwrap();
        assert_eq!(authors[0].last_name, "Adams");
        assert_eq!(authors[1].last_name, "Doe");
    }
}
