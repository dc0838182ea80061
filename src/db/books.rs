use rusqlite::types::Type;
use rusqlite::{params, Row, ToSql};

use crate::models::{Book, Genre};

use super::connection::CatalogDb;
use super::error::{DbError, DbResult};

/// Column list shared by every book query so row mapping stays in one shape.
const BOOK_COLUMNS: &str = "book_id, isbn, title, published, rating, genre";

impl CatalogDb {
    /// Case-insensitive substring match against book titles.
    pub fn search_books_by_title(&self, title: &str) -> DbResult<Vec<Book>> {
        let pattern = substring_pattern(title);
        self.query_books(
            &format!(
                "SELECT {BOOK_COLUMNS} FROM books
                 WHERE LOWER(title) LIKE ?1
                 ORDER BY title COLLATE NOCASE"
            ),
            &[&pattern],
            "failed to search books by title",
        )
    }

    /// Case-insensitive substring match against `First Last` author names,
    /// resolved through the association table.
    pub fn search_books_by_author(&self, name: &str) -> DbResult<Vec<Book>> {
        let pattern = substring_pattern(name);
        self.query_books(
            &format!(
                "SELECT DISTINCT b.book_id, b.isbn, b.title, b.published, b.rating, b.genre
                 FROM books b
                 INNER JOIN author_of_book ab ON ab.book_id = b.book_id
                 INNER JOIN authors a ON a.author_id = ab.author_id
                 WHERE LOWER(a.first_name || ' ' || a.last_name) LIKE ?1
                 ORDER BY b.title COLLATE NOCASE"
            ),
            &[&pattern],
            "failed to search books by author",
        )
    }

    /// Exact match on the stored genre token.
    pub fn search_books_by_genre(&self, genre: Genre) -> DbResult<Vec<Book>> {
        self.query_books(
            &format!(
                "SELECT {BOOK_COLUMNS} FROM books
                 WHERE genre = ?1
                 ORDER BY title COLLATE NOCASE"
            ),
            &[&genre.as_str()],
            "failed to search books by genre",
        )
    }

    /// Exact match on the rating value.
    pub fn search_books_by_rating(&self, rating: i32) -> DbResult<Vec<Book>> {
        self.query_books(
            &format!(
                "SELECT {BOOK_COLUMNS} FROM books
                 WHERE rating = ?1
                 ORDER BY title COLLATE NOCASE"
            ),
            &[&rating],
            "failed to search books by rating",
        )
    }

    /// Exact match on the ISBN text.
    pub fn search_books_by_isbn(&self, isbn: &str) -> DbResult<Vec<Book>> {
        self.query_books(
            &format!(
                "SELECT {BOOK_COLUMNS} FROM books
                 WHERE isbn = ?1
                 ORDER BY title COLLATE NOCASE"
            ),
            &[&isbn],
            "failed to search books by isbn",
        )
    }

    /// Every book in the catalog, title-ordered so mixed-case titles group
    /// together in the table.
    pub fn all_books(&self) -> DbResult<Vec<Book>> {
        self.query_books(
            &format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY title COLLATE NOCASE"),
            &[],
            "failed to load books",
        )
    }

    /// Insert one book row. Authors attached to the entity are not linked
    /// here; the orchestration layer links each one afterwards through
    /// [`CatalogDb::add_author_to_book`].
    pub fn add_book(&self, book: &Book) -> DbResult<()> {
        self.conn()?
            .execute(
                "INSERT INTO books (book_id, isbn, title, published, rating, genre)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    book.book_id,
                    book.isbn,
                    book.title,
                    book.published,
                    book.rating,
                    book.genre.as_str(),
                ],
            )
            .map_err(DbError::data_access("failed to insert book"))?;
        Ok(())
    }

    /// Remove a book and its association rows. The association rows go first
    /// so the foreign keys never see a dangling book id; there is no cascade
    /// in the schema.
    pub fn delete_book(&self, book_id: i64) -> DbResult<()> {
        let conn = self.conn()?;

        conn.execute(
            "DELETE FROM author_of_book WHERE book_id = ?1",
            params![book_id],
        )
        .map_err(DbError::data_access("failed to delete author links for book"))?;

        let deleted = conn
            .execute("DELETE FROM books WHERE book_id = ?1", params![book_id])
            .map_err(DbError::data_access("failed to delete book"))?;

        if deleted == 0 {
            Err(DbError::BookNotFound(book_id))
        } else {
            Ok(())
        }
    }

    /// Run a book query and hydrate each matched book's author list with a
    /// follow-up lookup per book.
    fn query_books(
        &self,
        sql: &str,
        query_params: &[&dyn ToSql],
        context: &'static str,
    ) -> DbResult<Vec<Book>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql).map_err(DbError::data_access(context))?;

        let mut books = stmt
            .query_map(query_params, book_from_row)
            .map_err(DbError::data_access(context))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(DbError::data_access(context))?;

        for book in &mut books {
            book.authors = self.authors_for_book(book.book_id)?;
        }
        Ok(books)
    }
}

/// Map one result row onto a [`Book`] with an empty author list. A genre
/// token outside the closed enum means the row was written by something other
/// than this application; surface it as a conversion failure instead of
/// guessing.
fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    let genre_text: String = row.get(5)?;
    let genre = genre_text
        .parse::<Genre>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(err)))?;

    Ok(Book {
        book_id: row.get(0)?,
        isbn: row.get(1)?,
        title: row.get(2)?,
        published: row.get(3)?,
        rating: row.get(4)?,
        genre,
        authors: Vec::new(),
    })
}

/// Lowercased `%text%` LIKE pattern for the substring searches.
fn substring_pattern(text: &str) -> String {
    format!("%{}%", text.trim().to_lowercase())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::models::Author;

    use super::*;

    fn test_db() -> CatalogDb {
        let mut db = CatalogDb::new();
        db.connect_in_memory().unwrap();
        db
    }

    fn gatsby() -> Book {
        Book {
            book_id: 10,
            isbn: "9780743273565".into(),
            title: "The Great Gatsby".into(),
            published: NaiveDate::from_ymd_opt(1925, 4, 10).unwrap(),
            rating: 5,
            genre: Genre::Fiction,
            authors: Vec::new(),
        }
    }

    fn fitzgerald() -> Author {
        Author {
            author_id: 1,
            first_name: "Francis".into(),
            last_name: "Fitzgerald".into(),
            birth_date: NaiveDate::from_ymd_opt(1896, 9, 24).unwrap(),
        }
    }

    #[test]
    fn searches_fail_when_disconnected() {
        let db = CatalogDb::new();
        assert!(matches!(db.all_books(), Err(DbError::NotConnected)));
        assert!(matches!(
            db.search_books_by_title("x"),
            Err(DbError::NotConnected)
        ));
        assert!(matches!(db.add_book(&gatsby()), Err(DbError::NotConnected)));
        assert!(matches!(db.delete_book(1), Err(DbError::NotConnected)));
    }

    #[test]
    fn all_books_is_empty_on_fresh_store() {
        let db = test_db();
        assert!(db.all_books().unwrap().is_empty());
    }

    #[test]
    fn add_then_search_by_isbn_returns_inserted_fields() {
        let db = test_db();
        let book = gatsby();
        db.add_book(&book).unwrap();

        let found = db.search_books_by_isbn("9780743273565").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], book);
    }

    #[test]
    fn duplicate_isbn_is_rejected() {
        let db = test_db();
        db.add_book(&gatsby()).unwrap();

        let mut duplicate = gatsby();
        duplicate.book_id = 11;
        assert!(matches!(
            db.add_book(&duplicate),
            Err(DbError::DataAccess { .. })
        ));
    }

    #[test]
    fn duplicate_book_id_is_rejected() {
        let db = test_db();
        db.add_book(&gatsby()).unwrap();

        let mut duplicate = gatsby();
        duplicate.isbn = "9780000000000".into();
        assert!(matches!(
            db.add_book(&duplicate),
            Err(DbError::DataAccess { .. })
        ));
    }

    #[test]
    fn title_search_matches_substring_case_insensitively() {
        let db = test_db();
        db.add_book(&gatsby()).unwrap();

        assert_eq!(db.search_books_by_title("great").unwrap().len(), 1);
        assert_eq!(db.search_books_by_title("GATSBY").unwrap().len(), 1);
        assert!(db.search_books_by_title("hobbit").unwrap().is_empty());
    }

    #[test]
    fn author_search_matches_full_name_substring() {
        let db = test_db();
        db.add_book(&gatsby()).unwrap();
        db.add_author(&fitzgerald()).unwrap();
        db.add_author_to_book(1, 10).unwrap();

        assert_eq!(db.search_books_by_author("fitz").unwrap().len(), 1);
        assert_eq!(
            db.search_books_by_author("francis fitzgerald").unwrap().len(),
            1
        );
        assert!(db.search_books_by_author("tolkien").unwrap().is_empty());
    }

    #[test]
    fn genre_and_rating_searches_are_exact() {
        let db = test_db();
        db.add_book(&gatsby()).unwrap();

        assert_eq!(db.search_books_by_genre(Genre::Fiction).unwrap().len(), 1);
        assert!(db.search_books_by_genre(Genre::Horror).unwrap().is_empty());
        assert_eq!(db.search_books_by_rating(5).unwrap().len(), 1);
        assert!(db.search_books_by_rating(4).unwrap().is_empty());
    }

    #[test]
    fn searches_populate_linked_authors() {
        let db = test_db();
        db.add_book(&gatsby()).unwrap();
        db.add_author(&fitzgerald()).unwrap();
        db.add_author_to_book(1, 10).unwrap();

        let found = db.search_books_by_title("gatsby").unwrap();
        assert_eq!(found[0].authors, vec![fitzgerald()]);
    }

    #[test]
    fn delete_missing_book_reports_not_found() {
        let db = test_db();
        assert!(matches!(db.delete_book(404), Err(DbError::BookNotFound(404))));
    }

    #[test]
    fn delete_removes_links_and_book_row() {
        let db = test_db();
        db.add_book(&gatsby()).unwrap();
        db.add_author(&fitzgerald()).unwrap();
        db.add_author_to_book(1, 10).unwrap();

        db.delete_book(10).unwrap();

        assert!(db.authors_for_book(10).unwrap().is_empty());
        assert!(db.search_books_by_isbn("9780743273565").unwrap().is_empty());
        assert!(db.all_books().unwrap().is_empty());
        // The author itself survives; only the association goes away.
        assert_eq!(db.all_authors().unwrap().len(), 1);
    }
}
