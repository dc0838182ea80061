//! Orchestration between the interface and the data-access layer. The
//! controller owns the [`CatalogDb`] handle, turns a (search text, search
//! mode) pair into the matching query, and runs the multi-step flows such as
//! linking a new book's authors. Results and errors flow straight back to the
//! presentation layer, which decides how to show them.

use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::db::CatalogDb;
use crate::models::{Author, Book, Genre, SearchMode};

pub struct Controller {
    db: CatalogDb,
}

impl Controller {
    /// Wrap an explicitly constructed database handle. The handle may be in
    /// either state; callers usually connect right after.
    pub fn new(db: CatalogDb) -> Self {
        Self { db }
    }

    pub fn connect(&mut self, path: &Path) -> Result<()> {
        self.db.connect(path)?;
        Ok(())
    }

    pub fn disconnect(&mut self) -> Result<()> {
        self.db.disconnect()?;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.db.is_connected()
    }

    /// Dispatch a search request to the query matching `mode`. Rating and
    /// genre input is parsed here, at the boundary, so malformed text never
    /// reaches the store. An empty result is a normal outcome; the caller
    /// renders it as "no matches".
    pub fn search(&self, text: &str, mode: SearchMode) -> Result<Vec<Book>> {
        let text = text.trim();
        if text.is_empty() {
            bail!("enter a search term first");
        }

        let books = match mode {
            SearchMode::Title => self.db.search_books_by_title(text)?,
            SearchMode::Isbn => self.db.search_books_by_isbn(text)?,
            SearchMode::Author => self.db.search_books_by_author(text)?,
            SearchMode::Rating => {
                let rating = text
                    .parse::<i32>()
                    .context("rating must be a whole number")?;
                self.db.search_books_by_rating(rating)?
            }
            SearchMode::Genre => {
                let genre = text.parse::<Genre>()?;
                self.db.search_books_by_genre(genre)?
            }
        };

        Ok(books)
    }

    /// Insert the book row, then link every author attached to the entity.
    /// The returned book carries the author list as re-read from the store,
    /// so the caller displays exactly what was persisted.
    pub fn add_book(&self, book: Book) -> Result<Book> {
        self.db.add_book(&book)?;
        for author in &book.authors {
            self.db.add_author_to_book(author.author_id, book.book_id)?;
        }

        let mut book = book;
        book.authors = self.db.authors_for_book(book.book_id)?;
        Ok(book)
    }

    pub fn add_author(&self, author: &Author) -> Result<()> {
        self.db.add_author(author)?;
        Ok(())
    }

    pub fn delete_book(&self, book_id: i64) -> Result<()> {
        self.db.delete_book(book_id)?;
        Ok(())
    }

    pub fn all_books(&self) -> Result<Vec<Book>> {
        Ok(self.db.all_books()?)
    }

    pub fn all_authors(&self) -> Result<Vec<Author>> {
        Ok(self.db.all_authors()?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::db::DbError;
    use crate::models::ParseGenreError;

    use super::*;

    fn controller() -> Controller {
        let mut db = CatalogDb::new();
        db.connect_in_memory().unwrap();
        Controller::new(db)
    }

    fn doe() -> Author {
        Author {
            author_id: 1,
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            birth_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
        }
    }

    fn go_book(authors: Vec<Author>) -> Book {
        Book {
            book_id: 10,
            isbn: "123".into(),
            title: "Go".into(),
            published: NaiveDate::from_ymd_opt(2015, 11, 18).unwrap(),
            rating: 4,
            genre: Genre::Fiction,
            authors,
        }
    }

    #[test]
    fn blank_search_text_is_rejected_before_any_query() {
        let controller = controller();
        assert!(controller.search("   ", SearchMode::Title).is_err());
    }

    #[test]
    fn non_numeric_rating_is_rejected() {
        let controller = controller();
        let err = controller.search("five", SearchMode::Rating).unwrap_err();
        assert!(err.to_string().contains("rating must be a whole number"));
    }

    #[test]
    fn unknown_genre_surfaces_the_typed_parse_error() {
        let controller = controller();
        let err = controller.search("western", SearchMode::Genre).unwrap_err();
        assert!(err.downcast_ref::<ParseGenreError>().is_some());
    }

    #[test]
    fn add_book_links_attached_authors_and_returns_hydrated_entity() {
        let controller = controller();
        controller.add_author(&doe()).unwrap();

        let added = controller.add_book(go_book(vec![doe()])).unwrap();
        assert_eq!(added.authors, vec![doe()]);

        // The link is persisted, not just echoed back.
        let found = controller.search("jane doe", SearchMode::Author).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].book_id, 10);
    }

    #[test]
    fn add_book_with_unknown_author_fails_with_link_error() {
        let controller = controller();
        let err = controller.add_book(go_book(vec![doe()])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DbError>(),
            Some(DbError::Link { .. })
        ));
    }

    #[test]
    fn delete_of_missing_book_propagates_not_found() {
        let controller = controller();
        let err = controller.delete_book(404).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DbError>(),
            Some(DbError::BookNotFound(404))
        ));
    }

    #[test]
    fn search_dispatches_every_mode() {
        let controller = controller();
        controller.add_author(&doe()).unwrap();
        controller.add_book(go_book(vec![doe()])).unwrap();

        for (text, mode) in [
            ("go", SearchMode::Title),
            ("123", SearchMode::Isbn),
            ("doe", SearchMode::Author),
            ("4", SearchMode::Rating),
            ("fiction", SearchMode::Genre),
        ] {
            let found = controller.search(text, mode).unwrap();
            assert_eq!(found.len(), 1, "mode {mode} should match");
            assert_eq!(found[0].book_id, 10);
            assert_eq!(found[0].authors.len(), 1);
            assert_eq!(found[0].authors[0].author_id, 1);
        }
    }

    #[test]
    fn searches_with_no_matches_return_empty_not_error() {
        let controller = controller();
        assert!(controller.search("go", SearchMode::Title).unwrap().is_empty());
        assert!(controller.all_books().unwrap().is_empty());
        assert!(controller.all_authors().unwrap().is_empty());
    }
}
