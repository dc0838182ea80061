//! Domain models that mirror the SQLite schema and get passed throughout the
//! application. The intent is that these types stay light-weight data holders
//! so other layers can focus on presentation and persistence logic. Keeping
//! the commentary here means later refactors can reconstruct the assumptions
//! even if other context is lost.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A catalog entry for a single book. The struct mirrors rows in the `books`
/// table plus the authors hydrated from the join table.
pub struct Book {
    /// Caller-assigned identifier; the catalog treats it as the primary key
    /// rather than minting its own, so delete flows can reference the same
    /// number the librarian typed in.
    pub book_id: i64,
    /// ISBN kept as raw text (hyphens and leading zeros matter), unique
    /// across the catalog.
    pub isbn: String,
    /// Title displayed in lists and matched by substring search.
    pub title: String,
    /// Publication date.
    pub published: NaiveDate,
    /// Rating on a 1-5 scale.
    pub rating: i32,
    /// Closed genre classification, validated before any row is written.
    pub genre: Genre,
    /// Authors linked through the association table. Not exclusive ownership:
    /// the same author may appear on many books.
    pub authors: Vec<Author>,
}

impl Book {
    /// Compose a `First Last, First Last` string for the authors column,
    /// empty when no authors are linked yet.
    pub fn display_authors(&self) -> String {
        self.authors
            .iter()
            .map(Author::full_name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A person who wrote zero or more books in the catalog.
pub struct Author {
    /// Caller-assigned identifier, unique across authors.
    pub author_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub birth_date: NaiveDate,
}

impl Author {
    /// `First Last` as shown in tables and matched by the author search.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}

/// The closed set of genres the catalog accepts. Free-form genre text is
/// parsed into this enum at the boundary; anything outside the set is
/// rejected with [`ParseGenreError`] before a row is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Genre {
    Fiction,
    NonFiction,
    Fantasy,
    SciFi,
    Mystery,
    Romance,
    Horror,
    Biography,
    Poetry,
}

impl Genre {
    /// Every genre in display order, listed as a hint in the add-book form.
    pub const ALL: [Genre; 9] = [
        Genre::Fiction,
        Genre::NonFiction,
        Genre::Fantasy,
        Genre::SciFi,
        Genre::Mystery,
        Genre::Romance,
        Genre::Horror,
        Genre::Biography,
        Genre::Poetry,
    ];

    /// Canonical token stored in the `genre` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Fiction => "FICTION",
            Genre::NonFiction => "NONFICTION",
            Genre::Fantasy => "FANTASY",
            Genre::SciFi => "SCIFI",
            Genre::Mystery => "MYSTERY",
            Genre::Romance => "ROMANCE",
            Genre::Horror => "HORROR",
            Genre::Biography => "BIOGRAPHY",
            Genre::Poetry => "POETRY",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when free-form text does not name a known genre.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized genre: {0}")]
pub struct ParseGenreError(pub String);

impl FromStr for Genre {
    type Err = ParseGenreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "FICTION" => Ok(Genre::Fiction),
            "NONFICTION" => Ok(Genre::NonFiction),
            "FANTASY" => Ok(Genre::Fantasy),
            "SCIFI" => Ok(Genre::SciFi),
            "MYSTERY" => Ok(Genre::Mystery),
            "ROMANCE" => Ok(Genre::Romance),
            "HORROR" => Ok(Genre::Horror),
            "BIOGRAPHY" => Ok(Genre::Biography),
            "POETRY" => Ok(Genre::Poetry),
            _ => Err(ParseGenreError(s.trim().to_string())),
        }
    }
}

/// Which book field a search request is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Title,
    Isbn,
    Author,
    Rating,
    Genre,
}

impl SearchMode {
    pub const ALL: [SearchMode; 5] = [
        SearchMode::Title,
        SearchMode::Isbn,
        SearchMode::Author,
        SearchMode::Rating,
        SearchMode::Genre,
    ];

    /// Cycle to the next mode, wrapping around. The search prompt binds this
    /// to Tab.
    pub fn next(self) -> SearchMode {
        match self {
            SearchMode::Title => SearchMode::Isbn,
            SearchMode::Isbn => SearchMode::Author,
            SearchMode::Author => SearchMode::Rating,
            SearchMode::Rating => SearchMode::Genre,
            SearchMode::Genre => SearchMode::Title,
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchMode::Title => "Title",
            SearchMode::Isbn => "ISBN",
            SearchMode::Author => "Author",
            SearchMode::Rating => "Rating",
            SearchMode::Genre => "Genre",
        };
        f.write_str(name)
    }
}
