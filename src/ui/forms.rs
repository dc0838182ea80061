use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Author, Book, Genre};

/// Date format accepted by the form date fields.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Internal representation of the "add book" form fields. Everything is kept
/// as raw text until submit so the user can edit freely; `parse_inputs` does
/// the validation in one place.
#[derive(Default, Clone)]
pub(crate) struct BookForm {
    pub(crate) book_id: String,
    pub(crate) isbn: String,
    pub(crate) title: String,
    pub(crate) published: String,
    pub(crate) rating: String,
    pub(crate) genre: String,
    /// Authors already stored through the nested author form, linked to the
    /// book once it is submitted.
    pub(crate) authors: Vec<Author>,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

/// Fields available within the book form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum BookField {
    #[default]
    BookId,
    Isbn,
    Title,
    Published,
    Rating,
    Genre,
}

impl BookForm {
    pub(crate) const FIELDS: [(&'static str, BookField); 6] = [
        ("Book ID", BookField::BookId),
        ("ISBN", BookField::Isbn),
        ("Title", BookField::Title),
        ("Published", BookField::Published),
        ("Rating", BookField::Rating),
        ("Genre", BookField::Genre),
    ];

    /// Cycle focus across the fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            BookField::BookId => BookField::Isbn,
            BookField::Isbn => BookField::Title,
            BookField::Title => BookField::Published,
            BookField::Published => BookField::Rating,
            BookField::Rating => BookField::Genre,
            BookField::Genre => BookField::BookId,
        };
    }

    /// Append a character to the active field, validating allowed input.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            BookField::BookId | BookField::Rating => {
                if ch.is_ascii_digit() {
                    self.field_mut().push(ch);
                    true
                } else {
                    false
                }
            }
            BookField::Published => {
                if ch.is_ascii_digit() || ch == '-' {
                    self.published.push(ch);
                    true
                } else {
                    false
                }
            }
            _ => {
                self.field_mut().push(ch);
                true
            }
        }
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        self.field_mut().pop();
    }

    fn field_mut(&mut self) -> &mut String {
        match self.active {
            BookField::BookId => &mut self.book_id,
            BookField::Isbn => &mut self.isbn,
            BookField::Title => &mut self.title,
            BookField::Published => &mut self.published,
            BookField::Rating => &mut self.rating,
            BookField::Genre => &mut self.genre,
        }
    }

    fn field(&self, field: BookField) -> &str {
        match field {
            BookField::BookId => &self.book_id,
            BookField::Isbn => &self.isbn,
            BookField::Title => &self.title,
            BookField::Published => &self.published,
            BookField::Rating => &self.rating,
            BookField::Genre => &self.genre,
        }
    }

    /// Validate the inputs and return a typed book ready for persistence,
    /// carrying the authors collected through the nested form.
    pub(crate) fn parse_inputs(&self) -> Result<Book> {
        let book_id = required(&self.book_id, "Book ID")?
            .parse::<i64>()
            .context("Book ID must be an integer.")?;
        let isbn = required(&self.isbn, "ISBN")?.to_string();
        let title = required(&self.title, "Title")?.to_string();
        let published = NaiveDate::parse_from_str(required(&self.published, "Published")?, DATE_FORMAT)
            .context("Published date must be YYYY-MM-DD.")?;
        let rating = required(&self.rating, "Rating")?
            .parse::<i32>()
            .context("Rating must be an integer.")?;
        if !(1..=5).contains(&rating) {
            return Err(anyhow!("Rating must be between 1 and 5."));
        }
        let genre = required(&self.genre, "Genre")?.parse::<Genre>()?;

        Ok(Book {
            book_id,
            isbn,
            title,
            published,
            rating,
            genre,
            authors: self.authors.clone(),
        })
    }

    /// Render a styled line for the modal form widget.
    pub(crate) fn build_line(&self, field_name: &str, field: BookField) -> Line<'static> {
        form_line(field_name, self.field(field), self.active == field)
    }

    /// Character count of the active field, for cursor placement.
    pub(crate) fn active_len(&self) -> usize {
        self.field(self.active).chars().count()
    }

    /// Row index of the active field inside the modal.
    pub(crate) fn active_index(&self) -> usize {
        Self::FIELDS
            .iter()
            .position(|(_, field)| *field == self.active)
            .unwrap_or(0)
    }
}

/// Form state for adding an author, either standalone or nested inside the
/// book form.
#[derive(Default, Clone)]
pub(crate) struct AuthorForm {
    pub(crate) author_id: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) birth_date: String,
    pub(crate) active: AuthorField,
    pub(crate) error: Option<String>,
}

/// Fields within the author form, in focus order.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum AuthorField {
    #[default]
    AuthorId,
    FirstName,
    LastName,
    BirthDate,
}

impl AuthorForm {
    pub(crate) const FIELDS: [(&'static str, AuthorField); 4] = [
        ("Author ID", AuthorField::AuthorId),
        ("First name", AuthorField::FirstName),
        ("Last name", AuthorField::LastName),
        ("Born", AuthorField::BirthDate),
    ];

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            AuthorField::AuthorId => AuthorField::FirstName,
            AuthorField::FirstName => AuthorField::LastName,
            AuthorField::LastName => AuthorField::BirthDate,
            AuthorField::BirthDate => AuthorField::AuthorId,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            AuthorField::AuthorId => {
                if ch.is_ascii_digit() {
                    self.author_id.push(ch);
                    true
                } else {
                    false
                }
            }
            AuthorField::BirthDate => {
                if ch.is_ascii_digit() || ch == '-' {
                    self.birth_date.push(ch);
                    true
                } else {
                    false
                }
            }
            _ => {
                self.field_mut().push(ch);
                true
            }
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.field_mut().pop();
    }

    fn field_mut(&mut self) -> &mut String {
        match self.active {
            AuthorField::AuthorId => &mut self.author_id,
            AuthorField::FirstName => &mut self.first_name,
            AuthorField::LastName => &mut self.last_name,
            AuthorField::BirthDate => &mut self.birth_date,
        }
    }

    fn field(&self, field: AuthorField) -> &str {
        match field {
            AuthorField::AuthorId => &self.author_id,
            AuthorField::FirstName => &self.first_name,
            AuthorField::LastName => &self.last_name,
            AuthorField::BirthDate => &self.birth_date,
        }
    }

    /// Validate the inputs and return a typed author ready for persistence.
    pub(crate) fn parse_inputs(&self) -> Result<Author> {
        let author_id = required(&self.author_id, "Author ID")?
            .parse::<i64>()
            .context("Author ID must be an integer.")?;
        let first_name = required(&self.first_name, "First name")?.to_string();
        let last_name = required(&self.last_name, "Last name")?.to_string();
        let birth_date =
            NaiveDate::parse_from_str(required(&self.birth_date, "Born")?, DATE_FORMAT)
                .context("Birth date must be YYYY-MM-DD.")?;

        Ok(Author {
            author_id,
            first_name,
            last_name,
            birth_date,
        })
    }

    pub(crate) fn build_line(&self, field_name: &str, field: AuthorField) -> Line<'static> {
        form_line(field_name, self.field(field), self.active == field)
    }

    pub(crate) fn active_len(&self) -> usize {
        self.field(self.active).chars().count()
    }

    pub(crate) fn active_index(&self) -> usize {
        Self::FIELDS
            .iter()
            .position(|(_, field)| *field == self.active)
            .unwrap_or(0)
    }
}

/// Confirmation state before a book is removed from the catalog.
#[derive(Clone)]
pub(crate) struct ConfirmBookDelete {
    pub(crate) book_id: i64,
    pub(crate) title: String,
}

impl ConfirmBookDelete {
    pub(crate) fn from(book: &Book) -> Self {
        Self {
            book_id: book.book_id,
            title: book.title.clone(),
        }
    }
}

/// Reject blank values with a message naming the field.
fn required<'a>(value: &'a str, field_name: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(anyhow!("{field_name} is required."))
    } else {
        Ok(trimmed)
    }
}

/// Shared rendering for a single form row: the active field is highlighted,
/// empty fields show a placeholder.
fn form_line(field_name: &str, value: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        "<required>".to_string()
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_book_form() -> BookForm {
        BookForm {
            book_id: "10".into(),
            isbn: "123".into(),
            title: "Go".into(),
            published: "2015-11-18".into(),
            rating: "4".into(),
            genre: "fiction".into(),
            ..BookForm::default()
        }
    }

    #[test]
    fn book_form_parses_valid_input() {
        let book = filled_book_form().parse_inputs().unwrap();
        assert_eq!(book.book_id, 10);
        assert_eq!(book.genre, Genre::Fiction);
        assert_eq!(book.published.to_string(), "2015-11-18");
    }

    #[test]
    fn book_form_rejects_out_of_range_rating() {
        let mut form = filled_book_form();
        form.rating = "6".into();
        let err = form.parse_inputs().unwrap_err();
        assert!(err.to_string().contains("between 1 and 5"));
    }

    #[test]
    fn book_form_rejects_malformed_date() {
        let mut form = filled_book_form();
        form.published = "18/11/2015".into();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn book_form_rejects_blank_required_fields() {
        let mut form = filled_book_form();
        form.title = "  ".into();
        let err = form.parse_inputs().unwrap_err();
        assert!(err.to_string().contains("Title is required"));
    }

    #[test]
    fn book_form_filters_non_numeric_ids() {
        let mut form = BookForm::default();
        assert!(!form.push_char('x'));
        assert!(form.push_char('7'));
        assert_eq!(form.book_id, "7");
    }

    #[test]
    fn author_form_parses_valid_input() {
        let form = AuthorForm {
            author_id: "1".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            birth_date: "1970-01-01".into(),
            ..AuthorForm::default()
        };
        let author = form.parse_inputs().unwrap();
        assert_eq!(author.author_id, 1);
        assert_eq!(author.full_name(), "Jane Doe");
    }

    #[test]
    fn focus_cycles_through_every_book_field() {
        let mut form = BookForm::default();
        for index in 0..BookForm::FIELDS.len() {
            assert_eq!(form.active_index(), index);
            form.toggle_field();
        }
        assert_eq!(form.active_index(), 0);
    }
}
