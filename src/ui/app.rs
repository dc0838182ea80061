use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;

use crate::controller::Controller;
use crate::models::{Author, Book, Genre, SearchMode};

use super::forms::{AuthorForm, BookForm, ConfirmBookDelete};
use super::helpers::{centered_rect, surface_error};

/// Footer space reserved for the status message and key hints.
const FOOTER_HEIGHT: u16 = 4;

/// High-level navigation states. Keeping this explicit makes it easy to
/// reason about which rendering path runs and what keyboard shortcuts should
/// do.
enum Screen {
    Books,
    Authors(Vec<Author>),
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    Searching(SearchState),
    AddingBook(BookForm),
    /// Nested author entry reached from inside the book form; the pending
    /// book form is parked until the author dialog closes.
    AddingBookAuthor {
        book_form: BookForm,
        author_form: AuthorForm,
    },
    AddingAuthor(AuthorForm),
    ConfirmBookDelete(ConfirmBookDelete),
}

/// State for the inline search prompt.
struct SearchState {
    query: String,
    mode: SearchMode,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query: String::new(),
            mode: SearchMode::Title,
        }
    }
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    controller: Controller,
    books: Vec<Book>,
    selected: usize,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(controller: Controller, books: Vec<Book>) -> Self {
        Self {
            controller,
            books,
            selected: 0,
            screen: Screen::Books,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Release the database connection. Called once on the way out.
    pub fn shutdown(&mut self) -> Result<()> {
        self.controller.disconnect()
    }

    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Searching(state) => self.handle_search(code, state),
            Mode::AddingBook(form) => self.handle_add_book(code, form),
            Mode::AddingBookAuthor {
                book_form,
                author_form,
            } => self.handle_add_book_author(code, book_form, author_form),
            Mode::AddingAuthor(form) => self.handle_add_author(code, form),
            Mode::ConfirmBookDelete(confirm) => self.handle_confirm_delete(code, confirm),
        };

        Ok(exit)
    }

    /// Ctrl+A opens the nested author dialog, but only while the book form is
    /// up; everywhere else the chord does nothing.
    pub fn handle_ctrl_a(&mut self) {
        let mode = mem::replace(&mut self.mode, Mode::Normal);
        self.mode = match mode {
            Mode::AddingBook(book_form) => Mode::AddingBookAuthor {
                book_form,
                author_form: AuthorForm::default(),
            },
            other => other,
        };
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match &self.screen {
            Screen::Books => match code {
                KeyCode::Char('q') => {
                    *exit = true;
                    Mode::Normal
                }
                KeyCode::Char('/') | KeyCode::Char('s') => Mode::Searching(SearchState::default()),
                KeyCode::Char('a') => Mode::AddingBook(BookForm::default()),
                KeyCode::Char('u') => Mode::AddingAuthor(AuthorForm::default()),
                KeyCode::Char('d') => match self.books.get(self.selected) {
                    Some(book) => Mode::ConfirmBookDelete(ConfirmBookDelete::from(book)),
                    None => {
                        self.report_info("No book selected.".to_string());
                        Mode::Normal
                    }
                },
                KeyCode::Char('v') => {
                    match self.controller.all_authors() {
                        Ok(authors) => self.screen = Screen::Authors(authors),
                        Err(err) => self.report_error(&err),
                    }
                    Mode::Normal
                }
                KeyCode::Char('r') => {
                    self.reload_books();
                    Mode::Normal
                }
                KeyCode::Up => {
                    self.selected = self.selected.saturating_sub(1);
                    Mode::Normal
                }
                KeyCode::Down => {
                    if self.selected + 1 < self.books.len() {
                        self.selected += 1;
                    }
                    Mode::Normal
                }
                _ => Mode::Normal,
            },
            Screen::Authors(_) => match code {
                KeyCode::Char('q') => {
                    *exit = true;
                    Mode::Normal
                }
                KeyCode::Esc | KeyCode::Char('v') => {
                    self.screen = Screen::Books;
                    Mode::Normal
                }
                _ => Mode::Normal,
            },
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Tab => {
                state.mode = state.mode.next();
                Mode::Searching(state)
            }
            KeyCode::Enter => match self.controller.search(&state.query, state.mode) {
                Ok(books) => {
                    if books.is_empty() {
                        self.report_info(format!(
                            "No books found for {}: {}",
                            state.mode,
                            state.query.trim()
                        ));
                    } else {
                        self.report_info(format!("{} book(s) found.", books.len()));
                    }
                    self.books = books;
                    self.selected = 0;
                    Mode::Normal
                }
                Err(err) => {
                    self.report_error(&err);
                    Mode::Searching(state)
                }
            },
            KeyCode::Backspace => {
                state.query.pop();
                Mode::Searching(state)
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                state.query.push(ch);
                Mode::Searching(state)
            }
            _ => Mode::Searching(state),
        }
    }

    fn handle_add_book(&mut self, code: KeyCode, mut form: BookForm) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Tab => {
                form.toggle_field();
                Mode::AddingBook(form)
            }
            KeyCode::Enter => match form.parse_inputs() {
                Ok(book) => match self.controller.add_book(book) {
                    Ok(added) => {
                        self.report_info(format!("Added \"{}\" to the catalog.", added.title));
                        self.books.push(added);
                        self.selected = self.books.len() - 1;
                        Mode::Normal
                    }
                    Err(err) => {
                        form.error = Some(surface_error(&err));
                        Mode::AddingBook(form)
                    }
                },
                Err(err) => {
                    form.error = Some(surface_error(&err));
                    Mode::AddingBook(form)
                }
            },
            KeyCode::Backspace => {
                form.backspace();
                Mode::AddingBook(form)
            }
            KeyCode::Char(ch) => {
                form.push_char(ch);
                Mode::AddingBook(form)
            }
            _ => Mode::AddingBook(form),
        }
    }

    fn handle_add_book_author(
        &mut self,
        code: KeyCode,
        mut book_form: BookForm,
        mut author_form: AuthorForm,
    ) -> Mode {
        match code {
            KeyCode::Esc => Mode::AddingBook(book_form),
            KeyCode::Tab => {
                author_form.toggle_field();
                Mode::AddingBookAuthor {
                    book_form,
                    author_form,
                }
            }
            KeyCode::Enter => match author_form.parse_inputs() {
                Ok(author) => match self.controller.add_author(&author) {
                    Ok(()) => {
                        self.report_info(format!(
                            "Stored {}; linked once the book is saved.",
                            author.full_name()
                        ));
                        book_form.authors.push(author);
                        Mode::AddingBook(book_form)
                    }
                    Err(err) => {
                        author_form.error = Some(surface_error(&err));
                        Mode::AddingBookAuthor {
                            book_form,
                            author_form,
                        }
                    }
                },
                Err(err) => {
                    author_form.error = Some(surface_error(&err));
                    Mode::AddingBookAuthor {
                        book_form,
                        author_form,
                    }
                }
            },
            KeyCode::Backspace => {
                author_form.backspace();
                Mode::AddingBookAuthor {
                    book_form,
                    author_form,
                }
            }
            KeyCode::Char(ch) => {
                author_form.push_char(ch);
                Mode::AddingBookAuthor {
                    book_form,
                    author_form,
                }
            }
            _ => Mode::AddingBookAuthor {
                book_form,
                author_form,
            },
        }
    }

    fn handle_add_author(&mut self, code: KeyCode, mut form: AuthorForm) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Tab => {
                form.toggle_field();
                Mode::AddingAuthor(form)
            }
            KeyCode::Enter => match form.parse_inputs() {
                Ok(author) => match self.controller.add_author(&author) {
                    Ok(()) => {
                        self.report_info(format!("Added author {}.", author.full_name()));
                        Mode::Normal
                    }
                    Err(err) => {
                        form.error = Some(surface_error(&err));
                        Mode::AddingAuthor(form)
                    }
                },
                Err(err) => {
                    form.error = Some(surface_error(&err));
                    Mode::AddingAuthor(form)
                }
            },
            KeyCode::Backspace => {
                form.backspace();
                Mode::AddingAuthor(form)
            }
            KeyCode::Char(ch) => {
                form.push_char(ch);
                Mode::AddingAuthor(form)
            }
            _ => Mode::AddingAuthor(form),
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmBookDelete) -> Mode {
        match code {
            KeyCode::Char('y') | KeyCode::Enter => {
                match self.controller.delete_book(confirm.book_id) {
                    Ok(()) => {
                        self.books.retain(|book| book.book_id != confirm.book_id);
                        if self.selected >= self.books.len() {
                            self.selected = self.books.len().saturating_sub(1);
                        }
                        self.report_info(format!("Removed \"{}\".", confirm.title));
                    }
                    Err(err) => self.report_error(&err),
                }
                Mode::Normal
            }
            KeyCode::Char('n') | KeyCode::Esc => Mode::Normal,
            _ => Mode::ConfirmBookDelete(confirm),
        }
    }

    fn reload_books(&mut self) {
        match self.controller.all_books() {
            Ok(books) => {
                self.report_info(format!("{} book(s) in the catalog.", books.len()));
                self.books = books;
                self.selected = 0;
            }
            Err(err) => self.report_error(&err),
        }
    }

    fn report_info(&mut self, text: String) {
        self.status = Some(StatusMessage {
            text,
            kind: StatusKind::Info,
        });
    }

    fn report_error(&mut self, err: &anyhow::Error) {
        self.status = Some(StatusMessage {
            text: surface_error(err),
            kind: StatusKind::Error,
        });
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(FOOTER_HEIGHT)])
            .split(frame.area());

        match &self.screen {
            Screen::Books => self.draw_books_table(frame, chunks[0]),
            Screen::Authors(authors) => draw_authors_table(frame, chunks[0], authors),
        }
        self.draw_footer(frame, chunks[1]);

        match &self.mode {
            Mode::AddingBook(form) => draw_book_form(frame, form),
            Mode::AddingBookAuthor { author_form, .. } => {
                draw_author_form(frame, author_form, " Add Author to Book ")
            }
            Mode::AddingAuthor(form) => draw_author_form(frame, form, " Add Author "),
            Mode::ConfirmBookDelete(confirm) => draw_confirm_delete(frame, confirm),
            Mode::Normal | Mode::Searching(_) => {}
        }
    }

    fn draw_books_table(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(["Title", "ID", "ISBN", "Published", "Authors", "Rating", "Genre"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = self.books.iter().map(|book| {
            Row::new([
                book.title.clone(),
                book.book_id.to_string(),
                book.isbn.clone(),
                book.published.to_string(),
                book.display_authors(),
                book.rating.to_string(),
                book.genre.to_string(),
            ])
        });

        let widths = [
            Constraint::Percentage(26),
            Constraint::Length(6),
            Constraint::Length(15),
            Constraint::Length(12),
            Constraint::Percentage(24),
            Constraint::Length(6),
            Constraint::Length(11),
        ];

        let title = if self.controller.is_connected() {
            " Library Catalog "
        } else {
            " Library Catalog (disconnected) "
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        let mut state = TableState::default();
        if !self.books.is_empty() {
            state.select(Some(self.selected.min(self.books.len() - 1)));
        }
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL);

        let first_line = if let Mode::Searching(state) = &self.mode {
            let prompt = format!("Search [{}] (Tab changes mode): ", state.mode);
            // Cursor sits right after the typed query.
            let x = area.x + 1 + (prompt.chars().count() + state.query.chars().count()) as u16;
            frame.set_cursor_position(Position::new(x, area.y + 1));
            Line::from(format!("{prompt}{}", state.query))
        } else if let Some(status) = &self.status {
            Line::styled(status.text.clone(), status.kind.style())
        } else {
            Line::from("")
        };

        let hints = match (&self.mode, &self.screen) {
            (Mode::Searching(_), _) => "Enter search  Tab mode  Esc cancel",
            (Mode::AddingBook(_), _) | (Mode::AddingBookAuthor { .. }, _) => {
                "Tab next field  Enter save  Ctrl+A add author  Esc cancel"
            }
            (Mode::AddingAuthor(_), _) => "Tab next field  Enter save  Esc cancel",
            (Mode::ConfirmBookDelete(_), _) => "y confirm  n cancel",
            (Mode::Normal, Screen::Authors(_)) => "Esc back  q quit",
            (Mode::Normal, Screen::Books) => {
                "/ search  a add book  u add author  d delete  v authors  r refresh  q quit"
            }
        };

        let paragraph = Paragraph::new(vec![
            first_line,
            Line::styled(hints, Style::default().fg(Color::DarkGray)),
        ])
        .block(block);
        frame.render_widget(paragraph, area);
    }
}

fn draw_authors_table(frame: &mut Frame, area: Rect, authors: &[Author]) {
    let header = Row::new(["ID", "First name", "Last name", "Born"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = authors.iter().map(|author| {
        Row::new([
            author.author_id.to_string(),
            author.first_name.clone(),
            author.last_name.clone(),
            author.birth_date.to_string(),
        ])
    });

    let widths = [
        Constraint::Length(6),
        Constraint::Percentage(35),
        Constraint::Percentage(35),
        Constraint::Length(12),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(" Authors "));
    frame.render_widget(table, area);
}

fn draw_book_form(frame: &mut Frame, form: &BookForm) {
    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = BookForm::FIELDS
        .iter()
        .map(|(name, field)| form.build_line(name, *field))
        .collect();

    lines.push(Line::from(""));
    let authors = if form.authors.is_empty() {
        "Authors: none yet (Ctrl+A to add)".to_string()
    } else {
        format!(
            "Authors: {}",
            form.authors
                .iter()
                .map(|author| author.full_name())
                .collect::<Vec<_>>()
                .join(", ")
        )
    };
    lines.push(Line::styled(authors, Style::default().fg(Color::DarkGray)));

    let genres = format!(
        "Genres: {}",
        Genre::ALL
            .iter()
            .map(Genre::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );
    lines.push(Line::styled(genres, Style::default().fg(Color::DarkGray)));

    if let Some(error) = &form.error {
        lines.push(Line::from(""));
        lines.push(Line::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        ));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Add Book "))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);

    set_form_cursor(
        frame,
        area,
        BookForm::FIELDS[form.active_index()].0,
        form.active_index(),
        form.active_len(),
    );
}

fn draw_author_form(frame: &mut Frame, form: &AuthorForm, title: &str) {
    let area = centered_rect(50, 40, frame.area());
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = AuthorForm::FIELDS
        .iter()
        .map(|(name, field)| form.build_line(name, *field))
        .collect();

    if let Some(error) = &form.error {
        lines.push(Line::from(""));
        lines.push(Line::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        ));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);

    set_form_cursor(
        frame,
        area,
        AuthorForm::FIELDS[form.active_index()].0,
        form.active_index(),
        form.active_len(),
    );
}

fn draw_confirm_delete(frame: &mut Frame, confirm: &ConfirmBookDelete) {
    let area = centered_rect(50, 20, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(format!(
            "Remove \"{}\" (id {}) from the catalog?",
            confirm.title, confirm.book_id
        )),
        Line::from(""),
        Line::styled(
            "This also removes its author links.",
            Style::default().fg(Color::DarkGray),
        ),
    ];

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Remove Book "))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Place the terminal cursor at the end of the active form field. Field rows
/// start one cell inside the modal border.
fn set_form_cursor(
    frame: &mut Frame,
    area: Rect,
    field_label: &str,
    field_index: usize,
    value_len: usize,
) {
    let x = area.x + 1 + (field_label.chars().count() + 2 + value_len) as u16;
    let y = area.y + 1 + field_index as u16;
    if x < area.right() && y < area.bottom() {
        frame.set_cursor_position(Position::new(x, y));
    }
}
