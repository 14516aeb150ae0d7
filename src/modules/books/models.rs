use std::collections::HashMap;

use library_db::{Document, RecordId};
use serde::{Deserialize, Serialize};

use crate::modules::{
    authors::models::{Author, AuthorView},
    genres::models::Genre,
    Linked, Routable,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: RecordId,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: RecordId,
    #[serde(default)]
    pub genre: Vec<RecordId>,
}

impl Book {
    pub fn new(
        title: impl Into<String>,
        author: RecordId,
        summary: impl Into<String>,
        isbn: impl Into<String>,
        genre: Vec<RecordId>,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            title: title.into(),
            summary: summary.into(),
            isbn: isbn.into(),
            author,
            genre,
        }
    }
}

impl Document for Book {
    const COLLECTION: &'static str = "books";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Routable for Book {
    fn url(&self) -> String {
        format!("/book/{}", self.id)
    }
}

/// Projection used wherever books are listed as referencing records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

impl Routable for BookSummary {
    fn url(&self) -> String {
        format!("/book/{}", self.id)
    }
}

/// Book with its author and genres resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct BookView {
    pub id: RecordId,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Option<AuthorView>,
    pub genre: Vec<Linked<Genre>>,
    pub url: String,
}

impl BookView {
    /// References that no longer resolve are left out.
    pub fn expand(
        book: Book,
        authors: &HashMap<RecordId, Author>,
        genres: &HashMap<RecordId, Genre>,
    ) -> Self {
        Self {
            url: book.url(),
            author: authors.get(&book.author).cloned().map(AuthorView::from),
            genre: book
                .genre
                .iter()
                .filter_map(|id| genres.get(id).cloned())
                .map(Linked::new)
                .collect(),
            id: book.id,
            title: book.title,
            summary: book.summary,
            isbn: book.isbn,
        }
    }
}

/// A genre offered on the book form, ticked when it was submitted.
#[derive(Debug, Clone, Serialize)]
pub struct GenreChoice {
    #[serde(flatten)]
    pub genre: Linked<Genre>,
    pub checked: bool,
}

/// Index records by identifier for reference expansion.
pub fn by_id<T: Document + Clone>(records: &[T]) -> HashMap<RecordId, T> {
    records
        .iter()
        .map(|record| (record.id().clone(), record.clone()))
        .collect()
}
