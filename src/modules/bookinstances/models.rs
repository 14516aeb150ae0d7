use std::{fmt, str::FromStr};

use library_db::{Document, RecordId};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    modules::{books::models::BookSummary, Linked, Routable},
    utils::{display_date, optional_date},
};

/// Circulation state of a single copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookStatus {
    Available,
    #[default]
    Maintenance,
    Loaned,
    Reserved,
}

impl BookStatus {
    pub const ALL: [BookStatus; 4] = [
        BookStatus::Available,
        BookStatus::Maintenance,
        BookStatus::Loaned,
        BookStatus::Reserved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Maintenance => "Maintenance",
            BookStatus::Loaned => "Loaned",
            BookStatus::Reserved => "Reserved",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown book status '{0}'")]
pub struct UnknownStatus(String);

impl FromStr for BookStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == raw)
            .ok_or_else(|| UnknownStatus(raw.to_string()))
    }
}

/// One physical copy of a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookInstance {
    pub id: RecordId,
    pub book: RecordId,
    pub imprint: String,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(default, with = "optional_date")]
    pub due_back: Option<Date>,
}

impl BookInstance {
    pub fn new(
        book: RecordId,
        imprint: impl Into<String>,
        status: BookStatus,
        due_back: Option<Date>,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            book,
            imprint: imprint.into(),
            status,
            due_back,
        }
    }

    pub fn due_back_formatted(&self) -> String {
        display_date(self.due_back)
    }
}

impl Document for BookInstance {
    const COLLECTION: &'static str = "bookinstances";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Routable for BookInstance {
    fn url(&self) -> String {
        format!("/bookinstance/{}", self.id)
    }
}

/// Copy as shown in views, with its book resolved when known.
#[derive(Debug, Clone, Serialize)]
pub struct BookInstanceView {
    pub id: RecordId,
    pub book: Option<Linked<BookSummary>>,
    pub imprint: String,
    pub status: BookStatus,
    #[serde(serialize_with = "optional_date::serialize")]
    pub due_back: Option<Date>,
    pub due_back_formatted: String,
    pub url: String,
}

impl BookInstanceView {
    pub fn new(instance: BookInstance, book: Option<BookSummary>) -> Self {
        Self {
            url: instance.url(),
            due_back_formatted: instance.due_back_formatted(),
            book: book.map(Linked::new),
            id: instance.id,
            imprint: instance.imprint,
            status: instance.status,
            due_back: instance.due_back,
        }
    }
}
