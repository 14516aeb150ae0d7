use library_db::{Document, RecordId};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    modules::Routable,
    utils::{display_date, optional_date},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: RecordId,
    pub first_name: String,
    pub family_name: String,
    #[serde(default, with = "optional_date")]
    pub date_of_birth: Option<Date>,
    #[serde(default, with = "optional_date")]
    pub date_of_death: Option<Date>,
}

impl Author {
    pub fn new(
        first_name: impl Into<String>,
        family_name: impl Into<String>,
        date_of_birth: Option<Date>,
        date_of_death: Option<Date>,
    ) -> Self {
        Self {
            id: RecordId::generate(),
            first_name: first_name.into(),
            family_name: family_name.into(),
            date_of_birth,
            date_of_death,
        }
    }

    /// `"Family, First"`, or empty unless both parts are present.
    pub fn name(&self) -> String {
        if self.first_name.is_empty() || self.family_name.is_empty() {
            return String::new();
        }
        format!("{}, {}", self.family_name, self.first_name)
    }

    pub fn lifespan(&self) -> String {
        format!(
            "{} - {}",
            display_date(self.date_of_birth),
            display_date(self.date_of_death)
        )
    }
}

impl Document for Author {
    const COLLECTION: &'static str = "authors";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Routable for Author {
    fn url(&self) -> String {
        format!("/author/{}", self.id)
    }
}

/// Author as shown in views, with its derived fields.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorView {
    #[serde(flatten)]
    pub author: Author,
    pub name: String,
    pub lifespan: String,
    pub url: String,
}

impl From<Author> for AuthorView {
    fn from(author: Author) -> Self {
        Self {
            name: author.name(),
            lifespan: author.lifespan(),
            url: author.url(),
            author,
        }
    }
}
