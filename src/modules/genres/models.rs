use library_db::{Document, RecordId};
use serde::{Deserialize, Serialize};

use crate::modules::Routable;

/// Book category; names are kept unique by create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: RecordId,
    pub name: String,
}

impl Genre {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: RecordId::generate(),
            name: name.into(),
        }
    }
}

impl Document for Genre {
    const COLLECTION: &'static str = "genres";

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl Routable for Genre {
    fn url(&self) -> String {
        format!("/genre/{}", self.id)
    }
}
