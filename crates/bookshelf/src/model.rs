//! Domain records for the walkthrough

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typed_surreal::{Record, RecordId};

pub const BOOK_TABLE: &str = "book";
pub const PUBLISHER_TABLE: &str = "publisher";
/// Edge label linking a book to its publisher
pub const PUBLISHED_BY: &str = "published_by";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Book {
    pub id: Option<RecordId>,
    pub title: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub available: bool,
}

impl Book {
    /// New, available book
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            author: author.into(),
            published_at,
            available: true,
        }
    }
}

impl Record for Book {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Publisher {
    pub id: Option<RecordId>,
    pub name: String,
}

impl Publisher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

impl Record for Publisher {
    fn id(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }
}
