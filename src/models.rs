use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Wishlist,
    Queued,
    Reading,
    Finished,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Wishlist => "wishlist",
            BookStatus::Queued => "queued",
            BookStatus::Reading => "reading",
            BookStatus::Finished => "finished",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookStatus::Wishlist => "Wishlist",
            BookStatus::Queued => "Queued",
            BookStatus::Reading => "Reading",
            BookStatus::Finished => "Finished",
        }
    }

    pub fn is_upcoming(&self) -> bool {
        matches!(self, BookStatus::Queued | BookStatus::Wishlist)
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "wishlist" => Ok(BookStatus::Wishlist),
            "queued" => Ok(BookStatus::Queued),
            "reading" => Ok(BookStatus::Reading),
            "finished" => Ok(BookStatus::Finished),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// One tracked book. Stored as camelCase JSON; everything but `id` and
/// `title` may be missing from older blobs.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: String, // UUID
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub goodreads_url: String,
    #[serde(default)]
    pub cover_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: i64, // epoch millis
}

impl Book {
    pub fn is_finished(&self) -> bool {
        self.status == BookStatus::Finished
    }

    pub fn rating_label(&self) -> String {
        if self.rating > 0 {
            format!("{}/5", self.rating)
        } else {
            "Tap a star".to_string()
        }
    }
}

/// Form input for a new record, or the full form contents when editing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub status: BookStatus,
    pub notes: String,
    pub priority: i64,
    pub rating: u8,
    pub review: String,
}

impl BookDraft {
    pub fn new(title: impl Into<String>) -> Self {
        BookDraft {
            title: title.into(),
            ..Default::default()
        }
    }

    pub(crate) fn into_patch(self) -> BookPatch {
        let finished = self.status == BookStatus::Finished;
        BookPatch {
            title: Some(self.title),
            author: Some(self.author),
            genre: Some(self.genre),
            status: Some(self.status),
            notes: Some(self.notes),
            priority: Some(self.priority),
            rating: finished.then_some(self.rating),
            review: finished.then_some(self.review),
        }
    }
}

/// Shallow overwrite for an existing record; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub status: Option<BookStatus>,
    pub notes: Option<String>,
    pub priority: Option<i64>,
    pub rating: Option<u8>,
    pub review: Option<String>,
}

/// Supplemental fields gathered by enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub author: Option<String>,
    pub cover_url: Option<String>,
    pub description: Option<String>,
    pub goodreads_url: String,
}
