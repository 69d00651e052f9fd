use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;

use crate::models::{Book, BookStatus};

/// How the visible order is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderingStrategy {
    /// The stored order is authoritative; views only filter.
    #[default]
    Curated,
    /// Views are sorted by the requested key on every request.
    Sorted,
}

impl FromStr for OrderingStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "curated" | "manual" => Ok(OrderingStrategy::Curated),
            "sorted" | "computed" => Ok(OrderingStrategy::Sorted),
            other => Err(format!("unknown ordering: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(BookStatus),
}

impl StatusFilter {
    fn matches(&self, status: BookStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        BookStatus::from_str(value).map(StatusFilter::Only)
    }
}

/// Priority and creation time sort newest/highest first. Title and author
/// sort ascending on their lower-cased text, so "alpha" and "Alpha" sit
/// together; an empty author sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Priority,
    Title,
    Author,
    Created,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "priority" => Ok(SortKey::Priority),
            "title" => Ok(SortKey::Title),
            "author" => Ok(SortKey::Author),
            "created" => Ok(SortKey::Created),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewCriteria {
    pub search: String,
    pub status: StatusFilter,
    pub sort: SortKey,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ListStats {
    pub total: usize,
    pub active: usize,
    pub upcoming: usize,
}

/// Filters (and, for `Sorted`, orders) the collection without touching it.
/// The search text is trimmed, so a blank or whitespace-only search matches
/// every record.
pub fn derive_view<'a>(
    books: &'a [Book],
    criteria: &ViewCriteria,
    strategy: OrderingStrategy,
) -> Vec<&'a Book> {
    let needle = criteria.search.trim().to_lowercase();
    let mut visible: Vec<&Book> = books
        .iter()
        .filter(|book| criteria.status.matches(book.status))
        .filter(|book| matches_search(book, &needle))
        .collect();

    if strategy == OrderingStrategy::Sorted {
        // sort_by is stable, so ties keep collection order
        visible.sort_by(|a, b| compare(a, b, criteria.sort));
    }
    visible
}

/// Counts over the full collection, never the filtered view.
pub fn compute_stats(books: &[Book]) -> ListStats {
    ListStats {
        total: books.len(),
        active: books
            .iter()
            .filter(|book| book.status == BookStatus::Reading)
            .count(),
        upcoming: books.iter().filter(|book| book.status.is_upcoming()).count(),
    }
}

fn matches_search(book: &Book, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    [&book.title, &book.author]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

fn compare(a: &Book, b: &Book, key: SortKey) -> Ordering {
    match key {
        SortKey::Priority => b.priority.cmp(&a.priority),
        SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
        SortKey::Author => a.author.to_lowercase().cmp(&b.author.to_lowercase()),
        SortKey::Created => b.created_at.cmp(&a.created_at),
    }
}
