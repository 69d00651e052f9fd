use crate::db::BlobStore;
use crate::error::StoreError;
use crate::models::Book;

/// Persists the whole collection as one JSON blob under a single key.
pub struct BookStorage<S> {
    store: S,
    key: String,
}

impl<S: BlobStore> BookStorage<S> {
    pub fn new(store: S, key: impl Into<String>) -> Self {
        BookStorage {
            store,
            key: key.into(),
        }
    }

    /// Missing, unreadable or malformed data loads as an empty list.
    pub fn load(&self) -> Vec<Book> {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return vec![],
            Err(err) => {
                log::warn!("could not read saved books key={}: {}", self.key, err);
                return vec![];
            }
        };
        match serde_json::from_str::<Vec<Book>>(&raw) {
            Ok(books) => books,
            Err(err) => {
                log::warn!("could not parse saved books key={}: {}", self.key, err);
                vec![]
            }
        }
    }

    pub fn save(&self, books: &[Book]) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(books)?;
        self.store.set(&self.key, &encoded)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.remove(&self.key)
    }
}
