//! The reading list: canonical ordered collection plus session state.
//!
//! Every mutation goes through `&mut self`, persists the next collection, and
//! only then swaps it in and notifies subscribers with the new (books, session)
//! pair. A failed write leaves both the collection and subscribers untouched.
//! Views are derived on demand and never stored.

use chrono::Utc;
use uuid::Uuid;

use crate::db::BlobStore;
use crate::error::{EngineError, Result};
use crate::metadata::{Enricher, MetadataProvider};
use crate::models::{Book, BookDraft, BookPatch, BookStatus, Metadata};
use crate::reorder;
use crate::session::{ReviewEditor, Session};
use crate::storage::BookStorage;
use crate::view::{compute_stats, derive_view, ListStats, OrderingStrategy, ViewCriteria};

const MAX_RATING: u8 = 5;

/// What subscribers see after each change.
pub struct ListState<'a> {
    pub books: &'a [Book],
    pub session: &'a Session,
    pub ordering: OrderingStrategy,
}

impl<'a> ListState<'a> {
    pub fn view(&self, criteria: &ViewCriteria) -> Vec<&'a Book> {
        derive_view(self.books, criteria, self.ordering)
    }

    pub fn stats(&self) -> ListStats {
        compute_stats(self.books)
    }
}

type Listener = Box<dyn Fn(&ListState<'_>)>;

pub struct ReadingList<S, P> {
    books: Vec<Book>,
    session: Session,
    storage: BookStorage<S>,
    enricher: Enricher<P>,
    ordering: OrderingStrategy,
    listeners: Vec<Listener>,
}

impl<S: BlobStore, P: MetadataProvider> ReadingList<S, P> {
    /// Loads whatever the store holds; bad data starts an empty list.
    pub fn open(storage: BookStorage<S>, enricher: Enricher<P>, ordering: OrderingStrategy) -> Self {
        let books = storage.load();
        log::info!("loaded {} books ordering={:?}", books.len(), ordering);
        ReadingList {
            books,
            session: Session::default(),
            storage,
            enricher,
            ordering,
            listeners: vec![],
        }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn ordering(&self) -> OrderingStrategy {
        self.ordering
    }

    pub fn get(&self, id: &str) -> Option<&Book> {
        self.books.iter().find(|book| book.id == id)
    }

    pub fn state(&self) -> ListState<'_> {
        ListState {
            books: &self.books,
            session: &self.session,
            ordering: self.ordering,
        }
    }

    pub fn view(&self, criteria: &ViewCriteria) -> Vec<&Book> {
        derive_view(&self.books, criteria, self.ordering)
    }

    pub fn stats(&self) -> ListStats {
        compute_stats(&self.books)
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: Fn(&ListState<'_>) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn create(&mut self, draft: BookDraft) -> Result<Book> {
        let book = self.insert_new(draft)?;
        self.notify();
        Ok(book)
    }

    /// Strict: an unknown id is an error. Enrichment only re-runs when the
    /// title or author actually changes.
    pub fn update(&mut self, id: &str, patch: BookPatch) -> Result<Book> {
        let book = self.apply_update(id, patch)?;
        self.notify();
        Ok(book)
    }

    pub fn remove(&mut self, id: &str) -> Result<()> {
        if self.get(id).is_some() {
            let next = self
                .books
                .iter()
                .filter(|book| book.id != id)
                .cloned()
                .collect();
            self.commit(next)?;
            log::info!("removed book id={}", id);
        }
        self.transition(|session| session.forget(id));
        self.notify();
        Ok(())
    }

    pub fn reorder(&mut self, moved_id: &str, target_id: &str) -> Result<()> {
        let mut next = self.books.clone();
        if reorder::move_before(&mut next, moved_id, target_id) {
            self.commit(next)?;
            self.notify();
        }
        Ok(())
    }

    pub fn move_to_end(&mut self, moved_id: &str) -> Result<()> {
        let mut next = self.books.clone();
        if reorder::move_to_end(&mut next, moved_id) {
            self.commit(next)?;
            self.notify();
        }
        Ok(())
    }

    /// Marks finished without touching an existing rating or review, then
    /// expands the card and opens the review editor on it.
    pub fn promote_to_finished(&mut self, id: &str) -> Result<Book> {
        let updated = self.edit_record(id, |book| book.status = BookStatus::Finished)?;
        self.transition(|session| {
            session
                .with_card_expanded(id)
                .with_review_opened(id, updated.review.clone())
        });
        self.notify();
        Ok(updated)
    }

    pub fn set_rating(&mut self, id: &str, value: u8) -> Result<Book> {
        if !(1..=MAX_RATING).contains(&value) {
            return Err(EngineError::rating_out_of_range());
        }
        let updated = self.edit_record(id, |book| {
            book.status = BookStatus::Finished;
            book.rating = value;
        })?;
        self.notify();
        Ok(updated)
    }

    /// Opening the record already being reviewed closes the editor.
    pub fn open_review_editor(&mut self, id: &str) -> Result<()> {
        if self.session.is_editing_review(id) {
            self.close_review_editor();
            return Ok(());
        }
        let review = self
            .get(id)
            .map(|book| book.review.clone())
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        self.transition(|session| session.with_review_opened(id, review));
        self.notify();
        Ok(())
    }

    pub fn close_review_editor(&mut self) {
        self.transition(Session::with_review_closed);
        self.notify();
    }

    pub fn update_review_draft(&mut self, text: &str) {
        self.transition(|session| session.with_review_draft(text));
    }

    /// Writes the trimmed draft when the editor is open on `id`; otherwise the
    /// stored review is kept. Either way the record ends up finished.
    pub fn submit_review(&mut self, id: &str) -> Result<Book> {
        let draft = match self.session.review_editor() {
            ReviewEditor::Editing { id: editing, draft } if editing == id => {
                Some(draft.trim().to_string())
            }
            _ => None,
        };
        let updated = self.edit_record(id, |book| {
            book.status = BookStatus::Finished;
            if let Some(review) = draft {
                book.review = review;
            }
        })?;
        self.transition(Session::with_review_closed);
        self.notify();
        Ok(updated)
    }

    pub fn toggle_card_expansion(&mut self, id: &str) {
        self.transition(|session| session.with_card_toggled(id));
        self.notify();
    }

    /// Puts the form into edit mode for `id` and returns the record to pre-fill it.
    pub fn begin_edit(&mut self, id: &str) -> Result<Book> {
        let book = self
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        self.transition(|session| {
            session
                .with_editing(id)
                .with_review_closed()
                .with_card_expanded(id)
        });
        self.notify();
        Ok(book)
    }

    pub fn cancel_edit(&mut self) {
        self.transition(Session::without_editing);
        self.notify();
    }

    /// Creates a record, or updates the one in edit mode. On failure the
    /// session is left as it was so the form can be corrected.
    pub fn submit_form(&mut self, draft: BookDraft) -> Result<Book> {
        let book = match self.session.editing_id().map(str::to_string) {
            Some(id) => self.apply_update(&id, draft.into_patch())?,
            None => self.insert_new(draft)?,
        };
        self.transition(|session| session.without_editing().with_review_closed());
        self.notify();
        Ok(book)
    }

    pub fn begin_drag(&mut self, id: &str) {
        if self.get(id).is_some() {
            self.transition(|session| session.with_drag(id));
            self.notify();
        }
    }

    /// Dropped on a card: the dragged record moves in front of it.
    pub fn drop_on(&mut self, target_id: &str) -> Result<()> {
        if let Some(dragged) = self.session.dragging_id().map(str::to_string) {
            let mut next = self.books.clone();
            if reorder::move_before(&mut next, &dragged, target_id) {
                self.commit(next)?;
            }
        }
        self.transition(Session::without_drag);
        self.notify();
        Ok(())
    }

    /// Dropped on the list itself rather than a card.
    pub fn drop_on_list(&mut self) -> Result<()> {
        if let Some(dragged) = self.session.dragging_id().map(str::to_string) {
            let mut next = self.books.clone();
            if reorder::move_to_end(&mut next, &dragged) {
                self.commit(next)?;
            }
        }
        self.transition(Session::without_drag);
        self.notify();
        Ok(())
    }

    pub fn end_drag(&mut self) {
        self.transition(Session::without_drag);
        self.notify();
    }

    /// Swaps in a whole collection (e.g. an import). Collapses every card and
    /// drops session references to records that no longer exist.
    pub fn replace_all(&mut self, books: Vec<Book>) -> Result<()> {
        self.commit(books)?;
        let dangling: Vec<String> = [
            self.session.editing_id(),
            self.session.dragging_id(),
            match self.session.review_editor() {
                ReviewEditor::Editing { id, .. } => Some(id.as_str()),
                ReviewEditor::Closed => None,
            },
        ]
        .into_iter()
        .flatten()
        .filter(|id| self.get(id).is_none())
        .map(str::to_string)
        .collect();
        self.transition(|session| {
            dangling
                .iter()
                .fold(session.with_cards_collapsed(), |session, id| session.forget(id))
        });
        self.notify();
        Ok(())
    }

    /// Empties the list and removes the stored blob.
    pub fn clear(&mut self) -> Result<()> {
        self.storage.clear()?;
        self.books.clear();
        self.session = Session::default();
        log::info!("cleared reading list");
        self.notify();
        Ok(())
    }

    fn insert_new(&mut self, draft: BookDraft) -> Result<Book> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(EngineError::title_required());
        }
        let author = draft.author.trim().to_string();
        let finished = draft.status == BookStatus::Finished;
        let metadata = self.enricher.enrich(&title, &author);

        let mut book = Book {
            id: self.new_id(),
            title,
            author: String::new(),
            genre: draft.genre.trim().to_string(),
            status: draft.status,
            notes: draft.notes.trim().to_string(),
            priority: draft.priority,
            rating: if finished { draft.rating.min(MAX_RATING) } else { 0 },
            review: if finished {
                draft.review.trim().to_string()
            } else {
                String::new()
            },
            goodreads_url: String::new(),
            cover_url: String::new(),
            description: String::new(),
            created_at: Utc::now().timestamp_millis(),
        };
        apply_metadata(&mut book, metadata, &author);

        let mut next = self.books.clone();
        next.push(book.clone());
        self.commit(next)?;
        log::info!("added book id={} title=\"{}\"", book.id, book.title);
        Ok(book)
    }

    fn apply_update(&mut self, id: &str, patch: BookPatch) -> Result<Book> {
        let index = self
            .books
            .iter()
            .position(|book| book.id == id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        if patch
            .title
            .as_deref()
            .map(|title| title.trim().is_empty())
            .unwrap_or(false)
        {
            return Err(EngineError::title_required());
        }

        let current = &self.books[index];
        let title = patch
            .title
            .as_deref()
            .map(str::trim)
            .unwrap_or(&current.title)
            .to_string();
        let author = patch
            .author
            .as_deref()
            .map(str::trim)
            .unwrap_or(&current.author)
            .to_string();
        let metadata = if title != current.title || author != current.author {
            Some(self.enricher.enrich(&title, &author))
        } else {
            None
        };

        let mut next = self.books.clone();
        let book = &mut next[index];
        apply_patch(book, patch);
        if let Some(metadata) = metadata {
            apply_metadata(book, metadata, &author);
        }
        let updated = book.clone();
        self.commit(next)?;
        log::info!("updated book id={}", id);
        Ok(updated)
    }

    /// Applies `edit` to a copy of the record and commits it.
    fn edit_record<F>(&mut self, id: &str, edit: F) -> Result<Book>
    where
        F: FnOnce(&mut Book),
    {
        let mut next = self.books.clone();
        let book = next
            .iter_mut()
            .find(|book| book.id == id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))?;
        edit(book);
        let updated = book.clone();
        self.commit(next)?;
        Ok(updated)
    }

    /// Persists `next` and only then makes it the live collection.
    fn commit(&mut self, next: Vec<Book>) -> Result<()> {
        self.storage.save(&next)?;
        self.books = next;
        Ok(())
    }

    fn new_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn transition<F>(&mut self, step: F)
    where
        F: FnOnce(Session) -> Session,
    {
        let current = std::mem::take(&mut self.session);
        self.session = step(current);
    }

    fn notify(&self) {
        let state = self.state();
        for listener in &self.listeners {
            listener(&state);
        }
    }
}

/// Enrichment wins for author; the local author is kept only when none came back.
fn apply_metadata(book: &mut Book, metadata: Metadata, local_author: &str) {
    book.author = metadata
        .author
        .unwrap_or_else(|| local_author.to_string());
    book.cover_url = metadata.cover_url.unwrap_or_default();
    book.description = metadata.description.unwrap_or_default();
    book.goodreads_url = metadata.goodreads_url;
}

fn apply_patch(book: &mut Book, patch: BookPatch) {
    if let Some(title) = patch.title {
        book.title = title.trim().to_string();
    }
    if let Some(author) = patch.author {
        book.author = author.trim().to_string();
    }
    if let Some(genre) = patch.genre {
        book.genre = genre.trim().to_string();
    }
    if let Some(status) = patch.status {
        book.status = status;
    }
    if let Some(notes) = patch.notes {
        book.notes = notes.trim().to_string();
    }
    if let Some(priority) = patch.priority {
        book.priority = priority;
    }
    // rating and review only land on finished records; leaving finished keeps them
    if book.is_finished() {
        if let Some(rating) = patch.rating {
            book.rating = rating.min(MAX_RATING);
        }
        if let Some(review) = patch.review {
            book.review = review.trim().to_string();
        }
    }
}
