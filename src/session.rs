//! Transient, never-persisted UI state.
//!
//! `Session` is a plain value: every transition consumes it and returns the
//! next one, so the engine can hand observers a consistent pair of
//! (collection, session) after each operation.

use std::collections::BTreeSet;

/// At most one review is edited at a time across the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReviewEditor {
    #[default]
    Closed,
    Editing { id: String, draft: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    editing_id: Option<String>,
    review: ReviewEditor,
    expanded: BTreeSet<String>,
    dragging_id: Option<String>,
}

impl Session {
    pub fn editing_id(&self) -> Option<&str> {
        self.editing_id.as_deref()
    }

    pub fn review_editor(&self) -> &ReviewEditor {
        &self.review
    }

    pub fn is_editing_review(&self, id: &str) -> bool {
        matches!(&self.review, ReviewEditor::Editing { id: current, .. } if current == id)
    }

    /// Draft text of the open editor, empty when closed.
    pub fn review_draft(&self) -> &str {
        match &self.review {
            ReviewEditor::Editing { draft, .. } => draft,
            ReviewEditor::Closed => "",
        }
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn expanded_ids(&self) -> impl Iterator<Item = &str> {
        self.expanded.iter().map(String::as_str)
    }

    pub fn dragging_id(&self) -> Option<&str> {
        self.dragging_id.as_deref()
    }

    /// Whether a card should highlight as a drop target for the current drag.
    pub fn drop_target_active(&self, id: &str) -> bool {
        self.dragging_id
            .as_deref()
            .map(|dragged| dragged != id)
            .unwrap_or(false)
    }

    pub fn with_card_toggled(mut self, id: &str) -> Self {
        if !self.expanded.remove(id) {
            self.expanded.insert(id.to_string());
        }
        self
    }

    pub fn with_card_expanded(mut self, id: &str) -> Self {
        self.expanded.insert(id.to_string());
        self
    }

    pub fn with_cards_collapsed(mut self) -> Self {
        self.expanded.clear();
        self
    }

    pub fn with_review_opened(mut self, id: &str, draft: impl Into<String>) -> Self {
        self.review = ReviewEditor::Editing {
            id: id.to_string(),
            draft: draft.into(),
        };
        self
    }

    pub fn with_review_closed(mut self) -> Self {
        self.review = ReviewEditor::Closed;
        self
    }

    /// Ignored while the editor is closed.
    pub fn with_review_draft(mut self, text: impl Into<String>) -> Self {
        if let ReviewEditor::Editing { draft, .. } = &mut self.review {
            *draft = text.into();
        }
        self
    }

    pub fn with_editing(mut self, id: &str) -> Self {
        self.editing_id = Some(id.to_string());
        self
    }

    pub fn without_editing(mut self) -> Self {
        self.editing_id = None;
        self
    }

    pub fn with_drag(mut self, id: &str) -> Self {
        self.dragging_id = Some(id.to_string());
        self
    }

    pub fn without_drag(mut self) -> Self {
        self.dragging_id = None;
        self
    }

    /// Drops every reference to a deleted record.
    pub fn forget(mut self, id: &str) -> Self {
        self.expanded.remove(id);
        if self.editing_id.as_deref() == Some(id) {
            self.editing_id = None;
        }
        if self.is_editing_review(id) {
            self.review = ReviewEditor::Closed;
        }
        if self.dragging_id.as_deref() == Some(id) {
            self.dragging_id = None;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ReviewEditor, Session};

    #[test]
    fn toggling_a_card_twice_collapses_it() {
        let session = Session::default().with_card_toggled("a");
        assert!(session.is_expanded("a"));

        let session = session.with_card_toggled("a");
        assert!(!session.is_expanded("a"));
    }

    #[test]
    fn only_one_review_editor_is_open() {
        let session = Session::default()
            .with_review_opened("a", "first")
            .with_review_opened("b", "second");

        assert!(!session.is_editing_review("a"));
        assert!(session.is_editing_review("b"));
        assert_eq!(session.review_draft(), "second");
    }

    #[test]
    fn draft_updates_are_ignored_when_closed() {
        let session = Session::default().with_review_draft("lost");
        assert_eq!(session.review_editor(), &ReviewEditor::Closed);
        assert_eq!(session.review_draft(), "");
    }

    #[test]
    fn forget_clears_every_reference() {
        let session = Session::default()
            .with_card_expanded("a")
            .with_card_expanded("b")
            .with_editing("a")
            .with_review_opened("a", "draft")
            .with_drag("a")
            .forget("a");

        assert!(!session.is_expanded("a"));
        assert!(session.is_expanded("b"));
        assert_eq!(session.editing_id(), None);
        assert_eq!(session.review_editor(), &ReviewEditor::Closed);
        assert_eq!(session.dragging_id(), None);
    }

    #[test]
    fn forget_leaves_other_records_alone() {
        let session = Session::default()
            .with_review_opened("b", "keep")
            .with_drag("b")
            .forget("a");

        assert!(session.is_editing_review("b"));
        assert_eq!(session.dragging_id(), Some("b"));
    }

    #[test]
    fn drop_target_excludes_dragged_card() {
        let session = Session::default().with_drag("a");
        assert!(!session.drop_target_active("a"));
        assert!(session.drop_target_active("b"));
        assert!(!Session::default().drop_target_active("b"));
    }
}
