use crate::models::Book;

/// Moves `moved_id` to sit immediately before `target_id`. The target index
/// is looked up after the removal. Returns false when nothing moved.
pub fn move_before(books: &mut Vec<Book>, moved_id: &str, target_id: &str) -> bool {
    if moved_id == target_id {
        return false;
    }
    let Some(from) = position(books, moved_id) else {
        return false;
    };
    if position(books, target_id).is_none() {
        return false;
    }

    let entry = books.remove(from);
    let to = position(books, target_id).unwrap_or(books.len());
    books.insert(to, entry);
    true
}

pub fn move_to_end(books: &mut Vec<Book>, moved_id: &str) -> bool {
    let Some(from) = position(books, moved_id) else {
        return false;
    };
    let entry = books.remove(from);
    books.push(entry);
    true
}

fn position(books: &[Book], id: &str) -> Option<usize> {
    books.iter().position(|book| book.id == id)
}

#[cfg(test)]
mod tests {
    use super::{move_before, move_to_end};
    use crate::models::{Book, BookStatus};
    use crate::view::compute_stats;

    fn books(ids: &[&str]) -> Vec<Book> {
        ids.iter()
            .enumerate()
            .map(|(index, id)| Book {
                id: id.to_string(),
                title: id.to_uppercase(),
                author: String::new(),
                genre: String::new(),
                status: if index % 2 == 0 {
                    BookStatus::Reading
                } else {
                    BookStatus::Queued
                },
                notes: String::new(),
                priority: 0,
                rating: 0,
                review: String::new(),
                goodreads_url: String::new(),
                cover_url: String::new(),
                description: String::new(),
                created_at: index as i64,
            })
            .collect()
    }

    fn ids(books: &[Book]) -> Vec<&str> {
        books.iter().map(|book| book.id.as_str()).collect()
    }

    #[test]
    fn moving_down_lands_before_target() {
        let mut list = books(&["a", "b", "c", "d"]);
        assert!(move_before(&mut list, "a", "c"));
        assert_eq!(ids(&list), vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn moving_up_lands_before_target() {
        let mut list = books(&["a", "b", "c", "d"]);
        assert!(move_before(&mut list, "d", "b"));
        assert_eq!(ids(&list), vec!["a", "d", "b", "c"]);
    }

    #[test]
    fn adjacent_swap_round_trips() {
        let mut list = books(&["a", "b", "c"]);
        move_before(&mut list, "b", "a");
        assert_eq!(ids(&list), vec!["b", "a", "c"]);
        move_before(&mut list, "a", "b");
        assert_eq!(ids(&list), vec!["a", "b", "c"]);
    }

    #[test]
    fn unknown_or_same_ids_are_no_ops() {
        let mut list = books(&["a", "b"]);
        assert!(!move_before(&mut list, "a", "a"));
        assert!(!move_before(&mut list, "x", "a"));
        assert!(!move_before(&mut list, "a", "x"));
        assert!(!move_to_end(&mut list, "x"));
        assert_eq!(ids(&list), vec!["a", "b"]);
    }

    #[test]
    fn move_to_end_appends() {
        let mut list = books(&["a", "b", "c"]);
        assert!(move_to_end(&mut list, "a"));
        assert_eq!(ids(&list), vec!["b", "c", "a"]);
    }

    #[test]
    fn reordering_preserves_members_and_stats() {
        let mut list = books(&["a", "b", "c", "d", "e"]);
        let before = compute_stats(&list);
        let mut expected: Vec<String> = list.iter().map(|book| book.id.clone()).collect();

        for (moved, target) in [("e", "a"), ("b", "d"), ("a", "e"), ("c", "b")] {
            move_before(&mut list, moved, target);
        }
        move_to_end(&mut list, "d");

        let mut actual: Vec<String> = list.iter().map(|book| book.id.clone()).collect();
        expected.sort();
        actual.sort();
        assert_eq!(actual, expected);
        assert_eq!(compute_stats(&list), before);
    }
}
