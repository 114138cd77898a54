//! Ordered collections of board items.
//!
//! Columns within a board and tasks within a column both carry a persisted
//! `order` field. After every reconciliation the field must equal the item's
//! position: zero-based, contiguous, no duplicates.

/// An item whose position among its siblings is persisted as an integer.
pub trait Ordered: Clone {
    type Id: PartialEq + Clone;

    fn item_id(&self) -> &Self::Id;

    fn order(&self) -> u32;

    fn set_order(&mut self, order: u32);
}

/// Moves the item at `from` to `to`, shifting the items in between by one.
///
/// Returns a new sequence in which every `order` field matches its index.
/// The input is never modified, so callers can diff or roll back against it.
/// `from == to` and out-of-range indices keep the arrangement and only
/// re-stamp the copy.
///
/// # Examples
/// ```
/// use kanban_core::domain::ordering::{move_item, Ordered};
/// use kanban_core::domain::{Column, ColumnColor, ColumnId};
///
/// let columns: Vec<Column> = ["a", "b", "c"]
///     .iter()
///     .enumerate()
///     .map(|(i, id)| {
///         let mut column = Column::new(ColumnId::new(*id), id.to_string(), ColumnColor::Sky);
///         column.set_order(i as u32);
///         column
///     })
///     .collect();
///
/// let moved = move_item(&columns, 2, 0);
/// let ids: Vec<&str> = moved.iter().map(|c| c.id.as_str()).collect();
/// assert_eq!(ids, vec!["c", "a", "b"]);
/// assert_eq!(moved[0].order, 0);
/// ```
pub fn move_item<T: Ordered>(items: &[T], from: usize, to: usize) -> Vec<T> {
    let mut moved = items.to_vec();
    if from != to && from < moved.len() && to < moved.len() {
        let item = moved.remove(from);
        moved.insert(to, item);
    }
    restamp(&mut moved);
    moved
}

/// Rewrites every `order` field to match the item's index
pub fn restamp<T: Ordered>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_order(index as u32);
    }
}

/// Checks that `order` values are exactly `0..len` in position
pub fn is_dense<T: Ordered>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(index, item)| item.order() == index as u32)
}

/// Sorts items by their persisted `order`, keeping ties in their current position
pub fn sort_by_order<T: Ordered>(items: &mut [T]) {
    items.sort_by_key(|item| item.order());
}

/// Finds the index of the item with the given id
pub fn position_of<T: Ordered>(items: &[T], id: &T::Id) -> Option<usize> {
    items.iter().position(|item| item.item_id() == id)
}

/// Collects item ids in sequence order
pub fn ids_of<T: Ordered>(items: &[T]) -> Vec<T::Id> {
    items.iter().map(|item| item.item_id().clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: &'static str,
        order: u32,
    }

    impl Ordered for Item {
        type Id = &'static str;

        fn item_id(&self) -> &Self::Id {
            &self.id
        }

        fn order(&self) -> u32 {
            self.order
        }

        fn set_order(&mut self, order: u32) {
            self.order = order;
        }
    }

    fn sequence(ids: &[&'static str]) -> Vec<Item> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| Item {
                id,
                order: i as u32,
            })
            .collect()
    }

    #[test]
    fn test_move_forward() {
        let items = sequence(&["a", "b", "c", "d"]);
        let moved = move_item(&items, 0, 2);
        assert_eq!(ids_of(&moved), vec!["b", "c", "a", "d"]);
        assert!(is_dense(&moved));
    }

    #[test]
    fn test_move_backward() {
        let items = sequence(&["a", "b", "c"]);
        let moved = move_item(&items, 2, 0);
        assert_eq!(ids_of(&moved), vec!["c", "a", "b"]);
        assert_eq!(
            moved.iter().map(|i| i.order).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_move_keeps_length_and_ids_for_every_pair() {
        let items = sequence(&["a", "b", "c", "d", "e"]);
        for from in 0..items.len() {
            for to in 0..items.len() {
                let moved = move_item(&items, from, to);
                assert_eq!(moved.len(), items.len());
                assert!(is_dense(&moved));
                assert_eq!(moved[to].id, items[from].id);

                let mut before = ids_of(&items);
                let mut after = ids_of(&moved);
                before.sort();
                after.sort();
                assert_eq!(before, after);
            }
        }
    }

    #[test]
    fn test_same_index_is_noop() {
        let items = sequence(&["a", "b", "c"]);
        for i in 0..items.len() {
            assert_eq!(move_item(&items, i, i), items);
        }
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let items = sequence(&["a", "b"]);
        assert_eq!(move_item(&items, 5, 0), items);
        assert_eq!(move_item(&items, 0, 2), items);
        assert!(move_item::<Item>(&[], 0, 0).is_empty());
    }

    #[test]
    fn test_out_of_range_still_restamps() {
        let items = vec![
            Item { id: "a", order: 4 },
            Item { id: "b", order: 9 },
        ];
        let moved = move_item(&items, 7, 0);
        assert_eq!(ids_of(&moved), vec!["a", "b"]);
        assert!(is_dense(&moved));
    }

    #[test]
    fn test_input_is_not_modified() {
        let items = sequence(&["a", "b", "c"]);
        let snapshot = items.clone();
        let _ = move_item(&items, 0, 2);
        assert_eq!(items, snapshot);
    }

    #[test]
    fn test_restamp_closes_gaps() {
        let mut items = vec![
            Item { id: "a", order: 3 },
            Item { id: "b", order: 7 },
        ];
        assert!(!is_dense(&items));
        restamp(&mut items);
        assert!(is_dense(&items));
    }

    #[test]
    fn test_sort_by_order() {
        let mut items = vec![
            Item { id: "c", order: 2 },
            Item { id: "a", order: 0 },
            Item { id: "b", order: 1 },
        ];
        sort_by_order(&mut items);
        assert_eq!(ids_of(&items), vec!["a", "b", "c"]);
        assert_eq!(position_of(&items, &"b"), Some(1));
        assert_eq!(position_of(&items, &"z"), None);
    }
}
