// ── Notification mirror ──
//
// Local, possibly stale copy of the server's notification list plus a
// derived unread counter. Plain data: the store wraps it in a `watch`
// channel and is the only writer.

use indexmap::IndexMap;

use crmsync_api::Notification;

/// Ordered, id-unique notification list with an unread counter.
///
/// Invariant: `unread_count == items.filter(|n| !n.read).count()` after
/// every operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationMirror {
    items: IndexMap<i64, Notification>,
    unread_count: usize,
}

impl NotificationMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mirror from a server listing. See [`replace`](Self::replace).
    pub fn from_items(items: impl IntoIterator<Item = Notification>) -> Self {
        let mut mirror = Self::new();
        mirror.replace(items);
        mirror
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.unread_count
    }

    pub fn get(&self, id: i64) -> Option<&Notification> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.items.contains_key(&id)
    }

    /// Items in display order (most recently added first, then server order).
    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.values()
    }

    pub fn to_vec(&self) -> Vec<Notification> {
        self.items.values().cloned().collect()
    }

    pub fn ids(&self) -> Vec<i64> {
        self.items.keys().copied().collect()
    }

    // ── Mutations ────────────────────────────────────────────────────

    /// Replace everything with a fresh server listing.
    ///
    /// Server order is kept. If the listing repeats an id, the first
    /// occurrence wins.
    pub fn replace(&mut self, items: impl IntoIterator<Item = Notification>) {
        self.items.clear();
        for item in items {
            self.items.entry(item.id).or_insert(item);
        }
        self.unread_count = self.items.values().filter(|n| !n.read).count();
        self.debug_check();
    }

    /// Flag one item read. Returns `true` if an unread item was flipped.
    ///
    /// A missing or already-read id leaves the mirror untouched.
    pub fn mark_read(&mut self, id: i64) -> bool {
        let Some(item) = self.items.get_mut(&id) else {
            return false;
        };
        if item.read {
            return false;
        }
        item.read = true;
        self.unread_count = self.unread_count.saturating_sub(1);
        self.debug_check();
        true
    }

    /// Flag every item read. Returns how many were flipped.
    pub fn mark_all_read(&mut self) -> usize {
        let flipped = self.unread_count;
        for item in self.items.values_mut() {
            item.read = true;
        }
        self.unread_count = 0;
        self.debug_check();
        flipped
    }

    /// Put a notification at the front.
    ///
    /// An existing entry with the same id is dropped first, so the
    /// counter never double-counts it.
    pub fn add(&mut self, notification: Notification) {
        if let Some(previous) = self.items.shift_remove(&notification.id) {
            if !previous.read {
                self.unread_count = self.unread_count.saturating_sub(1);
            }
        }
        if !notification.read {
            self.unread_count += 1;
        }
        self.items.shift_insert(0, notification.id, notification);
        self.debug_check();
    }

    /// Remove by id, returning the removed item. Unknown ids are a no-op.
    pub fn remove(&mut self, id: i64) -> Option<Notification> {
        let removed = self.items.shift_remove(&id)?;
        if !removed.read {
            self.unread_count = self.unread_count.saturating_sub(1);
        }
        self.debug_check();
        Some(removed)
    }

    fn debug_check(&self) {
        debug_assert_eq!(
            self.unread_count,
            self.items.values().filter(|n| !n.read).count(),
            "unread counter drifted from items"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn note(id: i64, read: bool) -> Notification {
        Notification {
            id,
            user_id: 1,
            kind: "in_app".into(),
            title: format!("n{id}"),
            content: String::new(),
            read,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            delivered_at: None,
        }
    }

    fn actual_unread(m: &NotificationMirror) -> usize {
        m.iter().filter(|n| !n.read).count()
    }

    #[test]
    fn replace_counts_unread() {
        let m = NotificationMirror::from_items([note(1, false), note(2, true)]);
        assert_eq!(m.len(), 2);
        assert_eq!(m.unread_count(), 1);
    }

    #[test]
    fn replace_discards_previous_contents() {
        let mut m = NotificationMirror::from_items([note(1, false), note(2, false)]);
        m.add(note(9, false));

        m.replace([note(3, true), note(4, false), note(5, false)]);

        assert_eq!(m.ids(), vec![3, 4, 5]);
        assert_eq!(m.unread_count(), 2);
    }

    #[test]
    fn replace_keeps_first_of_duplicate_ids() {
        let m = NotificationMirror::from_items([note(1, false), note(1, true)]);
        assert_eq!(m.len(), 1);
        assert!(!m.get(1).unwrap().read);
        assert_eq!(m.unread_count(), 1);
    }

    #[test]
    fn mark_read_then_again_is_noop() {
        let mut m = NotificationMirror::from_items([note(1, false), note(2, true)]);

        assert!(m.mark_read(1));
        assert!(m.get(1).unwrap().read);
        assert_eq!(m.unread_count(), 0);

        assert!(!m.mark_read(1));
        assert_eq!(m.unread_count(), 0);
    }

    #[test]
    fn mark_read_unknown_id_is_noop() {
        let mut m = NotificationMirror::from_items([note(1, false)]);
        let before = m.clone();
        assert!(!m.mark_read(404));
        assert_eq!(m, before);
    }

    #[test]
    fn mark_all_read_is_idempotent() {
        let mut m = NotificationMirror::from_items([note(1, false), note(2, false), note(3, true)]);

        assert_eq!(m.mark_all_read(), 2);
        assert_eq!(m.mark_all_read(), 0);

        assert_eq!(m.unread_count(), 0);
        assert!(m.iter().all(|n| n.read));
    }

    #[test]
    fn mark_all_read_after_edits_keeps_counter_exact() {
        let mut m = NotificationMirror::from_items([note(1, false), note(2, true)]);
        m.add(note(3, false));
        m.add(note(2, false));
        m.remove(1);
        assert_eq!(m.unread_count(), 2);

        assert_eq!(m.mark_all_read(), 2);
        assert_eq!(m.unread_count(), actual_unread(&m));

        m.add(note(4, false));
        assert_eq!(m.unread_count(), 1);
        assert_eq!(m.unread_count(), actual_unread(&m));
    }

    #[test]
    fn add_prepends_and_counts_unread() {
        let mut m = NotificationMirror::from_items([note(1, true), note(2, true)]);
        m.add(note(3, false));

        assert_eq!(m.ids(), vec![3, 1, 2]);
        assert_eq!(m.unread_count(), 1);

        m.add(note(4, true));
        assert_eq!(m.ids(), vec![4, 3, 1, 2]);
        assert_eq!(m.unread_count(), 1);
    }

    #[test]
    fn add_existing_id_moves_it_to_front_without_double_count() {
        let mut m = NotificationMirror::from_items([note(1, false), note(2, false)]);
        m.add(note(2, false));

        assert_eq!(m.ids(), vec![2, 1]);
        assert_eq!(m.unread_count(), 2);

        m.add(note(2, true));
        assert_eq!(m.unread_count(), 1);
    }

    #[test]
    fn remove_unread_decrements() {
        let mut m = NotificationMirror::from_items([note(1, false), note(2, true)]);

        assert_eq!(m.remove(2).unwrap().id, 2);
        assert_eq!(m.unread_count(), 1);

        assert_eq!(m.remove(1).unwrap().id, 1);
        assert_eq!(m.unread_count(), 0);
        assert!(m.is_empty());
    }

    #[test]
    fn remove_unknown_id_leaves_everything() {
        let mut m = NotificationMirror::from_items([note(1, false), note(2, true)]);
        let before = m.clone();
        assert!(m.remove(99).is_none());
        assert_eq!(m, before);
    }

    #[test]
    fn counter_matches_items_across_mixed_sequence() {
        let mut m = NotificationMirror::new();
        let steps: Vec<Box<dyn Fn(&mut NotificationMirror)>> = vec![
            Box::new(|m| m.replace([note(1, false), note(2, true), note(3, false)])),
            Box::new(|m| {
                m.mark_read(3);
            }),
            Box::new(|m| m.add(note(4, false))),
            Box::new(|m| {
                m.remove(1);
            }),
            Box::new(|m| {
                m.mark_read(99);
            }),
            Box::new(|m| {
                m.remove(99);
            }),
            Box::new(|m| m.add(note(4, true))),
            Box::new(|m| m.add(note(5, false))),
            Box::new(|m| {
                m.mark_all_read();
            }),
            Box::new(|m| m.add(note(6, false))),
            Box::new(|m| {
                m.remove(6);
            }),
            Box::new(|m| {
                m.remove(6);
            }),
        ];

        for step in steps {
            step(&mut m);
            assert_eq!(m.unread_count(), actual_unread(&m));
        }
        assert_eq!(m.unread_count(), 0);
    }
}
