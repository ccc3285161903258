use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::utils::tentative::Tentative;

type Key = (u64, NaiveDate);

#[derive(Debug)]
struct Entry {
    count: Tentative<u32>,
    /// False until the store's count has been seen for this key.
    seeded: bool,
}

impl Entry {
    fn unseeded() -> Self {
        Self {
            count: Tentative::new(0),
            seeded: false,
        }
    }
}

/// Per-site daily check-in counts shown to managers.
///
/// Counts are optimistic: a check-in bumps the overlay before the insert,
/// then the overlay is replaced by the store's count or discarded. Nothing
/// here is consulted when deciding whether a worker may check in.
#[derive(Debug, Default)]
pub struct HeadcountBoard {
    counts: Mutex<HashMap<Key, Entry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct HeadcountSnapshot {
    #[schema(example = 1)]
    pub site_id: u64,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub work_date: NaiveDate,
    #[schema(example = 12)]
    pub confirmed: u32,
    #[schema(example = 13)]
    pub current: u32,
    pub pending: bool,
}

impl HeadcountBoard {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, Entry>> {
        // counts are display-only; a panic mid-update leaves them usable
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Marks one check-in as in flight.
    pub fn begin(&self, site_id: u64, work_date: NaiveDate) {
        let mut counts = self.lock();
        if !counts.contains_key(&(site_id, work_date)) {
            counts.retain(|(_, date), _| *date >= work_date);
        }
        let entry = counts
            .entry((site_id, work_date))
            .or_insert_with(Entry::unseeded);
        let next = entry.count.current().saturating_add(1);
        entry.count.propose(next);
    }

    /// Replaces the overlay with the store's count.
    pub fn reconcile(&self, site_id: u64, work_date: NaiveDate, server_count: u32) {
        let mut counts = self.lock();
        let entry = counts
            .entry((site_id, work_date))
            .or_insert_with(Entry::unseeded);
        entry.count.reconcile(server_count);
        entry.seeded = true;
    }

    /// Drops the in-flight increment. An entry the store never confirmed is
    /// removed so the next read seeds it again.
    pub fn rollback(&self, site_id: u64, work_date: NaiveDate) {
        let mut counts = self.lock();
        let key = (site_id, work_date);
        match counts.get_mut(&key) {
            Some(entry) if entry.seeded => entry.count.rollback(),
            Some(_) => {
                counts.remove(&key);
            }
            None => {}
        }
    }

    /// True while a check-in for this key is between `begin` and its outcome.
    pub fn is_pending(&self, site_id: u64, work_date: NaiveDate) -> bool {
        self.lock()
            .get(&(site_id, work_date))
            .is_some_and(|entry| entry.count.is_pending())
    }

    /// Counts backed by at least one store read; `None` otherwise.
    pub fn snapshot(&self, site_id: u64, work_date: NaiveDate) -> Option<HeadcountSnapshot> {
        self.lock()
            .get(&(site_id, work_date))
            .filter(|entry| entry.seeded)
            .map(|entry| HeadcountSnapshot {
                site_id,
                work_date,
                confirmed: *entry.count.confirmed(),
                current: *entry.count.current(),
                pending: entry.count.is_pending(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn begin_shows_pending_increment() {
        let board = HeadcountBoard::new();
        board.reconcile(1, day(5), 4);
        board.begin(1, day(5));

        let snap = board.snapshot(1, day(5)).unwrap();
        assert_eq!((snap.confirmed, snap.current, snap.pending), (4, 5, true));
    }

    #[test]
    fn reconcile_replaces_overlay_with_server_count() {
        let board = HeadcountBoard::new();
        board.begin(1, day(5));
        board.reconcile(1, day(5), 7);

        let snap = board.snapshot(1, day(5)).unwrap();
        assert_eq!((snap.confirmed, snap.current, snap.pending), (7, 7, false));
    }

    #[test]
    fn rollback_discards_failed_increment() {
        let board = HeadcountBoard::new();
        board.reconcile(1, day(5), 2);
        board.begin(1, day(5));
        board.rollback(1, day(5));

        let snap = board.snapshot(1, day(5)).unwrap();
        assert_eq!((snap.confirmed, snap.current, snap.pending), (2, 2, false));
    }

    #[test]
    fn new_day_prunes_previous_days() {
        let board = HeadcountBoard::new();
        board.reconcile(1, day(4), 9);
        board.begin(2, day(5));

        assert!(board.snapshot(1, day(4)).is_none());
        assert!(board.is_pending(2, day(5)));
    }

    #[test]
    fn unconfirmed_increment_is_not_reported() {
        let board = HeadcountBoard::new();
        board.begin(1, day(5));

        assert!(board.is_pending(1, day(5)));
        assert!(board.snapshot(1, day(5)).is_none());
    }

    #[test]
    fn rollback_before_any_store_read_forgets_the_entry() {
        let board = HeadcountBoard::new();
        board.begin(1, day(5));
        board.rollback(1, day(5));

        assert!(!board.is_pending(1, day(5)));
        assert!(board.snapshot(1, day(5)).is_none());

        board.reconcile(1, day(5), 25);
        let snap = board.snapshot(1, day(5)).unwrap();
        assert_eq!((snap.confirmed, snap.current), (25, 25));
    }

    #[test]
    fn unknown_site_has_no_snapshot() {
        assert!(HeadcountBoard::new().snapshot(99, day(5)).is_none());
    }
}
