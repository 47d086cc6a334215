//! Per-entry counter record shared between the cache and its auxiliary index.

use std::sync::atomic::{AtomicU32, Ordering};

/// Reference-count record attached to one cache entry.
///
/// Carries the entry's creation sequence number and its live use count.
/// The record is shared (via `Arc`) between the entry in the primary map
/// and the row in the auxiliary map, so retention can inspect usage
/// without locking the primary map.
///
/// Count arithmetic is relaxed: visibility of new records is established
/// by the map locks, not by these atomics.
#[derive(Debug)]
pub(crate) struct EntryCount {
    sequence_number: u64,
    use_count: AtomicU32,
}

impl EntryCount {
    /// Creates a record with the given sequence number and a zero use count.
    pub(crate) fn new(sequence_number: u64) -> Self {
        Self {
            sequence_number,
            use_count: AtomicU32::new(0),
        }
    }

    /// Sequence number assigned at entry creation.
    #[inline]
    pub(crate) fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Adds one unit of use.
    #[inline]
    pub(crate) fn inc(&self) {
        self.use_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Releases one unit of use.
    #[inline]
    pub(crate) fn dec(&self) {
        self.use_count.fetch_sub(1, Ordering::Relaxed);
    }

    /// Current use count. Advisory under concurrency.
    #[inline]
    pub(crate) fn load(&self) -> u32 {
        self.use_count.load(Ordering::Relaxed)
    }
}
