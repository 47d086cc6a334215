//! Cache entry: one immutable value plus its counter record.
//!
//! Not user-facing; entries are reached only through
//! [`CacheHandle`](crate::handle::CacheHandle).

use std::sync::Arc;

use crate::count::EntryCount;
use crate::error::CacheError;

/// A stored value together with the counter record that governs its
/// retention.
///
/// The entry owns the value; the counter record is shared with the
/// auxiliary index. The value is never mutated after construction and is
/// exposed only as a shared borrow.
#[derive(Debug)]
pub(crate) struct CacheEntry<V> {
    value: Option<V>,
    count: Arc<EntryCount>,
}

impl<V> CacheEntry<V> {
    /// Creates an entry owning `value`, tied to `count`.
    pub(crate) fn new(value: V, count: Arc<EntryCount>) -> Self {
        Self {
            value: Some(value),
            count,
        }
    }

    /// Creates an entry in the defensive empty state.
    ///
    /// No cache operation produces such an entry; it exists so the
    /// `EmptyEntry` report stays honest.
    #[cfg(test)]
    pub(crate) fn empty(count: Arc<EntryCount>) -> Self {
        Self { value: None, count }
    }

    /// Shared borrow of the stored value.
    pub(crate) fn value(&self) -> Result<&V, CacheError> {
        match &self.value {
            Some(value) => Ok(value),
            None => Err(CacheError::EmptyEntry {
                sequence_number: self.count.sequence_number(),
            }),
        }
    }

    /// The entry's counter record.
    #[inline]
    pub(crate) fn count(&self) -> &Arc<EntryCount> {
        &self.count
    }

    /// Sequence number assigned at creation.
    #[inline]
    pub(crate) fn sequence_number(&self) -> u64 {
        self.count.sequence_number()
    }

    /// Current use count. Advisory under concurrency.
    #[inline]
    pub(crate) fn use_count(&self) -> u32 {
        self.count.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_is_readable() {
        let entry = CacheEntry::new(97, Arc::new(EntryCount::new(0)));
        assert_eq!(entry.value(), Ok(&97));
        assert_eq!(entry.sequence_number(), 0);
        assert_eq!(entry.use_count(), 0);
    }

    #[test]
    fn empty_entry_reports_its_sequence_number() {
        let entry: CacheEntry<i32> = CacheEntry::empty(Arc::new(EntryCount::new(12)));
        assert_eq!(
            entry.value(),
            Err(CacheError::EmptyEntry { sequence_number: 12 })
        );
    }

    #[test]
    fn counter_is_shared_not_copied() {
        let count = Arc::new(EntryCount::new(3));
        let entry = CacheEntry::new("v", count.clone());
        count.inc();
        assert_eq!(entry.use_count(), 1);
    }
}
