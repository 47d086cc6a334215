//! Handles: client-visible tokens that pin cache entries.
//!
//! ## Architecture
//!
//! A [`CacheHandle`] either refers to one cache entry or to nothing. A
//! referring handle has added exactly one unit to its entry's use count;
//! the retention operations on
//! [`ConcurrentCache`](crate::cache::ConcurrentCache) only remove entries
//! whose use count is zero, so a value read through a handle stays in the
//! cache for as long as the handle lives.
//!
//! ## Counting discipline
//!
//! - Construction from an entry and `clone` increment the count.
//! - `invalidate` and `Drop` decrement it (once).
//! - `clone_from` onto a handle that already refers to the same entry
//!   leaves the count untouched. Decrementing and re-incrementing would
//!   open a window in which another thread's retention pass sees the
//!   count at zero and erases the entry.
//! - Reassignment to a different entry increments the incoming entry
//!   before the outgoing one is released, so the count never dips to
//!   zero mid-assignment.
//!
//! ## Example Usage
//!
//! ```
//! use pincache::cache::ConcurrentCache;
//!
//! let cache: ConcurrentCache<String, i32> = ConcurrentCache::new();
//! let handle = cache.insert_or_get("answer".to_string(), 42);
//!
//! assert!(handle.is_valid());
//! assert_eq!(handle.value(), Ok(&42));
//!
//! // The entry survives retention while the handle is alive.
//! cache.drop_unused();
//! assert_eq!(cache.len(), 1);
//!
//! drop(handle);
//! cache.drop_unused();
//! assert!(cache.is_empty());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::entry::CacheEntry;
use crate::error::CacheError;

/// A token granting read access to one cache entry and pinning it against
/// eviction.
///
/// Handles are cheap to clone (one atomic increment plus an `Arc` clone)
/// and may be sent across threads. A default-constructed handle refers to
/// nothing, contributes nothing, and fails dereference with
/// [`CacheError::InvalidHandle`].
pub struct CacheHandle<V> {
    entry: Option<Arc<CacheEntry<V>>>,
}

impl<V> CacheHandle<V> {
    /// Builds a handle pinning `entry`.
    ///
    /// Callers must hold the entry's primary-map shard guard so the
    /// increment is ordered before any retention re-check.
    pub(crate) fn from_entry(entry: Arc<CacheEntry<V>>) -> Self {
        entry.count().inc();
        Self { entry: Some(entry) }
    }

    /// Builds a handle referring to nothing.
    pub(crate) fn invalid() -> Self {
        Self { entry: None }
    }

    /// Whether this handle refers to an entry.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.entry.is_some()
    }

    /// Shared borrow of the pinned value.
    ///
    /// Fails with [`CacheError::InvalidHandle`] on a handle that refers
    /// to nothing.
    pub fn value(&self) -> Result<&V, CacheError> {
        match &self.entry {
            Some(entry) => entry.value(),
            None => Err(CacheError::InvalidHandle),
        }
    }

    /// Shared borrow of the pinned value, or `None` for an invalid handle.
    #[inline]
    pub fn get(&self) -> Option<&V> {
        self.value().ok()
    }

    /// Sequence number of the pinned entry, if any.
    pub fn sequence_number(&self) -> Option<u64> {
        self.entry.as_deref().map(CacheEntry::sequence_number)
    }

    /// Releases the pinned entry, if any. Idempotent.
    ///
    /// After invalidation the handle refers to nothing and the entry
    /// becomes eligible for retention once no other handle pins it.
    pub fn invalidate(&mut self) {
        if let Some(entry) = self.entry.take() {
            entry.count().dec();
        }
    }

    /// Whether `self` and `other` refer to the same entry (or both to
    /// nothing).
    fn same_entry(&self, other: &Self) -> bool {
        match (&self.entry, &other.entry) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<V> Default for CacheHandle<V> {
    /// An invalid handle.
    fn default() -> Self {
        Self::invalid()
    }
}

impl<V> Clone for CacheHandle<V> {
    /// Pins the same entry once more.
    fn clone(&self) -> Self {
        match &self.entry {
            Some(entry) => Self::from_entry(Arc::clone(entry)),
            None => Self::invalid(),
        }
    }

    /// Same-entry assignment leaves the use count untouched; see the
    /// module docs for why this is load-bearing rather than cosmetic.
    fn clone_from(&mut self, source: &Self) {
        if self.same_entry(source) {
            return;
        }
        // Increment the incoming entry first, then release the old one.
        *self = source.clone();
    }
}

impl<V> Drop for CacheHandle<V> {
    fn drop(&mut self) {
        self.invalidate();
    }
}

impl<V> fmt::Debug for CacheHandle<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHandle")
            .field("valid", &self.is_valid())
            .field("sequence_number", &self.sequence_number())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
