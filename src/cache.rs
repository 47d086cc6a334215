//! Concurrent reference-counted cache.
//!
//! ## Architecture
//!
//! ```text
//!                      ┌──────────────────────────────────────────┐
//!                      │        ConcurrentCache<K, V, S>          │
//!                      │                                          │
//!   insert_or_get ───► │  entries: StripedMap<K, Arc<CacheEntry>> │ ◄─── get
//!                      │  counts:  StripedMap<K, Arc<EntryCount>> │ ◄─── get_supporting,
//!                      │  next_sequence: AtomicU64                │      drop_unused*
//!                      └──────────────────────────────────────────┘
//! ```
//!
//! The primary map (`entries`) owns the values; the auxiliary map
//! (`counts`) carries one row per key pointing at the same shared counter
//! record as the entry. Retention and support lookups traverse the
//! auxiliary map only, so they never contend with readers and writers
//! working other keys in the primary map.
//!
//! ## Key Concepts
//!
//! - **Pinning**: every operation that finds an entry returns a
//!   [`CacheHandle`] built while the key's primary shard guard is still
//!   held, so the handle's use-count increment is ordered before any
//!   retention re-check of that count.
//! - **Retention**: [`drop_unused_keeping_last`] snapshots unused rows
//!   from the auxiliary map, sorts them newest-first by sequence number,
//!   and removes the surplus from the primary map. Removal re-checks the
//!   count under the key's shard write lock and skips entries that were
//!   re-pinned after the snapshot.
//! - **Orphans**: evicting a key leaves its auxiliary row behind; the row
//!   is overwritten if the key is inserted again and reclaimed only by
//!   [`compact`], which requires exclusive access.
//!
//! ## Concurrency
//!
//! All operations except [`compact`] take `&self` and may run from any
//! thread. Lock order is primary shard → auxiliary shard (insertion
//! publishes the counter row while holding the primary guard); auxiliary
//! scans release their guards before touching primary shards, so the two
//! maps cannot deadlock.
//!
//! ## Example Usage
//!
//! ```
//! use pincache::cache::ConcurrentCache;
//!
//! let ages: ConcurrentCache<String, i32> = ConcurrentCache::new();
//!
//! let handle = ages.insert_or_get("Alice".to_string(), 97);
//! assert_eq!(handle.value(), Ok(&97));
//!
//! // A second insert under the same key keeps the first value.
//! let again = ages.insert_or_get("Alice".to_string(), 0);
//! assert_eq!(again.value(), Ok(&97));
//! assert_eq!(ages.len(), 1);
//!
//! drop(handle);
//! drop(again);
//! ages.drop_unused();
//! assert!(ages.is_empty());
//! ```
//!
//! [`drop_unused_keeping_last`]: ConcurrentCache::drop_unused_keeping_last
//! [`compact`]: ConcurrentCache::compact

use std::collections::hash_map;
use std::fmt;
use std::hash::{BuildHasher, BuildHasherDefault, Hash};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHasher;

use crate::count::EntryCount;
use crate::ds::StripedMap;
use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::handle::CacheHandle;
use crate::support::Supports;

/// Default hasher for cache keys, same hasher the shard selection uses.
pub type DefaultHashBuilder = BuildHasherDefault<FxHasher>;

/// Shard count used by [`ConcurrentCache::new`]: one shard per available
/// core, falling back to a single shard.
fn default_shard_count() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(1)
}

/// Concurrent map from keys to immutable, reference-counted values.
///
/// Values are inserted once and never replaced or mutated; they leave the
/// cache only through the retention operations, and never while a
/// [`CacheHandle`] pins them. See the module docs for the architecture.
pub struct ConcurrentCache<K, V, S = DefaultHashBuilder> {
    entries: StripedMap<K, Arc<CacheEntry<V>>, S>,
    counts: StripedMap<K, Arc<EntryCount>, S>,
    next_sequence: AtomicU64,
}

impl<K, V> ConcurrentCache<K, V, DefaultHashBuilder>
where
    K: Eq + Hash + Clone,
{
    /// Creates a cache with the default hasher and one shard per
    /// available core.
    pub fn new() -> Self {
        Self::with_shards_and_hasher(default_shard_count(), DefaultHashBuilder::default())
    }

    /// Creates a cache with the default hasher and an explicit shard
    /// count (clamped to at least 1).
    pub fn with_shards(shards: usize) -> Self {
        Self::with_shards_and_hasher(shards, DefaultHashBuilder::default())
    }
}

impl<K, V> Default for ConcurrentCache<K, V, DefaultHashBuilder>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> ConcurrentCache<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher + Clone,
{
    /// Creates a cache with a custom hasher.
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_shards_and_hasher(default_shard_count(), hasher)
    }

    /// Creates a cache with a custom hasher and shard count (clamped to
    /// at least 1). Both internal maps use the same configuration.
    pub fn with_shards_and_hasher(shards: usize, hasher: S) -> Self {
        Self {
            entries: StripedMap::with_shards_and_hasher(shards, hasher.clone()),
            counts: StripedMap::with_shards_and_hasher(shards, hasher),
            next_sequence: AtomicU64::new(0),
        }
    }

    /// Inserts `value` under `key`, or finds the entry already stored
    /// there, and returns a handle pinning it.
    ///
    /// The insertion is atomic per key: of any number of concurrent
    /// callers with the same key, exactly one caller's value is stored
    /// and every caller receives a handle to that single entry. A losing
    /// caller's `value` is dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use pincache::cache::ConcurrentCache;
    ///
    /// let cache: ConcurrentCache<&str, i32> = ConcurrentCache::new();
    /// let first = cache.insert_or_get("k", 1);
    /// let second = cache.insert_or_get("k", 2);
    /// assert_eq!(second.value(), Ok(&1));
    /// assert_eq!(cache.len(), 1);
    /// ```
    pub fn insert_or_get(&self, key: K, value: V) -> CacheHandle<V> {
        let mut entries = self.entries.shard(&key).write();
        match entries.entry(key) {
            hash_map::Entry::Occupied(occupied) => {
                // Pin the existing entry while the shard guard is held.
                CacheHandle::from_entry(Arc::clone(occupied.get()))
            },
            hash_map::Entry::Vacant(vacant) => {
                let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
                let count = Arc::new(EntryCount::new(sequence));
                let entry = Arc::new(CacheEntry::new(value, Arc::clone(&count)));

                let key_for_row = vacant.key().clone();
                vacant.insert(Arc::clone(&entry));
                // Publish the counter row while the primary guard is still
                // held; an existing orphan row for this key is overwritten.
                self.counts.insert(key_for_row, count);

                CacheHandle::from_entry(entry)
            },
        }
    }

    /// Looks up `key` and returns a handle pinning the entry, or an
    /// invalid handle on a miss.
    ///
    /// # Example
    ///
    /// ```
    /// use pincache::cache::ConcurrentCache;
    ///
    /// let cache: ConcurrentCache<&str, i32> = ConcurrentCache::new();
    /// assert!(!cache.get(&"missing").is_valid());
    ///
    /// let _pin = cache.insert_or_get("present", 5);
    /// assert_eq!(cache.get(&"present").value(), Ok(&5));
    /// ```
    pub fn get(&self, key: &K) -> CacheHandle<V> {
        let entries = self.entries.shard(key).read();
        match entries.get(key) {
            Some(entry) => CacheHandle::from_entry(Arc::clone(entry)),
            None => CacheHandle::invalid(),
        }
    }

    /// Finds the entry whose key supports `probe`.
    ///
    /// Scans the auxiliary map for keys accepting the probe. No match
    /// yields an invalid handle; exactly one match defers to [`get`];
    /// several matches fail with [`CacheError::AmbiguousSupport`], since
    /// the caller contract is that at most one live key supports any
    /// probed value.
    ///
    /// Auxiliary rows orphaned by eviction still participate in the scan
    /// until [`compact`] reclaims them; a sole orphaned match resolves to
    /// an invalid handle.
    ///
    /// [`get`]: ConcurrentCache::get
    /// [`compact`]: ConcurrentCache::compact
    pub fn get_supporting<P>(&self, probe: &P) -> Result<CacheHandle<V>, CacheError>
    where
        K: Supports<P>,
    {
        let mut matches = Vec::new();
        for shard in self.counts.shards() {
            let rows = shard.read();
            for key in rows.keys() {
                if key.supports(probe) {
                    matches.push(key.clone());
                }
            }
        }

        match matches.as_slice() {
            [] => Ok(CacheHandle::invalid()),
            [key] => Ok(self.get(key)),
            _ => Err(CacheError::AmbiguousSupport {
                matches: matches.len(),
            }),
        }
    }

    /// Removes every entry whose use count is zero.
    ///
    /// Equivalent to `drop_unused_keeping_last(0)`.
    pub fn drop_unused(&self) {
        self.drop_unused_keeping_last(0);
    }

    /// Removes unused entries, retaining the `keep` most recently created
    /// among them.
    ///
    /// Unused rows are snapshotted from the auxiliary map and ordered
    /// newest-first by sequence number. The snapshot is advisory: a
    /// concurrent [`get`] may pin an entry after it was seen at zero, so
    /// each removal re-checks the count under the key's primary shard
    /// write lock and skips entries that are pinned again.
    ///
    /// # Example
    ///
    /// ```
    /// use pincache::cache::ConcurrentCache;
    ///
    /// let cache: ConcurrentCache<&str, i32> = ConcurrentCache::new();
    /// cache.insert_or_get("a", 1);
    /// cache.insert_or_get("b", 2);
    /// cache.insert_or_get("c", 3);
    ///
    /// cache.drop_unused_keeping_last(1);
    /// assert_eq!(cache.len(), 1);
    /// assert!(cache.get(&"c").is_valid());
    /// ```
    ///
    /// [`get`]: ConcurrentCache::get
    pub fn drop_unused_keeping_last(&self, keep: usize) {
        let mut unused = self.unused_entries();
        unused.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        if unused.len() <= keep {
            return;
        }
        for (_, key) in unused.drain(keep..) {
            self.remove_if_unused(&key);
        }
    }

    /// Drops unused entries and rebuilds the auxiliary map from the live
    /// primary map, reclaiming orphan rows.
    ///
    /// This is the only operation that shrinks the auxiliary map, and the
    /// only one that demands exclusive access; `&mut self` enforces that
    /// at compile time.
    pub fn compact(&mut self) {
        self.drop_unused();
        self.counts.clear();
        for shard in self.entries.shards() {
            let entries = shard.read();
            for (key, entry) in entries.iter() {
                self.counts.insert(key.clone(), Arc::clone(entry.count()));
            }
        }
    }

    /// Number of entries in the cache. Advisory under concurrency.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries. Advisory under concurrency.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of auxiliary rows, live and orphaned. Always at least
    /// [`len`]; the difference measures rows reclaimable by [`compact`].
    ///
    /// [`len`]: ConcurrentCache::len
    /// [`compact`]: ConcurrentCache::compact
    pub fn capacity(&self) -> usize {
        self.counts.len()
    }

    /// Snapshot of `(sequence_number, key)` for every auxiliary row whose
    /// count reads zero. Shard guards are released before returning, so
    /// callers may lock primary shards afterwards.
    fn unused_entries(&self) -> Vec<(u64, K)> {
        let mut unused = Vec::new();
        for shard in self.counts.shards() {
            let rows = shard.read();
            for (key, count) in rows.iter() {
                if count.load() == 0 {
                    unused.push((count.sequence_number(), key.clone()));
                }
            }
        }
        unused
    }

    /// Removes `key` from the primary map if its entry is still unused
    /// at the moment the shard write lock is held. Returns whether the
    /// entry was removed.
    fn remove_if_unused(&self, key: &K) -> bool {
        let mut entries = self.entries.shard(key).write();
        let still_unused = entries
            .get(key)
            .is_some_and(|entry| entry.use_count() == 0);
        if still_unused {
            entries.remove(key);
        }
        still_unused
    }
}

impl<K, V, S> fmt::Debug for ConcurrentCache<K, V, S>
where
    K: Eq + Hash + Clone,
    S: BuildHasher + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
