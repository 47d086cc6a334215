//! Striped hash map: a fixed array of independently locked shards.
//!
//! ## Architecture
//!
//! ```text
//!   key ──hash──► shard index ──► RwLock<HashMap<K, V>>
//!
//!   ┌─────────┬─────────┬─────────┬─────────┐
//!   │ shard 0 │ shard 1 │ shard 2 │ shard 3 │
//!   │ RwLock  │ RwLock  │ RwLock  │ RwLock  │
//!   └─────────┴─────────┴─────────┴─────────┘
//! ```
//!
//! ## Key Concepts
//!
//! - **Per-shard locking**: writers on keys in different shards never
//!   serialise; readers of one shard share a read guard.
//! - **Guard exposure**: [`StripedMap::shard`] hands back the lock itself,
//!   so callers can keep the guard alive across several steps (the cache
//!   builds handles while the shard guard for the key is still held).
//! - **Weak iteration**: [`StripedMap::shards`] visits shards one at a
//!   time; concurrent mutations in not-yet-visited shards may or may not
//!   be observed. Aggregates such as [`StripedMap::len`] are advisory.
//!
//! ## Implementation Notes
//!
//! - Shard selection is `hash(key) % shard_count` with the map's own
//!   `BuildHasher`; the shard count is clamped to at least 1.
//! - Deterministic: the same key always lands in the same shard.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

use parking_lot::RwLock;

/// Hash map split into independently locked shards.
#[derive(Debug)]
pub(crate) struct StripedMap<K, V, S> {
    shards: Box<[RwLock<HashMap<K, V, S>>]>,
    hasher: S,
}

impl<K, V, S> StripedMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Clone,
{
    /// Creates a map with `shards` shards (clamped to at least 1), all
    /// using clones of `hasher`.
    pub(crate) fn with_shards_and_hasher(shards: usize, hasher: S) -> Self {
        let shard_count = shards.max(1);
        let mut shard_vec = Vec::with_capacity(shard_count);
        for _ in 0..shard_count {
            shard_vec.push(RwLock::new(HashMap::with_hasher(hasher.clone())));
        }
        Self {
            shards: shard_vec.into_boxed_slice(),
            hasher,
        }
    }

    /// The shard holding `key`. Lock it for reading or writing as needed.
    #[inline]
    pub(crate) fn shard(&self, key: &K) -> &RwLock<HashMap<K, V, S>> {
        let index = (self.hasher.hash_one(key) as usize) % self.shards.len();
        &self.shards[index]
    }

    /// Visits every shard, in index order.
    pub(crate) fn shards(&self) -> impl Iterator<Item = &RwLock<HashMap<K, V, S>>> {
        self.shards.iter()
    }

    /// Inserts under the key's shard write guard, returning any previous
    /// value.
    pub(crate) fn insert(&self, key: K, value: V) -> Option<V> {
        self.shard(&key).write().insert(key, value)
    }

    /// Number of entries across all shards. Advisory under concurrency:
    /// shards are counted one at a time.
    pub(crate) fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.read().len()).sum()
    }

    /// Empties every shard.
    ///
    /// All shard write guards are collected before clearing so observers
    /// never see a partially cleared map.
    pub(crate) fn clear(&self) {
        let mut guards: Vec<_> = self.shards.iter().map(|shard| shard.write()).collect();
        for guard in guards.iter_mut() {
            guard.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::BuildHasherDefault;

    use rustc_hash::FxHasher;

    type Map = StripedMap<u64, String, BuildHasherDefault<FxHasher>>;

    fn map_with_shards(shards: usize) -> Map {
        StripedMap::with_shards_and_hasher(shards, Default::default())
    }

    #[test]
    fn insert_and_read_through_shard_guard() {
        let map = map_with_shards(4);
        assert_eq!(map.insert(1, "one".to_string()), None);
        assert_eq!(map.insert(1, "uno".to_string()), Some("one".to_string()));

        let shard = map.shard(&1).read();
        assert_eq!(shard.get(&1), Some(&"uno".to_string()));
    }

    #[test]
    fn len_sums_all_shards() {
        let map = map_with_shards(4);
        for key in 0..32 {
            map.insert(key, key.to_string());
        }
        assert_eq!(map.len(), 32);

        let mut seen = 0;
        for shard in map.shards() {
            seen += shard.read().len();
        }
        assert_eq!(seen, 32);
    }

    #[test]
    fn zero_shards_clamps_to_one() {
        let map = map_with_shards(0);
        map.insert(9, "nine".to_string());
        assert_eq!(map.len(), 1);
        assert_eq!(map.shards().count(), 1);
    }

    #[test]
    fn shard_selection_is_deterministic() {
        let map = map_with_shards(8);
        let first = map.shard(&42) as *const _;
        let second = map.shard(&42) as *const _;
        assert_eq!(first, second);
    }

    #[test]
    fn clear_empties_every_shard() {
        let map = map_with_shards(4);
        for key in 0..16 {
            map.insert(key, key.to_string());
        }
        map.clear();
        assert_eq!(map.len(), 0);
    }

    #[test]
    fn remove_under_write_guard() {
        let map = map_with_shards(2);
        map.insert(5, "five".to_string());
        let removed = map.shard(&5).write().remove(&5);
        assert_eq!(removed, Some("five".to_string()));
        assert_eq!(map.len(), 0);
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use std::hash::BuildHasherDefault;

    use proptest::prelude::*;
    use rustc_hash::FxHasher;

    proptest! {
        /// Every inserted key is readable from its own shard and counted
        /// exactly once by `len`.
        #[test]
        fn prop_inserted_keys_are_found(
            shards in 1usize..16,
            keys in prop::collection::hash_set(any::<u32>(), 0..64)
        ) {
            let map: StripedMap<u32, u32, BuildHasherDefault<FxHasher>> =
                StripedMap::with_shards_and_hasher(shards, Default::default());
            for &key in &keys {
                map.insert(key, key.wrapping_mul(3));
            }
            prop_assert_eq!(map.len(), keys.len());
            for &key in &keys {
                let shard = map.shard(&key).read();
                prop_assert_eq!(shard.get(&key), Some(&key.wrapping_mul(3)));
            }
        }
    }
}
