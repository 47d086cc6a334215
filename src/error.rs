//! Error types for the pincache library.
//!
//! ## Key Components
//!
//! - [`CacheError`]: every failure the cache or its handles can surface.
//!
//! All variants are reported to the caller; nothing is retried or swallowed
//! internally.
//!
//! ## Example Usage
//!
//! ```
//! use pincache::cache::ConcurrentCache;
//! use pincache::error::CacheError;
//!
//! let cache: ConcurrentCache<String, i32> = ConcurrentCache::new();
//!
//! // A miss yields an invalid handle; dereferencing it is an error, not a panic.
//! let handle = cache.get(&"absent".to_string());
//! assert_eq!(handle.value(), Err(CacheError::InvalidHandle));
//! ```

use std::fmt;

/// Errors surfaced by cache and handle operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// A handle that refers to no entry was dereferenced.
    InvalidHandle,

    /// An entry without a value was dereferenced.
    ///
    /// Entries exposed through cache operations always carry a value, so
    /// this variant is a defensive report of internal corruption rather
    /// than something callers should expect to handle.
    EmptyEntry {
        /// Sequence number of the offending entry.
        sequence_number: u64,
    },

    /// More than one key accepted a support probe.
    ///
    /// The cache requires that at most one live key supports any probed
    /// value; violating that contract is detected at lookup time.
    AmbiguousSupport {
        /// How many keys accepted the probe.
        matches: usize,
    },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvalidHandle => {
                write!(
                    f,
                    "invalid cache handle dereference: handle does not refer to any cache entry"
                )
            },
            CacheError::EmptyEntry { sequence_number } => {
                write!(
                    f,
                    "invalid cache entry dereference: cache entry {} is empty",
                    sequence_number
                )
            },
            CacheError::AmbiguousSupport { matches } => {
                write!(
                    f,
                    "ambiguous support lookup: {} keys accept the probed value",
                    matches
                )
            },
        }
    }
}

impl std::error::Error for CacheError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
