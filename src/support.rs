//! Support predicate: lets key types answer "does this key cover that
//! probe value?".
//!
//! Key types that implement [`Supports`] unlock
//! [`ConcurrentCache::get_supporting`](crate::cache::ConcurrentCache::get_supporting):
//! instead of presenting the exact key, callers present a probe value and
//! the cache finds the entry whose key accepts it. The canonical case is
//! an interval key covering a range of event numbers.
//!
//! It is a caller contract that at most one live key supports any probe
//! value that will be queried; the cache checks this at lookup time, not
//! at insertion.
//!
//! ## Example Usage
//!
//! ```
//! use pincache::cache::ConcurrentCache;
//! use pincache::support::Supports;
//!
//! #[derive(Clone, PartialEq, Eq, Hash)]
//! struct Window {
//!     begin: u32,
//!     end: u32,
//! }
//!
//! impl Supports<u32> for Window {
//!     fn supports(&self, probe: &u32) -> bool {
//!         self.begin <= *probe && *probe < self.end
//!     }
//! }
//!
//! let cache: ConcurrentCache<Window, &str> = ConcurrentCache::new();
//! cache.insert_or_get(Window { begin: 0, end: 10 }, "calibration A");
//!
//! let handle = cache.get_supporting(&4).unwrap();
//! assert_eq!(handle.value(), Ok(&"calibration A"));
//! ```

/// Acceptance predicate over probe values of type `P`.
pub trait Supports<P> {
    /// Whether this key covers `probe`.
    fn supports(&self, probe: &P) -> bool;
}
