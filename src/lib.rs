//! pincache: a concurrent reference-counted cache.
//!
//! Keys map to immutable values; [`handle::CacheHandle`]s pin entries
//! against eviction for as long as they live; retention keeps the N most
//! recently created unused entries; key types implementing
//! [`support::Supports`] enable lookup by probe value.

mod count;
mod ds;
mod entry;

pub mod cache;
pub mod error;
pub mod handle;
pub mod prelude;
pub mod support;
