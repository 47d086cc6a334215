pub use crate::cache::{ConcurrentCache, DefaultHashBuilder};
pub use crate::error::CacheError;
pub use crate::handle::CacheHandle;
pub use crate::support::Supports;
