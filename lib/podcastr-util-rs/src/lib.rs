#[cfg(feature = "format-duration")]
mod format_duration;
#[cfg(feature = "format-duration")]
pub use self::format_duration::*;

#[cfg(feature = "async-timed-cache-cell")]
mod async_timed_cache_cell;
#[cfg(feature = "async-timed-cache-cell")]
pub use self::async_timed_cache_cell::*;

#[cfg(feature = "async-timed-lru-cache")]
mod async_timed_lru_cache;
#[cfg(feature = "async-timed-lru-cache")]
pub use self::async_timed_lru_cache::*;
