//! Kernel module - cache infrastructure behind the flow context store.

pub mod memory_cache;
pub mod test_dependencies;
pub mod traits;

pub use memory_cache::MemoryCache;
pub use test_dependencies::{CacheCall, MockCache};
pub use traits::*;
