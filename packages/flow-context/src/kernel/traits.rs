// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Flow signing and metadata merging live in domains/flow and use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseCache)

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

// =============================================================================
// Cache Trait (Infrastructure - key-value store)
// =============================================================================

/// Key-value cache client
///
/// Implementations apply their own namespace prefix to every key, so callers
/// pass bare keys. Expiry is the implementation's concern.
#[async_trait]
pub trait BaseCache: Send + Sync {
    /// Fetch the value stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Remove `key` (removing a missing key is not an error)
    async fn del(&self, key: &str) -> Result<()>;
}
