// Test doubles for the kernel traits
//
// MockCache records every call and can be scripted to fail, so tests can
// assert which cache operations a flow context call performed.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use super::BaseCache;

/// A cache operation captured by `MockCache`
#[derive(Debug, Clone, PartialEq)]
pub enum CacheCall {
    Get(String),
    Set(String, Value),
    Del(String),
}

// =============================================================================
// Mock Cache
// =============================================================================

#[derive(Clone, Default)]
pub struct MockCache {
    get_response: Arc<Mutex<Option<Value>>>,
    get_error: Arc<Mutex<Option<String>>>,
    set_error: Arc<Mutex<Option<String>>>,
    del_error: Arc<Mutex<Option<String>>>,
    calls: Arc<Mutex<Vec<CacheCall>>>,
}

impl MockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value returned by every `get`
    pub fn with_get_response(self, value: Value) -> Self {
        *self.get_response.lock().unwrap() = Some(value);
        self
    }

    pub fn with_get_error(self, message: &str) -> Self {
        *self.get_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn with_set_error(self, message: &str) -> Self {
        *self.set_error.lock().unwrap() = Some(message.to_string());
        self
    }

    pub fn with_del_error(self, message: &str) -> Self {
        *self.del_error.lock().unwrap() = Some(message.to_string());
        self
    }

    /// All calls in the order they were made
    pub fn calls(&self) -> Vec<CacheCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn get_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                CacheCall::Get(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn set_calls(&self) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                CacheCall::Set(key, value) => Some((key, value)),
                _ => None,
            })
            .collect()
    }

    pub fn del_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                CacheCall::Del(key) => Some(key),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: CacheCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn scripted_error(slot: &Mutex<Option<String>>) -> Result<()> {
        match slot.lock().unwrap().as_deref() {
            Some(message) => Err(anyhow!("{}", message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BaseCache for MockCache {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.record(CacheCall::Get(key.to_string()));
        Self::scripted_error(&self.get_error)?;
        Ok(self.get_response.lock().unwrap().clone())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.record(CacheCall::Set(key.to_string(), value));
        Self::scripted_error(&self.set_error)
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.record(CacheCall::Del(key.to_string()));
        Self::scripted_error(&self.del_error)
    }
}
