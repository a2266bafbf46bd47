//! Key-value persistence contracts and adapters.
//!
//! The desktop store treats durable storage as an opaque text blob per key. Adapters never
//! interpret the payload; validation is the caller's job.

use std::{cell::RefCell, collections::BTreeMap, future::Future, pin::Pin, rc::Rc};

use serde::Serialize;

/// Object-safe boxed future used by [`KeyValueStore`] async methods.
pub type KeyValueFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service storing raw text values by key (browser `localStorage`, a file, a test map).
pub trait KeyValueStore {
    /// Loads the raw text stored under `key`.
    fn load_raw<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<Option<String>, String>>;

    /// Replaces the raw text stored under `key`.
    fn save_raw<'a>(&'a self, key: &'a str, raw: &'a str) -> KeyValueFuture<'a, Result<(), String>>;

    /// Removes `key`. Removing a missing key succeeds.
    fn remove<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Store that never holds anything; used where persistence is unavailable.
pub struct NoopKeyValueStore;

impl KeyValueStore for NoopKeyValueStore {
    fn load_raw<'a>(&'a self, _key: &'a str) -> KeyValueFuture<'a, Result<Option<String>, String>> {
        Box::pin(async { Ok(None) })
    }

    fn save_raw<'a>(
        &'a self,
        _key: &'a str,
        _raw: &'a str,
    ) -> KeyValueFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn remove<'a>(&'a self, _key: &'a str) -> KeyValueFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory store. Clones share the same map, so a test can keep a handle and inspect writes.
pub struct MemoryKeyValueStore {
    inner: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryKeyValueStore {
    /// Creates a store pre-seeded with one entry.
    pub fn with_entry(key: impl Into<String>, raw: impl Into<String>) -> Self {
        let store = Self::default();
        store.inner.borrow_mut().insert(key.into(), raw.into());
        store
    }

    /// Returns the raw value for `key` without going through the async contract.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.inner.borrow().get(key).cloned()
    }

    /// Lists the stored keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().keys().cloned().collect()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn load_raw<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<Option<String>, String>> {
        Box::pin(async move { Ok(self.peek(key)) })
    }

    fn save_raw<'a>(&'a self, key: &'a str, raw: &'a str) -> KeyValueFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .insert(key.to_string(), raw.to_string());
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> KeyValueFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner.borrow_mut().remove(key);
            Ok(())
        })
    }
}

/// Serializes and saves a typed value through a [`KeyValueStore`].
///
/// # Errors
///
/// Returns an error when serialization or the store write fails.
pub async fn save_json_with<S: KeyValueStore + ?Sized, T: Serialize>(
    store: &S,
    key: &str,
    value: &T,
) -> Result<(), String> {
    let raw = serde_json::to_string(value).map_err(|e| e.to_string())?;
    store.save_raw(key, &raw).await
}
