//! Rada Store - key/value preferences shared across the admin
//!
//! The store holds UI preferences that outlive a single view (selected
//! columns, sidebar state, last used filters). Values are JSON so any
//! persistence backend can implement [`Store`]; the default is the in-memory
//! [`MemoryStore`].
//!
//! # Example
//!
//! ```ignore
//! let store = MemoryStore::new();
//! store.set_item("sidebar.open", json!(true));
//!
//! let handle = store.subscribe("sidebar.open", Arc::new(|value| {
//!     println!("sidebar changed: {:?}", value);
//! }));
//! store.unsubscribe(&handle);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;
use serde_json::Value;
use smallvec::SmallVec;

/// Callback invoked with the new value (`None` when removed)
pub type StoreCallback = Arc<dyn Fn(Option<&Value>) + Send + Sync>;

/// Storage contract
pub trait Store: Send + Sync {
    fn get_item(&self, key: &str) -> Option<Value>;
    fn set_item(&self, key: &str, value: Value);
    fn remove_item(&self, key: &str);
    /// Remove every key starting with `prefix`
    fn remove_items(&self, prefix: &str);
    fn subscribe(&self, key: &str, callback: StoreCallback) -> SubscriptionHandle;
    fn unsubscribe(&self, handle: &SubscriptionHandle);
    fn reset(&self);
}

/// Handle for unsubscribing from store updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    key: String,
    id: u64,
}

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    items: RwLock<FxHashMap<String, Value>>,
    subscribers: RwLock<FxHashMap<String, SmallVec<[(u64, StoreCallback); 2]>>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-filled with values
    pub fn with_items(items: impl IntoIterator<Item = (String, Value)>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.items.write() {
            map.extend(items);
        }
        store
    }

    fn notify(&self, key: &str, value: Option<&Value>) {
        // Clone out so callbacks may touch the store
        let callbacks: SmallVec<[StoreCallback; 2]> = match self.subscribers.read() {
            Ok(subs) => subs
                .get(key)
                .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
                .unwrap_or_default(),
            Err(_) => return,
        };
        for callback in callbacks {
            callback(value);
        }
    }

    fn keys(&self) -> Vec<String> {
        self.items
            .read()
            .map(|items| items.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl Store for MemoryStore {
    fn get_item(&self, key: &str) -> Option<Value> {
        self.items.read().ok()?.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: Value) {
        if let Ok(mut items) = self.items.write() {
            items.insert(key.to_string(), value.clone());
        }
        self.notify(key, Some(&value));
    }

    fn remove_item(&self, key: &str) {
        let removed = self
            .items
            .write()
            .ok()
            .and_then(|mut items| items.remove(key));
        if removed.is_some() {
            self.notify(key, None);
        }
    }

    fn remove_items(&self, prefix: &str) {
        for key in self.keys().into_iter().filter(|k| k.starts_with(prefix)) {
            self.remove_item(&key);
        }
    }

    fn subscribe(&self, key: &str, callback: StoreCallback) -> SubscriptionHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut subs) = self.subscribers.write() {
            subs.entry(key.to_string()).or_default().push((id, callback));
        }
        SubscriptionHandle {
            key: key.to_string(),
            id,
        }
    }

    fn unsubscribe(&self, handle: &SubscriptionHandle) {
        if let Ok(mut subs) = self.subscribers.write() {
            if let Some(list) = subs.get_mut(&handle.key) {
                list.retain(|(id, _)| *id != handle.id);
            }
        }
    }

    fn reset(&self) {
        for key in self.keys() {
            self.remove_item(&key);
        }
    }
}
