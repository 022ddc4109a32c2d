//! Persistent client state.
//!
//! Only three keys ever hit the browser's `localStorage`: the session token,
//! the cached user, and the sidebar collapse state.  Everything else is a
//! transient mirror of server data.  Access goes through [`KeyValueStore`] so
//! the session logic can run against an in-memory map in unit tests.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::constants::STORAGE_SIDEBAR_KEY;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// `window.localStorage`.  Every operation is a silent no-op when storage is
/// unavailable (private mode, sandboxed iframes).
#[derive(Default, Clone, Copy)]
pub struct LocalStorage;

impl LocalStorage {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

impl KeyValueStore for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = Self::storage() {
            if storage.set_item(key, value).is_err() {
                error_log!("localStorage write failed for {}", key);
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::storage() {
            let _ = storage.remove_item(key);
        }
    }
}

/// In-memory store used by tests and as a fallback.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::default();
        for (k, v) in entries {
            store.set(k, v);
        }
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

// ---------------------------------------------------------------------------
// Sidebar persistence
// ---------------------------------------------------------------------------

const SIDEBAR_COLLAPSED: &str = "collapsed";
const SIDEBAR_EXPANDED: &str = "expanded";

pub fn load_sidebar_collapsed(store: &dyn KeyValueStore) -> bool {
    store.get(STORAGE_SIDEBAR_KEY).as_deref() == Some(SIDEBAR_COLLAPSED)
}

pub fn save_sidebar_collapsed(store: &dyn KeyValueStore, collapsed: bool) {
    store.set(
        STORAGE_SIDEBAR_KEY,
        if collapsed {
            SIDEBAR_COLLAPSED
        } else {
            SIDEBAR_EXPANDED
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sidebar_state_round_trips_through_store() {
        let store = MemoryStore::new();
        assert!(!load_sidebar_collapsed(&store));
        save_sidebar_collapsed(&store, true);
        assert_eq!(store.get(STORAGE_SIDEBAR_KEY).as_deref(), Some("collapsed"));
        assert!(load_sidebar_collapsed(&store));
        save_sidebar_collapsed(&store, false);
        assert!(!load_sidebar_collapsed(&store));
    }

    #[test]
    fn unknown_sidebar_value_means_expanded() {
        let store = MemoryStore::with_entries([(STORAGE_SIDEBAR_KEY, "weird")]);
        assert!(!load_sidebar_collapsed(&store));
    }
}
