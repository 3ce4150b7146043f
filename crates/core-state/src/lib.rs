//! Flat keyed state store and notification bus.
//!
//! Keys are `<scope>:<symbol>` strings; storage is delegated to a
//! `core_collab::StateBackend`. `set` and `clear_all` fire listener
//! notifications on detached tasks so a misbehaving listener can never stall
//! or crash a write.

mod accessor;
mod extract;

pub use accessor::{AccessorDecl, StateAccessor};
pub use core_collab::Value;
pub use extract::{get_bool, get_float, get_int, get_string};

use core_collab::StateBackend;
use core_errors::ShellError;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Handle returned by `add_listener`, needed to later `remove_listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(String) + Send + Sync>;

pub struct StateManager {
    backend: Arc<dyn StateBackend>,
    listeners: Mutex<BTreeMap<ListenerId, Listener>>,
    next_id: AtomicU64,
}

impl StateManager {
    pub fn new(backend: Arc<dyn StateBackend>) -> Self {
        Self {
            backend,
            listeners: Mutex::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the stored value, or `None` if unset or the backend errored
    /// (backend failures are logged, not surfaced, so a read never poisons
    /// the prompt loop).
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%key, %err, "state backend get failed");
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: Value) -> Result<(), ShellError> {
        self.backend.set(key, value)?;
        self.notify(vec![key.to_string()]);
        Ok(())
    }

    pub fn list_keys(&self) -> Result<Vec<String>, ShellError> {
        self.backend.list_keys()
    }

    /// Removes every entry, then fires one notification round naming every
    /// cleared key rather than one task per key (see DESIGN.md).
    pub fn clear_all(&self) -> Result<(), ShellError> {
        let keys = self.backend.list_keys()?;
        for key in &keys {
            self.backend.delete(key)?;
        }
        self.notify(keys);
        Ok(())
    }

    pub fn add_listener(&self, f: impl Fn(String) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().unwrap().insert(id, Arc::new(f));
        id
    }

    /// No-op for unknown ids.
    pub fn remove_listener(&self, id: ListenerId) {
        self.listeners.lock().unwrap().remove(&id);
    }

    fn notify(&self, keys: Vec<String>) {
        if keys.is_empty() {
            return;
        }
        let listeners: Vec<Listener> = self.listeners.lock().unwrap().values().cloned().collect();
        if listeners.is_empty() {
            return;
        }
        tokio::spawn(async move {
            for key in keys {
                for listener in &listeners {
                    let listener = listener.clone();
                    let key = key.clone();
                    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| listener(key)));
                    if outcome.is_err() {
                        tracing::warn!("state listener panicked");
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_collab::MemoryBackend;
    use std::sync::atomic::{AtomicUsize, Ordering as MemOrdering};

    fn manager() -> StateManager {
        StateManager::new(Arc::new(MemoryBackend::new()))
    }

    #[test]
    fn get_returns_none_when_never_set() {
        let manager = manager();
        assert_eq!(manager.get("prod:retries"), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let manager = manager();
        manager.set("prod:retries", Value::Int(5)).unwrap();
        assert_eq!(manager.get("prod:retries"), Some(Value::Int(5)));
    }

    #[tokio::test]
    async fn set_notifies_listeners() {
        let manager = manager();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        manager.add_listener(move |_key| {
            seen_clone.fetch_add(1, MemOrdering::SeqCst);
        });
        manager.set("prod:retries", Value::Int(1)).unwrap();
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(seen.load(MemOrdering::SeqCst), 1);
    }

    #[tokio::test]
    async fn panicking_listener_does_not_poison_manager() {
        let manager = manager();
        manager.add_listener(|_key| panic!("boom"));
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        manager.add_listener(move |_key| {
            seen_clone.fetch_add(1, MemOrdering::SeqCst);
        });
        manager.set("prod:x", Value::Bool(true)).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert_eq!(seen.load(MemOrdering::SeqCst), 1);
    }

    #[test]
    fn remove_listener_is_a_noop_for_unknown_ids() {
        let manager = manager();
        manager.remove_listener(ListenerId(9999));
    }

    #[test]
    fn clear_all_empties_the_backend() {
        let manager = manager();
        manager.set("a:x", Value::Null).unwrap();
        manager.set("b:y", Value::Null).unwrap();
        manager.clear_all().unwrap();
        assert!(manager.list_keys().unwrap().is_empty());
    }
}
