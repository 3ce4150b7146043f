//! State persistence collaborator. `core-state` owns
//! the flat keyed store's semantics and talks to one of these backends for
//! durability; this crate only defines the storage seam.

use crate::Value;
use core_errors::ShellError;
use std::collections::BTreeMap;
use std::sync::Mutex;

pub trait StateBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, ShellError>;
    fn set(&self, key: &str, value: Value) -> Result<(), ShellError>;
    fn delete(&self, key: &str) -> Result<(), ShellError>;
    fn list_keys(&self) -> Result<Vec<String>, ShellError>;
    fn close(&self) -> Result<(), ShellError>;
}

/// The `"memory"` backend named in `ShellConfig::state.backend`. Process-local,
/// lost on exit.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<Value>, ShellError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), ShellError> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), ShellError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    fn list_keys(&self) -> Result<Vec<String>, ShellError> {
        Ok(self.entries.lock().unwrap().keys().cloned().collect())
    }

    fn close(&self) -> Result<(), ShellError> {
        Ok(())
    }
}

/// Stands in for the `"persistent"` backend named in configuration. The real
/// wire format is out of scope here; every call fails so misconfiguration
/// is loud rather than silently falling back to memory semantics.
#[derive(Default)]
pub struct PersistentBackendUnavailable;

impl PersistentBackendUnavailable {
    pub fn new() -> Self {
        Self
    }

    fn unavailable(&self) -> ShellError {
        ShellError::state_backend_failure(
            "the persistent state backend is not implemented in this build",
        )
    }
}

impl StateBackend for PersistentBackendUnavailable {
    fn get(&self, _key: &str) -> Result<Option<Value>, ShellError> {
        Err(self.unavailable())
    }

    fn set(&self, _key: &str, _value: Value) -> Result<(), ShellError> {
        Err(self.unavailable())
    }

    fn delete(&self, _key: &str) -> Result<(), ShellError> {
        Err(self.unavailable())
    }

    fn list_keys(&self) -> Result<Vec<String>, ShellError> {
        Err(self.unavailable())
    }

    fn close(&self) -> Result<(), ShellError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_round_trips() {
        let backend = MemoryBackend::new();
        backend.set("prod:retries", Value::Int(3)).unwrap();
        assert_eq!(backend.get("prod:retries").unwrap(), Some(Value::Int(3)));
        backend.delete("prod:retries").unwrap();
        assert_eq!(backend.get("prod:retries").unwrap(), None);
    }

    #[test]
    fn memory_backend_lists_keys() {
        let backend = MemoryBackend::new();
        backend.set("a:x", Value::Bool(true)).unwrap();
        backend.set("b:y", Value::Bool(false)).unwrap();
        let mut keys = backend.list_keys().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a:x".to_string(), "b:y".to_string()]);
    }

    #[test]
    fn persistent_stub_always_fails() {
        let backend = PersistentBackendUnavailable::new();
        assert!(backend.get("x").is_err());
        assert!(backend.set("x", Value::Null).is_err());
        assert!(backend.close().is_ok());
    }
}
