use std::collections::BTreeMap;

/// Opaque persistence collaborator: the core hands it serialized documents
/// and asks for them back by key. Saving is best-effort; a `false` return is
/// logged by the caller and never rolls back in-memory state.
pub trait SaveStore {
    fn load(&mut self, key: &str) -> Option<String>;
    fn save(&mut self, key: &str, payload: &str) -> bool;
}

/// In-memory store, used in tests and anywhere durability is not wanted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn put(&mut self, key: impl Into<String>, payload: impl Into<String>) {
        self.entries.insert(key.into(), payload.into());
    }
}

impl SaveStore for MemoryStore {
    fn load(&mut self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn save(&mut self, key: &str, payload: &str) -> bool {
        self.entries.insert(key.to_string(), payload.to_string());
        true
    }
}

/// Store that drops every save and never loads anything.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct NullStore;

impl SaveStore for NullStore {
    fn load(&mut self, _key: &str) -> Option<String> {
        None
    }

    fn save(&mut self, _key: &str, _payload: &str) -> bool {
        true
    }
}
