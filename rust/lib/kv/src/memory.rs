use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::KVError;
use crate::traits::KVStore;

/// MemoryStore keeps every entry in an in-process `BTreeMap`.
///
/// Nothing survives the process. Use it for tests and for single-session
/// tools where the data is throwaway; production wiring uses `RedbStore`.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> KVError {
    KVError::Storage("memory store lock poisoned".into())
}

impl KVStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn batch_set(&self, batch: &[(&str, &[u8])]) -> Result<(), KVError> {
        // One write guard for the whole batch, so readers never see half of it.
        let mut entries = self.entries.write().map_err(poisoned)?;
        for (key, value) in batch {
            entries.insert((*key).to_string(), value.to_vec());
        }
        Ok(())
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let entries = self.entries.read().map_err(poisoned)?;
        let results = entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_delete() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("a", b"1").unwrap();
        assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.len(), 1);

        store.delete("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn scan_is_sorted_and_prefix_bounded() {
        let store = MemoryStore::new();
        store.set("p:2", b"b").unwrap();
        store.set("p:1", b"a").unwrap();
        store.set("q:1", b"z").unwrap();
        store.set("o:9", b"y").unwrap();

        let rows = store.scan("p:").unwrap();
        assert_eq!(
            rows,
            vec![
                ("p:1".to_string(), b"a".to_vec()),
                ("p:2".to_string(), b"b".to_vec()),
            ]
        );
        assert!(store.scan("missing:").unwrap().is_empty());
    }

    #[test]
    fn batch_set_overwrites() {
        let store = MemoryStore::new();
        store.set("k", b"old").unwrap();
        store
            .batch_set(&[("k", b"new".as_slice()), ("j", b"x".as_slice())])
            .unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"new".to_vec()));
        assert_eq!(store.len(), 2);
    }
}
