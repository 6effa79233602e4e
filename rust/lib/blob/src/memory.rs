use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::BlobError;
use crate::traits::{validate_key, BlobMeta, BlobStore};

/// In-process BlobStore for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> BlobError {
    BlobError::Io("memory blob store lock poisoned".into())
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        validate_key(key)?;
        let mut blobs = self.blobs.write().map_err(poisoned)?;
        blobs.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        validate_key(key)?;
        let blobs = self.blobs.read().map_err(poisoned)?;
        Ok(blobs.get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<(), BlobError> {
        validate_key(key)?;
        let mut blobs = self.blobs.write().map_err(poisoned)?;
        blobs.remove(key);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<BlobMeta>, BlobError> {
        let blobs = self.blobs.read().map_err(poisoned)?;
        Ok(blobs
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, data)| BlobMeta {
                key: key.clone(),
                size: data.len() as u64,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_and_list() {
        let store = MemoryBlobStore::new();
        store.put("production/REQ-1/a.pdf", b"abc").unwrap();
        assert!(store.exists("production/REQ-1/a.pdf").unwrap());
        assert_eq!(store.list("production/").unwrap().len(), 1);
        assert_eq!(store.list("production/").unwrap()[0].size, 3);

        store.delete("production/REQ-1/a.pdf").unwrap();
        assert_eq!(store.get("production/REQ-1/a.pdf").unwrap(), None);
    }
}
