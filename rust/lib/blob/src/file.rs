use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::BlobError;
use crate::traits::{validate_key, BlobMeta, BlobStore};

fn io_err(e: std::io::Error) -> BlobError {
    BlobError::Io(e.to_string())
}

/// FileStore is a BlobStore implementation backed by the local filesystem.
///
/// Keys are mapped to paths under `base_dir`:
///   key "production/REQ-20241125-001/ab12-drawing.pdf"
///   → `{base_dir}/production/REQ-20241125-001/ab12-drawing.pdf`
///
/// Parent directories are created on `put`. Keys are validated with
/// [`validate_key`], so no key can resolve outside `base_dir`.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a new FileStore rooted at `base_dir`.
    /// The directory is created if it doesn't exist.
    pub fn open(base_dir: &Path) -> Result<Self, BlobError> {
        fs::create_dir_all(base_dir).map_err(io_err)?;
        debug!("FileStore: rooted at {:?}", base_dir);
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
        })
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, BlobError> {
        validate_key(key)?;
        Ok(key.split('/').fold(self.base_dir.clone(), |path, part| path.join(part)))
    }

    fn walk_dir(&self, dir: &Path, prefix: &str, results: &mut Vec<BlobMeta>) -> Result<(), BlobError> {
        if !dir.is_dir() {
            return Ok(());
        }

        for entry in fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let path = entry.path();

            if path.is_dir() {
                self.walk_dir(&path, prefix, results)?;
                continue;
            }
            let Ok(rel) = path.strip_prefix(&self.base_dir) else {
                continue;
            };
            // Keys always use '/', whatever the platform separator is.
            let key = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            if key.starts_with(prefix) {
                let size = entry.metadata().map_err(io_err)?.len();
                results.push(BlobMeta { key, size });
            }
        }

        Ok(())
    }
}

impl BlobStore for FileStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&path, data).map_err(io_err)?;
        debug!("FileStore: wrote {} bytes to {}", data.len(), key);
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        let path = self.resolve(key)?;
        if !path.is_file() {
            return Ok(None);
        }
        fs::read(&path).map(Some).map_err(io_err)
    }

    fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        if path.is_file() {
            fs::remove_file(&path).map_err(io_err)?;
        }
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, BlobError> {
        Ok(self.resolve(key)?.is_file())
    }

    fn list(&self, prefix: &str) -> Result<Vec<BlobMeta>, BlobError> {
        let mut results = Vec::new();
        self.walk_dir(&self.base_dir, prefix, &mut results)?;
        results.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(results)
    }
}
