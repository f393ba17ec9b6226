//! Object storage: trait plus memory and local-disk implementations.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::{BackendError, BackendResult};

/// A flat object store addressed by slash-separated paths.
///
/// This is the seam the bucket wrapper talks to. Unlike document deletes,
/// deleting a missing object IS an error, matching the hosted services
/// these implementations stand in for.
pub trait FileStore: Send + Sync {
    /// Store an object, creating or replacing it. Returns its download URL.
    fn put(&self, path: &str, data: Bytes) -> BackendResult<String>;

    /// Download URL of an existing object.
    fn url(&self, path: &str) -> BackendResult<String>;

    /// Read an object's contents.
    fn read(&self, path: &str) -> BackendResult<Bytes>;

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the object does not exist.
    fn delete(&self, path: &str) -> BackendResult<()>;

    /// List object paths starting with a prefix, sorted.
    fn list(&self, prefix: &str) -> BackendResult<Vec<String>>;
}

/// An in-memory object store.
///
/// URLs use the `memory://` scheme. Suitable for tests and demos.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    objects: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryFileStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileStore for MemoryFileStore {
    fn put(&self, path: &str, data: Bytes) -> BackendResult<String> {
        self.objects.write().insert(path.to_string(), data);
        Ok(format!("memory://{path}"))
    }

    fn url(&self, path: &str) -> BackendResult<String> {
        if self.objects.read().contains_key(path) {
            Ok(format!("memory://{path}"))
        } else {
            Err(BackendError::not_found(path))
        }
    }

    fn read(&self, path: &str) -> BackendResult<Bytes> {
        self.objects
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| BackendError::not_found(path))
    }

    fn delete(&self, path: &str) -> BackendResult<()> {
        self.objects
            .write()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| BackendError::not_found(path))
    }

    fn list(&self, prefix: &str) -> BackendResult<Vec<String>> {
        Ok(self
            .objects
            .read()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

/// An object store backed by a local directory.
///
/// Object paths map to files under the root; URLs use the `file://`
/// scheme. Data survives process restarts, making this useful for demos
/// and local development.
#[derive(Debug)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> BackendResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// The root directory of this store.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> BackendResult<PathBuf> {
        if path.is_empty() || path.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(BackendError::invalid_argument(format!(
                "invalid object path: `{path}`"
            )));
        }
        Ok(self.root.join(path))
    }

    fn collect_paths(&self, dir: &Path, out: &mut Vec<String>) -> io::Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let entry_path = entry.path();
            if entry_path.is_dir() {
                self.collect_paths(&entry_path, out)?;
            } else if let Ok(relative) = entry_path.strip_prefix(&self.root) {
                let parts: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(parts.join("/"));
            }
        }
        Ok(())
    }

    fn map_missing(err: io::Error, path: &str) -> BackendError {
        if err.kind() == io::ErrorKind::NotFound {
            BackendError::not_found(path)
        } else {
            BackendError::Io(err)
        }
    }
}

impl FileStore for LocalFileStore {
    fn put(&self, path: &str, data: Bytes) -> BackendResult<String> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full, &data)?;
        Ok(format!("file://{}", full.display()))
    }

    fn url(&self, path: &str) -> BackendResult<String> {
        let full = self.resolve(path)?;
        if full.is_file() {
            Ok(format!("file://{}", full.display()))
        } else {
            Err(BackendError::not_found(path))
        }
    }

    fn read(&self, path: &str) -> BackendResult<Bytes> {
        let full = self.resolve(path)?;
        let data = fs::read(&full).map_err(|e| Self::map_missing(e, path))?;
        Ok(Bytes::from(data))
    }

    fn delete(&self, path: &str) -> BackendResult<()> {
        let full = self.resolve(path)?;
        fs::remove_file(&full).map_err(|e| Self::map_missing(e, path))
    }

    fn list(&self, prefix: &str) -> BackendResult<Vec<String>> {
        let mut paths = Vec::new();
        self.collect_paths(&self.root, &mut paths)?;
        paths.retain(|p| p.starts_with(prefix));
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &dyn FileStore) {
        let url = store.put("covers/dune.png", Bytes::from_static(b"png")).unwrap();
        assert!(url.ends_with("covers/dune.png"));

        assert_eq!(store.read("covers/dune.png").unwrap(), Bytes::from_static(b"png"));
        assert!(store.url("covers/dune.png").is_ok());
        assert!(matches!(
            store.url("covers/missing.png"),
            Err(BackendError::NotFound { .. })
        ));

        store.put("covers/emma.png", Bytes::from_static(b"x")).unwrap();
        store.put("audio/dune.mp3", Bytes::from_static(b"y")).unwrap();
        assert_eq!(
            store.list("covers/").unwrap(),
            vec!["covers/dune.png".to_string(), "covers/emma.png".to_string()]
        );

        store.delete("covers/emma.png").unwrap();
        assert!(matches!(
            store.delete("covers/emma.png"),
            Err(BackendError::NotFound { .. })
        ));
    }

    #[test]
    fn memory_store_surface() {
        exercise(&MemoryFileStore::new());
    }

    #[test]
    fn local_store_surface() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&LocalFileStore::open(dir.path()).unwrap());
    }

    #[test]
    fn local_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LocalFileStore::open(dir.path()).unwrap();
            store.put("a/b.txt", Bytes::from_static(b"kept")).unwrap();
        }
        let store = LocalFileStore::open(dir.path()).unwrap();
        assert_eq!(store.read("a/b.txt").unwrap(), Bytes::from_static(b"kept"));
    }

    #[test]
    fn local_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.put("../escape.txt", Bytes::from_static(b"no")),
            Err(BackendError::InvalidArgument { .. })
        ));
        assert!(matches!(
            store.read(""),
            Err(BackendError::InvalidArgument { .. })
        ));
    }
}
