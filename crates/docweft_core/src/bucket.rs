//! File storage scoped to a path prefix.

use std::sync::Arc;

use bytes::Bytes;
use docweft_backend::FileStore;

use crate::error::CoreResult;

/// Object storage rooted at a path prefix.
///
/// Names nest under the bucket's root; [`Bucket::file_path`] shows the
/// full path a name maps to. A bucket is cheap to clone and shares its
/// file store with the client that produced it.
#[derive(Clone)]
pub struct Bucket {
    files: Arc<dyn FileStore>,
    root: String,
}

impl Bucket {
    /// Creates a bucket rooted at a path prefix.
    pub fn new(files: Arc<dyn FileStore>, root: impl Into<String>) -> Self {
        Self {
            files,
            root: root.into(),
        }
    }

    /// Full object path of a name within this bucket.
    #[must_use]
    pub fn file_path(&self, name: &str) -> String {
        if self.root.is_empty() {
            name.to_string()
        } else {
            format!("{}/{name}", self.root)
        }
    }

    /// Stores an object, creating or replacing it. Returns its download
    /// URL.
    pub fn upload(&self, name: &str, data: impl Into<Bytes>) -> CoreResult<String> {
        Ok(self.files.put(&self.file_path(name), data.into())?)
    }

    /// Download URL of an existing object.
    pub fn download_url(&self, name: &str) -> CoreResult<String> {
        Ok(self.files.url(&self.file_path(name))?)
    }

    /// Reads an object's contents.
    pub fn read(&self, name: &str) -> CoreResult<Bytes> {
        Ok(self.files.read(&self.file_path(name))?)
    }

    /// Deletes an object.
    ///
    /// # Errors
    ///
    /// Unlike record deletion, removing a missing object errors.
    pub fn remove(&self, name: &str) -> CoreResult<()> {
        Ok(self.files.delete(&self.file_path(name))?)
    }

    /// Lists the full object paths under this bucket, sorted.
    pub fn list(&self) -> CoreResult<Vec<String>> {
        Ok(self.files.list(&self.file_path(""))?)
    }
}
