use std::io::Cursor;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// A file written to the public disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredMedia {
    /// Path relative to the disk root, e.g. `videos/0193....mp4`.
    pub path: String,
    /// Publicly reachable URL for `path`.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
}

/// Public-disk media storage (videos, profile photos, gallery images).
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store bytes under `folder` with a generated file name.
    async fn put(
        &self,
        folder: &str,
        extension: &str,
        data: &[u8],
        max_size: u64,
    ) -> Result<StoredMedia, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(folder, extension, reader, max_size).await
    }

    /// Store data from an async reader under `folder` with a generated file name.
    async fn put_stream(
        &self,
        folder: &str,
        extension: &str,
        reader: BoxReader,
        max_size: u64,
    ) -> Result<StoredMedia, StorageError>;

    /// Retrieve all bytes of a stored file.
    async fn get(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(path).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve a stored file as a streaming async reader.
    async fn get_stream(&self, path: &str) -> Result<BoxReader, StorageError>;

    /// Check whether a file exists.
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Delete a stored file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, path: &str) -> Result<bool, StorageError>;

    /// Public URL for a relative path.
    fn url_for(&self, path: &str) -> String;

    /// Inverse of [`MediaStore::url_for`]; `None` for URLs outside this disk.
    fn path_from_url(&self, url: &str) -> Option<String>;
}
