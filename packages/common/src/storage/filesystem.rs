use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use super::error::StorageError;
use super::traits::{BoxReader, MediaStore, StoredMedia};

/// Filesystem-backed public disk.
///
/// Files are stored as `{base_path}/{folder}/{uuid}.{extension}` and served
/// under `public_url`.
pub struct FilesystemMediaStore {
    base_path: PathBuf,
    public_url: String,
}

impl FilesystemMediaStore {
    /// Create a new filesystem media store.
    pub async fn new(base_path: PathBuf, public_url: &str) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    /// Root directory of the disk.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Map a relative path onto the disk, rejecting anything that could escape it.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(path);
        if path.is_empty() || path.starts_with('.') {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        for component in rel.components() {
            if !matches!(component, Component::Normal(_)) {
                return Err(StorageError::InvalidPath(path.to_string()));
            }
        }
        Ok(self.base_path.join(rel))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path.join(".tmp").join(Uuid::new_v4().to_string())
    }
}

fn validate_folder(folder: &str) -> Result<(), StorageError> {
    let ok = !folder.is_empty()
        && folder.split('/').all(|seg| {
            !seg.is_empty()
                && seg
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
        });
    if ok {
        Ok(())
    } else {
        Err(StorageError::InvalidPath(format!("bad folder '{folder}'")))
    }
}

fn validate_extension(extension: &str) -> Result<(), StorageError> {
    if extension.is_empty()
        || extension.len() > 10
        || !extension.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(StorageError::InvalidPath(format!(
            "bad extension '{extension}'"
        )));
    }
    Ok(())
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn put_stream(
        &self,
        folder: &str,
        extension: &str,
        mut reader: BoxReader,
        max_size: u64,
    ) -> Result<StoredMedia, StorageError> {
        validate_folder(folder)?;
        validate_extension(extension)?;

        let temp_path = self.temp_path();
        let mut total_bytes: u64 = 0;

        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer
        let mut temp_file = fs::File::create(&temp_path).await?;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        drop(temp_file);

        let rel_path = format!(
            "{folder}/{}.{}",
            Uuid::now_v7(),
            extension.to_ascii_lowercase()
        );
        let target = self.base_path.join(&rel_path);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &target).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(path = %rel_path, size = total_bytes, "Stored media file");

        Ok(StoredMedia {
            url: self.url_for(&rel_path),
            path: rel_path,
            size: total_bytes,
        })
    }

    async fn get_stream(&self, path: &str) -> Result<BoxReader, StorageError> {
        let full = self.resolve(path)?;
        match fs::File::open(&full).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let full = self.resolve(path)?;
        Ok(fs::try_exists(&full).await?)
    }

    async fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.public_url, path.trim_start_matches('/'))
    }

    fn path_from_url(&self, url: &str) -> Option<String> {
        let rest = url.strip_prefix(&self.public_url)?.strip_prefix('/')?;
        if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        }
    }
}
