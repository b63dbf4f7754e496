use axum::extract::multipart::Field;
use common::storage::{BoxReader, MediaStore, StoredMedia};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::AppError;

/// Spool a multipart field to a temp file, then hand it to the media store.
pub async fn store_field(
    mut field: Field<'_>,
    media: &dyn MediaStore,
    folder: &str,
    extension: &str,
    max_size: u64,
) -> Result<StoredMedia, AppError> {
    let temp_path = std::env::temp_dir().join(format!("casting-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(AppError::Validation(format!(
                    "File exceeds maximum size of {} KB",
                    max_size / 1024
                )));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        if total_size == 0 {
            return Err(AppError::Validation("Uploaded file is empty".into()));
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;
        drop(temp_file);

        let file = tokio::fs::File::open(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        let reader: BoxReader = Box::new(file);
        Ok(media.put_stream(folder, extension, reader, max_size).await?)
    }
    .await;

    let _ = tokio::fs::remove_file(&temp_path).await;
    result
}

/// Read a text form field, rejecting values longer than `max_bytes`.
pub async fn text_field(mut field: Field<'_>, max_bytes: usize) -> Result<String, AppError> {
    let name = field.name().unwrap_or_default().to_string();
    let mut buf = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if buf.len() + chunk.len() > max_bytes {
            return Err(AppError::field(&name, format!("The {name} field is too long.")));
        }
        buf.extend_from_slice(&chunk);
    }
    String::from_utf8(buf)
        .map_err(|_| AppError::field(&name, format!("The {name} field must be valid UTF-8.")))
}

/// Delete a stored file after the database write referencing it failed.
pub async fn discard(media: &dyn MediaStore, stored: &StoredMedia) {
    if let Err(e) = media.delete(&stored.path).await {
        tracing::warn!(path = %stored.path, error = %e, "Failed to remove orphaned upload");
    }
}

/// Delete a file by its public URL, ignoring URLs outside the public disk.
pub async fn delete_by_url(media: &dyn MediaStore, url: &str) {
    let Some(path) = media.path_from_url(url) else {
        return;
    };
    if let Err(e) = media.delete(&path).await {
        tracing::warn!(%path, error = %e, "Failed to delete stored file");
    }
}
