//! Image uploads for floors and rooms.
//!
//! Files are read from the multipart body and checked as a batch (count,
//! content type, size) before anything touches storage.

use anyhow::anyhow;
use axum::body::Bytes;
use axum::extract::Multipart;

use wardmap_core::AppError;
use wardmap_core::file_storage::{
    FileStorage, ImageCategory, StorageError, ensure_mime_type, upload_key,
};

/// Room photos are limited to common raster formats.
pub const ROOM_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];
/// Floor maps accept any image type.
pub const FLOOR_IMAGE_TYPES: &[&str] = &["image/*"];

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

pub fn storage_error(e: StorageError) -> AppError {
    if e.is_client_error() {
        AppError::bad_request(anyhow!("{}", e))
    } else {
        AppError::internal(e)
    }
}

/// Files sent under `field_name`; other fields are ignored.
pub async fn collect_files(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::new(e.status(), anyhow!("{}", e.body_text())))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::new(e.status(), anyhow!("{}", e.body_text())))?;

        files.push(UploadedFile {
            file_name,
            content_type,
            bytes,
        });
    }

    Ok(files)
}

/// Rejects the whole batch if any file is unacceptable.
pub fn validate_images(
    files: &[UploadedFile],
    allowed: &[&str],
    max_files: usize,
    max_file_size: usize,
) -> Result<(), AppError> {
    if files.is_empty() {
        return Err(AppError::bad_request(anyhow!("Please upload at least one file.")));
    }
    if files.len() > max_files {
        return Err(AppError::bad_request(anyhow!(
            "At most {} files can be uploaded at once.",
            max_files
        )));
    }

    for file in files {
        ensure_mime_type(file.content_type.as_deref(), allowed).map_err(storage_error)?;
        if file.bytes.len() > max_file_size {
            return Err(storage_error(StorageError::InvalidFileSize {
                max_bytes: max_file_size,
            }));
        }
    }

    Ok(())
}

/// Writes every file and returns their storage keys in upload order. Files
/// already written are removed again if a later one fails.
pub async fn store_images(
    storage: &dyn FileStorage,
    category: ImageCategory,
    entity_id: i32,
    files: &[UploadedFile],
) -> Result<Vec<String>, AppError> {
    let mut keys = Vec::with_capacity(files.len());

    for file in files {
        let key = upload_key(category, entity_id, &file.file_name);
        match storage.save(&key, &file.bytes).await {
            Ok(key) => keys.push(key),
            Err(e) => {
                discard(storage, &keys).await;
                return Err(storage_error(e));
            }
        }
    }

    Ok(keys)
}

/// Best-effort removal of stored files, used after a failed write.
pub async fn discard(storage: &dyn FileStorage, keys: &[String]) {
    for key in keys {
        if let Err(e) = storage.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to remove stored upload");
        }
    }
}
