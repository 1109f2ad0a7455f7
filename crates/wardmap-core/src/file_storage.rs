//! File storage for uploaded floor maps and room photos.
//!
//! Storage is reached through the [`FileStorage`] trait so the HTTP layer
//! never touches paths directly. [`LocalFileStorage`] writes under a content
//! root that the router serves back as static files.
//!
//! ```ignore
//! let storage = LocalFileStorage::new(PathBuf::from("uploads"));
//! let key = upload_key(ImageCategory::Room, 7, "front view.png");
//! storage.save(&key, &bytes).await?;
//! ```

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

pub trait FileStorage: Send + Sync {
    /// Stores `content` under `key` and returns the key.
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String>;

    /// Removes the file at `key`. Missing files are not an error.
    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;
}

#[derive(Debug)]
pub enum StorageError {
    InvalidFileSize { max_bytes: usize },
    InvalidMimeType {
        received: String,
        allowed: Vec<String>,
    },
    IoError(std::io::Error),
    InvalidKey(String),
}

impl StorageError {
    /// Size, type and key problems come from the upload itself.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::IoError(_))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFileSize { max_bytes } => {
                write!(f, "File exceeds maximum size of {} bytes", max_bytes)
            }
            Self::InvalidMimeType { received, allowed } => write!(
                f,
                "File type '{}' is not allowed. Allowed types: {}",
                received,
                allowed.join(", ")
            ),
            Self::IoError(e) => write!(f, "I/O error: {}", e),
            Self::InvalidKey(msg) => write!(f, "Invalid storage key: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        Self::IoError(e)
    }
}

/// Subdirectory an upload is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageCategory {
    Floor,
    Room,
}

impl ImageCategory {
    pub fn dir(self) -> &'static str {
        match self {
            ImageCategory::Floor => "floor_images",
            ImageCategory::Room => "room_images",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ImageCategory::Floor => "floor",
            ImageCategory::Room => "room",
        }
    }
}

/// Longest stem kept from a client file name, so keys stay well inside
/// both the filesystem name limit and the `image_location` column.
const MAX_STEM_LEN: usize = 100;
const MAX_EXTENSION_LEN: usize = 10;

/// Maps anything outside `[A-Za-z0-9_-]` to `-` and collapses dash runs.
fn key_safe(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for c in part.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '_' { c } else { '-' };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    out.trim_matches('-').to_string()
}

/// Reduces a client-supplied file name to `{stem}.{extension}` using only
/// characters accepted in storage keys. Only the last dot survives.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let (stem, extension) = match base.rsplit_once('.') {
        Some((stem, ext)) => (stem, key_safe(ext)),
        None => (base, String::new()),
    };

    let mut stem = key_safe(stem);
    stem.truncate(MAX_STEM_LEN);
    let stem = match stem.trim_end_matches('-') {
        "" => "upload",
        trimmed => trimmed,
    };

    let mut extension = extension;
    extension.truncate(MAX_EXTENSION_LEN);
    match extension.trim_end_matches('-') {
        "" => stem.to_string(),
        ext => format!("{}.{}", stem, ext),
    }
}

/// `{category}/{entity_id}-{unix_millis}-{random}-{sanitised name}`
pub fn upload_key(category: ImageCategory, entity_id: i32, original_name: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: u32 = rand::random::<u32>() % 1_000_000_000;

    format!(
        "{}/{}-{}-{}-{}",
        category.dir(),
        entity_id,
        millis,
        suffix,
        sanitize_file_name(original_name)
    )
}

/// Checks a content type against an allow-list; `image/*` matches any image type.
pub fn ensure_mime_type(received: Option<&str>, allowed: &[&str]) -> Result<(), StorageError> {
    let received = received.unwrap_or("").trim().to_ascii_lowercase();
    let essence = received.split(';').next().unwrap_or("").trim();

    let matches = allowed.iter().any(|pattern| match pattern.strip_suffix("/*") {
        Some(top) => essence
            .split_once('/')
            .is_some_and(|(t, sub)| t == top && !sub.is_empty()),
        None => essence == *pattern,
    });

    if matches {
        Ok(())
    } else {
        Err(StorageError::InvalidMimeType {
            received: if essence.is_empty() {
                "unknown".to_string()
            } else {
                essence.to_string()
            },
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[derive(Clone)]
pub struct LocalFileStorage {
    base_dir: PathBuf,
    max_file_size: usize,
}

impl LocalFileStorage {
    pub const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

    pub fn new(base_dir: PathBuf) -> Self {
        Self::with_max_size(base_dir, Self::DEFAULT_MAX_FILE_SIZE)
    }

    pub fn with_max_size(base_dir: PathBuf, max_file_size: usize) -> Self {
        Self {
            base_dir,
            max_file_size,
        }
    }

    /// Rejects keys that could escape the content root.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty() || key.contains("..") || key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Key must not be empty, contain '..', or start with '/'".to_string(),
            ));
        }

        if !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.'))
        {
            return Err(StorageError::InvalidKey(
                "Key contains invalid characters".to_string(),
            ));
        }

        Ok(())
    }
}

impl FileStorage for LocalFileStorage {
    fn save<'a>(&'a self, key: &'a str, content: &'a [u8]) -> StorageFuture<'a, String> {
        Box::pin(async move {
            Self::validate_key(key)?;

            if content.len() > self.max_file_size {
                return Err(StorageError::InvalidFileSize {
                    max_bytes: self.max_file_size,
                });
            }

            let file_path = self.base_dir.join(key);
            if let Some(parent) = file_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&file_path, content).await?;

            tracing::debug!(key = %key, bytes = content.len(), "Stored upload");
            Ok(key.to_string())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            Self::validate_key(key)?;

            match fs::remove_file(self.base_dir.join(key)).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.into()),
            }
        })
    }
}
