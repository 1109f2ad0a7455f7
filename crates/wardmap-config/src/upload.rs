use std::env;
use std::path::PathBuf;

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadConfig {
    /// Directory uploads are written to.
    pub upload_dir: PathBuf,
    /// URL prefix the directory is served under.
    pub public_path: String,
    pub max_file_size: usize,
    pub max_room_images: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            public_path: "/uploads".to_string(),
            max_file_size: 10 * 1024 * 1024,
            max_room_images: 20,
        }
    }
}

impl UploadConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let public_path = env::var("UPLOAD_PUBLIC_PATH")
            .map(|p| normalize_public_path(&p))
            .unwrap_or(defaults.public_path);

        Self {
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            public_path,
            max_file_size: env_or("UPLOAD_MAX_FILE_SIZE", defaults.max_file_size),
            max_room_images: env_or("UPLOAD_MAX_ROOM_IMAGES", defaults.max_room_images),
        }
    }

    /// Request body limit for a multipart upload of `files` files, with room
    /// for multipart framing.
    pub fn body_limit(&self, files: usize) -> usize {
        self.max_file_size.saturating_mul(files).saturating_add(64 * 1024)
    }
}

fn normalize_public_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/uploads".to_string()
    } else {
        format!("/{}", trimmed)
    }
}
