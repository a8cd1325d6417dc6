use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::Rng;
use thiserror::Error;

/// An image file received in a multipart form, held in memory.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error, PartialEq)]
pub enum UploadError {
    #[error("Only image files are allowed!")]
    NotAnImage(String),

    #[error("File too large. Maximum size is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("Uploaded file is empty")]
    Empty,
}

pub struct UploadStore {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadStore {
    /// Creates the directory if it doesn't exist.
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create uploads directory {}", dir.display()))?;

        log::info!("📁 Uploads directory: {}", dir.display());
        Ok(Self { dir, max_bytes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn validate(&self, image: &UploadedImage) -> Result<(), UploadError> {
        if !image.content_type.to_lowercase().starts_with("image/") {
            return Err(UploadError::NotAnImage(image.content_type.clone()));
        }
        if image.bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if image.bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: image.bytes.len(),
                max: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Write the image under a fresh name and return that name.
    pub async fn save(&self, image: &UploadedImage) -> Result<String> {
        let file_name = stored_file_name(image);
        let path = self.dir.join(&file_name);

        tokio::fs::write(&path, &image.bytes)
            .await
            .with_context(|| format!("Failed to write upload {}", path.display()))?;

        log::info!("💾 Saved {} bytes to {}", image.bytes.len(), path.display());
        Ok(file_name)
    }

    /// Best-effort delete, for uploads whose owning record was never written.
    pub async fn remove(&self, file_name: &str) {
        let path = self.dir.join(file_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => log::info!("🗑️ Removed orphaned upload {}", path.display()),
            Err(e) => log::warn!("⚠️ Failed to remove upload {}: {}", path.display(), e),
        }
    }
}

/// `<field>-<unix millis>-<random>.<ext>`
fn stored_file_name(image: &UploadedImage) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let millis = chrono::Utc::now().timestamp_millis();

    format!(
        "{}-{}-{}.{}",
        sanitize_field(&image.field),
        millis,
        suffix,
        extension_for(image.file_name.as_deref(), &image.content_type)
    )
}

fn sanitize_field(field: &str) -> String {
    let cleaned: String = field
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

/// Prefer the client's extension; otherwise derive one from the media type.
fn extension_for(file_name: Option<&str>, content_type: &str) -> String {
    let from_name = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    if let Some(ext) = from_name {
        return ext;
    }

    match content_type.to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg".to_string(),
        "image/png" => "png".to_string(),
        "image/webp" => "webp".to_string(),
        "image/gif" => "gif".to_string(),
        "image/heic" => "heic".to_string(),
        _ => "img".to_string(),
    }
}
