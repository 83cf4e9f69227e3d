//! Photo storage
//!
//! Uploads land in a [`BlobStore`] and are referenced by public URL. Image
//! type is decided from the file's leading bytes, never from the client's
//! file name or content type.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use uuid::Uuid;

/// Destination for uploaded files
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `folder` and return the public URL
    async fn put(&self, folder: &str, extension: &str, bytes: &[u8]) -> Result<String>;
}

/// Filesystem-backed store; files are served back by the HTTP layer
pub struct LocalBlobStore {
    root: PathBuf,
    public_prefix: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, folder: &str, extension: &str, bytes: &[u8]) -> Result<String> {
        let dir = self.root.join(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create upload directory {:?}", dir))?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = dir.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write upload {:?}", path))?;

        Ok(format!("{}/{}/{}", self.public_prefix, folder, file_name))
    }
}

/// A file part received from a multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
}

impl ImageKind {
    /// Detect the image type from magic bytes
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageKind::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageKind::Gif)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
        }
    }
}

/// Check an upload against the allowed image types and size cap
///
/// Returns the detected type, or the field message to report.
pub fn validate_image(
    field: &str,
    file: &UploadedFile,
    allowed: &[ImageKind],
    max_bytes: usize,
) -> std::result::Result<ImageKind, String> {
    let Some(kind) = ImageKind::sniff(&file.bytes) else {
        return Err(format!("The {} field must be an image.", field));
    };

    if !allowed.contains(&kind) {
        let names: Vec<&str> = allowed
            .iter()
            .flat_map(|k| match k {
                ImageKind::Jpeg => vec!["jpeg", "jpg"],
                ImageKind::Png => vec!["png"],
                ImageKind::Gif => vec!["gif"],
            })
            .collect();
        return Err(format!(
            "The {} field must be a file of type: {}.",
            field,
            names.join(", ")
        ));
    }

    if file.bytes.len() > max_bytes {
        return Err(format!(
            "The {} field must not be greater than {} kilobytes.",
            field,
            max_bytes / 1024
        ));
    }

    Ok(kind)
}
