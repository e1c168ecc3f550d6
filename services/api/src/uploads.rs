//! Profile image uploads
//!
//! Images arrive either as a multipart file field or as a base64 data URL in
//! a JSON body. Depending on [`ImageStorage`] they are kept inline in the
//! user row or written to the upload directory.

use std::path::{Path, PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    models::StoredImage,
    settings::{ImageStorage, Settings},
};

/// Route prefix the upload directory is served under in disk mode
pub const UPLOADS_ROUTE: &str = "/uploads";

const ALLOWED_MIME_TYPES: [(&str, &str); 4] = [
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/webp", "webp"),
];

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(&'static str),

    #[error("Failed to write image: {0}")]
    Io(#[from] std::io::Error),
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Io(e) => ApiError::Internal(anyhow::Error::new(e)),
            too_large @ UploadError::TooLarge { .. } => {
                ApiError::PayloadTooLarge(too_large.to_string())
            }
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

/// An image as received from the client, before storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Lowercase the type and drop parameters; `image/jpg` is folded into `image/jpeg`
pub fn normalize_mime(mime: &str) -> String {
    let essence = mime
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    if essence == "image/jpg" {
        "image/jpeg".to_string()
    } else {
        essence
    }
}

/// Guess the type of an upload that arrived without a usable `Content-Type`
pub fn mime_from_file_name(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    let ext = if ext == "jpeg" { "jpg" } else { ext.as_str() };

    ALLOWED_MIME_TYPES
        .iter()
        .find(|(_, allowed)| *allowed == ext)
        .map(|(mime, _)| mime.to_string())
}

fn extension_for(mime: &str) -> Option<&'static str> {
    ALLOWED_MIME_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == mime)
        .map(|(_, ext)| *ext)
}

pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Parse `data:<mime>;base64,<payload>`
pub fn parse_data_url(value: &str) -> Result<ImageUpload, UploadError> {
    let rest = value
        .strip_prefix("data:")
        .ok_or(UploadError::InvalidDataUrl("missing data: scheme"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or(UploadError::InvalidDataUrl("missing payload separator"))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or(UploadError::InvalidDataUrl("only base64 payloads are supported"))?;
    if mime_type.is_empty() {
        return Err(UploadError::InvalidDataUrl("missing media type"));
    }

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| UploadError::InvalidDataUrl("payload is not valid base64"))?;

    Ok(ImageUpload {
        bytes,
        mime_type: normalize_mime(mime_type),
    })
}

/// Public URL for a stored profile image
///
/// Inline bytes win over a file path when a row somehow carries both.
pub fn profile_image_url(
    bytes: Option<&[u8]>,
    path: Option<&str>,
    mime_type: Option<&str>,
) -> Option<String> {
    match (bytes, path) {
        (Some(bytes), _) => Some(encode_data_url(
            mime_type.unwrap_or("application/octet-stream"),
            bytes,
        )),
        (None, Some(path)) => Some(format!("{}/{}", UPLOADS_ROUTE, path)),
        (None, None) => None,
    }
}

/// Accepts, stores and discards profile images
#[derive(Debug, Clone)]
pub struct ImageStore {
    mode: ImageStorage,
    upload_dir: PathBuf,
    max_bytes: usize,
}

impl ImageStore {
    pub fn new(mode: ImageStorage, upload_dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            mode,
            upload_dir: upload_dir.into(),
            max_bytes,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.image_storage,
            settings.upload_dir.clone(),
            settings.max_upload_bytes,
        )
    }

    pub fn mode(&self) -> ImageStorage {
        self.mode
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Create the upload directory when running in disk mode
    pub async fn prepare(&self) -> Result<(), UploadError> {
        if self.mode == ImageStorage::Disk {
            tokio::fs::create_dir_all(&self.upload_dir).await?;
            info!("Storing profile images under {}", self.upload_dir.display());
        }
        Ok(())
    }

    /// Reject unsupported types and oversized images
    pub fn check(&self, upload: &ImageUpload) -> Result<(), UploadError> {
        if extension_for(&upload.mime_type).is_none() {
            return Err(UploadError::UnsupportedType(upload.mime_type.clone()));
        }
        if upload.bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                size: upload.bytes.len(),
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    pub async fn store(&self, upload: ImageUpload) -> Result<StoredImage, UploadError> {
        self.check(&upload)?;

        match self.mode {
            ImageStorage::Database => Ok(StoredImage::Inline {
                bytes: upload.bytes,
                mime_type: upload.mime_type,
            }),
            ImageStorage::Disk => {
                let ext = extension_for(&upload.mime_type)
                    .ok_or_else(|| UploadError::UnsupportedType(upload.mime_type.clone()))?;
                let file_name = format!("{}.{}", Uuid::new_v4(), ext);

                tokio::fs::create_dir_all(&self.upload_dir).await?;
                tokio::fs::write(self.upload_dir.join(&file_name), &upload.bytes).await?;
                info!("Wrote profile image {}", file_name);

                Ok(StoredImage::File {
                    file_name,
                    mime_type: upload.mime_type,
                })
            }
        }
    }

    /// Remove a file written by [`ImageStore::store`] whose row never landed
    pub async fn discard(&self, image: &StoredImage) {
        if let StoredImage::File { file_name, .. } = image {
            let path = self.upload_dir.join(file_name);
            if let Err(e) = tokio::fs::remove_file(&path).await {
                warn!("Failed to remove orphaned upload {}: {}", path.display(), e);
            }
        }
    }
}
