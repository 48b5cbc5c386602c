//! File intake: which uploads are accepted and how they become snapshots.
//!
//! Accepted media types are `image/*` and `application/pdf`, up to a size
//! limit. Rejections never touch the session history.

use std::path::Path;

use retouch_protocol::ImagePayload;
use retouch_protocol::PDF_MEDIA_TYPE;
use retouch_protocol::Snapshot;

use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::config::RetouchConfig;
use crate::error::SessionError;
use crate::error::ValidationError;

/// Media type used when the extension gives no hint.
const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakePolicy {
    pub max_bytes: usize,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl From<&RetouchConfig> for IntakePolicy {
    fn from(config: &RetouchConfig) -> Self {
        Self {
            max_bytes: config.max_upload_bytes,
        }
    }
}

pub fn is_accepted_media_type(media_type: &str) -> bool {
    let media_type = media_type.trim().to_ascii_lowercase();
    media_type.starts_with("image/") || media_type == PDF_MEDIA_TYPE
}

/// Best guess at a media type from the file extension.
pub fn guess_media_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(UNKNOWN_MEDIA_TYPE)
        .to_string()
}

/// File extension used when writing a payload of `media_type` to disk.
pub fn extension_for(media_type: &str) -> &'static str {
    match media_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        PDF_MEDIA_TYPE => "pdf",
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.first().copied())
            .unwrap_or("bin"),
    }
}

impl IntakePolicy {
    /// Validate type and size, in that order.
    pub fn check(&self, media_type: &str, size: usize) -> Result<(), ValidationError> {
        if !is_accepted_media_type(media_type) {
            return Err(ValidationError::UnsupportedMediaType {
                media_type: media_type.to_string(),
            });
        }
        if size > self.max_bytes {
            return Err(ValidationError::PayloadTooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        if size == 0 {
            return Err(ValidationError::EmptyPayload);
        }
        Ok(())
    }

    /// Turn an in-memory upload into a seed snapshot.
    pub fn accept(&self, payload: ImagePayload) -> Result<Snapshot, ValidationError> {
        self.check(&payload.media_type, payload.len())?;
        Ok(Snapshot::upload(payload))
    }

    /// Read a file from disk into a seed snapshot.
    ///
    /// The size limit is checked against the file metadata before reading so
    /// oversized files are never loaded.
    pub async fn load_file(&self, path: &Path) -> Result<Snapshot, SessionError> {
        let io_err = |source| SessionError::Io {
            path: path.display().to_string(),
            source,
        };
        let media_type = guess_media_type(path);
        let metadata = tokio::fs::metadata(path).await.map_err(io_err)?;
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        self.check(&media_type, size)?;

        let data = tokio::fs::read(path).await.map_err(io_err)?;
        tracing::debug!(path = %path.display(), %media_type, bytes = data.len(), "loaded upload");
        Ok(self.accept(ImagePayload::new(media_type, data))?)
    }
}
