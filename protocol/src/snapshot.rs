use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_with::base64::Base64;
use serde_with::serde_as;
use uuid::Uuid;

/// Media type of PDF documents, the only non-image type accepted for editing.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Media type assumed for generated images when the service omits one.
pub const DEFAULT_GENERATED_MEDIA_TYPE: &str = "image/png";

/// Opaque, never-reused identity of a [`Snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(Uuid);

impl SnapshotId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SnapshotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors produced when decoding a payload from its textual forms.
#[derive(Debug, thiserror::Error)]
pub enum PayloadDecodeError {
    #[error("not a data URI")]
    NotDataUri,

    #[error("data URI is not base64 encoded")]
    NotBase64Encoded,

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
}

/// Raw encoded image or document bytes together with their media type.
#[serde_as]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub media_type: String,
    #[serde_as(as = "Base64")]
    pub data: Vec<u8>,
}

impl ImagePayload {
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    /// Decode a standard base64 body, as returned inline by the model service.
    pub fn from_base64(
        media_type: impl Into<String>,
        encoded: &str,
    ) -> Result<Self, PayloadDecodeError> {
        Ok(Self::new(media_type, BASE64.decode(encoded.trim())?))
    }

    /// Parse a `data:<mime>;base64,<body>` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self, PayloadDecodeError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or(PayloadDecodeError::NotDataUri)?;
        let (header, body) = rest
            .split_once(',')
            .ok_or(PayloadDecodeError::NotDataUri)?;
        let media_type = header
            .strip_suffix(";base64")
            .ok_or(PayloadDecodeError::NotBase64Encoded)?;
        let media_type = if media_type.is_empty() {
            DEFAULT_GENERATED_MEDIA_TYPE
        } else {
            media_type
        };
        Self::from_base64(media_type, body)
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.data)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_pdf(&self) -> bool {
        self.media_type.eq_ignore_ascii_case(PDF_MEDIA_TYPE)
    }

    /// Short uppercase format tag, e.g. `PNG` for `image/png`.
    pub fn format_tag(&self) -> String {
        self.media_type
            .split_once('/')
            .map_or(self.media_type.as_str(), |(_, subtype)| subtype)
            .to_ascii_uppercase()
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("media_type", &self.media_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// How a snapshot came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SnapshotOrigin {
    /// Seeded from a user-supplied file.
    Upload,
    /// Produced by the model service and accepted (or pending acceptance).
    Generated,
}

/// One immutable version of the edited artifact.
///
/// Cloning is cheap: the payload is shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    id: SnapshotId,
    payload: Arc<ImagePayload>,
    created_at: DateTime<Utc>,
    origin: SnapshotOrigin,
}

impl Snapshot {
    pub fn upload(payload: ImagePayload) -> Self {
        Self::with_origin(payload, SnapshotOrigin::Upload)
    }

    pub fn generated(payload: ImagePayload) -> Self {
        Self::with_origin(payload, SnapshotOrigin::Generated)
    }

    fn with_origin(payload: ImagePayload, origin: SnapshotOrigin) -> Self {
        Self {
            id: SnapshotId::new(),
            payload: Arc::new(payload),
            created_at: Utc::now(),
            origin,
        }
    }

    pub fn id(&self) -> SnapshotId {
        self.id
    }

    pub fn payload(&self) -> &ImagePayload {
        &self.payload
    }

    /// Shared handle to the payload, for handing to a request without copying.
    pub fn shared_payload(&self) -> Arc<ImagePayload> {
        Arc::clone(&self.payload)
    }

    pub fn media_type(&self) -> &str {
        &self.payload.media_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn origin(&self) -> SnapshotOrigin {
        self.origin
    }

    pub fn is_pdf(&self) -> bool {
        self.payload.is_pdf()
    }
}
