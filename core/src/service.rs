//! Boundary to the hosted model service that performs the actual edits.

use async_trait::async_trait;
use retouch_protocol::ImagePayload;

use crate::error::EditError;

/// Opaque request/response boundary used by the session driver.
///
/// `GeminiClient` is the production implementation; tests script their own.
#[async_trait]
pub trait RemoteEditService: Send + Sync {
    /// Apply a natural-language instruction to `payload` and return the edited
    /// image.
    async fn edit(&self, payload: &ImagePayload, instruction: &str)
    -> Result<ImagePayload, EditError>;

    /// Propose short editing instructions tailored to `payload`.
    ///
    /// Best-effort: implementations return an empty list on any failure so
    /// callers can fall back to the static defaults.
    async fn suggest(&self, payload: &ImagePayload) -> Vec<String>;
}
