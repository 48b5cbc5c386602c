//! Error taxonomy for edit sessions.
//!
//! Validation errors are raised before any network call. Edit errors come
//! back from the model service and revert the session to editing. Suggestion
//! failures never reach this module: the client downgrades them to an empty
//! list.

use thiserror::Error;

use crate::api_clients::ApiError;

/// Maximum number of characters of model commentary kept in an error message.
pub const COMMENTARY_LIMIT: usize = 150;

/// Input rejected before anything is sent to the model service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please upload an image or PDF to edit.")]
    MissingSnapshot,

    #[error("Please enter an instruction.")]
    EmptyInstruction,

    #[error("Please upload a valid image or PDF file (got {media_type}).")]
    UnsupportedMediaType { media_type: String },

    #[error("File size too large ({size} bytes). Please upload a file under {limit} bytes.")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("The selected file is empty.")]
    EmptyPayload,
}

/// Failure of a single edit submission.
#[derive(Debug, Error)]
pub enum EditError {
    /// The service halted generation for policy or safety reasons.
    #[error("Generation stopped due to: {reason}")]
    ModelRefusal { reason: String },

    /// The service answered with text instead of image data.
    #[error("{}", no_image_message(.commentary))]
    NoImageReturned { commentary: Option<String> },

    #[error(transparent)]
    Transport(#[from] ApiError),
}

impl EditError {
    /// Build a `NoImageReturned` from raw model text, collapsing newlines and
    /// truncating long commentary.
    pub fn no_image(text: Option<&str>) -> Self {
        let commentary = text
            .map(|t| t.replace('\n', " ").trim().to_string())
            .filter(|t| !t.is_empty())
            .map(|t| truncate_commentary(&t));
        EditError::NoImageReturned { commentary }
    }

    /// Machine-readable kind, used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            EditError::ModelRefusal { .. } => "model_refusal",
            EditError::NoImageReturned { .. } => "no_image_returned",
            EditError::Transport(_) => "transport_error",
        }
    }
}

fn no_image_message(commentary: &Option<String>) -> String {
    match commentary {
        Some(text) => format!("The model returned a message instead of an image: \"{text}\""),
        None => "The model completed the request but returned no image data. \
                 Please try a different prompt or image."
            .to_string(),
    }
}

fn truncate_commentary(text: &str) -> String {
    if text.chars().count() <= COMMENTARY_LIMIT {
        return text.to_string();
    }
    let mut out: String = text.chars().take(COMMENTARY_LIMIT).collect();
    out.push_str("...");
    out
}

/// Errors returned by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Edit(#[from] EditError),

    #[error("There is no generated result to accept.")]
    NoCandidate,

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
