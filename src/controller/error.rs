//! Failure taxonomy surfaced by the controller.

use thiserror::Error;

use crate::api::ApiError;
use crate::voices::CatalogError;

/// A submission that was refused before any network call was made.
///
/// The `Display` text is the status message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("A synthesis task is already in progress.")]
    TaskInFlight,

    #[error("Please enter text to synthesize.")]
    EmptyText,

    #[error("Text is too long ({len} / {max} characters).")]
    TextTooLong { len: usize, max: usize },

    #[error("Please select a voice.")]
    NoVoiceSelected,

    #[error("Voice '{0}' is not available.")]
    UnknownVoice(String),

    #[error("Style instructions are too long ({len} / {max} characters).")]
    StylePromptTooLong { len: usize, max: usize },

    #[error("Chunk size must be greater than zero.")]
    InvalidChunkSize,

    #[error("API timeout must be greater than zero.")]
    InvalidTimeout,
}

/// Everything that can end a task (or a catalog load) unsuccessfully.
///
/// Cancellation is not listed: it is a state of the controller, not a fault.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TaskError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    /// Transport failure, or a 2xx response whose body could not be used.
    /// Never retried automatically.
    #[error("{0}")]
    Network(String),

    /// Non-2xx response; `detail` is the server's message when it sent one.
    #[error("{detail}")]
    Server { status: u16, detail: String },

    /// The server has no voices; submission stays disabled until a reload.
    #[error("No voices available from the server.")]
    NoVoicesAvailable,
}

impl From<ApiError> for TaskError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Server { status, detail } => TaskError::Server { status, detail },
            other @ (ApiError::Network(_) | ApiError::Decode(_)) => {
                TaskError::Network(other.to_string())
            }
        }
    }
}

impl From<CatalogError> for TaskError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NoVoicesAvailable => TaskError::NoVoicesAvailable,
            CatalogError::Api(api) => api.into(),
        }
    }
}
