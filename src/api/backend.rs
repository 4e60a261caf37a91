//! Core `SynthesisBackend` trait, its error type and the deferred audio body.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use thiserror::Error;

use crate::api::types::{SynthesisRequest, TaskId, VoiceListResponse};

// ---------------------------------------------------------------------------
// ApiError
// ---------------------------------------------------------------------------

/// Errors raised by a [`SynthesisBackend`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, reset, body aborted).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.  `detail` is the
    /// server-provided message, or a generic status line when absent.
    #[error("{detail}")]
    Server { status: u16, detail: String },

    /// A 2xx response whose body did not have the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// AudioResponse
// ---------------------------------------------------------------------------

type BodyFuture = Pin<Box<dyn Future<Output = Result<Vec<u8>, ApiError>> + Send>>;

/// A successful synthesize response whose payload has not been read yet.
///
/// Once this exists the backend has finished the task; reading the body is
/// a separate await point that can still be aborted locally.
pub struct AudioResponse {
    content_type: Option<String>,
    body: BodyFuture,
}

impl AudioResponse {
    pub fn new<F>(content_type: Option<String>, body: F) -> Self
    where
        F: Future<Output = Result<Vec<u8>, ApiError>> + Send + 'static,
    {
        Self {
            content_type,
            body: Box::pin(body),
        }
    }

    /// A response whose payload is already in memory.
    pub fn ready(content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self::new(content_type, async move { Ok(bytes) })
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Read the whole payload.
    pub async fn into_bytes(self) -> Result<Vec<u8>, ApiError> {
        self.body.await
    }
}

// ---------------------------------------------------------------------------
// SynthesisBackend trait
// ---------------------------------------------------------------------------

/// The four endpoints the client talks to.
///
/// Implementors must be `Send + Sync` so the controller can hold them behind
/// an `Arc<dyn SynthesisBackend>` and call them from spawned tasks.
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// `GET /api/config`: raw JSON, interpreted field by field by the caller.
    async fn fetch_config(&self) -> Result<serde_json::Value, ApiError>;

    /// `GET /api/voices`.
    async fn list_voices(&self) -> Result<VoiceListResponse, ApiError>;

    /// `POST /api/synthesize`.  Dropping the returned future aborts the
    /// request at the transport level.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioResponse, ApiError>;

    /// `POST /api/cancel_task/{task_id}`.  The response body is advisory.
    async fn cancel_task(&self, task_id: &TaskId) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ready_response_yields_its_bytes() {
        let response = AudioResponse::ready(Some("audio/wav".into()), vec![1, 2, 3]);
        assert_eq!(response.content_type(), Some("audio/wav"));
        assert_eq!(response.into_bytes().await.unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn server_error_displays_detail_only() {
        let err = ApiError::Server {
            status: 500,
            detail: "Speech synthesis failed to produce audio.".into(),
        };
        assert_eq!(err.to_string(), "Speech synthesis failed to produce audio.");
    }
}
