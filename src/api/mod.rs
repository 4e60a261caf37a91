//! Client for the synthesis server.
//!
//! This module provides:
//! * [`SynthesisBackend`]: async trait over the four server endpoints.
//! * [`HttpBackend`]: the reqwest implementation.
//! * [`AudioResponse`]: a successful synthesize response with a deferred body.
//! * [`ApiError`]: transport, server and decode failures.
//! * Wire types: [`SynthesisRequest`], [`Voice`], [`AudioFormat`], [`TaskId`].
//!
//! # Quick start
//!
//! ```rust,no_run
//! use tts_desk::api::{HttpBackend, SynthesisBackend};
//! use tts_desk::config::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = HttpBackend::from_config(&ServerConfig::default());
//!     let voices = backend.list_voices().await.unwrap();
//!     for voice in voices.voices.unwrap_or_default() {
//!         println!("{}", voice.label());
//!     }
//! }
//! ```

pub mod backend;
pub mod http;
pub mod types;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use backend::{ApiError, AudioResponse, SynthesisBackend};
pub use http::HttpBackend;
pub use types::{AudioFormat, ErrorBody, SynthesisRequest, TaskId, Voice, VoiceListResponse};
