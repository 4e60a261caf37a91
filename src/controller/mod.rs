//! Task lifecycle controller.
//!
//! Owns the one in-flight synthesis request and every transition on it:
//! validation, submission, two-phase cancellation and the discard of late
//! results.
//!
//! # Architecture
//!
//! ```text
//! front-end ──submit(params)──▶ TaskController ──synthesize──▶ SynthesisBackend
//!           ──cancel()────────▶      │          ──cancel_task─▶
//!                                    │
//!                                    ▼
//!                              TaskObserver  (status, controls, audio)
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tts_desk::api::HttpBackend;
//! use tts_desk::config::{load_config, ServerConfig};
//! use tts_desk::controller::{SynthesisParams, TaskController};
//! use tts_desk::status::LogReporter;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = Arc::new(HttpBackend::from_config(&ServerConfig::default()));
//!     let snapshot = load_config(backend.as_ref()).await;
//!     let controller = Arc::new(TaskController::new(backend, Arc::new(LogReporter), snapshot));
//!
//!     let catalog = controller.reload_voices().await.unwrap();
//!     let voice = catalog.selected().map(|v| v.display_name.clone());
//!     let params = SynthesisParams::from_snapshot(controller.snapshot(), "Hello world", voice);
//!     if let Some(audio) = controller.submit(params).await.artifact() {
//!         println!("{} bytes", audio.bytes.len());
//!     }
//! }
//! ```

pub mod error;
pub mod observer;
pub mod request;
pub mod state;
pub mod task;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use error::{TaskError, ValidationFailure};
pub use observer::TaskObserver;
pub use request::{
    download_file_name, estimate_chunks, synthesizing_message, AudioArtifact, SynthesisParams,
};
pub use state::{Controls, TaskPhase};
pub use task::{SubmitOutcome, TaskController, CANCEL_ACK_TIMEOUT, CANCEL_FALLBACK_DELAY};
