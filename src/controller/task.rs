//! `TaskController`: single-flight synthesis with two-phase cancellation.
//!
//! # Flow
//!
//! ```text
//! submit(params)
//!   └─▶ validate → publish handle                           [Submitting]
//!         └─▶ POST /api/synthesize  (raced against token)
//!               └─▶ response head: task id released
//!                     └─▶ body      (raced against token)
//!                           ├─ Ok   → artifact, handle destroyed   [Idle]
//!                           └─ Err  → error status, handle destroyed [Idle]
//!
//! cancel()
//!   └─▶ fire token, state = Cancelling                      [Cancelling]
//!         ├─ task id known → spawn POST /api/cancel_task/{id}
//!         │                    └─ ack or failure → handle destroyed [Idle]
//!         └─ no task id    → spawn fixed delay → handle destroyed   [Idle]
//! ```
//!
//! The state lock is a `std::sync::Mutex` that is never held across an
//! `.await`, so every transition between two await points is atomic.
//! Finalizers identify their handle by sequence number and do nothing when
//! it is no longer current; that is what discards late results.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Local;
use tokio_util::sync::CancellationToken;

use crate::api::{SynthesisBackend, TaskId};
use crate::config::ConfigurationSnapshot;
use crate::controller::error::{TaskError, ValidationFailure};
use crate::controller::observer::TaskObserver;
use crate::controller::request::{
    estimate_chunks, synthesizing_message, AudioArtifact, SynthesisParams,
};
use crate::controller::state::{Controls, TaskHandle, TaskPhase, TaskState};
use crate::status::Severity;
use crate::voices::{load_voices, CatalogError, VoiceCatalog};

/// How long a cancel without a task id waits before returning to `Idle`.
pub const CANCEL_FALLBACK_DELAY: Duration = Duration::from_millis(1000);

/// Longest wait for the backend to answer a cancel notification.  When it
/// elapses the cancellation is treated as acknowledged.
pub const CANCEL_ACK_TIMEOUT: Duration = Duration::from_secs(20);

const MSG_SUCCESS: &str = "Synthesis successful!";
const MSG_CANCEL_REQUESTED: &str =
    "Cancellation request sent. Waiting for current operation to complete...";
const MSG_CANCELLED_BY_USER: &str =
    "Synthesis cancelled by user. Backend notified. This may take some time to fully stop.";
const MSG_ABORTED: &str = "Synthesis aborted (e.g., navigation or network issue).";

// ---------------------------------------------------------------------------
// SubmitOutcome
// ---------------------------------------------------------------------------

/// How a call to [`TaskController::submit`] ended.
///
/// Every variant has already been reported to the observer; the value is
/// for callers that want the artifact or need to branch on the result.
#[derive(Debug)]
pub enum SubmitOutcome {
    Completed(AudioArtifact),
    Failed(TaskError),
    /// The user cancelled; the remote acknowledgment ends the task.
    Cancelled,
    /// The token fired without a user cancel (see [`TaskController::shutdown`]).
    Aborted,
    /// Submit was pressed while a cancellation was still settling.
    Ignored,
}

impl SubmitOutcome {
    pub fn artifact(&self) -> Option<&AudioArtifact> {
        match self {
            SubmitOutcome::Completed(a) => Some(a),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// TaskController
// ---------------------------------------------------------------------------

struct Inner {
    state: TaskState,
    catalog: VoiceCatalog,
    next_seq: u64,
    /// Sequence number of the most recent user-cancelled handle.
    last_cancelled: Option<u64>,
}

impl Inner {
    fn controls(&self) -> Controls {
        Controls::for_phase(self.state.phase(), !self.catalog.is_empty())
    }
}

enum AbortKind {
    ByUser,
    Transport(Controls),
    Stale { user_cancelled: bool },
}

/// Owns the single task slot and every transition on it.
///
/// Construct it once, wrap it in an `Arc`, and hand clones to whatever
/// drives it.  [`cancel`](Self::cancel) spawns the remote notification and
/// must therefore run inside a tokio runtime.
pub struct TaskController {
    backend: Arc<dyn SynthesisBackend>,
    observer: Arc<dyn TaskObserver>,
    snapshot: ConfigurationSnapshot,
    cancel_fallback_delay: Duration,
    cancel_ack_timeout: Duration,
    inner: Mutex<Inner>,
}

impl TaskController {
    /// Create a controller in `Idle` with an empty catalog.
    ///
    /// # Arguments
    ///
    /// * `backend`:  the synthesis server client (e.g. `HttpBackend`).
    /// * `observer`: receives status messages and transitions.
    /// * `snapshot`: server defaults; supplies `max_text_chars` and the
    ///   fallback default voice.
    pub fn new(
        backend: Arc<dyn SynthesisBackend>,
        observer: Arc<dyn TaskObserver>,
        snapshot: ConfigurationSnapshot,
    ) -> Self {
        Self {
            backend,
            observer,
            snapshot,
            cancel_fallback_delay: CANCEL_FALLBACK_DELAY,
            cancel_ack_timeout: CANCEL_ACK_TIMEOUT,
            inner: Mutex::new(Inner {
                state: TaskState::Idle,
                catalog: VoiceCatalog::empty(),
                next_seq: 0,
                last_cancelled: None,
            }),
        }
    }

    /// Override [`CANCEL_FALLBACK_DELAY`].
    pub fn with_cancel_fallback_delay(mut self, delay: Duration) -> Self {
        self.cancel_fallback_delay = delay;
        self
    }

    /// Override [`CANCEL_ACK_TIMEOUT`].
    pub fn with_cancel_ack_timeout(mut self, timeout: Duration) -> Self {
        self.cancel_ack_timeout = timeout;
        self
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> TaskPhase {
        self.lock().state.phase()
    }

    pub fn controls(&self) -> Controls {
        self.lock().controls()
    }

    /// Id of the in-flight task, while the backend is still tracking it.
    pub fn current_task_id(&self) -> Option<TaskId> {
        self.lock().state.handle().and_then(|h| h.task_id.clone())
    }

    pub fn catalog(&self) -> VoiceCatalog {
        self.lock().catalog.clone()
    }

    pub fn snapshot(&self) -> &ConfigurationSnapshot {
        &self.snapshot
    }

    // -----------------------------------------------------------------------
    // Voice catalog
    // -----------------------------------------------------------------------

    /// Load the voice list and install it (an empty catalog on failure).
    ///
    /// Controls are recomputed and reported whatever the outcome, so the
    /// front-end never stays in its loading state.
    pub async fn reload_voices(&self) -> Result<VoiceCatalog, CatalogError> {
        let loading = {
            let mut inner = self.lock();
            inner.catalog = VoiceCatalog::empty();
            inner.controls()
        };
        self.observer.on_controls_changed(loading);

        let result = load_voices(
            self.backend.as_ref(),
            self.observer.as_ref(),
            &self.snapshot.default_voice,
        )
        .await;

        let catalog = result.as_ref().cloned().unwrap_or_default();
        let controls = {
            let mut inner = self.lock();
            inner.catalog = catalog.clone();
            inner.controls()
        };

        self.observer.on_voices_loaded(&catalog);
        self.observer.on_controls_changed(controls);
        result
    }

    // -----------------------------------------------------------------------
    // submit
    // -----------------------------------------------------------------------

    /// Start a task and drive it to completion.
    ///
    /// Returns once the task has completed, failed, or been aborted locally.
    /// After a user cancel the returned outcome is `Cancelled` while the
    /// handle itself lives on until the remote acknowledgment.
    pub async fn submit(&self, params: SynthesisParams) -> SubmitOutcome {
        let started = {
            let mut inner = self.lock();
            match inner.state.phase() {
                TaskPhase::Cancelling => {
                    log::debug!("controller: submit ignored while a cancellation is settling");
                    return SubmitOutcome::Ignored;
                }
                TaskPhase::Submitting => Err(ValidationFailure::TaskInFlight),
                TaskPhase::Idle => {
                    let task_id = TaskId::generate();
                    params
                        .into_request(task_id.clone(), &inner.catalog, self.snapshot.max_text_chars)
                        .map(|request| {
                            inner.next_seq += 1;
                            let seq = inner.next_seq;
                            let token = CancellationToken::new();
                            inner.state = TaskState::Submitting(TaskHandle::new(
                                seq,
                                task_id,
                                token.clone(),
                            ));
                            (seq, token, request, inner.controls())
                        })
                }
            }
        };

        let (seq, token, request, controls) = match started {
            Ok(started) => started,
            Err(failure) => {
                log::debug!("controller: submit rejected: {failure}");
                self.observer.report(&failure.to_string(), Severity::Error);
                return SubmitOutcome::Failed(failure.into());
            }
        };

        let chunks = estimate_chunks(&request.text, request.chunk_size_chars);
        log::info!(
            "controller: task {} started ({} chunk(s), voice {})",
            request.task_id,
            chunks,
            request.voice_name
        );
        self.observer.on_task_started(&request.task_id);
        self.observer.on_controls_changed(controls);
        self.observer
            .report(&synthesizing_message(chunks, &request.voice_name), Severity::Info);

        // ── 1. Request / response head ───────────────────────────────────
        let response = match until_cancelled(&token, self.backend.synthesize(&request)).await {
            None => return self.finish_aborted(seq),
            Some(Err(e)) => return self.finish_failed(seq, e.into()),
            Some(Ok(response)) => response,
        };

        // The server has finished and unregistered the task.
        self.release_task_id(seq);

        // ── 2. Payload ───────────────────────────────────────────────────
        let content_type = response.content_type().map(str::to_string);
        let bytes = match until_cancelled(&token, response.into_bytes()).await {
            None => return self.finish_aborted(seq),
            Some(Err(e)) => return self.finish_failed(seq, e.into()),
            Some(Ok(bytes)) => bytes,
        };

        let artifact =
            AudioArtifact::new(&request, content_type, bytes, Local::now().naive_local());
        self.finish_completed(seq, artifact)
    }

    // -----------------------------------------------------------------------
    // cancel / shutdown
    // -----------------------------------------------------------------------

    /// Request cancellation of the in-flight task.
    ///
    /// No-op without a task or when already cancelling.  Otherwise the
    /// local abort fires immediately and the backend is notified in a
    /// spawned task; the handle is destroyed when that notification
    /// finishes, whether it succeeded or not.
    pub fn cancel(self: &Arc<Self>) {
        let cancelled = {
            let mut inner = self.lock();
            match std::mem::take(&mut inner.state) {
                TaskState::Submitting(handle) => {
                    handle.token.cancel();
                    let seq = handle.seq;
                    let task_id = handle.task_id.clone();
                    inner.state = TaskState::Cancelling(handle);
                    inner.last_cancelled = Some(seq);
                    Some((seq, task_id, inner.controls()))
                }
                other => {
                    inner.state = other;
                    None
                }
            }
        };

        let Some((seq, task_id, controls)) = cancelled else {
            log::debug!("controller: cancel ignored, no active synthesis to cancel");
            return;
        };

        self.observer.on_controls_changed(controls);
        self.observer.report(MSG_CANCEL_REQUESTED, Severity::Info);

        let controller = Arc::clone(self);
        match task_id {
            Some(task_id) => {
                log::info!("controller: cancel initiated for task {task_id}");
                let ack_timeout = self.cancel_ack_timeout;
                tokio::spawn(async move {
                    let notify = controller.backend.cancel_task(&task_id);
                    match tokio::time::timeout(ack_timeout, notify).await {
                        Ok(Ok(())) => {
                            log::info!("controller: cancel acknowledged for task {task_id}")
                        }
                        Ok(Err(e)) => log::warn!(
                            "controller: cancel notification for task {task_id} failed: {e}"
                        ),
                        Err(_) => log::warn!(
                            "controller: cancel notification for task {task_id} timed out \
                             after {ack_timeout:?}"
                        ),
                    }
                    controller.finish_cancelled(seq);
                });
            }
            None => {
                log::info!("controller: cancel with no task id, resetting after delay");
                let delay = self.cancel_fallback_delay;
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    controller.finish_cancelled(seq);
                });
            }
        }
    }

    /// Abort the in-flight request locally without notifying the backend.
    ///
    /// Used when the front-end goes away.  The pending `submit` resolves
    /// with [`SubmitOutcome::Aborted`] unless the user had already cancelled.
    pub fn shutdown(&self) {
        let inner = self.lock();
        if let Some(handle) = inner.state.handle() {
            log::info!("controller: shutting down, aborting in-flight request");
            handle.token.cancel();
        }
    }

    // -----------------------------------------------------------------------
    // Finalizers
    // -----------------------------------------------------------------------

    fn release_task_id(&self, seq: u64) {
        let mut inner = self.lock();
        if let TaskState::Submitting(handle) | TaskState::Cancelling(handle) = &mut inner.state {
            if handle.seq == seq {
                handle.task_id = None;
            }
        }
    }

    fn finish_completed(&self, seq: u64, artifact: AudioArtifact) -> SubmitOutcome {
        let ended = {
            let mut inner = self.lock();
            match &inner.state {
                TaskState::Submitting(h) if h.seq == seq => {
                    inner.state = TaskState::Idle;
                    Some(inner.controls())
                }
                _ => None,
            }
        };

        let Some(controls) = ended else {
            log::info!(
                "controller: discarding late result for task {}",
                artifact.task_id
            );
            return self.finish_aborted(seq);
        };

        log::info!(
            "controller: task {} completed ({} bytes)",
            artifact.task_id,
            artifact.bytes.len()
        );
        self.observer.on_audio_ready(&artifact);
        self.observer.report(MSG_SUCCESS, Severity::Success);
        self.observer.on_task_ended();
        self.observer.on_controls_changed(controls);
        SubmitOutcome::Completed(artifact)
    }

    fn finish_failed(&self, seq: u64, error: TaskError) -> SubmitOutcome {
        let ended = {
            let mut inner = self.lock();
            match &inner.state {
                TaskState::Submitting(h) if h.seq == seq => {
                    inner.state = TaskState::Idle;
                    Some(inner.controls())
                }
                _ => None,
            }
        };

        let Some(controls) = ended else {
            log::debug!("controller: ignoring error after abort: {error}");
            return self.finish_aborted(seq);
        };

        log::error!("controller: synthesis error: {error}");
        self.observer
            .report(&format!("Synthesis error: {error}"), Severity::Error);
        self.observer.on_task_ended();
        self.observer.on_controls_changed(controls);
        SubmitOutcome::Failed(error)
    }

    fn finish_aborted(&self, seq: u64) -> SubmitOutcome {
        let kind = {
            let mut inner = self.lock();
            match &inner.state {
                TaskState::Cancelling(h) if h.seq == seq => AbortKind::ByUser,
                TaskState::Submitting(h) if h.seq == seq => {
                    inner.state = TaskState::Idle;
                    AbortKind::Transport(inner.controls())
                }
                _ => AbortKind::Stale {
                    user_cancelled: inner.last_cancelled == Some(seq)
                        && inner.state.phase() == TaskPhase::Idle,
                },
            }
        };

        match kind {
            AbortKind::ByUser => {
                log::info!("controller: request aborted by user");
                self.observer.report(MSG_CANCELLED_BY_USER, Severity::Info);
                SubmitOutcome::Cancelled
            }
            AbortKind::Transport(controls) => {
                log::info!("controller: request aborted without user cancel");
                self.observer.report(MSG_ABORTED, Severity::Info);
                self.observer.on_task_ended();
                self.observer.on_controls_changed(controls);
                SubmitOutcome::Aborted
            }
            AbortKind::Stale { user_cancelled } => {
                // Cancellation already settled; only the message is still owed.
                if user_cancelled {
                    self.observer.report(MSG_CANCELLED_BY_USER, Severity::Info);
                }
                SubmitOutcome::Cancelled
            }
        }
    }

    fn finish_cancelled(&self, seq: u64) {
        let ended = {
            let mut inner = self.lock();
            match &inner.state {
                TaskState::Cancelling(h) if h.seq == seq => {
                    inner.state = TaskState::Idle;
                    Some(inner.controls())
                }
                _ => None,
            }
        };

        if let Some(controls) = ended {
            log::debug!("controller: cancellation settled, back to Idle");
            self.observer.on_task_ended();
            self.observer.on_controls_changed(controls);
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Drive `fut` unless `token` fires first; dropping `fut` aborts it.
async fn until_cancelled<F: Future>(token: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;

        () = token.cancelled() => None,
        out = fut => Some(out),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
