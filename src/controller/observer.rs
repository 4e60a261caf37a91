//! The callback surface the controller drives.

use crate::api::TaskId;
use crate::controller::request::AudioArtifact;
use crate::controller::state::Controls;
use crate::status::{LogReporter, StatusReporter};
use crate::voices::VoiceCatalog;

/// Receives every user-visible effect of the controller.
///
/// Only [`StatusReporter::report`] is required; the other callbacks default
/// to no-ops so headless callers implement just what they render.
///
/// Callbacks are invoked after the controller has released its state lock,
/// so an observer may query the controller from inside a callback.
pub trait TaskObserver: StatusReporter {
    /// A task handle was created and the request is about to be sent.
    fn on_task_started(&self, _task_id: &TaskId) {}

    /// The task handle was destroyed.  Called exactly once per started task.
    fn on_task_ended(&self) {}

    /// Button state changed (any transition, or a voice reload).
    fn on_controls_changed(&self, _controls: Controls) {}

    /// A task completed with audio.  Never called for an aborted task.
    fn on_audio_ready(&self, _artifact: &AudioArtifact) {}

    /// A voice reload finished; `catalog` is empty on failure.
    fn on_voices_loaded(&self, _catalog: &VoiceCatalog) {}
}

/// Headless observer: status messages go to the log, everything else is
/// ignored.
impl TaskObserver for LogReporter {}
