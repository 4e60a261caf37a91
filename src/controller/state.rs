//! Task state machine and the button state derived from it.
//!
//! [`TaskPhase`] is the public view of the controller's state.  The private
//! [`TaskState`] carries the single [`TaskHandle`] in the phases that have
//! one, so "a handle exists" and "the phase is busy" cannot disagree.

use tokio_util::sync::CancellationToken;

use crate::api::TaskId;

// ---------------------------------------------------------------------------
// TaskPhase
// ---------------------------------------------------------------------------

/// Phases of the task lifecycle.
///
/// ```text
/// Idle ──submit──▶ Submitting ──success / failure / abort──▶ Idle
///                  Submitting ──cancel──▶ Cancelling ──remote ack──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskPhase {
    /// No task; a submit may start one.
    #[default]
    Idle,

    /// A request is in flight and the user has not cancelled it.
    Submitting,

    /// The local abort has fired; waiting for the remote acknowledgment.
    /// New submits are ignored.
    Cancelling,
}

impl TaskPhase {
    /// Returns `true` while a task handle exists.
    ///
    /// ```
    /// use tts_desk::controller::TaskPhase;
    ///
    /// assert!(!TaskPhase::Idle.is_busy());
    /// assert!(TaskPhase::Submitting.is_busy());
    /// assert!(TaskPhase::Cancelling.is_busy());
    /// ```
    pub fn is_busy(&self) -> bool {
        matches!(self, TaskPhase::Submitting | TaskPhase::Cancelling)
    }

    /// A short human-readable label suitable for a status bar.
    pub fn label(&self) -> &'static str {
        match self {
            TaskPhase::Idle => "Idle",
            TaskPhase::Submitting => "Synthesizing",
            TaskPhase::Cancelling => "Cancelling",
        }
    }
}

// ---------------------------------------------------------------------------
// TaskHandle / TaskState
// ---------------------------------------------------------------------------

/// The live state of the one in-flight request.
#[derive(Debug)]
pub(crate) struct TaskHandle {
    /// Identity of this handle; finalizers compare it before mutating.
    pub(crate) seq: u64,
    /// Cleared once the backend has answered, because from then on it no
    /// longer tracks the task.
    pub(crate) task_id: Option<TaskId>,
    pub(crate) token: CancellationToken,
}

impl TaskHandle {
    pub(crate) fn new(seq: u64, task_id: TaskId, token: CancellationToken) -> Self {
        Self {
            seq,
            task_id: Some(task_id),
            token,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) enum TaskState {
    #[default]
    Idle,
    Submitting(TaskHandle),
    Cancelling(TaskHandle),
}

impl TaskState {
    pub(crate) fn phase(&self) -> TaskPhase {
        match self {
            TaskState::Idle => TaskPhase::Idle,
            TaskState::Submitting(_) => TaskPhase::Submitting,
            TaskState::Cancelling(_) => TaskPhase::Cancelling,
        }
    }

    pub(crate) fn handle(&self) -> Option<&TaskHandle> {
        match self {
            TaskState::Idle => None,
            TaskState::Submitting(h) | TaskState::Cancelling(h) => Some(h),
        }
    }
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// Button state for the front-end, recomputed on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub submit_enabled: bool,
    pub cancel_enabled: bool,
    /// The cancel button shows "Cancelling..." instead of "Cancel".
    pub cancelling: bool,
}

impl Controls {
    /// `voices_ready` is whether the catalog has at least one voice.
    pub fn for_phase(phase: TaskPhase, voices_ready: bool) -> Self {
        match phase {
            TaskPhase::Idle => Self {
                submit_enabled: voices_ready,
                cancel_enabled: false,
                cancelling: false,
            },
            TaskPhase::Submitting => Self {
                submit_enabled: false,
                cancel_enabled: true,
                cancelling: false,
            },
            TaskPhase::Cancelling => Self {
                submit_enabled: false,
                cancel_enabled: false,
                cancelling: true,
            },
        }
    }

    pub fn cancel_label(&self) -> &'static str {
        if self.cancelling {
            "Cancelling..."
        } else {
            "Cancel"
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_is_not_busy() {
        assert!(!TaskPhase::Idle.is_busy());
        assert_eq!(TaskPhase::default(), TaskPhase::Idle);
    }

    #[test]
    fn labels() {
        assert_eq!(TaskPhase::Idle.label(), "Idle");
        assert_eq!(TaskPhase::Submitting.label(), "Synthesizing");
        assert_eq!(TaskPhase::Cancelling.label(), "Cancelling");
    }

    #[test]
    fn state_phase_matches_handle_presence() {
        let token = CancellationToken::new();
        let submitting = TaskState::Submitting(TaskHandle::new(1, TaskId::from("a"), token));
        assert_eq!(submitting.phase(), TaskPhase::Submitting);
        assert!(submitting.handle().is_some());
        assert!(TaskState::default().handle().is_none());
    }

    #[test]
    fn idle_controls_depend_on_voices() {
        let ready = Controls::for_phase(TaskPhase::Idle, true);
        assert!(ready.submit_enabled);
        assert!(!ready.cancel_enabled);

        let not_ready = Controls::for_phase(TaskPhase::Idle, false);
        assert!(!not_ready.submit_enabled);
    }

    #[test]
    fn busy_phases_disable_submit() {
        let submitting = Controls::for_phase(TaskPhase::Submitting, true);
        assert!(!submitting.submit_enabled);
        assert!(submitting.cancel_enabled);
        assert_eq!(submitting.cancel_label(), "Cancel");

        let cancelling = Controls::for_phase(TaskPhase::Cancelling, true);
        assert!(!cancelling.submit_enabled);
        assert!(!cancelling.cancel_enabled);
        assert_eq!(cancelling.cancel_label(), "Cancelling...");
    }
}
