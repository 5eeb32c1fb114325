use samd_launch_core::{Decision, StageKind};
use serde::Serialize;

/// Progress notifications emitted while a batch runs.
///
/// Events of one record arrive in stage order; events of different records
/// interleave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    RecordStarted {
        index: usize,
        country: String,
    },
    StageCompleted {
        index: usize,
        country: String,
        stage: StageKind,
        attempts: u32,
    },
    RecordCompleted {
        index: usize,
        country: String,
        decision: Option<Decision>,
    },
    RecordFailed {
        index: usize,
        country: String,
        stage: Option<StageKind>,
        error: String,
    },
}

impl ProgressEvent {
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            ProgressEvent::RecordStarted { index, .. }
            | ProgressEvent::StageCompleted { index, .. }
            | ProgressEvent::RecordCompleted { index, .. }
            | ProgressEvent::RecordFailed { index, .. } => *index,
        }
    }
}
