//! Drag gesture states, outcomes and events

use crate::core::{PipelineError, StoreError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

/// Lifecycle of one drag gesture
///
/// ```text
/// Idle -> Dragging -> Idle                  (dropped outside / same stage / cancel)
///             \-----> Committing -> Idle    (command issued)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState {
    Idle,
    Dragging {
        candidate_id: String,
        /// Stage the candidate occupied when the drag started
        origin_stage_id: Option<String>,
        /// Column currently under the pointer (visual only)
        hover_stage_id: Option<String>,
        started_at: DateTime<Utc>,
    },
    Committing {
        candidate_id: String,
        target_stage_id: String,
    },
}

impl DragState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DragState::Idle)
    }

    /// Candidate of the active gesture, if any
    pub fn candidate_id(&self) -> Option<&str> {
        match self {
            DragState::Idle => None,
            DragState::Dragging { candidate_id, .. } | DragState::Committing { candidate_id, .. } => {
                Some(candidate_id)
            }
        }
    }

    pub fn hover_stage_id(&self) -> Option<&str> {
        match self {
            DragState::Dragging { hover_stage_id, .. } => hover_stage_id.as_deref(),
            _ => None,
        }
    }
}

/// Handle to an issued stage-change command
#[derive(Debug)]
pub struct PendingCommit {
    pub candidate_id: String,
    pub job_id: String,
    pub stage_id: String,
    pub(crate) handle: JoinHandle<Result<(), PipelineError>>,
}

impl PendingCommit {
    /// Wait for the command to resolve
    pub async fn wait(self) -> Result<(), PipelineError> {
        match self.handle.await {
            Ok(result) => result,
            Err(join_error) => Err(PipelineError::DragCommitFailure {
                candidate_id: self.candidate_id,
                stage_id: self.stage_id,
                source: StoreError::Internal(join_error.to_string()),
            }),
        }
    }
}

/// What a drop did
#[derive(Debug)]
pub enum DropOutcome {
    /// Dropped outside any valid column; nothing issued
    Dismissed,
    /// Dropped on the stage the candidate already occupies; nothing issued
    Unchanged,
    /// Exactly one stage-change command was issued
    Committed(PendingCommit),
}

impl DropOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, DropOutcome::Committed(_))
    }

    pub fn into_commit(self) -> Option<PendingCommit> {
        match self {
            DropOutcome::Committed(commit) => Some(commit),
            _ => None,
        }
    }
}

/// Events emitted by the drag coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragEvent {
    Started {
        candidate_id: String,
        origin_stage_id: Option<String>,
    },
    Hovered {
        candidate_id: String,
        stage_id: Option<String>,
    },
    Cancelled {
        candidate_id: String,
    },
    Dismissed {
        candidate_id: String,
    },
    Unchanged {
        candidate_id: String,
        stage_id: String,
    },
    CommitIssued {
        candidate_id: String,
        job_id: String,
        stage_id: String,
    },
    CommitSucceeded {
        candidate_id: String,
        stage_id: String,
    },
    CommitFailed {
        candidate_id: String,
        stage_id: String,
        error: String,
    },
}
