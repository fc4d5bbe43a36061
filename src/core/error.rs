//! Error types for pipeline and collaborator operations

use thiserror::Error;

/// Errors reported by the injected collaborators (candidate store,
/// pipeline persistence)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by the pipeline core
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Save attempted with no stage carrying a non-empty name
    #[error("Invalid stage configuration: {0}")]
    InvalidStageConfiguration(String),

    /// An operation referenced a stage id the pipeline does not contain
    #[error("Stage not found: {stage_id}")]
    StageNotFound { stage_id: String },

    /// The external stage update for a drag commit was rejected
    #[error("Failed to move candidate {candidate_id} to stage {stage_id}: {source}")]
    DragCommitFailure {
        candidate_id: String,
        stage_id: String,
        #[source]
        source: StoreError,
    },

    /// The stage still holds candidates and no reassignment was given
    #[error("Stage '{stage_name}' still holds {candidates} candidate(s); reassign them before removing it")]
    StageRemovalBlocked {
        stage_id: String,
        stage_name: String,
        candidates: usize,
    },

    /// A drag gesture is already active
    #[error("A drag gesture for candidate {active} is already in progress")]
    GestureInProgress { active: String },

    /// A commit for the same candidate has not resolved yet
    #[error("A stage change for candidate {candidate_id} is still pending")]
    CommitPending { candidate_id: String },

    /// The candidate's last commit resolved after the board's candidate
    /// list was fetched
    #[error("Candidate {candidate_id} moved since the board was loaded; refresh before dragging again")]
    RefreshRequired { candidate_id: String },

    /// Drop received while no gesture is active
    #[error("No drag gesture in progress")]
    NotDragging,

    /// The candidate has no application shown on this board
    #[error("Candidate {candidate_id} is not on this board")]
    CandidateNotOnBoard { candidate_id: String },

    #[error("Invalid color '{0}': expected #RRGGBB")]
    InvalidColor(String),

    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl PipelineError {
    /// Whether the error is recovered locally with inline feedback
    /// (the builder stays open, nothing was committed)
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidStageConfiguration(_)
                | PipelineError::StageRemovalBlocked { .. }
                | PipelineError::InvalidColor(_)
                | PipelineError::StageNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_errors_pass_through_untouched() {
        let err: PipelineError = StoreError::Api("503 Service Unavailable".to_string()).into();
        assert_eq!(err.to_string(), "API error: 503 Service Unavailable");
        assert!(!err.is_validation());
    }

    #[test]
    fn test_removal_blocked_message() {
        let err = PipelineError::StageRemovalBlocked {
            stage_id: "s2".to_string(),
            stage_name: "Interview".to_string(),
            candidates: 3,
        };
        assert!(err.to_string().contains("Interview"));
        assert!(err.to_string().contains("3 candidate"));
        assert!(err.is_validation());
    }
}
