//! Drag coordinator - turns a drag gesture into a stage-change command

use crate::{
    core::PipelineError,
    drag::state::{DragEvent, DragState, DropOutcome, PendingCommit},
    grouping::StageGrouping,
    persistence::CandidateStore,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, error, info, warn};

/// Type for drag event handlers
pub type DragEventHandler = Arc<dyn Fn(DragEvent) + Send + Sync>;

/// Per-candidate commit lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommitLock {
    /// The stage update has not resolved yet
    InFlight,
    /// Resolved as the n-th resolution; held until a candidate list
    /// fetched after it has been grouped
    Settled(u64),
}

#[derive(Debug, Default)]
struct CommitLocks {
    resolutions: u64,
    entries: HashMap<String, CommitLock>,
}

/// Settles the candidate's lock when the commit task ends, panics included
struct SettleOnDrop {
    locks: Arc<Mutex<CommitLocks>>,
    candidate_id: String,
}

impl Drop for SettleOnDrop {
    fn drop(&mut self) {
        let mut locks = lock_commits(&self.locks);
        locks.resolutions += 1;
        let seq = locks.resolutions;
        locks
            .entries
            .insert(std::mem::take(&mut self.candidate_id), CommitLock::Settled(seq));
    }
}

/// Single-flight drag state machine for one job's board
///
/// At most one gesture is active at a time. Commits run in the background;
/// while a commit for a candidate is outstanding that candidate cannot be
/// dragged again, other candidates can. A resolved commit keeps its
/// candidate locked until the caller reports a fetch that started after the
/// resolution (see [`DragCoordinator::refresh_mark`]). No optimistic copy
/// of the assignment is kept: the grouping of persisted data stays
/// authoritative.
pub struct DragCoordinator<S: ?Sized> {
    store: Arc<S>,
    job_id: String,
    state: DragState,
    locks: Arc<Mutex<CommitLocks>>,
    handlers: Arc<RwLock<Vec<DragEventHandler>>>,
}

impl<S: CandidateStore + ?Sized + 'static> DragCoordinator<S> {
    pub fn new(store: Arc<S>, job_id: impl Into<String>) -> Self {
        Self {
            store,
            job_id: job_id.into(),
            state: DragState::Idle,
            locks: Arc::new(Mutex::new(CommitLocks::default())),
            handlers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(DragEvent) + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        handlers.push(Arc::new(handler));
    }

    /// Whether a commit for this candidate is still outstanding
    pub fn is_pending(&self, candidate_id: &str) -> bool {
        lock_commits(&self.locks).entries.get(candidate_id) == Some(&CommitLock::InFlight)
    }

    /// Whether this candidate's commit resolved after the last reported
    /// candidate fetch
    pub fn awaits_refresh(&self, candidate_id: &str) -> bool {
        matches!(
            lock_commits(&self.locks).entries.get(candidate_id),
            Some(CommitLock::Settled(_))
        )
    }

    pub fn pending_count(&self) -> usize {
        lock_commits(&self.locks)
            .entries
            .values()
            .filter(|lock| **lock == CommitLock::InFlight)
            .count()
    }

    /// Take a mark before fetching the candidate list
    ///
    /// Pass it to [`DragCoordinator::release_settled`] once the fetched
    /// list has been grouped.
    pub fn refresh_mark(&self) -> u64 {
        lock_commits(&self.locks).resolutions
    }

    /// Unlock candidates whose commit resolved before `mark` was taken
    pub fn release_settled(&self, mark: u64) {
        let mut locks = lock_commits(&self.locks);
        locks
            .entries
            .retain(|_, lock| !matches!(lock, CommitLock::Settled(seq) if *seq <= mark));
    }

    /// Begin dragging a candidate shown in `grouping`
    pub fn start_drag(
        &mut self,
        candidate_id: &str,
        grouping: &StageGrouping,
    ) -> Result<(), PipelineError> {
        if let Some(active) = self.state.candidate_id() {
            return Err(PipelineError::GestureInProgress {
                active: active.to_string(),
            });
        }
        match lock_commits(&self.locks).entries.get(candidate_id) {
            Some(CommitLock::InFlight) => {
                return Err(PipelineError::CommitPending {
                    candidate_id: candidate_id.to_string(),
                })
            }
            Some(CommitLock::Settled(_)) => {
                return Err(PipelineError::RefreshRequired {
                    candidate_id: candidate_id.to_string(),
                })
            }
            None => {}
        }
        let origin = grouping
            .stage_of(candidate_id)
            .ok_or_else(|| PipelineError::CandidateNotOnBoard {
                candidate_id: candidate_id.to_string(),
            })?
            .to_string();

        self.transition(DragState::Dragging {
            candidate_id: candidate_id.to_string(),
            origin_stage_id: Some(origin.clone()),
            hover_stage_id: None,
            started_at: Utc::now(),
        });
        emit(
            &self.handlers,
            DragEvent::Started {
                candidate_id: candidate_id.to_string(),
                origin_stage_id: Some(origin),
            },
        );
        Ok(())
    }

    /// Hover signal; only updates the highlighted column
    pub fn over(&mut self, stage_id: Option<&str>) {
        let DragState::Dragging {
            candidate_id,
            hover_stage_id,
            ..
        } = &mut self.state
        else {
            debug!(?stage_id, "Hover without active drag ignored");
            return;
        };

        if hover_stage_id.as_deref() == stage_id {
            return;
        }
        *hover_stage_id = stage_id.map(str::to_string);
        let event = DragEvent::Hovered {
            candidate_id: candidate_id.clone(),
            stage_id: stage_id.map(str::to_string),
        };
        emit(&self.handlers, event);
    }

    /// Finish the gesture over `target` (`None` = outside every column)
    ///
    /// The coordinator is back in `Idle` when this returns, whatever the
    /// eventual result of an issued command.
    pub fn end_drag(
        &mut self,
        target: Option<&str>,
        grouping: &StageGrouping,
    ) -> Result<DropOutcome, PipelineError> {
        let (candidate_id, origin) = match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging {
                candidate_id,
                origin_stage_id,
                ..
            } => (candidate_id, origin_stage_id),
            other => {
                self.state = other;
                return Err(PipelineError::NotDragging);
            }
        };

        let target = match target {
            Some(stage_id) if grouping.contains_stage(stage_id) => stage_id,
            Some(stage_id) => {
                warn!(candidate_id = %candidate_id, stage_id, "Dropped on unknown stage, ignoring");
                emit(&self.handlers, DragEvent::Dismissed { candidate_id });
                return Ok(DropOutcome::Dismissed);
            }
            None => {
                debug!(candidate_id = %candidate_id, "Dropped outside the board");
                emit(&self.handlers, DragEvent::Dismissed { candidate_id });
                return Ok(DropOutcome::Dismissed);
            }
        };

        let current = grouping
            .stage_of(&candidate_id)
            .map(str::to_string)
            .or(origin);
        if current.as_deref() == Some(target) {
            debug!(candidate_id = %candidate_id, stage_id = target, "Dropped on current stage");
            emit(
                &self.handlers,
                DragEvent::Unchanged {
                    candidate_id,
                    stage_id: target.to_string(),
                },
            );
            return Ok(DropOutcome::Unchanged);
        }

        self.transition(DragState::Committing {
            candidate_id: candidate_id.clone(),
            target_stage_id: target.to_string(),
        });
        let commit = self.issue_commit(candidate_id, target.to_string());
        self.transition(DragState::Idle);

        Ok(DropOutcome::Committed(commit))
    }

    /// Abort the active gesture (escape key, teardown)
    pub fn cancel(&mut self) -> bool {
        match std::mem::replace(&mut self.state, DragState::Idle) {
            DragState::Dragging { candidate_id, .. } => {
                debug!(candidate_id = %candidate_id, "Drag cancelled");
                emit(&self.handlers, DragEvent::Cancelled { candidate_id });
                true
            }
            other => {
                self.state = other;
                false
            }
        }
    }

    fn issue_commit(&self, candidate_id: String, stage_id: String) -> PendingCommit {
        lock_commits(&self.locks)
            .entries
            .insert(candidate_id.clone(), CommitLock::InFlight);

        info!(
            candidate_id = %candidate_id,
            job_id = %self.job_id,
            stage_id = %stage_id,
            "Moving candidate"
        );
        emit(
            &self.handlers,
            DragEvent::CommitIssued {
                candidate_id: candidate_id.clone(),
                job_id: self.job_id.clone(),
                stage_id: stage_id.clone(),
            },
        );

        let store = Arc::clone(&self.store);
        let settle = SettleOnDrop {
            locks: Arc::clone(&self.locks),
            candidate_id: candidate_id.clone(),
        };
        let handlers = Arc::clone(&self.handlers);
        let job_id = self.job_id.clone();
        let (task_candidate, task_stage) = (candidate_id.clone(), stage_id.clone());

        let handle = tokio::spawn(async move {
            let result = store
                .update_candidate_stage(&task_candidate, &job_id, &task_stage)
                .await;
            drop(settle);

            match result {
                Ok(()) => {
                    emit(
                        &handlers,
                        DragEvent::CommitSucceeded {
                            candidate_id: task_candidate,
                            stage_id: task_stage,
                        },
                    );
                    Ok(())
                }
                Err(source) => {
                    error!(
                        candidate_id = %task_candidate,
                        stage_id = %task_stage,
                        "Stage change rejected: {}",
                        source
                    );
                    emit(
                        &handlers,
                        DragEvent::CommitFailed {
                            candidate_id: task_candidate.clone(),
                            stage_id: task_stage.clone(),
                            error: source.to_string(),
                        },
                    );
                    Err(PipelineError::DragCommitFailure {
                        candidate_id: task_candidate,
                        stage_id: task_stage,
                        source,
                    })
                }
            }
        });

        PendingCommit {
            candidate_id,
            job_id: self.job_id.clone(),
            stage_id,
            handle,
        }
    }

    fn transition(&mut self, next: DragState) {
        debug!(from = ?self.state, to = ?next, "Drag transition");
        self.state = next;
    }
}

fn lock_commits(locks: &Mutex<CommitLocks>) -> MutexGuard<'_, CommitLocks> {
    locks.lock().unwrap_or_else(|e| e.into_inner())
}

/// Emit an event to all handlers
fn emit(handlers: &RwLock<Vec<DragEventHandler>>, event: DragEvent) {
    let handlers = handlers.read().unwrap_or_else(|e| e.into_inner());
    for handler in handlers.iter() {
        handler(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Candidate, CandidateSnapshot, Stage, StoreError};
    use crate::grouping::group_candidates;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Mutex as AsyncMutex;

    #[derive(Default)]
    struct RecordingStore {
        calls: AsyncMutex<Vec<(String, String, String)>>,
        reject: AtomicBool,
    }

    #[async_trait]
    impl CandidateStore for RecordingStore {
        async fn candidates(&self) -> Result<CandidateSnapshot, StoreError> {
            Ok(CandidateSnapshot::new(0, Vec::new()))
        }

        async fn update_candidate_stage(
            &self,
            candidate_id: &str,
            job_id: &str,
            stage_id: &str,
        ) -> Result<(), StoreError> {
            self.calls.lock().await.push((
                candidate_id.to_string(),
                job_id.to_string(),
                stage_id.to_string(),
            ));
            if self.reject.load(Ordering::SeqCst) {
                Err(StoreError::Api("rejected".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn grouping() -> StageGrouping {
        let stages = vec![Stage::new("s1", "Applied", 0), Stage::new("s2", "Interview", 1)];
        let candidates = vec![
            Candidate::new("c1", "Ada").with_application("job-1", Some("s1")),
            Candidate::new("c2", "Grace").with_application("job-1", Some("s2")),
        ];
        group_candidates(&stages, &candidates, "job-1")
    }

    #[tokio::test]
    async fn test_drop_on_other_stage_commits_once() {
        let store = Arc::new(RecordingStore::default());
        let mut coordinator = DragCoordinator::new(Arc::clone(&store), "job-1");
        let grouping = grouping();

        coordinator.start_drag("c1", &grouping).unwrap();
        coordinator.over(Some("s2"));
        let outcome = coordinator.end_drag(Some("s2"), &grouping).unwrap();
        assert!(coordinator.state().is_idle());

        outcome.into_commit().unwrap().wait().await.unwrap();
        let calls = store.calls.lock().await;
        assert_eq!(
            *calls,
            vec![("c1".to_string(), "job-1".to_string(), "s2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_drop_on_same_stage_is_noop() {
        let store = Arc::new(RecordingStore::default());
        let mut coordinator = DragCoordinator::new(Arc::clone(&store), "job-1");
        let grouping = grouping();

        coordinator.start_drag("c1", &grouping).unwrap();
        let outcome = coordinator.end_drag(Some("s1"), &grouping).unwrap();

        assert!(matches!(outcome, DropOutcome::Unchanged));
        assert!(store.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_drop_outside_and_unknown_target_dismiss() {
        let store = Arc::new(RecordingStore::default());
        let mut coordinator = DragCoordinator::new(Arc::clone(&store), "job-1");
        let grouping = grouping();

        coordinator.start_drag("c1", &grouping).unwrap();
        assert!(matches!(coordinator.end_drag(None, &grouping).unwrap(), DropOutcome::Dismissed));

        coordinator.start_drag("c1", &grouping).unwrap();
        assert!(matches!(
            coordinator.end_drag(Some("elsewhere"), &grouping).unwrap(),
            DropOutcome::Dismissed
        ));
        assert!(store.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_single_flight() {
        let store = Arc::new(RecordingStore::default());
        let mut coordinator = DragCoordinator::new(store, "job-1");
        let grouping = grouping();

        coordinator.start_drag("c1", &grouping).unwrap();
        let err = coordinator.start_drag("c2", &grouping).unwrap_err();
        assert!(matches!(err, PipelineError::GestureInProgress { ref active } if active == "c1"));
    }

    #[tokio::test]
    async fn test_cancel_returns_to_idle() {
        let store = Arc::new(RecordingStore::default());
        let mut coordinator = DragCoordinator::new(Arc::clone(&store), "job-1");
        let grouping = grouping();

        assert!(!coordinator.cancel());
        coordinator.start_drag("c1", &grouping).unwrap();
        assert!(coordinator.cancel());
        assert!(coordinator.state().is_idle());
        assert!(matches!(
            coordinator.end_drag(Some("s2"), &grouping),
            Err(PipelineError::NotDragging)
        ));
        assert!(store.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_candidate_cannot_start() {
        let store = Arc::new(RecordingStore::default());
        let mut coordinator = DragCoordinator::new(store, "job-1");
        assert!(matches!(
            coordinator.start_drag("ghost", &grouping()),
            Err(PipelineError::CandidateNotOnBoard { .. })
        ));
        assert!(coordinator.state().is_idle());
    }

    #[tokio::test]
    async fn test_rejected_commit_surfaces_failure() {
        let store = Arc::new(RecordingStore::default());
        store.reject.store(true, Ordering::SeqCst);
        let mut coordinator = DragCoordinator::new(Arc::clone(&store), "job-1");
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        coordinator.add_event_handler(move |event| sink.lock().unwrap().push(event));
        let grouping = grouping();

        coordinator.start_drag("c1", &grouping).unwrap();
        let commit = coordinator.end_drag(Some("s2"), &grouping).unwrap().into_commit().unwrap();
        let err = commit.wait().await.unwrap_err();

        assert!(matches!(err, PipelineError::DragCommitFailure { .. }));
        assert!(!coordinator.is_pending("c1"));
        assert!(events
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, DragEvent::CommitFailed { candidate_id, .. } if candidate_id == "c1")));
    }

    #[tokio::test]
    async fn test_resolved_commit_locks_until_refresh() {
        let store = Arc::new(RecordingStore::default());
        let mut coordinator = DragCoordinator::new(Arc::clone(&store), "job-1");
        let grouping = grouping();

        let mark = coordinator.refresh_mark();
        coordinator.start_drag("c1", &grouping).unwrap();
        let commit = coordinator.end_drag(Some("s2"), &grouping).unwrap().into_commit().unwrap();
        commit.wait().await.unwrap();

        assert!(!coordinator.is_pending("c1"));
        assert!(coordinator.awaits_refresh("c1"));
        assert!(matches!(
            coordinator.start_drag("c1", &grouping),
            Err(PipelineError::RefreshRequired { ref candidate_id }) if candidate_id == "c1"
        ));

        // A fetch that started before the resolution does not unlock
        coordinator.release_settled(mark);
        assert!(coordinator.awaits_refresh("c1"));

        coordinator.release_settled(coordinator.refresh_mark());
        assert!(!coordinator.awaits_refresh("c1"));
        coordinator.start_drag("c1", &grouping).unwrap();
    }

    struct PanickingStore;

    #[async_trait]
    impl CandidateStore for PanickingStore {
        async fn candidates(&self) -> Result<CandidateSnapshot, StoreError> {
            Ok(CandidateSnapshot::new(0, Vec::new()))
        }

        async fn update_candidate_stage(
            &self,
            _candidate_id: &str,
            _job_id: &str,
            _stage_id: &str,
        ) -> Result<(), StoreError> {
            panic!("store crashed")
        }
    }

    #[tokio::test]
    async fn test_panicking_store_does_not_leave_candidate_locked() {
        let mut coordinator = DragCoordinator::new(Arc::new(PanickingStore), "job-1");
        let grouping = grouping();

        coordinator.start_drag("c1", &grouping).unwrap();
        let commit = coordinator.end_drag(Some("s2"), &grouping).unwrap().into_commit().unwrap();
        let err = commit.wait().await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::DragCommitFailure { source: StoreError::Internal(_), .. }
        ));
        assert_eq!(coordinator.pending_count(), 0);
        coordinator.release_settled(coordinator.refresh_mark());
        coordinator.start_drag("c1", &grouping).unwrap();
    }
}
