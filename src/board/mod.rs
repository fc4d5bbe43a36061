//! Board orchestrator - wires the engines to the candidate store
//!
//! The board owns one job's view: the pipeline, the grouping cache, the
//! drag coordinator and the layout engine. Candidate data always comes
//! from the injected store; after a commit resolves the caller refreshes.

use crate::{
    builder::StageReassignment,
    core::{CandidateSnapshot, Pipeline, PipelineError},
    drag::{DragCoordinator, DragEvent, DragState, DropOutcome},
    grouping::{stage_occupancy, GroupingCache, StageGrouping},
    layout::{ColumnLayout, LayoutConstants, LayoutEngine, LayoutTrigger, WidthProvider},
    persistence::CandidateStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Kanban board for one job
pub struct PipelineBoard<S: ?Sized> {
    store: Arc<S>,
    pipeline: Pipeline,
    job_id: String,
    cache: GroupingCache,
    snapshot: Option<CandidateSnapshot>,
    coordinator: DragCoordinator<S>,
    layout: LayoutEngine,
}

impl<S: CandidateStore + ?Sized + 'static> PipelineBoard<S> {
    pub fn new(
        store: Arc<S>,
        pipeline: Pipeline,
        job_id: impl Into<String>,
        constants: LayoutConstants,
    ) -> Self {
        let job_id = job_id.into();
        Self {
            coordinator: DragCoordinator::new(Arc::clone(&store), job_id.clone()),
            store,
            pipeline,
            job_id,
            cache: GroupingCache::new(),
            snapshot: None,
            layout: LayoutEngine::new(constants),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn drag_state(&self) -> &DragState {
        self.coordinator.state()
    }

    pub fn is_pending(&self, candidate_id: &str) -> bool {
        self.coordinator.is_pending(candidate_id)
    }

    /// Whether the candidate moved since the last refresh
    pub fn awaits_refresh(&self, candidate_id: &str) -> bool {
        self.coordinator.awaits_refresh(candidate_id)
    }

    /// Register a handler for drag events
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(DragEvent) + Send + Sync + 'static,
    {
        self.coordinator.add_event_handler(handler);
    }

    /// Fetch the candidate list and regroup
    ///
    /// Candidates whose commit resolved before the fetch started can be
    /// dragged again afterwards.
    pub async fn refresh(&mut self) -> Result<Arc<StageGrouping>, PipelineError> {
        let mark = self.coordinator.refresh_mark();
        let snapshot = self.store.candidates().await?;
        debug!(job_id = %self.job_id, version = snapshot.version, "Fetched candidates");
        self.snapshot = Some(snapshot);
        let grouping = self.regroup();
        self.coordinator.release_settled(mark);
        Ok(grouping)
    }

    /// The grouping of the last fetched candidate list
    pub fn grouping(&self) -> Option<Arc<StageGrouping>> {
        self.cache.current()
    }

    /// Replace the pipeline (after a builder save) and regroup
    pub fn set_pipeline(&mut self, pipeline: Pipeline) {
        let before = self.pipeline.stages.len();
        self.pipeline = pipeline;
        if self.pipeline.stages.len() != before {
            debug!(
                trigger = ?LayoutTrigger::StageCountChanged,
                stages = self.pipeline.stages.len(),
                "Stage count changed"
            );
        }
        if self.snapshot.is_some() {
            self.regroup();
        }
    }

    pub fn start_drag(&mut self, candidate_id: &str) -> Result<(), PipelineError> {
        let grouping = self
            .grouping()
            .ok_or_else(|| PipelineError::CandidateNotOnBoard {
                candidate_id: candidate_id.to_string(),
            })?;
        self.coordinator.start_drag(candidate_id, &grouping)
    }

    pub fn hover(&mut self, stage_id: Option<&str>) {
        self.coordinator.over(stage_id);
    }

    /// Drop the dragged candidate on `target` (`None` = outside the board)
    ///
    /// Must be called inside a tokio runtime: a committed drop spawns the
    /// stage update.
    pub fn drop_on(&mut self, target: Option<&str>) -> Result<DropOutcome, PipelineError> {
        let grouping = self.grouping().unwrap_or_default();
        self.coordinator.end_drag(target, &grouping)
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.coordinator.cancel()
    }

    /// Column layout for the current stage count
    pub fn layout(&self, trigger: LayoutTrigger, provider: &dyn WidthProvider) -> ColumnLayout {
        self.layout.recompute(trigger, provider, self.pipeline.stages.len())
    }

    /// Candidates per recorded stage id, for the stage builder
    pub fn occupancy(&self) -> HashMap<String, usize> {
        self.snapshot
            .as_ref()
            .map(|s| stage_occupancy(&s.candidates, &self.job_id))
            .unwrap_or_default()
    }

    /// Move the candidates of removed stages to their replacement stage
    ///
    /// Returns how many candidates were moved. The board is refreshed
    /// afterwards.
    pub async fn apply_reassignments(
        &mut self,
        reassignments: &[StageReassignment],
    ) -> Result<usize, PipelineError> {
        if reassignments.is_empty() {
            return Ok(0);
        }

        let snapshot = self.store.candidates().await?;
        let mut moved = 0;
        for candidate in &snapshot.candidates {
            let Some(current) = candidate.current_stage(&self.job_id) else {
                continue;
            };
            let Some(reassignment) = reassignments.iter().find(|r| r.from_stage_id == current) else {
                continue;
            };
            if !self.pipeline.contains_stage(&reassignment.to_stage_id) {
                warn!(
                    stage_id = %reassignment.to_stage_id,
                    "Reassignment target is not part of the pipeline"
                );
                return Err(PipelineError::StageNotFound {
                    stage_id: reassignment.to_stage_id.clone(),
                });
            }

            self.store
                .update_candidate_stage(&candidate.id, &self.job_id, &reassignment.to_stage_id)
                .await
                .map_err(|source| PipelineError::DragCommitFailure {
                    candidate_id: candidate.id.clone(),
                    stage_id: reassignment.to_stage_id.clone(),
                    source,
                })?;
            moved += 1;
        }

        info!(job_id = %self.job_id, moved, "Applied stage reassignments");
        self.refresh().await?;
        Ok(moved)
    }

    fn regroup(&mut self) -> Arc<StageGrouping> {
        match &self.snapshot {
            Some(snapshot) => self.cache.get_or_compute(
                snapshot.version,
                &self.pipeline.stages,
                &snapshot.candidates,
                &self.job_id,
            ),
            None => Arc::new(StageGrouping::default()),
        }
    }
}
