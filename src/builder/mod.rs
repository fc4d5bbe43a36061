//! Stage builder - editing and reordering stage definitions
//!
//! All edits happen on a working copy. Nothing reaches persistence until
//! [`StageBuilder::save`] succeeds; a rejected save leaves every edit in
//! place, and [`StageBuilder::cancel`] restores the last saved state.

use crate::core::{
    pipeline::{Pipeline, PipelineDraft, PipelineKind, PipelinePatch},
    stage::{palette_entry, renumber, Stage, StagePatch},
    PipelineError,
};
use crate::persistence::PipelinePersistence;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Candidates of a removed stage must move to `to_stage_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReassignment {
    pub from_stage_id: String,
    pub to_stage_id: String,
}

/// Result of a successful save
#[derive(Debug, Clone)]
pub struct SavedPipeline {
    pub pipeline: Pipeline,
    /// Moves the caller must apply to candidates of removed stages
    pub reassignments: Vec<StageReassignment>,
}

#[derive(Debug, Clone)]
struct Baseline {
    name: String,
    description: String,
    stages: Vec<Stage>,
}

/// Working copy of a pipeline's stage list
#[derive(Debug, Clone)]
pub struct StageBuilder {
    pipeline_id: Option<String>,
    name: String,
    description: String,
    kind: PipelineKind,
    job_id: Option<String>,
    is_active: bool,
    stages: Vec<Stage>,
    baseline: Baseline,
    occupancy: HashMap<String, usize>,
    reassignments: Vec<StageReassignment>,
}

impl StageBuilder {
    /// Start a new pipeline with no stages
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_draft(PipelineDraft {
            name: name.into(),
            description: String::new(),
            kind: PipelineKind::Candidate,
            stages: Vec::new(),
            is_active: true,
            job_id: None,
        })
    }

    /// Start a new pipeline from a template selection
    pub fn from_draft(draft: PipelineDraft) -> Self {
        let mut stages = draft.stages;
        stages.sort_by_key(|s| s.order);
        renumber(&mut stages);

        Self {
            pipeline_id: None,
            baseline: Baseline {
                name: draft.name.clone(),
                description: draft.description.clone(),
                stages: stages.clone(),
            },
            name: draft.name,
            description: draft.description,
            kind: draft.kind,
            job_id: draft.job_id,
            is_active: draft.is_active,
            stages,
            occupancy: HashMap::new(),
            reassignments: Vec::new(),
        }
    }

    /// Edit an existing pipeline
    pub fn edit(pipeline: &Pipeline) -> Self {
        let mut builder = Self::from_draft(PipelineDraft {
            name: pipeline.name.clone(),
            description: pipeline.description.clone(),
            kind: pipeline.kind,
            stages: pipeline.stages.clone(),
            is_active: pipeline.is_active,
            job_id: pipeline.job_id.clone(),
        });
        builder.pipeline_id = Some(pipeline.id.clone());
        builder
    }

    /// Candidates per stage id, used to block removal of occupied stages
    pub fn with_occupancy(mut self, occupancy: HashMap<String, usize>) -> Self {
        self.occupancy = occupancy;
        self
    }

    pub fn pipeline_id(&self) -> Option<&str> {
        self.pipeline_id.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stages in position order; `order` always equals position + 1
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn pending_reassignments(&self) -> &[StageReassignment] {
        &self.reassignments
    }

    /// Whether there are unsaved edits
    pub fn is_dirty(&self) -> bool {
        self.name != self.baseline.name
            || self.description != self.baseline.description
            || self.stages != self.baseline.stages
            || !self.reassignments.is_empty()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Append a stage with the next order and a palette color/icon
    pub fn add_stage(&mut self, name: impl Into<String>) -> &Stage {
        let index = self.stages.len();
        let (color, icon) = palette_entry(index);
        self.stages.push(Stage {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: String::new(),
            color: color.to_string(),
            icon: icon.to_string(),
            order: index as u32 + 1,
            is_active: true,
        });
        &self.stages[index]
    }

    /// Remove a stage and renumber the rest
    ///
    /// Fails with `StageRemovalBlocked` when the stage still holds
    /// candidates or receives those of a removed stage; use
    /// [`StageBuilder::remove_stage_reassigning`] then.
    pub fn remove_stage(&mut self, id: &str) -> Result<Stage, PipelineError> {
        let index = self.position(id)?;
        self.ensure_vacant(&self.stages[index])?;

        let removed = self.stages.remove(index);
        renumber(&mut self.stages);
        debug!(stage_id = id, remaining = self.stages.len(), "Removed stage");
        Ok(removed)
    }

    /// Remove a stage, moving its candidates to `target_id` on save
    pub fn remove_stage_reassigning(&mut self, id: &str, target_id: &str) -> Result<Stage, PipelineError> {
        let index = self.position(id)?;
        if id == target_id {
            return Err(PipelineError::InvalidStageConfiguration(
                "A stage cannot be reassigned to itself".to_string(),
            ));
        }
        self.position(target_id)?;

        for reassignment in self.reassignments.iter_mut() {
            if reassignment.to_stage_id == id {
                reassignment.to_stage_id = target_id.to_string();
            }
        }
        self.reassignments.push(StageReassignment {
            from_stage_id: id.to_string(),
            to_stage_id: target_id.to_string(),
        });

        let removed = self.stages.remove(index);
        renumber(&mut self.stages);
        debug!(stage_id = id, target_id, "Removed stage with reassignment");
        Ok(removed)
    }

    /// Shallow-merge fields into a stage; order is untouched
    pub fn update_stage(&mut self, id: &str, patch: &StagePatch) -> Result<(), PipelineError> {
        let index = self.position(id)?;
        self.stages[index].apply(patch)
    }

    /// Move `dragged_id` to the position currently held by `target_id`
    pub fn reorder_stage(&mut self, dragged_id: &str, target_id: &str) -> Result<(), PipelineError> {
        let from = self.position(dragged_id)?;
        let to = self.position(target_id)?;
        if from == to {
            return Ok(());
        }

        let dragged = self.stages.remove(from);
        self.stages.insert(to, dragged);
        renumber(&mut self.stages);
        debug!(dragged_id, target_id, from, to, "Reordered stage");
        Ok(())
    }

    /// Commit the working copy
    ///
    /// Stages with a blank name are dropped. With no named stage left the
    /// save is rejected and every edit is kept.
    pub async fn save(
        &mut self,
        persistence: &dyn PipelinePersistence,
    ) -> Result<SavedPipeline, PipelineError> {
        if self.name.trim().is_empty() {
            return Err(PipelineError::InvalidStageConfiguration(
                "Pipeline name must not be empty".to_string(),
            ));
        }

        let (named, blank): (Vec<&Stage>, Vec<&Stage>) =
            self.stages.iter().partition(|s| s.has_name());
        if named.is_empty() {
            return Err(PipelineError::InvalidStageConfiguration(
                "At least one stage needs a name".to_string(),
            ));
        }
        for stage in blank {
            self.ensure_vacant(stage)?;
        }

        let mut stages: Vec<Stage> = named
            .into_iter()
            .map(|s| Stage {
                name: s.name.trim().to_string(),
                ..s.clone()
            })
            .collect();
        renumber(&mut stages);

        let pipeline = match &self.pipeline_id {
            Some(id) => {
                persistence
                    .update_pipeline(
                        id,
                        PipelinePatch {
                            name: Some(self.name.trim().to_string()),
                            description: Some(self.description.clone()),
                            stages: Some(stages),
                            is_active: Some(self.is_active),
                        },
                    )
                    .await?
            }
            None => {
                persistence
                    .create_pipeline(PipelineDraft {
                        name: self.name.trim().to_string(),
                        description: self.description.clone(),
                        kind: self.kind,
                        stages,
                        is_active: self.is_active,
                        job_id: self.job_id.clone(),
                    })
                    .await?
            }
        };

        info!(
            pipeline_id = %pipeline.id,
            stages = pipeline.stages.len(),
            "Saved pipeline"
        );

        let mut committed = pipeline.stages.clone();
        committed.sort_by_key(|s| s.order);
        self.pipeline_id = Some(pipeline.id.clone());
        self.name = pipeline.name.clone();
        self.description = pipeline.description.clone();
        self.stages = committed;
        self.baseline = Baseline {
            name: self.name.clone(),
            description: self.description.clone(),
            stages: self.stages.clone(),
        };

        Ok(SavedPipeline {
            pipeline,
            reassignments: std::mem::take(&mut self.reassignments),
        })
    }

    /// Discard all unsaved edits
    pub fn cancel(&mut self) {
        self.name = self.baseline.name.clone();
        self.description = self.baseline.description.clone();
        self.stages = self.baseline.stages.clone();
        self.reassignments.clear();
    }

    fn position(&self, id: &str) -> Result<usize, PipelineError> {
        self.stages
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| PipelineError::StageNotFound {
                stage_id: id.to_string(),
            })
    }

    /// A stage is vacant when none of its own candidates stay behind and no
    /// removed stage hands its candidates to it
    fn ensure_vacant(&self, stage: &Stage) -> Result<(), PipelineError> {
        let own = self.occupancy.get(&stage.id).copied().unwrap_or(0);
        let reassigned_away = self
            .reassignments
            .iter()
            .any(|r| r.from_stage_id == stage.id);
        let inbound: Vec<&StageReassignment> = self
            .reassignments
            .iter()
            .filter(|r| r.to_stage_id == stage.id)
            .collect();

        if (own > 0 && !reassigned_away) || !inbound.is_empty() {
            let incoming: usize = inbound
                .iter()
                .map(|r| self.occupancy.get(&r.from_stage_id).copied().unwrap_or(0))
                .sum();
            return Err(PipelineError::StageRemovalBlocked {
                stage_id: stage.id.clone(),
                stage_name: stage.name.clone(),
                candidates: own + incoming,
            });
        }
        Ok(())
    }
}
