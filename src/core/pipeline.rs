//! Pipeline domain model

use crate::core::stage::{orders_contiguous, renumber, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a pipeline tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    /// Candidate hiring workflow
    #[default]
    Candidate,
    /// User-defined workflow
    Custom,
}

/// An ordered set of stages; a reusable template when `job_id` is absent,
/// a job-bound instance otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    /// Server-assigned identifier
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(rename = "type", default)]
    pub kind: PipelineKind,

    /// Stages in storage order (not necessarily sorted by `order`)
    pub stages: Vec<Stage>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub job_id: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

/// A pipeline before the persistence layer has assigned it an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: PipelineKind,
    pub stages: Vec<Stage>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub job_id: Option<String>,
}

/// Partial pipeline update sent to persistence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelinePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stages: Option<Vec<Stage>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl Pipeline {
    /// Build a persisted pipeline from a draft and an assigned id
    pub fn from_draft(id: impl Into<String>, draft: PipelineDraft) -> Self {
        let now = Utc::now();
        Pipeline {
            id: id.into(),
            name: draft.name,
            description: draft.description,
            kind: draft.kind,
            stages: draft.stages,
            is_active: draft.is_active,
            job_id: draft.job_id,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Merge a patch into this pipeline
    pub fn apply(&mut self, patch: PipelinePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(stages) = patch.stages {
            self.stages = stages;
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Some(Utc::now());
    }

    /// Whether this is a reusable template rather than a job-bound instance
    pub fn is_template(&self) -> bool {
        self.job_id.is_none()
    }

    /// Get a stage by ID
    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    pub fn contains_stage(&self, id: &str) -> bool {
        self.stage(id).is_some()
    }

    /// Stages sorted by `order` (ties broken by id for determinism)
    pub fn sorted_stages(&self) -> Vec<&Stage> {
        sort_by_order(&self.stages)
    }

    /// Active stages sorted by `order`
    pub fn active_stages(&self) -> Vec<&Stage> {
        self.sorted_stages()
            .into_iter()
            .filter(|s| s.is_active)
            .collect()
    }

    /// The stage with the lowest `order`, regardless of storage order
    pub fn default_stage(&self) -> Option<&Stage> {
        default_stage(&self.stages)
    }

    /// Check the contiguous 1..N order invariant
    pub fn validate_order(&self) -> bool {
        orders_contiguous(&self.stages)
    }

    /// Sort stages by `order` and renumber them 1..N
    pub fn renumber(&mut self) {
        self.stages
            .sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        renumber(&mut self.stages);
    }
}

/// Sort stage references by `order`, then id
pub fn sort_by_order(stages: &[Stage]) -> Vec<&Stage> {
    let mut sorted: Vec<&Stage> = stages.iter().collect();
    sorted.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    sorted
}

/// The stage with the lowest `order` in any slice of stages
pub fn default_stage(stages: &[Stage]) -> Option<&Stage> {
    stages
        .iter()
        .min_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)))
}
