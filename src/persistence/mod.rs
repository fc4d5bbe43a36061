//! Collaborator contracts: candidate store and pipeline persistence
//!
//! The core never performs I/O itself; everything goes through these
//! traits. The in-memory implementations back the CLI and tests.

pub use crate::core::StoreError;
use crate::core::{Candidate, CandidateSnapshot, Pipeline, PipelineDraft, PipelinePatch};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Source of candidate data and target of stage-change commands
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Current candidate list with its version
    async fn candidates(&self) -> Result<CandidateSnapshot, StoreError>;

    /// Persist a candidate's new stage for one job
    async fn update_candidate_stage(
        &self,
        candidate_id: &str,
        job_id: &str,
        stage_id: &str,
    ) -> Result<(), StoreError>;
}

/// Pipeline persistence backend
#[async_trait]
pub trait PipelinePersistence: Send + Sync {
    /// Create a pipeline; the backend assigns the id
    async fn create_pipeline(&self, draft: PipelineDraft) -> Result<Pipeline, StoreError>;

    /// Apply a partial update
    async fn update_pipeline(&self, id: &str, patch: PipelinePatch) -> Result<Pipeline, StoreError>;

    async fn fetch_pipeline_by_id(&self, id: &str) -> Result<Pipeline, StoreError>;

    /// Reusable templates (pipelines without a job)
    async fn list_templates(&self) -> Result<Vec<Pipeline>, StoreError>;
}

/// In-memory candidate store
pub struct InMemoryCandidateStore {
    candidates: RwLock<Vec<Candidate>>,
    version: AtomicU64,
}

impl InMemoryCandidateStore {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates: RwLock::new(candidates),
            version: AtomicU64::new(1),
        }
    }
}

impl Default for InMemoryCandidateStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl CandidateStore for InMemoryCandidateStore {
    async fn candidates(&self) -> Result<CandidateSnapshot, StoreError> {
        let candidates = self.candidates.read().await;
        Ok(CandidateSnapshot::new(
            self.version.load(Ordering::SeqCst),
            candidates.clone(),
        ))
    }

    async fn update_candidate_stage(
        &self,
        candidate_id: &str,
        job_id: &str,
        stage_id: &str,
    ) -> Result<(), StoreError> {
        let mut candidates = self.candidates.write().await;
        let candidate = candidates
            .iter_mut()
            .find(|c| c.id == candidate_id)
            .ok_or_else(|| StoreError::NotFound(format!("candidate {}", candidate_id)))?;
        let application = candidate.application_mut(job_id).ok_or_else(|| {
            StoreError::NotFound(format!(
                "application of candidate {} for job {}",
                candidate_id, job_id
            ))
        })?;

        application.current_stage_id = Some(stage_id.to_string());
        self.version.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory pipeline persistence
pub struct InMemoryPipelineStore {
    pipelines: RwLock<HashMap<String, Pipeline>>,
}

impl InMemoryPipelineStore {
    pub fn new() -> Self {
        Self {
            pipelines: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.pipelines.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pipelines.read().await.is_empty()
    }
}

impl Default for InMemoryPipelineStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PipelinePersistence for InMemoryPipelineStore {
    async fn create_pipeline(&self, draft: PipelineDraft) -> Result<Pipeline, StoreError> {
        let pipeline = Pipeline::from_draft(Uuid::new_v4().to_string(), draft);
        let mut pipelines = self.pipelines.write().await;
        pipelines.insert(pipeline.id.clone(), pipeline.clone());
        Ok(pipeline)
    }

    async fn update_pipeline(&self, id: &str, patch: PipelinePatch) -> Result<Pipeline, StoreError> {
        let mut pipelines = self.pipelines.write().await;
        let pipeline = pipelines
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("pipeline {}", id)))?;
        pipeline.apply(patch);
        Ok(pipeline.clone())
    }

    async fn fetch_pipeline_by_id(&self, id: &str) -> Result<Pipeline, StoreError> {
        let pipelines = self.pipelines.read().await;
        pipelines
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("pipeline {}", id)))
    }

    async fn list_templates(&self) -> Result<Vec<Pipeline>, StoreError> {
        let pipelines = self.pipelines.read().await;
        let mut templates: Vec<Pipeline> = pipelines
            .values()
            .filter(|p| p.is_template())
            .cloned()
            .collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(templates)
    }
}
