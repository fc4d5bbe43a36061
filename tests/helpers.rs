//! Test utility functions for hiring-pipeline
#![allow(dead_code)]

use async_trait::async_trait;
use hiring_pipeline::core::{
    Candidate, CandidateSnapshot, Pipeline, PipelineDraft, PipelineKind, PipelinePatch, Stage,
    StoreError,
};
use hiring_pipeline::persistence::{CandidateStore, PipelinePersistence};
use hiring_pipeline::{LayoutConstants, PipelineBoard};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};

pub const JOB: &str = "job-1";

/// One recorded `update_candidate_stage` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageUpdate {
    pub candidate_id: String,
    pub job_id: String,
    pub stage_id: String,
}

impl StageUpdate {
    pub fn new(candidate_id: &str, stage_id: &str) -> Self {
        Self {
            candidate_id: candidate_id.to_string(),
            job_id: JOB.to_string(),
            stage_id: stage_id.to_string(),
        }
    }
}

/// Candidate store that records stage updates
///
/// With a gate, every update blocks until [`MockCandidateStore::release`]
/// hands out a permit, which keeps commits pending for as long as a test
/// needs.
pub struct MockCandidateStore {
    candidates: RwLock<Vec<Candidate>>,
    version: AtomicU64,
    calls: Mutex<Vec<StageUpdate>>,
    fetches: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
    reject: AtomicBool,
}

impl MockCandidateStore {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates: RwLock::new(candidates),
            version: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
            gate: None,
            reject: AtomicBool::new(false),
        }
    }

    /// Hold every update until released
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Let `n` held updates proceed
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Reject every following update
    pub fn reject_updates(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<StageUpdate> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` updates have been received
    pub async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls.lock().unwrap().len() < n {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("timed out waiting for stage updates");
    }
}

#[async_trait]
impl CandidateStore for MockCandidateStore {
    async fn candidates(&self) -> Result<CandidateSnapshot, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
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
        self.calls.lock().unwrap().push(StageUpdate {
            candidate_id: candidate_id.to_string(),
            job_id: job_id.to_string(),
            stage_id: stage_id.to_string(),
        });

        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| StoreError::Internal(e.to_string()))?;
            permit.forget();
        }

        if self.reject.load(Ordering::SeqCst) {
            return Err(StoreError::Api("422 Unprocessable Entity".to_string()));
        }

        let mut candidates = self.candidates.write().await;
        let application = candidates
            .iter_mut()
            .find(|c| c.id == candidate_id)
            .and_then(|c| c.application_mut(job_id))
            .ok_or_else(|| StoreError::NotFound(candidate_id.to_string()))?;
        application.current_stage_id = Some(stage_id.to_string());
        self.version.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Pipeline persistence that fails every write
pub struct FailingPersistence {
    pub error: StoreError,
    pub attempts: AtomicUsize,
}

impl FailingPersistence {
    pub fn new(error: StoreError) -> Self {
        Self {
            error,
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PipelinePersistence for FailingPersistence {
    async fn create_pipeline(&self, _draft: PipelineDraft) -> Result<Pipeline, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    async fn update_pipeline(&self, _id: &str, _patch: PipelinePatch) -> Result<Pipeline, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    async fn fetch_pipeline_by_id(&self, id: &str) -> Result<Pipeline, StoreError> {
        Err(StoreError::NotFound(id.to_string()))
    }

    async fn list_templates(&self) -> Result<Vec<Pipeline>, StoreError> {
        Ok(Vec::new())
    }
}

/// Job-bound pipeline with stage ids `s1..sN`
pub fn pipeline(names: &[&str]) -> Pipeline {
    let stages = names
        .iter()
        .enumerate()
        .map(|(index, name)| Stage::new(format!("s{}", index + 1), *name, index))
        .collect();
    Pipeline::from_draft(
        "p1",
        PipelineDraft {
            name: "Engineering".to_string(),
            description: String::new(),
            kind: PipelineKind::Candidate,
            stages,
            is_active: true,
            job_id: Some(JOB.to_string()),
        },
    )
}

/// Candidate applied to the test job
pub fn candidate(id: &str, stage_id: Option<&str>) -> Candidate {
    Candidate::new(id, format!("Candidate {}", id)).with_application(JOB, stage_id)
}

/// Applied / Screening / Interview board with c1, c2 in s1 and c3 in s2
pub async fn board(store: MockCandidateStore) -> (Arc<MockCandidateStore>, PipelineBoard<MockCandidateStore>) {
    let store = Arc::new(store);
    let mut board = PipelineBoard::new(
        Arc::clone(&store),
        pipeline(&["Applied", "Screening", "Interview"]),
        JOB,
        LayoutConstants::default(),
    );
    board.refresh().await.unwrap();
    (store, board)
}

pub fn default_candidates() -> Vec<Candidate> {
    vec![
        candidate("c1", Some("s1")),
        candidate("c2", Some("s1")),
        candidate("c3", Some("s2")),
    ]
}
