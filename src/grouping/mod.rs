//! Grouping engine - derives the stage → candidates mapping
//!
//! The mapping is never stored: it is recomputed from the stage list and
//! the live candidate list, and cached by [`GroupingCache`] under an
//! explicit key.

pub mod cache;

pub use cache::{GroupingCache, GroupingKey};

use crate::core::{pipeline::sort_by_order, Candidate, Stage};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Candidates attributed to one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageBucket {
    pub stage_id: String,
    pub order: u32,
    /// Candidates in candidate-list order
    pub candidates: Vec<Candidate>,
}

/// Data-integrity findings recovered during grouping
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupingWarning {
    /// The recorded stage is not part of this pipeline; the candidate was
    /// routed to the default stage
    StageNotFound {
        candidate_id: String,
        stage_id: String,
    },
}

/// Result of grouping the candidates of one job
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StageGrouping {
    /// One bucket per stage, sorted by `order`
    pub buckets: Vec<StageBucket>,

    /// Candidates of the job when the pipeline has no stages
    pub unassignable: Vec<Candidate>,

    pub warnings: Vec<GroupingWarning>,

    /// candidate id → effective stage id
    assignments: BTreeMap<String, String>,
}

impl StageGrouping {
    /// Candidates in a stage (`None` if the stage is not in the grouping)
    pub fn candidates_in(&self, stage_id: &str) -> Option<&[Candidate]> {
        self.buckets
            .iter()
            .find(|b| b.stage_id == stage_id)
            .map(|b| b.candidates.as_slice())
    }

    /// Effective stage of a candidate (after default-stage routing)
    pub fn stage_of(&self, candidate_id: &str) -> Option<&str> {
        self.assignments.get(candidate_id).map(String::as_str)
    }

    pub fn contains_stage(&self, stage_id: &str) -> bool {
        self.buckets.iter().any(|b| b.stage_id == stage_id)
    }

    /// Total candidates across all buckets
    pub fn assigned_count(&self) -> usize {
        self.buckets.iter().map(|b| b.candidates.len()).sum()
    }

    /// Stage ids with their candidate counts, in `order`
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.buckets
            .iter()
            .map(|b| (b.stage_id.as_str(), b.candidates.len()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Group the candidates that applied to `job_id` by their current stage
///
/// Candidates without a current stage, or with a stage id that is not in
/// `stages`, land in the stage with the lowest `order`. With no stages at
/// all, the job's candidates are reported as unassignable.
pub fn group_candidates(stages: &[Stage], candidates: &[Candidate], job_id: &str) -> StageGrouping {
    let applicants = candidates.iter().filter(|c| c.has_applied(job_id));

    let sorted = sort_by_order(stages);
    if sorted.is_empty() {
        let unassignable: Vec<Candidate> = applicants.cloned().collect();
        if !unassignable.is_empty() {
            warn!(
                job_id,
                count = unassignable.len(),
                "Pipeline has no stages, candidates are unassignable"
            );
        }
        return StageGrouping {
            unassignable,
            ..StageGrouping::default()
        };
    }

    let mut buckets: Vec<StageBucket> = Vec::with_capacity(sorted.len());
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(sorted.len());
    for stage in &sorted {
        if index.contains_key(stage.id.as_str()) {
            continue;
        }
        index.insert(stage.id.as_str(), buckets.len());
        buckets.push(StageBucket {
            stage_id: stage.id.clone(),
            order: stage.order,
            candidates: Vec::new(),
        });
    }

    let mut warnings = Vec::new();
    let mut assignments = BTreeMap::new();

    for candidate in applicants {
        let slot = match candidate.current_stage(job_id) {
            Some(stage_id) => match index.get(stage_id) {
                Some(slot) => *slot,
                None => {
                    warn!(
                        candidate_id = %candidate.id,
                        stage_id,
                        job_id,
                        "Candidate references unknown stage, using default stage"
                    );
                    warnings.push(GroupingWarning::StageNotFound {
                        candidate_id: candidate.id.clone(),
                        stage_id: stage_id.to_string(),
                    });
                    0
                }
            },
            None => 0,
        };

        assignments.insert(candidate.id.clone(), buckets[slot].stage_id.clone());
        buckets[slot].candidates.push(candidate.clone());
    }

    debug!(
        job_id,
        stages = buckets.len(),
        candidates = assignments.len(),
        "Grouped candidates"
    );

    StageGrouping {
        buckets,
        unassignable: Vec::new(),
        warnings,
        assignments,
    }
}

/// Candidates per recorded stage id for `job_id`, without default-stage
/// routing (used to decide whether a stage can be removed)
pub fn stage_occupancy(candidates: &[Candidate], job_id: &str) -> HashMap<String, usize> {
    let mut occupancy = HashMap::new();
    for stage_id in candidates.iter().filter_map(|c| c.current_stage(job_id)) {
        *occupancy.entry(stage_id.to_string()).or_insert(0) += 1;
    }
    occupancy
}
