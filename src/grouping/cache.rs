//! Memoization of the grouping by (candidate-list version, job, stage set)

use crate::core::{pipeline::sort_by_order, Candidate, Stage};
use crate::grouping::{group_candidates, StageGrouping};
use std::sync::Arc;
use tracing::debug;

/// Identity of one grouping computation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupingKey {
    pub candidates_version: u64,
    pub job_id: String,
    /// (id, order) pairs sorted by order, then id
    pub stage_set: Vec<(String, u32)>,
}

impl GroupingKey {
    pub fn new(candidates_version: u64, job_id: &str, stages: &[Stage]) -> Self {
        Self {
            candidates_version,
            job_id: job_id.to_string(),
            stage_set: stage_set(stages),
        }
    }
}

/// The (id, order) pairs of a stage list, independent of storage order
pub fn stage_set(stages: &[Stage]) -> Vec<(String, u32)> {
    sort_by_order(stages)
        .into_iter()
        .map(|stage| (stage.id.clone(), stage.order))
        .collect()
}

/// Single-entry grouping cache
#[derive(Debug, Default)]
pub struct GroupingCache {
    entry: Option<(GroupingKey, Arc<StageGrouping>)>,
    hits: u64,
    misses: u64,
}

impl GroupingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached grouping for this key, computing it on a miss
    pub fn get_or_compute(
        &mut self,
        candidates_version: u64,
        stages: &[Stage],
        candidates: &[Candidate],
        job_id: &str,
    ) -> Arc<StageGrouping> {
        let key = GroupingKey::new(candidates_version, job_id, stages);

        if let Some((cached_key, grouping)) = &self.entry {
            if *cached_key == key {
                self.hits += 1;
                debug!(job_id, version = candidates_version, "Grouping cache hit");
                return Arc::clone(grouping);
            }
        }

        self.misses += 1;
        let grouping = Arc::new(group_candidates(stages, candidates, job_id));
        self.entry = Some((key, Arc::clone(&grouping)));
        grouping
    }

    /// The last computed grouping, if any
    pub fn current(&self) -> Option<Arc<StageGrouping>> {
        self.entry.as_ref().map(|(_, grouping)| Arc::clone(grouping))
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
