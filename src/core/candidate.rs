//! Candidate application records (owned by the candidate store)

use serde::{Deserialize, Serialize};

/// One candidate's application to a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub job_id: String,

    /// Stage the candidate currently occupies; absent means unassigned
    #[serde(default)]
    pub current_stage_id: Option<String>,
}

/// A candidate as supplied by the candidate store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub job_applications: Vec<JobApplication>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            job_applications: Vec::new(),
        }
    }

    /// Add an application for `job_id` at an optional stage
    pub fn with_application(mut self, job_id: impl Into<String>, stage_id: Option<&str>) -> Self {
        self.job_applications.push(JobApplication {
            job_id: job_id.into(),
            current_stage_id: stage_id.map(str::to_string),
        });
        self
    }

    /// The first application for `job_id`, if any
    pub fn application(&self, job_id: &str) -> Option<&JobApplication> {
        self.job_applications.iter().find(|a| a.job_id == job_id)
    }

    pub fn application_mut(&mut self, job_id: &str) -> Option<&mut JobApplication> {
        self.job_applications.iter_mut().find(|a| a.job_id == job_id)
    }

    pub fn has_applied(&self, job_id: &str) -> bool {
        self.application(job_id).is_some()
    }

    /// Raw stage id recorded for `job_id` (may not exist in the pipeline)
    pub fn current_stage(&self, job_id: &str) -> Option<&str> {
        self.application(job_id)
            .and_then(|a| a.current_stage_id.as_deref())
    }

    /// Display label, falling back to the id
    pub fn label(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// A versioned view of the candidate list; the version changes whenever
/// any candidate's data changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSnapshot {
    pub version: u64,
    pub candidates: Vec<Candidate>,
}

impl CandidateSnapshot {
    pub fn new(version: u64, candidates: Vec<Candidate>) -> Self {
        Self { version, candidates }
    }

    /// Candidates that applied to `job_id`
    pub fn for_job<'a>(&'a self, job_id: &'a str) -> impl Iterator<Item = &'a Candidate> + 'a {
        self.candidates.iter().filter(move |c| c.has_applied(job_id))
    }

    pub fn find(&self, candidate_id: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.id == candidate_id)
    }
}
