//! Built-in pipeline templates

use crate::core::{
    pipeline::{PipelineDraft, PipelineKind},
    stage::Stage,
};

/// A named, reusable stage layout
#[derive(Debug, Clone, Copy)]
pub struct BuiltinTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub stages: &'static [&'static str],
}

pub const BUILTIN_TEMPLATES: [BuiltinTemplate; 3] = [
    BuiltinTemplate {
        key: "standard",
        name: "Standard Hiring",
        description: "General-purpose hiring workflow",
        stages: &["Applied", "Screening", "Interview", "Offer", "Hired"],
    },
    BuiltinTemplate {
        key: "technical",
        name: "Technical Hiring",
        description: "Engineering roles with a technical assessment",
        stages: &[
            "Applied",
            "Phone Screen",
            "Technical Interview",
            "Onsite",
            "Offer",
            "Hired",
        ],
    },
    BuiltinTemplate {
        key: "executive",
        name: "Executive Search",
        description: "Senior hires sourced through outreach",
        stages: &[
            "Sourced",
            "Intro Call",
            "Panel Interview",
            "Reference Check",
            "Offer",
            "Hired",
        ],
    },
];

/// Look up a built-in template by key
pub fn template(key: &str) -> Option<&'static BuiltinTemplate> {
    BUILTIN_TEMPLATES
        .iter()
        .find(|t| t.key.eq_ignore_ascii_case(key))
}

impl BuiltinTemplate {
    /// Stages with fresh ids, palette colors and order 1..N
    pub fn stages(&self) -> Vec<Stage> {
        self.stages
            .iter()
            .enumerate()
            .map(|(index, name)| Stage::new(uuid::Uuid::new_v4().to_string(), *name, index))
            .collect()
    }

    /// Draft pipeline, bound to `job_id` when given
    pub fn to_draft(&self, job_id: Option<String>) -> PipelineDraft {
        PipelineDraft {
            name: self.name.to_string(),
            description: self.description.to_string(),
            kind: PipelineKind::Candidate,
            stages: self.stages(),
            is_active: true,
            job_id,
        }
    }
}

/// Job-bound draft from a built-in template
pub fn instantiate_template(key: &str, job_id: &str) -> Option<PipelineDraft> {
    template(key).map(|t| t.to_draft(Some(job_id.to_string())))
}
