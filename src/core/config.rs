//! Pipeline templates and board snapshots loaded from YAML

use crate::core::{
    candidate::{Candidate, CandidateSnapshot},
    pipeline::{Pipeline, PipelineDraft, PipelineKind},
    stage::{palette_entry, validate_color, Stage},
};
use crate::layout::LayoutConstants;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A pipeline template as written in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineTemplateConfig {
    /// Template name
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// `candidate` or `custom`
    #[serde(rename = "type", default)]
    pub kind: PipelineKind,

    /// Stages in display order
    pub stages: Vec<StageConfig>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Stage definition inside a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    /// Stable id; generated when omitted
    #[serde(default)]
    pub id: Option<String>,

    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Hex color; palette default when omitted
    #[serde(default)]
    pub color: Option<String>,

    /// Icon; palette default when omitted
    #[serde(default)]
    pub icon: Option<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

impl PipelineTemplateConfig {
    /// Load a template from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a template from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineTemplateConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the template
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            anyhow::bail!("Pipeline name must not be empty");
        }
        if self.stages.is_empty() {
            anyhow::bail!("Pipeline '{}' must define at least one stage", self.name);
        }

        let mut seen_names = HashSet::new();
        let mut seen_ids = HashSet::new();
        for (index, stage) in self.stages.iter().enumerate() {
            let name = stage.name.trim();
            if name.is_empty() {
                anyhow::bail!("Stage #{} has an empty name", index + 1);
            }
            if !seen_names.insert(name.to_lowercase()) {
                anyhow::bail!("Duplicate stage name: {}", name);
            }
            if let Some(ref id) = stage.id {
                if !seen_ids.insert(id.as_str()) {
                    anyhow::bail!("Duplicate stage ID: {}", id);
                }
            }
            if let Some(ref color) = stage.color {
                validate_color(color)?;
            }
        }

        Ok(())
    }

    /// Build concrete stages with `order` 1..N and palette defaults
    pub fn to_stages(&self) -> Vec<Stage> {
        self.stages
            .iter()
            .enumerate()
            .map(|(index, config)| {
                let (color, icon) = palette_entry(index);
                Stage {
                    id: config
                        .id
                        .clone()
                        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                    name: config.name.trim().to_string(),
                    description: config.description.clone().unwrap_or_default(),
                    color: config.color.clone().unwrap_or_else(|| color.to_string()),
                    icon: config.icon.clone().unwrap_or_else(|| icon.to_string()),
                    order: index as u32 + 1,
                    is_active: config.is_active,
                }
            })
            .collect()
    }

    /// Convert to a draft, bound to `job_id` when given
    pub fn to_draft(&self, job_id: Option<String>) -> PipelineDraft {
        PipelineDraft {
            name: self.name.clone(),
            description: self.description.clone().unwrap_or_default(),
            kind: self.kind,
            stages: self.to_stages(),
            is_active: self.is_active,
            job_id,
        }
    }
}

/// Directory scanned for user templates
pub fn templates_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hiring-pipeline")
        .join("templates")
}

/// Load every `*.yaml` / `*.yml` template in `dir`, sorted by path
///
/// A missing directory yields an empty list. Invalid files are returned
/// with their error so callers can report them.
pub fn discover_templates(dir: &Path) -> Result<Vec<(PathBuf, Result<PipelineTemplateConfig>)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .map(|path| {
            let config = PipelineTemplateConfig::from_file(&path);
            (path, config)
        })
        .collect())
}

/// A pipeline plus the candidates of one job, as used by the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub job_id: String,

    pub pipeline: Pipeline,

    #[serde(default)]
    pub candidates: Vec<Candidate>,

    /// Layout constant overrides
    #[serde(default)]
    pub layout: Option<LayoutConstants>,
}

impl BoardSnapshot {
    /// Load a snapshot from a YAML (or JSON) file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut snapshot: BoardSnapshot = serde_yaml::from_str(yaml)?;

        let mut seen = HashSet::new();
        for stage in &snapshot.pipeline.stages {
            if !seen.insert(stage.id.as_str()) {
                anyhow::bail!("Duplicate stage ID: {}", stage.id);
            }
        }
        if !snapshot.pipeline.validate_order() {
            warn!(
                pipeline = %snapshot.pipeline.name,
                "Stage order is not contiguous, renumbering"
            );
            snapshot.pipeline.renumber();
        }

        Ok(snapshot)
    }

    /// Candidate list as a version-0 snapshot
    pub fn candidate_snapshot(&self) -> CandidateSnapshot {
        CandidateSnapshot::new(0, self.candidates.clone())
    }
}
