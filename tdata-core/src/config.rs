use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::contract::PartitionOptions;

pub const DEFAULT_ENRICHMENT_MODEL: &str = "gpt-4";
pub const DEFAULT_SYNTHESIS_MODEL: &str = "gpt-4o";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Model and output budget for one LLM stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl ModelSettings {
    pub fn enrichment() -> Self {
        Self {
            model: DEFAULT_ENRICHMENT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn synthesis() -> Self {
        Self {
            model: DEFAULT_SYNTHESIS_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

/// Where run artifacts are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputScope {
    /// Fixed paths shared by every run in the working directory.
    Shared,
    /// A fresh directory per run under `output/runs/`.
    PerRun,
}

/// Everything one pipeline run needs apart from its capability clients.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub base_dir: PathBuf,
    pub scope: OutputScope,
    /// Run the optional enrichment stage.
    pub enrich: bool,
    /// Persist elements no rule matched next to the summary.
    pub keep_unclassified: bool,
    pub partition: PartitionOptions,
    pub enrichment: ModelSettings,
    pub synthesis: ModelSettings,
}

impl PipelineConfig {
    /// Defaults matching the fixed layout: shared paths, no enrichment.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            scope: OutputScope::Shared,
            enrich: false,
            keep_unclassified: false,
            partition: PartitionOptions::default(),
            enrichment: ModelSettings::enrichment(),
            synthesis: ModelSettings::synthesis(),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            base_dir = %self.base_dir.display(),
            scope = ?self.scope,
            enrich = self.enrich,
            enrichment_model = %self.enrichment.model,
            synthesis_model = %self.synthesis.model,
            "Loaded PipelineConfig"
        );
        debug!(config = ?self, "PipelineConfig loaded (full debug)");
    }
}
