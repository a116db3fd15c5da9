/// `load_config` module: Loads the optional YAML config file and injects secrets from
/// the environment.
///
/// Every key is optional; an absent file or section yields the defaults of the fixed
/// layout (no enrichment, shared output paths, `gpt-4` for enrichment, `gpt-4o` for
/// synthesis, 4096 output tokens, `hi_res` partitioning with image and table blocks).
///
/// # Environment
/// - `OPENAI_API_KEY`: required by [`AppConfig::openai_api_key`] for `run`
/// - `OPENAI_API_URL`: overrides `llm.api_url`
/// - `UNSTRUCTURED_API_URL`: overrides `partition.api_url`
/// - `UNSTRUCTURED_API_KEY`: optional key for the partition service
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tdata_core::config::{ModelSettings, OutputScope, PipelineConfig};
use tdata_core::contract::PartitionOptions;
use tracing::{error, info};

pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_UNSTRUCTURED_API_URL: &str = "https://api.unstructuredapp.io/general/v0/general";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub enrich: bool,
    pub output: OutputSection,
    pub partition: PartitionSection,
    pub enrichment: ModelSettings,
    pub synthesis: ModelSettings,
    pub llm: LlmSection,
    #[serde(skip)]
    pub secrets: Secrets,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            enrich: false,
            output: OutputSection::default(),
            partition: PartitionSection::default(),
            enrichment: ModelSettings::enrichment(),
            synthesis: ModelSettings::synthesis(),
            llm: LlmSection::default(),
            secrets: Secrets::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub scope: OutputScope,
    pub keep_unclassified: bool,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            scope: OutputScope::Shared,
            keep_unclassified: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PartitionSection {
    pub api_url: String,
    #[serde(flatten)]
    pub options: PartitionOptions,
}

impl Default for PartitionSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_UNSTRUCTURED_API_URL.to_string(),
            options: PartitionOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub api_url: String,
    /// No timeout unless configured; a slow call blocks the run.
    pub timeout_secs: Option<u64>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_OPENAI_API_URL.to_string(),
            timeout_secs: None,
        }
    }
}

#[derive(Clone, Default)]
pub struct Secrets {
    pub openai_api_key: Option<String>,
    pub unstructured_api_key: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<set>"))
            .field(
                "unstructured_api_key",
                &self.unstructured_api_key.as_ref().map(|_| "<set>"),
            )
            .finish()
    }
}

impl AppConfig {
    pub fn openai_api_key(&self) -> Result<&str> {
        self.secrets.openai_api_key.as_deref().ok_or_else(|| {
            error!("OPENAI_API_KEY environment variable not set");
            anyhow::anyhow!("OPENAI_API_KEY environment variable not set")
        })
    }

    /// Core pipeline configuration for a run rooted at `base_dir`.
    pub fn pipeline_config(&self, base_dir: PathBuf) -> PipelineConfig {
        PipelineConfig {
            base_dir,
            scope: self.output.scope.clone(),
            enrich: self.enrich,
            keep_unclassified: self.output.keep_unclassified,
            partition: self.partition.options.clone(),
            enrichment: self.enrichment.clone(),
            synthesis: self.synthesis.clone(),
        }
    }
}

/// Loads the YAML config file (if any) and injects environment secrets and URL overrides.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path {
        Some(path_ref) => read_config_file(path_ref)?,
        None => {
            info!("No config file given, using defaults");
            AppConfig::default()
        }
    };

    if let Ok(url) = std::env::var("OPENAI_API_URL") {
        info!(url = %url, "OPENAI_API_URL found in env");
        config.llm.api_url = url;
    }
    if let Ok(url) = std::env::var("UNSTRUCTURED_API_URL") {
        info!(url = %url, "UNSTRUCTURED_API_URL found in env");
        config.partition.api_url = url;
    }
    config.secrets = Secrets {
        openai_api_key: std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty()),
        unstructured_api_key: std::env::var("UNSTRUCTURED_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty()),
    };

    info!(
        enrich = config.enrich,
        scope = ?config.output.scope,
        openai_api_key_set = config.secrets.openai_api_key.is_some(),
        "Config loaded and merged successfully"
    );
    Ok(config)
}

fn read_config_file(path_ref: &Path) -> Result<AppConfig> {
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    // An empty file is a valid "all defaults" config.
    if config_content.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf)
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}
