//! Error taxonomy shared by the stages.
//!
//! Missing inputs are reported as [`InputMissing`] values and handled by skipping the
//! dependent stage; transport failures propagate and end the run.

use std::fmt;
use std::path::PathBuf;

use crate::contract::{CompletionError, PartitionError};

/// Which required input was absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// The `.pdf` datasheet.
    Datasheet,
    /// The `.c` reference driver source.
    ReferenceSource,
    /// The persisted `summary.json`.
    Summary,
}

impl fmt::Display for InputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputKind::Datasheet => "PDF datasheet",
            InputKind::ReferenceSource => "C reference source",
            InputKind::Summary => "summary JSON",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{input} not found at {}", .location.display())]
pub struct InputMissing {
    pub input: InputKind,
    /// The file or directory that was searched.
    pub location: PathBuf,
}

impl InputMissing {
    pub fn new(input: InputKind, location: impl Into<PathBuf>) -> Self {
        Self {
            input,
            location: location.into(),
        }
    }
}

/// Why the synthesis inputs could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("missing input: {0}")]
    Missing(#[from] InputMissing),
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The single synthesis completion call failed. Never retried.
#[derive(Debug, thiserror::Error)]
#[error("generation failed: {0}")]
pub struct GenerationFailed(#[source] pub CompletionError);

#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    #[error("failed to serialize summary for enrichment: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("enrichment completion failed: {0}")]
    Completion(#[from] CompletionError),
}

/// Failures that abort a pipeline run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("partition failed: {0}")]
    Partition(#[from] PartitionError),
    #[error("enrichment failed: {0}")]
    Enrichment(#[source] CompletionError),
    #[error("synthesis failed: {0}")]
    Synthesis(#[source] CompletionError),
    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
