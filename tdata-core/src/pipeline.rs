//! High-level pipeline: datasheet → summary → synthetic training data.
//!
//! Stages run strictly in sequence, one awaited call at a time:
//!   1. find the PDF datasheet, partition it and classify the elements
//!   2. optionally enrich the summary, then persist `summary.json`
//!   3. find the C reference source and the persisted summary
//!   4. synthesise the dataset and persist it verbatim
//!
//! # Error Handling
//! A missing input skips its dependent stage and is recorded in the report as
//! [`StageOutcome::Skipped`]; the run still succeeds. Partition, completion and I/O
//! failures return immediately as a [`PipelineError`]; the failing stage never leaves a
//! partial output file behind (see [`layout::write_atomic`]).
//!
//! # Concurrency
//! With [`OutputScope::Shared`](crate::config::OutputScope::Shared) the artifact paths
//! are fixed, so concurrent runs against one base directory overwrite each other.
//! [`OutputScope::PerRun`](crate::config::OutputScope::PerRun) gives each run its own
//! output directory.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::classify::classify_with_overflow;
use crate::config::PipelineConfig;
use crate::contract::{CompletionClient, Partitioner};
use crate::enrich::Enricher;
use crate::error::{
    EnrichError, GenerationFailed, InputError, InputKind, InputMissing, PipelineError,
};
use crate::layout::{self, Layout};
use crate::summary::{to_pretty_json, SummaryArtifact};
use crate::synthesise::{SynthesisRequest, Synthesizer};

/// A file written by the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactReport {
    pub path: PathBuf,
    pub bytes: usize,
    /// Hex SHA-256 of the written contents.
    pub sha256: String,
}

impl ArtifactReport {
    fn new(path: PathBuf, contents: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(contents);
        Self {
            path,
            bytes: contents.len(),
            sha256: format!("{:x}", hasher.finalize()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Written(ArtifactReport),
    Skipped(InputMissing),
}

impl StageOutcome {
    pub fn artifact(&self) -> Option<&ArtifactReport> {
        match self {
            StageOutcome::Written(report) => Some(report),
            StageOutcome::Skipped(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub run_id: String,
    pub summary: StageOutcome,
    /// Whether the persisted summary is the bucketed structure (not raw enrichment text).
    pub summary_structured: Option<bool>,
    pub unclassified: usize,
    pub dataset: StageOutcome,
    /// Record count from the best-effort parse of the dataset, if it parsed.
    pub dataset_records: Option<usize>,
    /// Complete user/assistant pairs in the parsed dataset.
    pub dataset_pairs: Option<usize>,
}

/// Run the full pipeline in `config.base_dir`.
pub async fn run_pipeline<P, C>(
    config: &PipelineConfig,
    partitioner: &P,
    client: &C,
) -> Result<PipelineReport, PipelineError>
where
    P: Partitioner + ?Sized,
    C: CompletionClient + ?Sized,
{
    let run_id = Uuid::new_v4().to_string();
    let layout = Layout::new(&config.base_dir, &config.scope, &run_id);
    info!(run_id = %run_id, base_dir = %config.base_dir.display(), "[PIPELINE] Starting run");

    layout.ensure().map_err(|source| PipelineError::Io {
        path: layout.base_dir.clone(),
        source,
    })?;

    let mut report = PipelineReport {
        run_id,
        summary: StageOutcome::Skipped(InputMissing::new(
            InputKind::Datasheet,
            &layout.datasheets_dir,
        )),
        summary_structured: None,
        unclassified: 0,
        dataset: StageOutcome::Skipped(InputMissing::new(
            InputKind::ReferenceSource,
            &layout.code_reference_dir,
        )),
        dataset_records: None,
        dataset_pairs: None,
    };

    // --- Stage 1-2: datasheet to summary ---
    let datasheet = layout
        .find_datasheet()
        .map_err(|source| PipelineError::Io {
            path: layout.datasheets_dir.clone(),
            source,
        })?;
    match datasheet {
        Some(pdf) => {
            summarise_datasheet(config, &layout, &pdf, partitioner, client, &mut report).await?;
        }
        None => {
            error!(
                dir = %layout.datasheets_dir.display(),
                "[PIPELINE] No PDF datasheet found, skipping summary stage"
            );
        }
    }

    // --- Stage 3-4: summary + reference source to dataset ---
    let reference = layout
        .find_reference_source()
        .map_err(|source| PipelineError::Io {
            path: layout.code_reference_dir.clone(),
            source,
        })?;
    let Some(reference) = reference else {
        error!(
            dir = %layout.code_reference_dir.display(),
            "[PIPELINE] No C reference file found, skipping synthesis stage"
        );
        return Ok(finish(report));
    };

    let request = match SynthesisRequest::from_paths(&reference, &layout.summary_path()) {
        Ok(request) => request,
        Err(InputError::Missing(missing)) => {
            error!(
                missing = %missing,
                "[PIPELINE] Synthesis input missing, skipping synthesis stage"
            );
            report.dataset = StageOutcome::Skipped(missing);
            return Ok(finish(report));
        }
        Err(InputError::Read { path, source }) => return Err(PipelineError::Io { path, source }),
    };
    if report.summary_structured.is_none() {
        // Summary left by an earlier run.
        let structured = SummaryArtifact::from_json_text(&request.summary_text)
            .is_structured();
        info!(structured, "[PIPELINE] Reusing persisted summary");
        report.summary_structured = Some(structured);
    }

    let synthesizer = Synthesizer::new(client, config.synthesis.clone());
    let dataset = synthesizer
        .synthesise(&request)
        .await
        .map_err(|GenerationFailed(e)| PipelineError::Synthesis(e))?;

    match dataset.records() {
        Ok(parsed) => {
            let records = parsed.message.len();
            let pairs = parsed.pair_count();
            info!(records, pairs, "[PIPELINE] Generated dataset parsed");
            report.dataset_records = Some(records);
            report.dataset_pairs = Some(pairs);
        }
        Err(e) => warn!(
            error = %e,
            "[PIPELINE] Generated dataset is not valid dataset JSON; writing it verbatim"
        ),
    }

    let dataset_path = layout.dataset_path();
    report.dataset = StageOutcome::Written(persist(&dataset_path, dataset.raw.as_bytes())?);
    info!(path = %dataset_path.display(), "[PIPELINE] Generated code written");

    Ok(finish(report))
}

async fn summarise_datasheet<P, C>(
    config: &PipelineConfig,
    layout: &Layout,
    pdf: &Path,
    partitioner: &P,
    client: &C,
    report: &mut PipelineReport,
) -> Result<(), PipelineError>
where
    P: Partitioner + ?Sized,
    C: CompletionClient + ?Sized,
{
    info!(pdf = %pdf.display(), "[PIPELINE] Partitioning datasheet");
    let mut options = config.partition.clone();
    options.image_output_dir = layout.resolve(&options.image_output_dir);
    let elements = partitioner
        .partition(pdf, &options)
        .await
        .map_err(|e| {
            error!(error = %e, "[PIPELINE][ERROR] Partition failed");
            PipelineError::from(e)
        })?;
    info!(elements = elements.len(), "[PIPELINE] Datasheet partitioned");

    let classification = classify_with_overflow(&elements);
    report.unclassified = classification.unclassified.len();

    let artifact = if config.enrich {
        info!("[PIPELINE] Enhancing summary with LLM");
        Enricher::new(client, config.enrichment.clone())
            .enrich(&classification.summary)
            .await
            .map_err(|e| match e {
                EnrichError::Completion(e) => PipelineError::Enrichment(e),
                EnrichError::Serialize(source) => PipelineError::Serialize {
                    what: "summary",
                    source,
                },
            })?
    } else {
        SummaryArtifact::Structured(classification.summary)
    };
    report.summary_structured = Some(artifact.is_structured());

    let contents = artifact
        .to_pretty_json()
        .map_err(|source| PipelineError::Serialize {
            what: "summary",
            source,
        })?;
    let summary_path = layout.summary_path();
    report.summary = StageOutcome::Written(persist(&summary_path, contents.as_bytes())?);
    info!(path = %summary_path.display(), "[PIPELINE] Summary written");

    if config.keep_unclassified {
        let contents = to_pretty_json(&classification.unclassified).map_err(|source| {
            PipelineError::Serialize {
                what: "unclassified elements",
                source,
            }
        })?;
        persist(&layout.unclassified_path(), contents.as_bytes())?;
    }
    Ok(())
}

fn persist(path: &Path, contents: &[u8]) -> Result<ArtifactReport, PipelineError> {
    layout::write_atomic(path, contents).map_err(|source| {
        error!(
            path = %path.display(),
            error = %source,
            "[PIPELINE][ERROR] Failed to write artifact"
        );
        PipelineError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(ArtifactReport::new(path.to_path_buf(), contents))
}

fn finish(report: PipelineReport) -> PipelineReport {
    info!(
        run_id = %report.run_id,
        summary_written = report.summary.artifact().is_some(),
        dataset_written = report.dataset.artifact().is_some(),
        "[PIPELINE] Run complete"
    );
    report
}
