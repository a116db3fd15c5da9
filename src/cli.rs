///
/// This module implements the CLI interface for tdata: command parsing, config loading,
/// construction of the concrete capability clients, and the user-visible summary.
///
/// All classification, prompting and orchestration lives in the [`tdata-core`] crate.
///
/// ## How To Use
/// - From the command line: `tdata run` inside a working directory laid out as
///   `ingest/datasheets/*.pdf` and `ingest/C-code-reference/*.c`.
/// - Programmatically / in tests: call [`run`] with a constructed [`Cli`].
///
/// [`tdata-core`]: ../../tdata-core/
use crate::llm::OpenAiClient;
use crate::load_config::load_config;
use crate::partition::UnstructuredClient;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tdata_core::config::OutputScope;
use tdata_core::layout::Layout;
use tdata_core::pipeline::{run_pipeline, StageOutcome};

/// CLI for tdata: datasheet summaries and synthetic driver training data.
#[derive(Parser)]
#[clap(
    name = "tdata",
    version,
    about = "Summarise hardware datasheets and synthesise driver training data with an LLM"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline in the working directory
    Run {
        /// Working directory (defaults to the current directory)
        #[clap(long)]
        base_dir: Option<PathBuf>,
        /// Optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Enrich the classified summary with an extra LLM call
        #[clap(long)]
        enrich: bool,
        /// Write artifacts to a fresh output/runs/<run id>/ directory
        #[clap(long)]
        per_run: bool,
    },
    /// Create the ingest/ and output/ directory layout
    Init {
        /// Working directory (defaults to the current directory)
        #[clap(long)]
        base_dir: Option<PathBuf>,
    },
}

fn resolve_base_dir(base_dir: Option<PathBuf>) -> Result<PathBuf> {
    match base_dir {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("failed to determine current directory"),
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Init { base_dir } => {
            let base_dir = resolve_base_dir(base_dir)?;
            let layout = Layout::new(&base_dir, &OutputScope::Shared, "");
            layout
                .ensure()
                .with_context(|| format!("failed to create layout in {}", base_dir.display()))?;
            tracing::info!(command = "init", base_dir = %base_dir.display(), "Layout created");
            println!("Created ingest/ and output/ under {}", base_dir.display());
            Ok(())
        }
        Commands::Run {
            base_dir,
            config,
            enrich,
            per_run,
        } => {
            let base_dir = resolve_base_dir(base_dir)?;
            let app_config = load_config(config.as_deref())?;
            let mut pipeline_config = app_config.pipeline_config(base_dir);
            pipeline_config.enrich |= enrich;
            if per_run {
                pipeline_config.scope = OutputScope::PerRun;
            }
            pipeline_config.trace_loaded();

            let client = OpenAiClient::new(
                app_config.llm.api_url.clone(),
                app_config.openai_api_key()?,
                app_config.llm.timeout_secs.map(Duration::from_secs),
            )?;
            let partitioner = UnstructuredClient::new(
                app_config.partition.api_url.clone(),
                app_config.secrets.unstructured_api_key.clone(),
            )?;

            tracing::info!(command = "run", "Starting pipeline");
            match run_pipeline(&pipeline_config, &partitioner, &client).await {
                Ok(report) => {
                    tracing::info!(command = "run", ?report, "Pipeline complete");
                    print_outcome("summary", &report.summary);
                    print_outcome("dataset", &report.dataset);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "run", error = %e, "Pipeline failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
    }
}

fn print_outcome(stage: &str, outcome: &StageOutcome) {
    match outcome {
        StageOutcome::Written(artifact) => println!(
            "{stage}: written {} ({} bytes, sha256 {})",
            artifact.path.display(),
            artifact.bytes,
            artifact.sha256
        ),
        StageOutcome::Skipped(missing) => println!("{stage}: skipped ({missing})"),
    }
}
