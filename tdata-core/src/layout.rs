//! Working-directory layout: input discovery, output paths and atomic writes.
//!
//! ```text
//! <base>/ingest/datasheets/        one *.pdf; summary.json is written here
//! <base>/ingest/C-code-reference/  one *.c
//! <base>/output/                   generated_driver_code.json
//! <base>/output/runs/<run_id>/     both artifacts, when runs are scoped
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::OutputScope;

pub const DATASHEETS_DIR: &str = "ingest/datasheets";
pub const CODE_REFERENCE_DIR: &str = "ingest/C-code-reference";
pub const OUTPUT_DIR: &str = "output";
pub const SUMMARY_FILE: &str = "summary.json";
pub const UNCLASSIFIED_FILE: &str = "unclassified.json";
pub const DATASET_FILE: &str = "generated_driver_code.json";

/// Resolved directories and artifact paths for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub base_dir: PathBuf,
    pub datasheets_dir: PathBuf,
    pub code_reference_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Directory receiving this run's summary and dataset.
    artifact_dirs: ArtifactDirs,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ArtifactDirs {
    summary: PathBuf,
    dataset: PathBuf,
}

impl Layout {
    /// `run_id` only matters for [`OutputScope::PerRun`].
    pub fn new(base_dir: impl Into<PathBuf>, scope: &OutputScope, run_id: &str) -> Self {
        let base_dir = base_dir.into();
        let datasheets_dir = base_dir.join(DATASHEETS_DIR);
        let code_reference_dir = base_dir.join(CODE_REFERENCE_DIR);
        let output_dir = base_dir.join(OUTPUT_DIR);
        let artifact_dirs = match scope {
            OutputScope::Shared => ArtifactDirs {
                summary: datasheets_dir.clone(),
                dataset: output_dir.clone(),
            },
            OutputScope::PerRun => {
                let run_dir = output_dir.join("runs").join(run_id);
                ArtifactDirs {
                    summary: run_dir.clone(),
                    dataset: run_dir,
                }
            }
        };
        Self {
            base_dir,
            datasheets_dir,
            code_reference_dir,
            output_dir,
            artifact_dirs,
        }
    }

    /// Create every directory of the layout that does not exist yet.
    pub fn ensure(&self) -> io::Result<()> {
        for dir in [
            &self.datasheets_dir,
            &self.code_reference_dir,
            &self.output_dir,
            &self.artifact_dirs.summary,
            &self.artifact_dirs.dataset,
        ] {
            fs::create_dir_all(dir)?;
        }
        debug!(base_dir = %self.base_dir.display(), "Ensured working directory layout");
        Ok(())
    }

    pub fn summary_path(&self) -> PathBuf {
        self.artifact_dirs.summary.join(SUMMARY_FILE)
    }

    pub fn unclassified_path(&self) -> PathBuf {
        self.artifact_dirs.summary.join(UNCLASSIFIED_FILE)
    }

    pub fn dataset_path(&self) -> PathBuf {
        self.artifact_dirs.dataset.join(DATASET_FILE)
    }

    pub fn find_datasheet(&self) -> io::Result<Option<PathBuf>> {
        find_file(&self.datasheets_dir, ".pdf")
    }

    pub fn find_reference_source(&self) -> io::Result<Option<PathBuf>> {
        find_file(&self.code_reference_dir, ".c")
    }

    /// Resolve a configured path against the base directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// First file under `dir` whose name ends with `extension`.
///
/// A directory's own files are checked before its subdirectories; entries are visited in
/// name order so the choice is stable when several files match. A missing `dir` yields
/// `Ok(None)`.
pub fn find_file(dir: &Path, extension: &str) -> io::Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort();

    let mut subdirs = Vec::new();
    for path in entries {
        if path.is_dir() {
            subdirs.push(path);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(extension))
        {
            debug!(path = %path.display(), extension, "Found input file");
            return Ok(Some(path));
        }
    }
    for subdir in subdirs {
        if let Some(found) = find_file(&subdir, extension)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Write `contents` to `path` through a temp file in the same directory, so readers
/// never observe a partially written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    info!(path = %path.display(), bytes = contents.len(), "Wrote artifact");
    Ok(())
}
