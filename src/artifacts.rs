//! This module contains the on-disk artifact sink for an exploration run:
//! the corpus of executed seeds, the seeds that crashed the target, and the
//! coverage script.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    constant::COVERAGE_SCRIPT_NAME,
    error::artifacts::{Error, Result},
};

/// The name of the directory holding the seeds of successful traces.
const CORPUS_DIR: &str = "corpus";

/// The name of the directory holding the seeds of crashed traces.
const CRASHES_DIR: &str = "crashes";

/// The name of the directory holding the coverage script.
const COVERAGE_DIR: &str = "coverage";

/// The workspace directory an exploration run writes its artifacts into.
///
/// The workspace is assumed to be owned exclusively by one explorer for the
/// duration of a run. Seeds are written as raw dense bytes, one file per
/// trace, named by the trace number.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Opens the workspace rooted at `root`, creating the `corpus/`,
    /// `crashes/` and `coverage/` directories if they do not yet exist.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if any of the directories cannot be created.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in [CORPUS_DIR, CRASHES_DIR, COVERAGE_DIR] {
            let path = root.join(dir);
            fs::create_dir_all(&path).map_err(|source| Error::CreateDirectory {
                path,
                source: Arc::new(source),
            })?;
        }

        Ok(Self { root })
    }

    /// Gets the root directory of the workspace.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    /// Writes the raw bytes of the seed that drove trace number `index`
    /// into the corpus.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the file cannot be written.
    pub fn write_corpus_seed(&self, index: usize, bytes: &[u8]) -> Result<PathBuf> {
        self.write_seed(CORPUS_DIR, index, bytes)
    }

    /// Writes the raw bytes of a seed whose trace terminated on an invalid
    /// fetch or decode into the crashes directory.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the file cannot be written.
    pub fn write_crash_seed(&self, index: usize, bytes: &[u8]) -> Result<PathBuf> {
        self.write_seed(CRASHES_DIR, index, bytes)
    }

    /// Writes the rendered coverage script under `coverage/`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] if the file cannot be written.
    pub fn write_coverage_script(&self, script: &str) -> Result<PathBuf> {
        let path = self.root.join(COVERAGE_DIR).join(COVERAGE_SCRIPT_NAME);
        fs::write(&path, script).map_err(|source| Error::WriteFile {
            path: path.clone(),
            source: Arc::new(source),
        })?;

        Ok(path)
    }

    fn write_seed(&self, dir: &str, index: usize, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.root.join(dir).join(index.to_string());
        fs::write(&path, bytes).map_err(|source| Error::WriteFile {
            path: path.clone(),
            source: Arc::new(source),
        })?;

        Ok(path)
    }
}
