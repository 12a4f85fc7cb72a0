//! Core runtime configuration.
//!
//! Configuration is resolved once at process start-up and passed into core services. Services
//! never read environment variables themselves.

use crate::{ReasoningError, ReasoningResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at start-up.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    guideline_path: Option<PathBuf>,
    case_dir: PathBuf,
    output_dir: PathBuf,
    samples_dir: Option<PathBuf>,
    kg_dir: Option<PathBuf>,
}

fn require_path(path: PathBuf, name: &str) -> ReasoningResult<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(ReasoningError::InvalidInput(format!("{name} cannot be empty")));
    }
    Ok(path)
}

impl CoreConfig {
    /// Create a new `CoreConfig` with no guideline corpus.
    pub fn new(case_dir: PathBuf, output_dir: PathBuf) -> ReasoningResult<Self> {
        Ok(Self {
            guideline_path: None,
            case_dir: require_path(case_dir, "case_dir")?,
            output_dir: require_path(output_dir, "output_dir")?,
            samples_dir: None,
            kg_dir: None,
        })
    }

    /// Attach a guideline corpus: a single guideline file or a directory of them.
    pub fn with_guidelines(mut self, guideline_path: PathBuf) -> ReasoningResult<Self> {
        self.guideline_path = Some(require_path(guideline_path, "guideline_path")?);
        Ok(self)
    }

    /// Attach a benchmark samples directory and, optionally, its knowledge graph directory.
    pub fn with_samples(
        mut self,
        samples_dir: PathBuf,
        kg_dir: Option<PathBuf>,
    ) -> ReasoningResult<Self> {
        self.samples_dir = Some(require_path(samples_dir, "samples_dir")?);
        self.kg_dir = kg_dir
            .map(|dir| require_path(dir, "kg_dir"))
            .transpose()?;
        Ok(self)
    }

    /// Guideline corpus path; reasoning runs over an empty corpus when unset.
    pub fn guideline_path(&self) -> Option<&Path> {
        self.guideline_path.as_deref()
    }

    pub fn case_dir(&self) -> &Path {
        &self.case_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn samples_dir(&self) -> Option<&Path> {
        self.samples_dir.as_deref()
    }

    pub fn kg_dir(&self) -> Option<&Path> {
        self.kg_dir.as_deref()
    }
}
