//! Reasoning service.

use crate::case::{Case, ClinicalVignette};
use crate::config::CoreConfig;
use crate::corpus::{load_corpus, GuidelineCorpus, SkippedEntry};
use crate::engine::reason_over;
use crate::matcher::{rank_guidelines, MatchResult};
use crate::steps::DiagnosticStep;
use crate::ReasoningResult;
use std::sync::Arc;

/// Reasoning over one guideline corpus, loaded once and shared read-only.
///
/// Cloning is cheap; clones share the corpus.
#[derive(Clone, Debug)]
pub struct ReasoningService {
    corpus: Arc<GuidelineCorpus>,
    skipped: Arc<[SkippedEntry]>,
}

impl ReasoningService {
    pub fn new(corpus: GuidelineCorpus) -> Self {
        Self {
            corpus: Arc::new(corpus),
            skipped: Arc::from(Vec::new()),
        }
    }

    /// Load the corpus named by the configuration, or start from an empty corpus when none is
    /// configured.
    ///
    /// # Errors
    ///
    /// Fails if the corpus path is missing or, for a single file, malformed. Malformed files
    /// inside a corpus directory are skipped and available from [`ReasoningService::skipped`].
    pub fn load(cfg: &CoreConfig) -> ReasoningResult<Self> {
        let Some(path) = cfg.guideline_path() else {
            return Ok(Self::new(GuidelineCorpus::new()));
        };
        let load = load_corpus(path)?;
        Ok(Self {
            corpus: Arc::new(load.corpus),
            skipped: Arc::from(load.skipped),
        })
    }

    pub fn corpus(&self) -> &Arc<GuidelineCorpus> {
        &self.corpus
    }

    /// Corpus files left out while loading.
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    /// Produce the reasoning trail for a case.
    pub fn reason(&self, case: &Case) -> Vec<DiagnosticStep> {
        reason_over(&self.corpus, case)
    }

    /// Guidelines ranked against a vignette, best first.
    pub fn rank(&self, vignette: &ClinicalVignette) -> Vec<MatchResult<'_>> {
        rank_guidelines(vignette, &self.corpus)
    }
}
