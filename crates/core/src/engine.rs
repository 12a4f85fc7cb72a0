//! Reasoning engines.
//!
//! A reasoning engine turns a case into diagnostic steps, resolves the guideline references a
//! step should carry and evaluates its confidence. There are two engines, one per case shape,
//! each with its own reference and confidence rules:
//!
//! | Engine | References | Confidence |
//! |--------|------------|------------|
//! | [`VignetteEngine`] | criteria of the cited guideline | `min(1, evidence/5)`, +0.2 if a guideline is cited |
//! | [`ObservationEngine`] | corpus entries mentioning the diagnosis | `min(1, 0.5 + 0.1 * references)` |
//!
//! Engines share the corpus through an `Arc` and never mutate it.

use crate::case::{Case, ClinicalVignette, ObservationCase};
use crate::constants::{
    EVIDENCE_SATURATION, GUIDELINE_BONUS, OBSERVATION_BASE_CONFIDENCE,
    OBSERVATION_REFERENCE_WEIGHT,
};
use crate::corpus::GuidelineCorpus;
use crate::knowledge_graph::{extract_observation_links, ObservationLink};
use crate::matcher::rank_guidelines;
use crate::steps::{observation_steps, vignette_steps, DiagnosticStep};
use std::sync::Arc;

/// Capability contract shared by every reasoning engine.
pub trait ReasoningEngine {
    /// The case shape this engine reasons over.
    type Case;

    /// Produce the ordered reasoning trail for a case.
    fn process_case(&self, case: &Self::Case) -> Vec<DiagnosticStep>;

    /// Reference strings a step should carry.
    fn guideline_references(&self, step: &DiagnosticStep) -> Vec<String>;

    /// Confidence of a step given its current evidence and references, in `[0, 1]`.
    fn evaluate_confidence(&self, step: &DiagnosticStep) -> f64;
}

/// Flat-mode confidence: evidence saturates at five items, citing a guideline adds a bonus.
pub fn flat_confidence(evidence_count: usize, cites_guideline: bool) -> f64 {
    let base = (evidence_count as f64 / EVIDENCE_SATURATION).min(1.0);
    if cites_guideline {
        (base + GUIDELINE_BONUS).min(1.0)
    } else {
        base
    }
}

/// Observation-mode confidence: a floor plus a fixed weight per reference.
pub fn observation_confidence(reference_count: usize) -> f64 {
    (OBSERVATION_BASE_CONFIDENCE + OBSERVATION_REFERENCE_WEIGHT * reference_count as f64).min(1.0)
}

/// Engine for structured vignettes.
#[derive(Clone, Debug)]
pub struct VignetteEngine {
    corpus: Arc<GuidelineCorpus>,
}

impl VignetteEngine {
    pub fn new(corpus: Arc<GuidelineCorpus>) -> Self {
        Self { corpus }
    }
}

impl ReasoningEngine for VignetteEngine {
    type Case = ClinicalVignette;

    fn process_case(&self, vignette: &ClinicalVignette) -> Vec<DiagnosticStep> {
        let ranked = rank_guidelines(vignette, &self.corpus);
        match ranked.first() {
            Some(top) => tracing::debug!(
                "case {}: top guideline {} ({:.3}) of {} ranked",
                vignette.patient_id,
                top.guideline.id,
                top.match_score,
                ranked.len()
            ),
            None => tracing::debug!("case {}: no guideline above threshold", vignette.patient_id),
        }
        vignette_steps(vignette, ranked.first().copied())
    }

    fn guideline_references(&self, step: &DiagnosticStep) -> Vec<String> {
        step.guideline_reference
            .as_deref()
            .and_then(|id| self.corpus.find_guideline(id))
            .map(|guideline| guideline.criteria.clone())
            .unwrap_or_default()
    }

    fn evaluate_confidence(&self, step: &DiagnosticStep) -> f64 {
        flat_confidence(
            step.supporting_evidence.len(),
            step.guideline_reference.is_some(),
        )
    }
}

/// Engine for observation/diagnosis cases.
#[derive(Clone, Debug)]
pub struct ObservationEngine {
    corpus: Arc<GuidelineCorpus>,
}

impl ObservationEngine {
    pub fn new(corpus: Arc<GuidelineCorpus>) -> Self {
        Self { corpus }
    }

    /// Links from the case's own knowledge graph first, then from every corpus graph.
    fn links_for(&self, case: &ObservationCase) -> Vec<ObservationLink> {
        case.knowledge_graph
            .iter()
            .chain(self.corpus.knowledge_graphs())
            .flat_map(extract_observation_links)
            .collect()
    }
}

impl ReasoningEngine for ObservationEngine {
    type Case = ObservationCase;

    fn process_case(&self, case: &ObservationCase) -> Vec<DiagnosticStep> {
        if case.observations.len() != case.diagnoses.len() {
            tracing::debug!(
                "case {}: {} observations and {} diagnoses, pairing the first {}",
                case.patient_id,
                case.observations.len(),
                case.diagnoses.len(),
                case.observations.len().min(case.diagnoses.len())
            );
        }

        let links = self.links_for(case);
        let mut steps = observation_steps(case, &links);

        // references first: confidence depends on how many there are
        for step in &mut steps {
            step.guideline_references = self.guideline_references(step);
            step.confidence_score = self.evaluate_confidence(step);
        }
        steps
    }

    fn guideline_references(&self, step: &DiagnosticStep) -> Vec<String> {
        let Some(diagnosis) = step.diagnosis.as_deref().map(str::trim) else {
            return Vec::new();
        };
        if diagnosis.is_empty() {
            return Vec::new();
        }
        self.corpus
            .entries_mentioning(diagnosis)
            .map(|entry| entry.name().to_string())
            .collect()
    }

    fn evaluate_confidence(&self, step: &DiagnosticStep) -> f64 {
        observation_confidence(step.guideline_references.len())
    }
}

/// Run the engine matching the case's shape.
pub fn reason_over(corpus: &Arc<GuidelineCorpus>, case: &Case) -> Vec<DiagnosticStep> {
    match case {
        Case::Vignette(vignette) => VignetteEngine::new(corpus.clone()).process_case(vignette),
        Case::Observations(case) => ObservationEngine::new(corpus.clone()).process_case(case),
    }
}
