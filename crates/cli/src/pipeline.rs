//! Evaluation of one reasoning trail.

use tmd_core::{reasoning_text, reasoning_texts, Case, DiagnosticStep, GuidelineCorpus};
use tmd_evaluation::{
    Embedder, EvaluationError, EvaluationMetrics, EvaluationReport, EvaluationResult,
    MetricBundle, MetricCategory,
};

/// Metrics for one trail, with the categories that could not be scored.
#[derive(Debug)]
pub struct CaseEvaluation {
    pub report: EvaluationReport,
    pub omitted: Vec<MetricCategory>,
}

/// Score a trail on every category that has reference material.
///
/// Guideline adherence is measured against the corpus and completeness against the case's own
/// clinical text. A category with no reference material is left out of the report and listed
/// in [`CaseEvaluation::omitted`].
pub fn evaluate_case<E: Embedder>(
    metrics: &EvaluationMetrics<E>,
    corpus: &GuidelineCorpus,
    case: &Case,
    steps: &[DiagnosticStep],
) -> EvaluationResult<CaseEvaluation> {
    let reasoning = reasoning_text(steps);
    let mut evaluation = CaseEvaluation {
        report: EvaluationReport::new(),
        omitted: Vec::new(),
    };

    let guidelines = corpus.reference_texts();
    evaluation.record(
        MetricCategory::GuidelineAdherence,
        metrics.guideline_adherence(&reasoning, &guidelines),
    )?;
    evaluation.record(
        MetricCategory::ReasoningStructure,
        metrics.reasoning_structure(&reasoning_texts(steps)),
    )?;
    evaluation.record(
        MetricCategory::Completeness,
        metrics.completeness(&reasoning, &case.reference_text()),
    )?;

    Ok(evaluation)
}

impl CaseEvaluation {
    fn record(
        &mut self,
        category: MetricCategory,
        result: EvaluationResult<MetricBundle>,
    ) -> EvaluationResult<()> {
        match skip_if_unreferenced(category, result)? {
            Some(bundle) => self.report.insert(category, bundle),
            None => self.omitted.push(category),
        }
        Ok(())
    }
}

fn skip_if_unreferenced(
    category: MetricCategory,
    result: EvaluationResult<MetricBundle>,
) -> EvaluationResult<Option<MetricBundle>> {
    match result {
        Ok(bundle) => Ok(Some(bundle)),
        Err(EvaluationError::EmptyReferences(what)) => {
            tracing::warn!("skipping {category}: {what} has no reference text");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
