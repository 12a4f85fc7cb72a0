//! Weighted aggregation of metric bundles into one score.

use crate::metrics::{EvaluationReport, MetricCategory};
use serde::{Deserialize, Serialize};

/// Per-category weights.
///
/// Weights are used as given. A set that does not sum to 1 skews the overall score; callers
/// can check [`ScoreWeights::sum`] and warn.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub guideline_adherence: f64,
    pub reasoning_structure: f64,
    pub completeness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            guideline_adherence: 0.4,
            reasoning_structure: 0.3,
            completeness: 0.3,
        }
    }
}

impl ScoreWeights {
    pub fn weight(&self, category: MetricCategory) -> f64 {
        match category {
            MetricCategory::GuidelineAdherence => self.guideline_adherence,
            MetricCategory::ReasoningStructure => self.reasoning_structure,
            MetricCategory::Completeness => self.completeness,
        }
    }

    pub fn sum(&self) -> f64 {
        MetricCategory::ALL.iter().map(|c| self.weight(*c)).sum()
    }
}

/// Sum over categories of the category's mean metric value times its weight.
///
/// Categories absent from the report, and empty bundles, contribute nothing.
pub fn overall_score(report: &EvaluationReport, weights: &ScoreWeights) -> f64 {
    report
        .iter()
        .filter_map(|(category, bundle)| Some(bundle.mean()? * weights.weight(category)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricBundle;

    fn report(adherence: f64, structure: f64, completeness: f64) -> EvaluationReport {
        let mut report = EvaluationReport::new();
        report.insert(
            MetricCategory::GuidelineAdherence,
            MetricBundle::new()
                .with("max_guideline_similarity", adherence + 0.1)
                .with("mean_guideline_similarity", adherence - 0.1)
                .with("guideline_coverage", adherence),
        );
        report.insert(
            MetricCategory::ReasoningStructure,
            MetricBundle::new()
                .with("step_coherence", structure)
                .with("reasoning_flow", structure),
        );
        report.insert(
            MetricCategory::Completeness,
            MetricBundle::new()
                .with("concept_coverage", completeness)
                .with("detail_level", completeness),
        );
        report
    }

    #[test]
    fn default_weights_combine_category_means() {
        let score = overall_score(&report(0.8, 0.6, 0.4), &ScoreWeights::default());
        assert!((score - 0.62).abs() < 1e-12);
    }

    #[test]
    fn default_weights_sum_to_one() {
        assert!((ScoreWeights::default().sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn weights_are_not_renormalised() {
        let doubled = ScoreWeights {
            guideline_adherence: 0.8,
            reasoning_structure: 0.6,
            completeness: 0.6,
        };
        let score = overall_score(&report(0.8, 0.6, 0.4), &doubled);
        assert!((score - 1.24).abs() < 1e-12);
    }

    #[test]
    fn missing_and_empty_categories_contribute_nothing() {
        let mut partial = EvaluationReport::new();
        partial.insert(MetricCategory::GuidelineAdherence, MetricBundle::new());
        partial.insert(
            MetricCategory::Completeness,
            MetricBundle::new().with("detail_level", 0.5),
        );
        let score = overall_score(&partial, &ScoreWeights::default());
        assert!((score - 0.15).abs() < 1e-12);
        assert_eq!(overall_score(&EvaluationReport::new(), &ScoreWeights::default()), 0.0);
    }

    #[test]
    fn partial_weights_fill_from_defaults() {
        let weights: ScoreWeights = serde_json::from_str(r#"{"completeness": 0.5}"#).unwrap();
        assert_eq!(weights.guideline_adherence, 0.4);
        assert_eq!(weights.completeness, 0.5);
    }
}
