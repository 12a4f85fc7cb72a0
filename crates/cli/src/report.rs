//! Result artifact for one reasoned case.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tmd_core::DiagnosticStep;
use tmd_evaluation::{overall_score, EvaluationReport, MetricCategory, ScoreWeights};
use tmd_types::NonEmptyText;
use uuid::Uuid;

use crate::pipeline::CaseEvaluation;

/// Everything produced for one case: the trail, its metrics and the weighted score.
#[derive(Debug, Serialize)]
pub struct CaseReport {
    pub run_id: Uuid,
    pub case_id: NonEmptyText,
    pub generated_at: DateTime<Utc>,
    pub diagnostic_steps: Vec<DiagnosticStep>,
    pub evaluation: EvaluationReport,
    /// Categories left unscored for lack of reference material.
    pub omitted_categories: Vec<MetricCategory>,
    pub overall_score: f64,
}

impl CaseReport {
    pub fn new(
        case_id: NonEmptyText,
        diagnostic_steps: Vec<DiagnosticStep>,
        evaluation: CaseEvaluation,
        weights: &ScoreWeights,
    ) -> Self {
        let overall_score = overall_score(&evaluation.report, weights);
        Self {
            run_id: Uuid::new_v4(),
            case_id,
            generated_at: Utc::now(),
            diagnostic_steps,
            evaluation: evaluation.report,
            omitted_categories: evaluation.omitted,
            overall_score,
        }
    }

    /// `<case id>_results.json`, with characters unsafe in file names replaced by `_`.
    pub fn file_name(&self) -> String {
        let stem: String = self
            .case_id
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{stem}_results.json")
    }

    /// Write the report as pretty JSON into `output_dir`, creating it if needed.
    pub fn write(&self, output_dir: &Path) -> anyhow::Result<PathBuf> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("creating output directory {}", output_dir.display()))?;
        let path = output_dir.join(self.file_name());
        let json = serde_json::to_string_pretty(self).context("serialising case report")?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tmd_evaluation::MetricBundle;

    fn report(case_id: &str) -> CaseReport {
        let mut evaluation = CaseEvaluation {
            report: EvaluationReport::new(),
            omitted: vec![MetricCategory::GuidelineAdherence],
        };
        evaluation.report.insert(
            MetricCategory::Completeness,
            MetricBundle::new().with("detail_level", 0.5),
        );
        CaseReport::new(
            NonEmptyText::new(case_id).unwrap(),
            Vec::new(),
            evaluation,
            &ScoreWeights::default(),
        )
    }

    #[test]
    fn overall_score_uses_the_weights() {
        assert!((report("case-001").overall_score - 0.15).abs() < 1e-12);
    }

    #[test]
    fn file_names_are_sanitised() {
        assert_eq!(report("case-001").file_name(), "case-001_results.json");
        assert_eq!(
            report("Chief complaint: cough/fever").file_name(),
            "Chief_complaint__cough_fever_results.json"
        );
    }

    #[test]
    fn write_creates_the_output_directory() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("nested").join("out");
        let report = report("case-001");

        let path = report.write(&out).unwrap();
        assert_eq!(path, out.join("case-001_results.json"));

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["case_id"], "case-001");
        assert_eq!(written["evaluation"]["completeness"]["detail_level"], 0.5);
        assert_eq!(written["run_id"], report.run_id.to_string());
        assert_eq!(
            written["omitted_categories"],
            serde_json::json!(["guideline_adherence"])
        );
        assert!(written["evaluation"].get("guideline_adherence").is_none());
    }
}
