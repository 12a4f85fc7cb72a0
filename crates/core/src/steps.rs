//! Diagnostic steps and the two step generators.
//!
//! Steps are numbered from 1 with no gaps, in the order they are emitted. The generators only
//! build the trail; confidence and reference back-filling for observation cases is done by
//! [`crate::engine::ObservationEngine`].

use crate::case::{finding_lines, ClinicalVignette, ObservationCase};
use crate::constants::{
    HISTORY_ANALYSIS_CONFIDENCE, INITIAL_ASSESSMENT_CONFIDENCE, INVESTIGATIONS_CONFIDENCE,
    KG_TAG_SEPARATOR, PHYSICAL_EXAM_CONFIDENCE,
};
use crate::knowledge_graph::{find_link, ObservationLink};
use crate::matcher::MatchResult;
use serde::{Deserialize, Serialize};

/// One auditable unit of a reasoning trail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticStep {
    pub step_number: usize,
    pub reasoning: String,
    pub supporting_evidence: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guideline_reference: Option<String>,
    #[serde(default)]
    pub guideline_references: Vec<String>,
    pub confidence_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
}

impl DiagnosticStep {
    fn new(reasoning: String, supporting_evidence: Vec<String>, confidence_score: f64) -> Self {
        Self {
            step_number: 0,
            reasoning,
            supporting_evidence,
            guideline_reference: None,
            guideline_references: Vec::new(),
            confidence_score,
            observation: None,
            diagnosis: None,
        }
    }
}

/// Appends steps and assigns sequential numbers.
#[derive(Default)]
struct Trail(Vec<DiagnosticStep>);

impl Trail {
    fn push(&mut self, mut step: DiagnosticStep) {
        step.step_number = self.0.len() + 1;
        self.0.push(step);
    }

    fn finish(self) -> Vec<DiagnosticStep> {
        self.0
    }
}

/// Build the fixed reasoning trail for a structured vignette.
///
/// Four steps are always emitted: initial assessment, history analysis, physical examination
/// and investigations. A fifth, guideline-based step follows when `top_match` is present.
pub fn vignette_steps(
    vignette: &ClinicalVignette,
    top_match: Option<MatchResult<'_>>,
) -> Vec<DiagnosticStep> {
    let mut trail = Trail::default();

    trail.push(DiagnosticStep::new(
        format!(
            "Initial assessment based on chief complaint: {}",
            vignette.chief_complaint
        ),
        vec![vignette.chief_complaint.clone()],
        INITIAL_ASSESSMENT_CONFIDENCE,
    ));

    trail.push(DiagnosticStep::new(
        format!(
            "Analysis of history of present illness: {}",
            vignette.history_of_present_illness
        ),
        vec![vignette.history_of_present_illness.clone()],
        HISTORY_ANALYSIS_CONFIDENCE,
    ));

    trail.push(DiagnosticStep::new(
        "Evaluation of physical examination findings".to_string(),
        finding_lines(&vignette.physical_examination),
        PHYSICAL_EXAM_CONFIDENCE,
    ));

    let mut investigations = finding_lines(&vignette.laboratory_findings);
    if let Some(imaging) = &vignette.imaging_findings {
        investigations.extend(finding_lines(imaging));
    }
    trail.push(DiagnosticStep::new(
        "Review of laboratory and imaging findings".to_string(),
        investigations,
        INVESTIGATIONS_CONFIDENCE,
    ));

    if let Some(top) = top_match {
        let mut step = DiagnosticStep::new(
            format!(
                "Assessment against guideline \"{}\" based on matched criteria and risk factors",
                top.guideline.title
            ),
            top.guideline.criteria.clone(),
            top.match_score,
        );
        step.guideline_reference = Some(top.guideline.id.to_string());
        trail.push(step);
    }

    trail.finish()
}

/// Build one step per observation/diagnosis pair, in list order.
///
/// The reasoning names the observation and the diagnosis verbatim and, when a knowledge graph
/// link exists for the observation, the rationale node that connects them. Confidence is left
/// at zero for the engine to evaluate once references are known.
pub fn observation_steps(case: &ObservationCase, links: &[ObservationLink]) -> Vec<DiagnosticStep> {
    let mut trail = Trail::default();

    for (observation, diagnosis) in case.pairs() {
        let mut reasoning =
            format!("Observation \"{observation}\" supports the diagnosis of {diagnosis}.");
        let mut evidence = vec![observation.to_string()];

        if let Some(link) = find_link(links, observation, diagnosis) {
            let rationale = link.rationale.split(KG_TAG_SEPARATOR).next().unwrap_or(&link.rationale);
            reasoning.push_str(&format!(" Knowledge graph rationale: {rationale}."));
            evidence.push(link.rationale.clone());
        }

        let mut step = DiagnosticStep::new(reasoning, evidence, 0.0);
        step.observation = Some(observation.to_string());
        step.diagnosis = Some(diagnosis.to_string());
        trail.push(step);
    }

    trail.finish()
}

/// All step reasoning joined into one text, one step per line.
pub fn reasoning_text(steps: &[DiagnosticStep]) -> String {
    steps
        .iter()
        .map(|s| s.reasoning.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Step reasoning as separate texts, in step order.
pub fn reasoning_texts(steps: &[DiagnosticStep]) -> Vec<String> {
    steps.iter().map(|s| s.reasoning.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::fixtures::{chest_pain_vignette, findings};
    use crate::guideline::Guideline;
    use serde_json::json;
    use tmd_types::NonEmptyText;

    fn numbers(steps: &[DiagnosticStep]) -> Vec<usize> {
        steps.iter().map(|s| s.step_number).collect()
    }

    #[test]
    fn vignette_without_match_has_four_steps() {
        let steps = vignette_steps(&chest_pain_vignette(), None);
        assert_eq!(numbers(&steps), vec![1, 2, 3, 4]);
        let confidences: Vec<_> = steps.iter().map(|s| s.confidence_score).collect();
        assert_eq!(confidences, vec![0.9, 0.85, 0.8, 0.85]);
        assert!(steps.iter().all(|s| s.guideline_reference.is_none()));
    }

    #[test]
    fn vignette_with_match_adds_guideline_step() {
        let guideline = Guideline {
            id: NonEmptyText::new("G1").unwrap(),
            title: "Acute coronary syndrome".into(),
            criteria: vec!["chest pain".into(), "shortness of breath".into()],
            risk_factors: vec!["smoking".into()],
        };
        let top = MatchResult {
            guideline: &guideline,
            match_score: 0.75,
        };
        let steps = vignette_steps(&chest_pain_vignette(), Some(top));
        assert_eq!(numbers(&steps), vec![1, 2, 3, 4, 5]);

        let last = &steps[4];
        assert!(last.reasoning.contains("Acute coronary syndrome"));
        assert_eq!(last.supporting_evidence, guideline.criteria);
        assert_eq!(last.guideline_reference.as_deref(), Some("G1"));
        assert_eq!(last.confidence_score, 0.75);
    }

    #[test]
    fn examination_and_investigation_evidence() {
        let steps = vignette_steps(&chest_pain_vignette(), None);
        assert_eq!(
            steps[2].supporting_evidence,
            vec!["heart rate: 104", "blood pressure: 150/90"]
        );
        assert_eq!(
            steps[3].supporting_evidence,
            vec!["troponin: elevated", "ecg: ST elevation in V2-V4"]
        );
    }

    #[test]
    fn absent_imaging_is_omitted() {
        let mut vignette = chest_pain_vignette();
        vignette.imaging_findings = None;
        vignette.laboratory_findings = findings(json!({"lactate": 3.1}));
        let steps = vignette_steps(&vignette, None);
        assert_eq!(steps[3].supporting_evidence, vec!["lactate: 3.1"]);
    }

    #[test]
    fn observation_steps_reference_both_texts() {
        let case = ObservationCase {
            patient_id: NonEmptyText::new("note").unwrap(),
            clinical_info: String::new(),
            observations: vec!["productive cough".into(), "confusion".into()],
            diagnoses: vec!["Pneumonia".into(), "Sepsis".into()],
            knowledge_graph: None,
        };
        let links = vec![ObservationLink {
            observation: "productive cough".into(),
            rationale: "Suspected Pneumonia$Intermedia_2".into(),
            diagnosis: "Pneumonia".into(),
        }];
        let steps = observation_steps(&case, &links);

        assert_eq!(numbers(&steps), vec![1, 2]);
        for (step, (obs, dx)) in steps.iter().zip(case.pairs()) {
            assert!(step.reasoning.contains(obs));
            assert!(step.reasoning.contains(dx));
            assert_eq!(step.observation.as_deref(), Some(obs));
            assert_eq!(step.diagnosis.as_deref(), Some(dx));
        }
        assert!(steps[0].reasoning.contains("rationale: Suspected Pneumonia."));
        assert_eq!(steps[1].supporting_evidence, vec!["confusion"]);
    }

    #[test]
    fn reasoning_joins_one_line_per_step() {
        let steps = vignette_steps(&chest_pain_vignette(), None);
        let text = reasoning_text(&steps);
        assert_eq!(text.lines().count(), 4);
        assert_eq!(reasoning_texts(&steps).len(), 4);
    }
}
