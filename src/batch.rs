//! Batch reasoning over benchmark samples.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tmd_core::{
    evaluate_predictions, Case, DiagnosticStep, ReasoningResult, ReasoningService,
    SampleEvaluation, SampleLoader,
};

pub const RESULTS_FILE: &str = "direct_evaluation_results.json";

/// What happened to one sample.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SampleOutcome {
    Evaluated {
        predictions: Vec<DiagnosticStep>,
        evaluation: SampleEvaluation,
    },
    Failed {
        error: String,
    },
}

/// Outcomes keyed by sample identifier.
#[derive(Debug, Default, Serialize)]
#[serde(transparent)]
pub struct BatchResults(BTreeMap<String, SampleOutcome>);

impl BatchResults {
    pub fn total(&self) -> usize {
        self.0.len()
    }

    pub fn successful(&self) -> usize {
        self.0
            .values()
            .filter(|o| matches!(o, SampleOutcome::Evaluated { .. }))
            .count()
    }

    pub fn get(&self, sample_id: &str) -> Option<&SampleOutcome> {
        self.0.get(sample_id)
    }

    /// Write all outcomes as pretty JSON to `<output_dir>/direct_evaluation_results.json`.
    pub fn write(&self, output_dir: &Path) -> anyhow::Result<PathBuf> {
        use anyhow::Context;

        fs::create_dir_all(output_dir)
            .with_context(|| format!("creating output directory {}", output_dir.display()))?;
        let path = output_dir.join(RESULTS_FILE);
        let json = serde_json::to_string_pretty(self).context("serialising batch results")?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}

fn process_sample(
    loader: &SampleLoader,
    service: &ReasoningService,
    sample_id: &str,
) -> ReasoningResult<SampleOutcome> {
    let sample = loader.load_sample(sample_id)?;
    let case = Case::Observations(sample.to_case()?);
    let predictions = service.reason(&case);
    let evaluation = evaluate_predictions(&predictions, &sample);
    Ok(SampleOutcome::Evaluated {
        predictions,
        evaluation,
    })
}

/// Reason over every sample the loader finds. A failing sample is recorded and the batch
/// continues.
pub fn run_batch(loader: &SampleLoader, service: &ReasoningService) -> ReasoningResult<BatchResults> {
    let mut results = BatchResults::default();

    for sample_id in loader.sample_ids()? {
        tracing::info!("processing sample {sample_id}");
        let outcome = process_sample(loader, service, &sample_id).unwrap_or_else(|e| {
            tracing::warn!("sample {sample_id} failed: {e}");
            SampleOutcome::Failed {
                error: e.to_string(),
            }
        });
        results.0.insert(sample_id, outcome);
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use tmd_core::GuidelineCorpus;

    #[test]
    fn failures_are_recorded_and_the_batch_continues() {
        let temp = TempDir::new().unwrap();
        let samples = temp.path().join("samples");
        fs::create_dir_all(&samples).unwrap();
        fs::write(
            samples.join("good.json"),
            json!({
                "input1": "Cough and fever for three days.",
                "Pneumonia$Intermedia_1": {"productive cough$Input1": {}}
            })
            .to_string(),
        )
        .unwrap();
        fs::write(samples.join("bad.json"), "{ truncated").unwrap();

        let loader = SampleLoader::new(&samples, None);
        let service = ReasoningService::new(GuidelineCorpus::new());
        let results = run_batch(&loader, &service).unwrap();

        assert_eq!(results.total(), 2);
        assert_eq!(results.successful(), 1);
        match results.get("good.json") {
            Some(SampleOutcome::Evaluated {
                predictions,
                evaluation,
            }) => {
                assert_eq!(predictions.len(), 1);
                assert_eq!(evaluation.observation_matches, vec![true]);
            }
            other => panic!("expected an evaluated sample, got {other:?}"),
        }
        assert!(matches!(
            results.get("bad.json"),
            Some(SampleOutcome::Failed { .. })
        ));

        let path = results.write(&temp.path().join("out")).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert!(written["bad.json"]["error"].is_string());
        assert_eq!(
            written["good.json"]["predictions"][0]["diagnosis"],
            "Pneumonia"
        );
    }

    #[test]
    fn missing_samples_directory_is_fatal() {
        let temp = TempDir::new().unwrap();
        let loader = SampleLoader::new(temp.path().join("absent"), None);
        let service = ReasoningService::new(GuidelineCorpus::new());
        assert!(run_batch(&loader, &service).is_err());
    }
}
