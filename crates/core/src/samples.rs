//! Benchmark sample integration.
//!
//! A sample directory holds one file per annotated clinical note. JSON samples carry the note
//! in `input1`, `input2`, … sections alongside the annotated knowledge graph; plain text
//! samples carry only the note. Knowledge graphs for a sample may also live in a separate
//! directory as `<sample stem>_kg.json` or `<condition>_kg.json`.

use crate::case::ObservationCase;
use crate::constants::{
    DEFAULT_RATIONALE, EMPTY_SAMPLE_SECTION, KG_FILE_SUFFIX, SAMPLE_ID_CHARS, SAMPLE_INPUT_PREFIX,
};
use crate::config::CoreConfig;
use crate::knowledge_graph::{extract_observation_links, ObservationLink};
use crate::steps::DiagnosticStep;
use crate::validation::validate_case_file_name;
use crate::{ReasoningError, ReasoningResult};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tmd_types::NonEmptyText;

const SAMPLE_EXTENSIONS: &[&str] = &["json", "txt"];
const PLACEHOLDER_OBSERVATION: &str = "Extracted from clinical note";
const PLACEHOLDER_DIAGNOSIS: &str = "To be determined";

/// One loaded benchmark sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub sample_id: String,
    pub clinical_note: String,
    pub observations: Vec<ObservationLink>,
    pub knowledge_graph: Option<Value>,
}

impl Sample {
    /// Convert the sample into an observation case.
    ///
    /// The case identifier is the first characters of the clinical note, falling back to the
    /// sample identifier when the note is blank.
    pub fn to_case(&self) -> ReasoningResult<ObservationCase> {
        let prefix: String = self.clinical_note.chars().take(SAMPLE_ID_CHARS).collect();
        let patient_id = NonEmptyText::new(&prefix)
            .or_else(|_| NonEmptyText::new(&self.sample_id))
            .map_err(|e| ReasoningError::InvalidInput(format!("sample has no identifier: {e}")))?;

        Ok(ObservationCase {
            patient_id,
            clinical_info: self.clinical_note.clone(),
            observations: self
                .observations
                .iter()
                .map(|link| link.observation.clone())
                .collect(),
            diagnoses: self
                .observations
                .iter()
                .map(|link| link.diagnosis.clone())
                .collect(),
            knowledge_graph: self.knowledge_graph.clone(),
        })
    }
}

/// Reads samples and their knowledge graphs from disk.
#[derive(Clone, Debug)]
pub struct SampleLoader {
    samples_dir: PathBuf,
    kg_dir: Option<PathBuf>,
}

impl SampleLoader {
    pub fn new(samples_dir: impl Into<PathBuf>, kg_dir: Option<PathBuf>) -> Self {
        Self {
            samples_dir: samples_dir.into(),
            kg_dir,
        }
    }

    /// Build a loader from the samples directories in `cfg`.
    ///
    /// # Errors
    ///
    /// Returns `ReasoningError::InvalidInput` if no samples directory is configured.
    pub fn from_config(cfg: &CoreConfig) -> ReasoningResult<Self> {
        let samples_dir = cfg.samples_dir().ok_or_else(|| {
            ReasoningError::InvalidInput("no samples directory configured".into())
        })?;
        Ok(Self::new(samples_dir, cfg.kg_dir().map(Path::to_path_buf)))
    }

    pub fn samples_dir(&self) -> &Path {
        &self.samples_dir
    }

    /// File names of every sample in the samples directory, sorted.
    ///
    /// Knowledge graph files that share the directory are not samples.
    pub fn sample_ids(&self) -> ReasoningResult<Vec<String>> {
        let entries = fs::read_dir(&self.samples_dir).map_err(|source| ReasoningError::FileRead {
            path: self.samples_dir.clone(),
            source,
        })?;

        let mut ids: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && has_extension(p, SAMPLE_EXTENSIONS))
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .filter(|name| !name.ends_with(KG_FILE_SUFFIX))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Load one sample by file name.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `ReasoningError::CaseNotFound` if the sample file does not exist,
    /// - `ReasoningError::UnsupportedFormat` if it is neither `.json` nor `.txt`,
    /// - `ReasoningError::CaseSchema` if a JSON sample or its knowledge graph is not valid JSON,
    /// - `ReasoningError::FileRead` if a file cannot be read.
    pub fn load_sample(&self, sample_id: &str) -> ReasoningResult<Sample> {
        validate_case_file_name(sample_id)?;
        let path = self.samples_dir.join(sample_id);
        if !path.is_file() {
            return Err(ReasoningError::CaseNotFound {
                id: sample_id.to_string(),
                path,
            });
        }

        let (clinical_note, observations) = if has_extension(&path, &["json"]) {
            let document = read_json(&path)?;
            let note = document
                .as_object()
                .map(clinical_note)
                .unwrap_or_default();
            (note, extract_observation_links(&document))
        } else if has_extension(&path, &["txt"]) {
            let note = read_text(&path)?;
            let placeholder = ObservationLink {
                observation: PLACEHOLDER_OBSERVATION.to_string(),
                rationale: DEFAULT_RATIONALE.to_string(),
                diagnosis: PLACEHOLDER_DIAGNOSIS.to_string(),
            };
            (note, vec![placeholder])
        } else {
            return Err(ReasoningError::UnsupportedFormat { path });
        };

        let knowledge_graph = match self.knowledge_graph_path(&path) {
            Some(kg_path) => Some(read_json(&kg_path)?),
            None => None,
        };

        tracing::debug!(
            "loaded sample {} with {} observations",
            sample_id,
            observations.len()
        );

        Ok(Sample {
            sample_id: sample_id.to_string(),
            clinical_note,
            observations,
            knowledge_graph,
        })
    }

    /// `<kg_dir>/<stem>_kg.json`, else `<kg_dir>/<parent dir>_kg.json`, if either exists.
    fn knowledge_graph_path(&self, sample_path: &Path) -> Option<PathBuf> {
        let kg_dir = self.kg_dir.as_ref()?;
        let candidate = |name: Option<&str>| {
            name.map(|n| kg_dir.join(format!("{n}{KG_FILE_SUFFIX}")))
                .filter(|p| p.is_file())
        };

        candidate(sample_path.file_stem().and_then(|s| s.to_str())).or_else(|| {
            candidate(
                sample_path
                    .parent()
                    .and_then(Path::file_name)
                    .and_then(|s| s.to_str()),
            )
        })
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.contains(&e))
}

fn read_text(path: &Path) -> ReasoningResult<String> {
    fs::read_to_string(path).map_err(|source| ReasoningError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json(path: &Path) -> ReasoningResult<Value> {
    let contents = read_text(path)?;
    serde_json::from_str(&contents).map_err(|e| ReasoningError::CaseSchema {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Note sections ordered by their numeric suffix; non-numeric suffixes sort last.
fn clinical_note(sample: &Map<String, Value>) -> String {
    let mut sections: Vec<(Option<u64>, &str)> = sample
        .iter()
        .filter_map(|(key, value)| {
            let suffix = key.strip_prefix(SAMPLE_INPUT_PREFIX)?;
            let text = value.as_str()?;
            Some((suffix.parse::<u64>().ok(), text))
        })
        .filter(|(_, text)| *text != EMPTY_SAMPLE_SECTION)
        .collect();

    sections.sort_by_key(|(order, _)| order.map_or((1, 0), |n| (0, n)));
    sections
        .into_iter()
        .map(|(_, text)| text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Exact-match comparison of predicted steps against a sample's annotations.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SampleEvaluation {
    pub observation_matches: Vec<bool>,
    pub diagnosis_matches: Vec<bool>,
    pub observation_match_rate: f64,
    pub diagnosis_match_rate: f64,
}

fn match_rate(matches: &[bool]) -> f64 {
    if matches.is_empty() {
        return 0.0;
    }
    matches.iter().filter(|m| **m).count() as f64 / matches.len() as f64
}

/// For each step, whether its observation and its diagnosis equal any annotated value.
///
/// Steps without an observation or diagnosis count as misses.
pub fn evaluate_predictions(steps: &[DiagnosticStep], sample: &Sample) -> SampleEvaluation {
    let observation_matches: Vec<bool> = steps
        .iter()
        .map(|s| {
            is_annotated(
                s.observation.as_deref(),
                sample.observations.iter().map(|l| l.observation.as_str()),
            )
        })
        .collect();
    let diagnosis_matches: Vec<bool> = steps
        .iter()
        .map(|s| {
            is_annotated(
                s.diagnosis.as_deref(),
                sample.observations.iter().map(|l| l.diagnosis.as_str()),
            )
        })
        .collect();

    SampleEvaluation {
        observation_match_rate: match_rate(&observation_matches),
        diagnosis_match_rate: match_rate(&diagnosis_matches),
        observation_matches,
        diagnosis_matches,
    }
}

fn is_annotated<'a>(predicted: Option<&str>, mut truth: impl Iterator<Item = &'a str>) -> bool {
    predicted.is_some_and(|p| truth.any(|t| t == p))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ObservationEngine, ReasoningEngine};
    use crate::corpus::GuidelineCorpus;
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn pneumonia_sample() -> Value {
        json!({
            "input2": "Exam: crackles at right base.",
            "input1": "Chief complaint: productive cough and fever.",
            "input3": "None\n",
            "inputX": "Addendum.",
            "Pneumonia$Intermedia_1": {
                "Suspected Pneumonia$Intermedia_2": {
                    "productive cough$Input1": {},
                    "crackles at right base$Input2": {}
                }
            }
        })
    }

    fn write_sample(dir: &Path, name: &str, value: &Value) {
        fs::write(dir.join(name), serde_json::to_string(value).unwrap()).unwrap();
    }

    #[test]
    fn json_note_is_assembled_in_section_order() {
        let temp = TempDir::new().unwrap();
        write_sample(temp.path(), "p1.json", &pneumonia_sample());

        let sample = SampleLoader::new(temp.path(), None)
            .load_sample("p1.json")
            .expect("load");
        assert_eq!(
            sample.clinical_note,
            "Chief complaint: productive cough and fever.\nExam: crackles at right base.\nAddendum."
        );
        assert_eq!(sample.observations.len(), 2);
        assert_eq!(sample.observations[0].diagnosis, "Pneumonia");
        assert!(sample.knowledge_graph.is_none());
    }

    #[test]
    fn text_samples_use_a_placeholder_observation() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("note.txt"), "Free text note").unwrap();

        let sample = SampleLoader::new(temp.path(), None)
            .load_sample("note.txt")
            .unwrap();
        assert_eq!(sample.clinical_note, "Free text note");
        assert_eq!(sample.observations.len(), 1);
        assert_eq!(sample.observations[0].diagnosis, PLACEHOLDER_DIAGNOSIS);
    }

    #[test]
    fn missing_and_unsupported_samples_fail() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("scan.csv"), "a,b").unwrap();
        let loader = SampleLoader::new(temp.path(), None);

        assert!(matches!(
            loader.load_sample("absent.json"),
            Err(ReasoningError::CaseNotFound { .. })
        ));
        assert!(matches!(
            loader.load_sample("scan.csv"),
            Err(ReasoningError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn knowledge_graph_falls_back_to_condition_name() {
        let temp = TempDir::new().unwrap();
        let samples = temp.path().join("Pneumonia");
        let kg = temp.path().join("kg");
        fs::create_dir_all(&samples).unwrap();
        fs::create_dir_all(&kg).unwrap();
        write_sample(&samples, "p1.json", &pneumonia_sample());
        write_sample(&samples, "p2.json", &pneumonia_sample());
        write_sample(&kg, "p1_kg.json", &json!({"specific": true}));
        write_sample(&kg, "Pneumonia_kg.json", &json!({"condition": true}));

        let loader = SampleLoader::new(&samples, Some(kg));
        let first = loader.load_sample("p1.json").unwrap();
        let second = loader.load_sample("p2.json").unwrap();
        assert_eq!(first.knowledge_graph, Some(json!({"specific": true})));
        assert_eq!(second.knowledge_graph, Some(json!({"condition": true})));
    }

    #[test]
    fn sample_ids_are_sorted_file_names() {
        let temp = TempDir::new().unwrap();
        write_sample(temp.path(), "b.json", &json!({}));
        write_sample(temp.path(), "a.json", &json!({}));
        write_sample(temp.path(), "a_kg.json", &json!({}));
        fs::write(temp.path().join("c.txt"), "note").unwrap();
        fs::write(temp.path().join("readme.md"), "ignored").unwrap();

        let ids = SampleLoader::new(temp.path(), None).sample_ids().unwrap();
        assert_eq!(ids, vec!["a.json", "b.json", "c.txt"]);
    }

    #[test]
    fn to_case_uses_note_prefix_as_identifier() {
        let temp = TempDir::new().unwrap();
        write_sample(temp.path(), "p1.json", &pneumonia_sample());
        let sample = SampleLoader::new(temp.path(), None)
            .load_sample("p1.json")
            .unwrap();

        let case = sample.to_case().unwrap();
        assert_eq!(case.patient_id, "Chief complaint: productive co");
        assert_eq!(case.observations, vec!["productive cough", "crackles at right base"]);
        assert_eq!(case.diagnoses, vec!["Pneumonia", "Pneumonia"]);

        let blank = Sample {
            sample_id: "blank.txt".into(),
            clinical_note: "   ".into(),
            observations: Vec::new(),
            knowledge_graph: None,
        };
        assert_eq!(blank.to_case().unwrap().patient_id, "blank.txt");
    }

    #[test]
    fn predictions_are_scored_against_annotations() {
        let temp = TempDir::new().unwrap();
        write_sample(temp.path(), "p1.json", &pneumonia_sample());
        let sample = SampleLoader::new(temp.path(), None)
            .load_sample("p1.json")
            .unwrap();

        let engine = ObservationEngine::new(Arc::new(GuidelineCorpus::new()));
        let mut steps = engine.process_case(&sample.to_case().unwrap());
        steps[1].diagnosis = Some("Bronchitis".into());

        let evaluation = evaluate_predictions(&steps, &sample);
        assert_eq!(evaluation.observation_matches, vec![true, true]);
        assert_eq!(evaluation.diagnosis_matches, vec![true, false]);
        assert_eq!(evaluation.diagnosis_match_rate, 0.5);
        assert_eq!(evaluate_predictions(&[], &sample).observation_match_rate, 0.0);
    }
}
