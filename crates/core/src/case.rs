//! Clinical case records.
//!
//! A case arrives in one of two shapes and is modelled as a tagged union so that each shape
//! is reasoned over by its own step generator:
//! - [`ClinicalVignette`]: structured presentation with chief complaint, history and findings.
//! - [`ObservationCase`]: a clinical note with parallel observation and diagnosis lists, usually
//!   carrying the knowledge graph the observations were extracted from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tmd_types::NonEmptyText;

/// Named findings (examination, laboratory, imaging) in the order they were recorded.
///
/// Values are usually strings, but numeric laboratory results are accepted as written.
pub type Findings = Map<String, Value>;

/// Renders each finding as a `"name: value"` line.
pub fn finding_lines(findings: &Findings) -> Vec<String> {
    findings
        .iter()
        .map(|(name, value)| match value {
            Value::String(text) => format!("{name}: {text}"),
            other => format!("{name}: {other}"),
        })
        .collect()
}

/// A structured clinical presentation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClinicalVignette {
    pub patient_id: NonEmptyText,
    pub age: u32,
    pub gender: String,
    pub chief_complaint: String,
    pub history_of_present_illness: String,
    #[serde(default)]
    pub physical_examination: Findings,
    #[serde(default)]
    pub laboratory_findings: Findings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imaging_findings: Option<Findings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
}

impl ClinicalVignette {
    /// Demographic summary block.
    pub fn patient_info(&self) -> String {
        format!(
            "Patient ID: {}\nAge: {}\nGender: {}",
            self.patient_id, self.age, self.gender
        )
    }

    /// Presenting complaint and history, used as the default completeness reference.
    pub fn clinical_info(&self) -> String {
        format!(
            "Chief Complaint: {}\nHistory of Present Illness: {}",
            self.chief_complaint, self.history_of_present_illness
        )
    }

    /// The whole record serialised to a single string.
    ///
    /// Risk factors are searched for anywhere in this text, including field names. Substring
    /// collisions make this a noisy signal; it is kept for scoring compatibility only.
    pub fn full_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A clinical note reduced to observation/diagnosis pairs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObservationCase {
    pub patient_id: NonEmptyText,
    #[serde(default)]
    pub clinical_info: String,
    pub observations: Vec<String>,
    pub diagnoses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_graph: Option<Value>,
}

impl ObservationCase {
    /// Observation/diagnosis pairs in list order.
    ///
    /// Pairing stops at the shorter of the two lists. Use
    /// [`crate::validation::validate_observation_pairs`] first when unequal lengths must be
    /// rejected.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.observations
            .iter()
            .zip(self.diagnoses.iter())
            .map(|(obs, dx)| (obs.as_str(), dx.as_str()))
    }
}

/// A case in either of its two supported shapes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Case {
    Observations(ObservationCase),
    Vignette(ClinicalVignette),
}

impl Case {
    pub fn id(&self) -> &NonEmptyText {
        match self {
            Case::Observations(case) => &case.patient_id,
            Case::Vignette(vignette) => &vignette.patient_id,
        }
    }

    /// Text a completeness check compares generated reasoning against.
    pub fn reference_text(&self) -> String {
        match self {
            Case::Observations(case) => case.clinical_info.clone(),
            Case::Vignette(vignette) => vignette.clinical_info(),
        }
    }

    /// Decode a case from an already parsed document.
    ///
    /// Documents carrying `observations` or `diagnoses` are observation cases; everything else
    /// is decoded as a vignette. The specific shape is decoded directly so that schema errors
    /// report the path of the offending field.
    pub(crate) fn from_value(value: Value) -> Result<Self, String> {
        let is_observation_case = value
            .as_object()
            .is_some_and(|obj| obj.contains_key("observations") || obj.contains_key("diagnoses"));

        if is_observation_case {
            decode::<ObservationCase>(value).map(Case::Observations)
        } else {
            decode::<ClinicalVignette>(value).map(Case::Vignette)
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, String> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(|err| {
        let path = err.path().to_string();
        let path = if path.is_empty() || path == "." {
            "<root>".to_string()
        } else {
            path
        };
        format!("at {path}: {}", err.into_inner())
    })
}

impl From<ClinicalVignette> for Case {
    fn from(vignette: ClinicalVignette) -> Self {
        Case::Vignette(vignette)
    }
}

impl From<ObservationCase> for Case {
    fn from(case: ObservationCase) -> Self {
        Case::Observations(case)
    }
}
