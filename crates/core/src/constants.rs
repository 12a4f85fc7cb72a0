//! Constants used throughout the reasoning core.
//!
//! Scoring constants are kept together so the thresholds that decide which guidelines
//! ground a case can be audited in one place.

/// A guideline is only ranked when its match score is strictly greater than this.
pub const MATCH_SCORE_THRESHOLD: f64 = 0.5;

/// Number of supporting-evidence items that saturates flat-mode confidence.
pub const EVIDENCE_SATURATION: f64 = 5.0;

/// Bonus added to flat-mode confidence when a step cites a guideline.
pub const GUIDELINE_BONUS: f64 = 0.2;

/// Floor confidence for an observation-mode step with no guideline references.
pub const OBSERVATION_BASE_CONFIDENCE: f64 = 0.5;

/// Confidence added per guideline reference in observation mode.
pub const OBSERVATION_REFERENCE_WEIGHT: f64 = 0.1;

/// Fixed confidences for the flat-mode reasoning trail.
pub const INITIAL_ASSESSMENT_CONFIDENCE: f64 = 0.9;
pub const HISTORY_ANALYSIS_CONFIDENCE: f64 = 0.85;
pub const PHYSICAL_EXAM_CONFIDENCE: f64 = 0.8;
pub const INVESTIGATIONS_CONFIDENCE: f64 = 0.85;

/// Marker that identifies an observation node inside a knowledge graph key.
pub const KG_INPUT_MARKER: &str = "$Input";

/// Separator between a knowledge graph key's text and its node tag.
pub const KG_TAG_SEPARATOR: char = '$';

/// Rationale used when an observation sits directly under the graph root.
pub const DEFAULT_RATIONALE: &str = "Based on clinical presentation";

/// Diagnosis used when an observation sits directly under the graph root.
pub const UNKNOWN_DIAGNOSIS: &str = "Unknown";

/// Sample values equal to this are treated as absent note sections.
pub const EMPTY_SAMPLE_SECTION: &str = "None\n";

/// Prefix of the note-section keys in a benchmark sample.
pub const SAMPLE_INPUT_PREFIX: &str = "input";

/// Suffix appended to a sample stem or condition name to find its knowledge graph.
pub const KG_FILE_SUFFIX: &str = "_kg.json";

/// Number of leading clinical-note characters used as a sample's case identifier.
pub const SAMPLE_ID_CHARS: usize = 30;

/// File extensions understood by the corpus loader and the case store.
pub const JSON_EXTENSIONS: &[&str] = &["json"];
pub const YAML_EXTENSIONS: &[&str] = &["yaml", "yml"];
