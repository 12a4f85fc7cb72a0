//! Evaluation configuration.
//!
//! The configuration file may hold the evaluation settings at its top level or under an
//! `evaluation` key, next to settings for other components. JSON and YAML are both accepted.

use crate::embedding::HashingEmbedder;
use crate::metrics::{EvaluationMetrics, DEFAULT_COVERAGE_THRESHOLD};
use crate::score::ScoreWeights;
use crate::{EvaluationError, EvaluationResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_DIMENSIONS: usize = 384;

const EVALUATION_SECTION: &str = "evaluation";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Sentence-embedding model the embedder stands for.
    pub model_name: String,
    pub dimensions: usize,
    pub coverage_threshold: f64,
    pub weights: ScoreWeights,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL_NAME.to_string(),
            dimensions: DEFAULT_DIMENSIONS,
            coverage_threshold: DEFAULT_COVERAGE_THRESHOLD,
            weights: ScoreWeights::default(),
        }
    }
}

impl EvaluationConfig {
    /// Load the configuration from `path`, or the defaults when no file is given or the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `EvaluationError::ConfigRead` if the file exists but cannot be read,
    /// - `EvaluationError::ConfigParse` if it is not valid JSON/YAML or fails validation.
    pub fn load(path: Option<&Path>) -> EvaluationResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !path.exists() {
            tracing::warn!(
                "evaluation config {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| EvaluationError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&contents).map_err(|reason| EvaluationError::ConfigParse {
            path: path.to_path_buf(),
            reason,
        })?;

        if (config.weights.sum() - 1.0).abs() > 1e-9 {
            tracing::warn!(
                "score weights in {} sum to {:.3}, not 1",
                path.display(),
                config.weights.sum()
            );
        }
        Ok(config)
    }

    fn parse(contents: &str) -> Result<Self, String> {
        let document: serde_yaml::Value =
            serde_yaml::from_str(contents).map_err(|e| e.to_string())?;
        let section = match document.get(EVALUATION_SECTION) {
            Some(section) => section.clone(),
            None => document,
        };
        let config: Self = if section.is_null() {
            Self::default()
        } else {
            serde_yaml::from_value(section).map_err(|e| e.to_string())?
        };
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `EvaluationError::InvalidInput` for zero dimensions, a threshold outside
    /// `[0, 1]`, or a negative or non-finite weight.
    pub fn validate(&self) -> EvaluationResult<()> {
        if self.dimensions == 0 {
            return Err(EvaluationError::InvalidInput(
                "dimensions must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.coverage_threshold) {
            return Err(EvaluationError::InvalidInput(format!(
                "coverage_threshold {} is outside [0, 1]",
                self.coverage_threshold
            )));
        }
        let w = &self.weights;
        for weight in [w.guideline_adherence, w.reasoning_structure, w.completeness] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(EvaluationError::InvalidInput(format!(
                    "weight {weight} must be a non-negative number"
                )));
            }
        }
        Ok(())
    }

    /// Metrics backed by the offline hashing embedder.
    pub fn hashing_metrics(&self) -> EvaluationResult<EvaluationMetrics<HashingEmbedder>> {
        let embedder = HashingEmbedder::new(self.dimensions)?.named(&self.model_name);
        EvaluationMetrics::new(embedder).with_coverage_threshold(self.coverage_threshold)
    }
}
