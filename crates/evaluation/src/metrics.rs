//! Embedding-based reasoning quality metrics.
//!
//! Each metric returns a [`MetricBundle`] of named values for one [`MetricCategory`]:
//!
//! | Category | Metrics |
//! |----------|---------|
//! | guideline adherence | `max_guideline_similarity`, `mean_guideline_similarity`, `guideline_coverage` |
//! | reasoning structure | `step_coherence`, `reasoning_flow` |
//! | completeness | `concept_coverage`, `detail_level` |

use crate::embedding::Embedder;
use crate::similarity::{cosine_similarity, fraction_above, mean};
use crate::{EvaluationError, EvaluationResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Similarity above which a reference counts as covered.
pub const DEFAULT_COVERAGE_THRESHOLD: f64 = 0.5;

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?'];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    GuidelineAdherence,
    ReasoningStructure,
    Completeness,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 3] = [
        MetricCategory::GuidelineAdherence,
        MetricCategory::ReasoningStructure,
        MetricCategory::Completeness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::GuidelineAdherence => "guideline_adherence",
            MetricCategory::ReasoningStructure => "reasoning_structure",
            MetricCategory::Completeness => "completeness",
        }
    }
}

impl std::fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named metric values for one category.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricBundle(BTreeMap<String, f64>);

impl MetricBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mean of the bundle's values, or `None` when it holds none.
    pub fn mean(&self) -> Option<f64> {
        if self.0.is_empty() {
            return None;
        }
        Some(self.0.values().sum::<f64>() / self.0.len() as f64)
    }
}

/// Metric bundles keyed by category.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EvaluationReport(BTreeMap<MetricCategory, MetricBundle>);

impl EvaluationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: MetricCategory, bundle: MetricBundle) {
        self.0.insert(category, bundle);
    }

    pub fn get(&self, category: MetricCategory) -> Option<&MetricBundle> {
        self.0.get(&category)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricCategory, &MetricBundle)> {
        self.0.iter().map(|(category, bundle)| (*category, bundle))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Sentences of `text`, split on `.`, `!` and `?`, trimmed, empty fragments dropped.
///
/// Unlike a bare split on `.`, the empty fragment after a final full stop is not scored, so it
/// cannot pull `detail_level` down.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(SENTENCE_TERMINATORS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Reasoning quality metrics over one embedder.
#[derive(Clone, Debug)]
pub struct EvaluationMetrics<E> {
    embedder: E,
    coverage_threshold: f64,
}

impl<E: Embedder> EvaluationMetrics<E> {
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            coverage_threshold: DEFAULT_COVERAGE_THRESHOLD,
        }
    }

    /// Replace the coverage threshold.
    ///
    /// # Errors
    ///
    /// Returns `EvaluationError::InvalidInput` if `threshold` is outside `[0, 1]`.
    pub fn with_coverage_threshold(mut self, threshold: f64) -> EvaluationResult<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(EvaluationError::InvalidInput(format!(
                "coverage threshold {threshold} is outside [0, 1]"
            )));
        }
        self.coverage_threshold = threshold;
        Ok(self)
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn coverage_threshold(&self) -> f64 {
        self.coverage_threshold
    }

    fn embed_batch(&self, texts: &[&str]) -> EvaluationResult<Vec<Vec<f32>>> {
        let vectors = self.embedder.embed(texts)?;
        if vectors.len() != texts.len() {
            return Err(EvaluationError::EmbeddingCountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }
        tracing::debug!("embedded {} texts with {}", texts.len(), self.embedder.name());
        Ok(vectors)
    }

    /// Similarities of `target` against every reference, embedded in one batch.
    fn similarities_to(&self, target: &str, references: &[&str]) -> EvaluationResult<Vec<f64>> {
        let mut batch = Vec::with_capacity(references.len() + 1);
        batch.push(target);
        batch.extend_from_slice(references);

        let vectors = self.embed_batch(&batch)?;
        let (target, references) = vectors
            .split_first()
            .ok_or(EvaluationError::EmbeddingCountMismatch {
                expected: batch.len(),
                actual: 0,
            })?;
        references
            .iter()
            .map(|reference| cosine_similarity(target, reference))
            .collect()
    }

    /// Cosine similarity of the embeddings of two texts.
    pub fn semantic_similarity(&self, a: &str, b: &str) -> EvaluationResult<f64> {
        let similarities = self.similarities_to(a, &[b])?;
        Ok(similarities.first().copied().unwrap_or_default())
    }

    /// How closely reasoning follows the given guideline texts.
    ///
    /// # Errors
    ///
    /// Returns `EvaluationError::EmptyReferences` when `guidelines` is empty.
    pub fn guideline_adherence<S: AsRef<str>>(
        &self,
        reasoning: &str,
        guidelines: &[S],
    ) -> EvaluationResult<MetricBundle> {
        if guidelines.is_empty() {
            return Err(EvaluationError::EmptyReferences("guideline adherence"));
        }
        let references: Vec<&str> = guidelines.iter().map(AsRef::as_ref).collect();
        let similarities = self.similarities_to(reasoning, &references)?;

        let max = similarities
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        Ok(MetricBundle::new()
            .with("max_guideline_similarity", max)
            .with("mean_guideline_similarity", mean(&similarities))
            .with(
                "guideline_coverage",
                fraction_above(&similarities, self.coverage_threshold),
            ))
    }

    /// Coherence between consecutive steps and between the first and last step.
    ///
    /// Fewer than two steps score zero on both metrics without calling the embedder.
    pub fn reasoning_structure<S: AsRef<str>>(&self, steps: &[S]) -> EvaluationResult<MetricBundle> {
        if steps.len() < 2 {
            return Ok(MetricBundle::new()
                .with("step_coherence", 0.0)
                .with("reasoning_flow", 0.0));
        }
        let texts: Vec<&str> = steps.iter().map(AsRef::as_ref).collect();
        let vectors = self.embed_batch(&texts)?;

        let consecutive = vectors
            .windows(2)
            .map(|pair| cosine_similarity(&pair[0], &pair[1]))
            .collect::<EvaluationResult<Vec<_>>>()?;
        let flow = match (vectors.first(), vectors.last()) {
            (Some(first), Some(last)) => cosine_similarity(first, last)?,
            _ => 0.0,
        };

        Ok(MetricBundle::new()
            .with("step_coherence", mean(&consecutive))
            .with("reasoning_flow", flow))
    }

    /// How much of a gold-standard text the reasoning covers, sentence by sentence.
    ///
    /// # Errors
    ///
    /// Returns `EvaluationError::EmptyReferences` when the gold standard has no sentences.
    pub fn completeness(&self, reasoning: &str, gold_standard: &str) -> EvaluationResult<MetricBundle> {
        let sentences = split_sentences(gold_standard);
        if sentences.is_empty() {
            return Err(EvaluationError::EmptyReferences("completeness"));
        }
        let similarities = self.similarities_to(reasoning, &sentences)?;

        Ok(MetricBundle::new()
            .with(
                "concept_coverage",
                fraction_above(&similarities, self.coverage_threshold),
            )
            .with("detail_level", mean(&similarities)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use std::cell::Cell;

    fn metrics() -> EvaluationMetrics<HashingEmbedder> {
        EvaluationMetrics::new(HashingEmbedder::new(256).unwrap())
    }

    /// Counts embed calls and returns canned vectors.
    struct Scripted {
        vectors: Vec<Vec<f32>>,
        calls: Cell<usize>,
    }

    impl Embedder for Scripted {
        fn embed(&self, texts: &[&str]) -> EvaluationResult<Vec<Vec<f32>>> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.vectors.iter().take(texts.len()).cloned().collect())
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn scripted(vectors: Vec<Vec<f32>>) -> EvaluationMetrics<Scripted> {
        EvaluationMetrics::new(Scripted {
            vectors,
            calls: Cell::new(0),
        })
    }

    #[test]
    fn self_similarity_is_one() {
        for text in ["acute chest pain", "   ", "?!"] {
            let sim = metrics().semantic_similarity(text, text).unwrap();
            assert!((sim - 1.0).abs() < 1e-6, "{text:?} scored {sim}");
        }
    }

    #[test]
    fn adherence_reports_max_mean_and_coverage_in_one_batch() {
        // reasoning, then three guidelines at cos 1, 0 and 0.6
        let m = scripted(vec![
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.6, 0.8],
        ]);
        let bundle = m
            .guideline_adherence("reasoning", &["g1", "g2", "g3"])
            .unwrap();

        assert!((bundle.get("max_guideline_similarity").unwrap() - 1.0).abs() < 1e-6);
        assert!((bundle.get("mean_guideline_similarity").unwrap() - 1.6 / 3.0).abs() < 1e-6);
        assert!((bundle.get("guideline_coverage").unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(m.embedder().calls.get(), 1);
    }

    #[test]
    fn adherence_without_guidelines_fails() {
        let err = metrics()
            .guideline_adherence::<&str>("reasoning", &[])
            .expect_err("empty references");
        assert!(matches!(err, EvaluationError::EmptyReferences(_)));
    }

    #[test]
    fn short_trails_have_zero_structure() {
        let m = scripted(Vec::new());
        for steps in [Vec::<&str>::new(), vec!["only step"]] {
            let bundle = m.reasoning_structure(&steps).unwrap();
            assert_eq!(bundle.get("step_coherence"), Some(0.0));
            assert_eq!(bundle.get("reasoning_flow"), Some(0.0));
        }
        assert_eq!(m.embedder().calls.get(), 0);
    }

    #[test]
    fn structure_uses_consecutive_pairs_and_endpoints() {
        let m = scripted(vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]);
        let bundle = m.reasoning_structure(&["a", "b", "c"]).unwrap();
        assert!((bundle.get("step_coherence").unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(bundle.get("reasoning_flow"), Some(0.0));
    }

    #[test]
    fn completeness_scores_each_gold_sentence() {
        let m = scripted(vec![vec![1.0, 0.0], vec![1.0, 0.0], vec![0.0, 1.0]]);
        let bundle = m
            .completeness("reasoning", "Chest pain for two hours. Smoker!")
            .unwrap();
        assert_eq!(bundle.get("concept_coverage"), Some(0.5));
        assert!((bundle.get("detail_level").unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn completeness_needs_a_gold_sentence() {
        assert!(matches!(
            metrics().completeness("reasoning", " ... "),
            Err(EvaluationError::EmptyReferences(_))
        ));
    }

    #[test]
    fn short_embedding_batches_are_rejected() {
        let m = scripted(vec![vec![1.0, 0.0]]);
        assert!(matches!(
            m.semantic_similarity("a", "b"),
            Err(EvaluationError::EmbeddingCountMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn sentences_split_on_terminators() {
        assert_eq!(
            split_sentences("Fever. Cough!  Dyspnoea? "),
            vec!["Fever", "Cough", "Dyspnoea"]
        );
    }

    #[test]
    fn threshold_must_be_a_fraction() {
        assert!(metrics().with_coverage_threshold(1.5).is_err());
        assert_eq!(
            metrics().with_coverage_threshold(0.7).unwrap().coverage_threshold(),
            0.7
        );
    }

    #[test]
    fn report_serialises_by_category() {
        let mut report = EvaluationReport::new();
        report.insert(
            MetricCategory::ReasoningStructure,
            MetricBundle::new().with("step_coherence", 0.5),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["reasoning_structure"]["step_coherence"], 0.5);
    }
}
