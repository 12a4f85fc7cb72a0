//! # TMD Evaluation
//!
//! Embedding-based quality metrics for generated clinical reasoning:
//! - guideline adherence against guideline texts
//! - structural coherence across reasoning steps
//! - completeness against a gold-standard text
//!
//! Metrics go through the [`Embedder`] trait. [`HashingEmbedder`] is a deterministic lexical
//! stand-in for offline runs and tests.

pub mod config;
pub mod embedding;
pub mod error;
pub mod metrics;
pub mod score;
pub mod similarity;

pub use config::EvaluationConfig;
pub use embedding::{Embedder, HashingEmbedder};
pub use error::{EvaluationError, EvaluationResult};
pub use metrics::{EvaluationMetrics, EvaluationReport, MetricBundle, MetricCategory};
pub use score::{overall_score, ScoreWeights};
pub use similarity::cosine_similarity;
