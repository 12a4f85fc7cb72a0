//! # TMD Core
//!
//! Guideline-grounded diagnostic reasoning for the TMD clinical reasoning toolkit.
//!
//! This crate contains the pure reasoning pipeline and its file handling:
//! - Guideline corpus loading from JSON and YAML files
//! - Lexical guideline matching and ranking for clinical vignettes
//! - Step-by-step diagnostic trails for vignettes and observation cases
//! - Knowledge graph observation extraction and benchmark sample loading
//!
//! **No evaluation concerns**: embedding, similarity metrics and scoring belong in
//! `tmd-evaluation`.

pub mod case;
pub mod config;
pub mod constants;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod guideline;
pub mod knowledge_graph;
pub mod matcher;
pub mod samples;
pub mod service;
pub mod steps;
pub mod store;
pub mod validation;

pub use case::{Case, ClinicalVignette, Findings, ObservationCase};
pub use config::CoreConfig;
pub use corpus::{load_corpus, CorpusEntry, CorpusLoad, CorpusPayload, GuidelineCorpus};
pub use engine::{ObservationEngine, ReasoningEngine, VignetteEngine};
pub use error::{ReasoningError, ReasoningResult};
pub use guideline::Guideline;
pub use knowledge_graph::{extract_observation_links, ObservationLink};
pub use matcher::{rank_guidelines, MatchResult};
pub use samples::{evaluate_predictions, Sample, SampleEvaluation, SampleLoader};
pub use service::ReasoningService;
pub use steps::{reasoning_text, reasoning_texts, DiagnosticStep};
pub use store::CaseStore;
