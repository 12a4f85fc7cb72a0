//! Guideline corpus and its file-system loader.
//!
//! A corpus maps entry names to payloads. Two payload shapes coexist:
//! - flat guideline records (one file may hold one guideline or a list of them),
//! - nested knowledge graphs whose leaves encode observation → diagnosis links.
//!
//! The corpus is built once and then only read. Entry order is load order, which is the
//! tie-break order for every ranking that walks the corpus.
//!
//! ## Loading
//!
//! [`load_corpus`] accepts either a single file or a directory of files:
//!
//! ```text
//! guidelines/
//! ├── acs.json          # [{ "id": "G1", "title": ..., "criteria": [...], "risk_factors": [...] }]
//! ├── sepsis.yaml       # { "id": "G2", ... }
//! └── pneumonia_kg.json # { "Pneumonia$Intermedia_1": { ... } }
//! ```
//!
//! A missing path is fatal. Inside a directory, a file that cannot be read or parsed is skipped
//! and reported back as a [`SkippedEntry`]; the remaining files still load.

use crate::constants::{JSON_EXTENSIONS, YAML_EXTENSIONS};
use crate::guideline::Guideline;
use crate::{ReasoningError, ReasoningResult};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Raw content of one corpus entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CorpusPayload {
    Guidelines(Vec<Guideline>),
    KnowledgeGraph(Value),
}

/// A named corpus entry.
#[derive(Clone, Debug, PartialEq)]
pub struct CorpusEntry {
    name: String,
    payload: CorpusPayload,
    search_text: String,
}

impl CorpusEntry {
    pub fn new(name: impl Into<String>, payload: CorpusPayload) -> Self {
        let search_text = serde_json::to_string(&payload)
            .unwrap_or_default()
            .to_lowercase();
        Self {
            name: name.into(),
            payload,
            search_text,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Guideline records held by this entry, empty for knowledge graphs.
    pub fn guidelines(&self) -> &[Guideline] {
        match &self.payload {
            CorpusPayload::Guidelines(guidelines) => guidelines,
            CorpusPayload::KnowledgeGraph(_) => &[],
        }
    }

}

/// Immutable collection of guideline payloads, in load order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GuidelineCorpus {
    entries: Vec<CorpusEntry>,
}

impl GuidelineCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a corpus from entries. A later entry replaces an earlier one with the same name
    /// but keeps the earlier position.
    pub fn from_entries(entries: impl IntoIterator<Item = CorpusEntry>) -> Self {
        let mut corpus = Self::new();
        for entry in entries {
            corpus.insert(entry);
        }
        corpus
    }

    /// Convenience constructor for a corpus holding one list of guidelines.
    pub fn from_guidelines(name: impl Into<String>, guidelines: Vec<Guideline>) -> Self {
        Self::from_entries([CorpusEntry::new(name, CorpusPayload::Guidelines(guidelines))])
    }

    fn insert(&mut self, entry: CorpusEntry) {
        match self.entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn entries(&self) -> &[CorpusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CorpusEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Every guideline record across all entries, in corpus order.
    pub fn guidelines(&self) -> impl Iterator<Item = &Guideline> {
        self.entries.iter().flat_map(|e| e.guidelines().iter())
    }

    /// First guideline with the given identifier.
    pub fn find_guideline(&self, id: &str) -> Option<&Guideline> {
        self.guidelines().find(|g| g.id == id)
    }

    /// Knowledge graph payloads, in corpus order.
    pub fn knowledge_graphs(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().filter_map(|e| match &e.payload {
            CorpusPayload::KnowledgeGraph(graph) => Some(graph),
            CorpusPayload::Guidelines(_) => None,
        })
    }

    /// One reference text per guideline record and per knowledge graph, in corpus order.
    pub fn reference_texts(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|e| match &e.payload {
                CorpusPayload::Guidelines(guidelines) => {
                    guidelines.iter().map(Guideline::text).collect()
                }
                CorpusPayload::KnowledgeGraph(graph) => vec![graph.to_string()],
            })
            .collect()
    }

    /// Entries whose serialised payload contains `text`, ignoring case.
    pub fn entries_mentioning<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a CorpusEntry> {
        let needle = text.to_lowercase();
        self.entries
            .iter()
            .filter(move |e| e.search_text.contains(&needle))
    }
}

/// A corpus file that was left out of a directory load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a corpus load: the corpus plus any files that were skipped.
#[derive(Clone, Debug, Default)]
pub struct CorpusLoad {
    pub corpus: GuidelineCorpus,
    pub skipped: Vec<SkippedEntry>,
}

/// Load a guideline corpus from a single file or a directory of files.
///
/// # Errors
///
/// Returns:
/// - `ReasoningError::CorpusNotFound` if `path` does not exist,
/// - `ReasoningError::MalformedGuideline` if `path` is a single file that cannot be parsed,
/// - `ReasoningError::FileRead` if a single file or the directory listing cannot be read.
pub fn load_corpus(path: &Path) -> ReasoningResult<CorpusLoad> {
    if !path.exists() {
        return Err(ReasoningError::CorpusNotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_file() {
        let contents = fs::read_to_string(path).map_err(|source| ReasoningError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let payload =
            parse_payload(path, &contents).map_err(|reason| ReasoningError::MalformedGuideline {
                path: path.to_path_buf(),
                reason,
            })?;
        let corpus = GuidelineCorpus::from_entries([CorpusEntry::new(entry_name(path), payload)]);
        tracing::info!("loaded guideline corpus from {}", path.display());
        return Ok(CorpusLoad {
            corpus,
            skipped: Vec::new(),
        });
    }

    let read_dir = fs::read_dir(path).map_err(|source| ReasoningError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = read_dir
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && is_supported(p))
        .collect();
    files.sort();

    let mut load = CorpusLoad::default();
    let mut entries = Vec::with_capacity(files.len());
    for file in files {
        let parsed = fs::read_to_string(&file)
            .map_err(|e| e.to_string())
            .and_then(|contents| parse_payload(&file, &contents));
        match parsed {
            Ok(payload) => entries.push(CorpusEntry::new(entry_name(&file), payload)),
            Err(reason) => {
                tracing::warn!("skipping guideline file {}: {}", file.display(), reason);
                load.skipped.push(SkippedEntry { path: file, reason });
            }
        }
    }
    load.corpus = GuidelineCorpus::from_entries(entries);

    tracing::info!(
        "loaded {} guideline corpus entries from {} ({} skipped)",
        load.corpus.len(),
        path.display(),
        load.skipped.len()
    );
    Ok(load)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|ext| {
        JSON_EXTENSIONS.contains(&ext.as_str()) || YAML_EXTENSIONS.contains(&ext.as_str())
    })
}

fn entry_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Parse a JSON or YAML document into a structured value, choosing the parser by extension.
pub(crate) fn parse_document(path: &Path, contents: &str) -> Result<Value, String> {
    match extension(path).as_deref() {
        Some(ext) if YAML_EXTENSIONS.contains(&ext) => {
            serde_yaml::from_str::<Value>(contents).map_err(|e| e.to_string())
        }
        _ => serde_json::from_str::<Value>(contents).map_err(|e| e.to_string()),
    }
}

/// Any of these at the top of a mapping makes it a guideline, never a knowledge graph.
const GUIDELINE_KEYS: &[&str] = &["id", "title", "criteria", "risk_factors"];

fn parse_payload(path: &Path, contents: &str) -> Result<CorpusPayload, String> {
    let document = parse_document(path, contents)?;
    let looks_like_guideline = matches!(
        &document,
        Value::Object(obj) if GUIDELINE_KEYS.iter().any(|key| obj.contains_key(*key))
    );

    match document {
        Value::Array(_) => serde_json::from_value::<Vec<Guideline>>(document)
            .map(CorpusPayload::Guidelines)
            .map_err(|e| format!("invalid guideline list: {e}")),
        Value::Object(_) if looks_like_guideline => serde_json::from_value::<Guideline>(document)
            .map(|g| CorpusPayload::Guidelines(vec![g]))
            .map_err(|e| format!("invalid guideline: {e}")),
        Value::Object(_) => Ok(CorpusPayload::KnowledgeGraph(document)),
        other => Err(format!(
            "expected a guideline, a guideline list or a knowledge graph mapping, found {}",
            kind_of(&other)
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
