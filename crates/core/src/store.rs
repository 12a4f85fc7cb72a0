//! Directory-backed case store.
//!
//! Cases are stored as pretty-printed JSON under `<dir>/<case id>.json`. Cases may also be
//! loaded from an explicit path, in which case YAML (`.yaml`, `.yml`) is accepted too.

use crate::case::Case;
use crate::constants::{JSON_EXTENSIONS, YAML_EXTENSIONS};
use crate::corpus::parse_document;
use crate::validation::validate_case_file_name;
use crate::{ReasoningError, ReasoningResult};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct CaseStore {
    dir: PathBuf,
}

impl CaseStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path a case with this identifier is stored at.
    pub fn case_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Load a case by identifier.
    ///
    /// # Errors
    ///
    /// Returns `ReasoningError::CaseNotFound` when no file exists for `id`, or any error
    /// [`CaseStore::load_path`] can return.
    pub fn load(&self, id: &str) -> ReasoningResult<Case> {
        validate_case_file_name(id)?;
        Self::load_path(&self.case_path(id))
    }

    /// Load a case from an explicit JSON or YAML file.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - `ReasoningError::CaseNotFound` if the file does not exist,
    /// - `ReasoningError::UnsupportedFormat` for any other extension,
    /// - `ReasoningError::CaseSchema` if the content is not a valid case,
    /// - `ReasoningError::FileRead` if the file cannot be read.
    pub fn load_path(path: &Path) -> ReasoningResult<Case> {
        if !path.is_file() {
            return Err(ReasoningError::CaseNotFound {
                id: path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default()
                    .to_string(),
                path: path.to_path_buf(),
            });
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !JSON_EXTENSIONS.contains(&ext.as_str()) && !YAML_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ReasoningError::UnsupportedFormat {
                path: path.to_path_buf(),
            });
        }

        let contents = fs::read_to_string(path).map_err(|source| ReasoningError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let schema_error = |reason: String| ReasoningError::CaseSchema {
            path: path.to_path_buf(),
            reason,
        };
        let document = parse_document(path, &contents).map_err(schema_error)?;
        let case = Case::from_value(document).map_err(schema_error)?;

        tracing::debug!("loaded case {} from {}", case.id(), path.display());
        Ok(case)
    }

    /// Save a case under its identifier, overwriting any previous version.
    pub fn save(&self, case: &Case) -> ReasoningResult<PathBuf> {
        let id = case.id().as_str();
        validate_case_file_name(id)?;

        fs::create_dir_all(&self.dir).map_err(|source| ReasoningError::FileWrite {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.case_path(id);
        let json = serde_json::to_string_pretty(case).map_err(ReasoningError::Serialization)?;
        fs::write(&path, json).map_err(|source| ReasoningError::FileWrite {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Identifiers of every JSON case in the store, sorted.
    pub fn list_ids(&self) -> ReasoningResult<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(ReasoningError::FileRead {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut ids: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().and_then(|e| e.to_str()) == Some("json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        ids.sort();
        Ok(ids)
    }
}
