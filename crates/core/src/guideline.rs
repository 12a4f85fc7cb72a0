//! Clinical guideline records.

use serde::{Deserialize, Serialize};
use tmd_types::NonEmptyText;

/// A named rule used to ground diagnostic reasoning.
///
/// Criteria are matched against the presenting complaint and history; risk factors against the
/// whole case. A guideline missing either list is loaded but never ranked.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Guideline {
    pub id: NonEmptyText,
    pub title: String,
    #[serde(default)]
    pub criteria: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
}

impl Guideline {
    /// Whether both evidence channels are populated.
    pub fn is_rankable(&self) -> bool {
        !self.criteria.is_empty() && !self.risk_factors.is_empty()
    }

    /// Prose rendering used as an evaluation reference.
    pub fn text(&self) -> String {
        let mut text = self.title.clone();
        if !self.criteria.is_empty() {
            text.push_str(&format!(". Criteria: {}", self.criteria.join(", ")));
        }
        if !self.risk_factors.is_empty() {
            text.push_str(&format!(". Risk factors: {}", self.risk_factors.join(", ")));
        }
        text
    }
}
