//! Observation extraction from nested knowledge graphs.
//!
//! Knowledge graphs are nested mappings whose keys carry a node tag after a `$`, for example:
//!
//! ```text
//! {
//!   "Pneumonia$Intermedia_1": {
//!     "Suspected Pneumonia$Intermedia_2": {
//!       "productive cough$Input2": {},
//!       "fever of 39C$Input3": {}
//!     }
//!   }
//! }
//! ```
//!
//! Every key containing `$Input` whose value is itself a mapping is an observation. Its
//! rationale is the full parent key and its diagnosis is the text of the root-most key on the
//! path.

use crate::constants::{DEFAULT_RATIONALE, KG_INPUT_MARKER, KG_TAG_SEPARATOR, UNKNOWN_DIAGNOSIS};
use serde::{Deserialize, Serialize};
use serde_json::{map, Value};

/// One observation → diagnosis link found in a knowledge graph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationLink {
    pub observation: String,
    pub rationale: String,
    pub diagnosis: String,
}

/// Text of a key before its node tag.
fn untagged(key: &str) -> &str {
    key.split(KG_TAG_SEPARATOR).next().unwrap_or(key).trim()
}

/// Walk `graph` depth-first in document order and collect every observation link.
///
/// The walk keeps an explicit stack of (entries, path) frames, so arbitrarily deep input does
/// not grow the call stack. Non-mapping values are ignored. A graph that is not a mapping has
/// no links.
pub fn extract_observation_links(graph: &Value) -> Vec<ObservationLink> {
    let Some(root) = graph.as_object() else {
        return Vec::new();
    };

    let mut links = Vec::new();
    let mut stack: Vec<(map::Iter<'_>, Vec<&str>)> = vec![(root.iter(), Vec::new())];

    while let Some((entries, path)) = stack.last_mut() {
        let Some((key, value)) = entries.next() else {
            stack.pop();
            continue;
        };
        let Value::Object(children) = value else {
            continue;
        };

        if key.contains(KG_INPUT_MARKER) {
            links.push(ObservationLink {
                observation: untagged(key).to_string(),
                rationale: path.last().copied().unwrap_or(DEFAULT_RATIONALE).to_string(),
                diagnosis: path
                    .first()
                    .map(|root_key| untagged(root_key))
                    .unwrap_or(UNKNOWN_DIAGNOSIS)
                    .to_string(),
            });
        }

        let mut child_path = path.clone();
        child_path.push(key.as_str());
        stack.push((children.iter(), child_path));
    }

    links
}

/// The link for an observation, ignoring case and surrounding whitespace.
///
/// A link whose diagnosis also matches `diagnosis` is preferred; otherwise the first link for
/// the observation is returned.
pub fn find_link<'a>(
    links: &'a [ObservationLink],
    observation: &str,
    diagnosis: &str,
) -> Option<&'a ObservationLink> {
    let observation = observation.trim();
    let diagnosis = diagnosis.trim();
    let mut for_observation = links
        .iter()
        .filter(|link| link.observation.eq_ignore_ascii_case(observation));

    let first = for_observation.next()?;
    if first.diagnosis.eq_ignore_ascii_case(diagnosis) {
        return Some(first);
    }
    Some(
        for_observation
            .find(|link| link.diagnosis.eq_ignore_ascii_case(diagnosis))
            .unwrap_or(first),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pneumonia_graph() -> Value {
        json!({
            "Pneumonia$Intermedia_1": {
                "Suspected Pneumonia$Intermedia_2": {
                    "productive cough$Input2": {},
                    "fever of 39C$Input3": {}
                },
                "chest x-ray consolidation$Input4": {}
            },
            "input1": "free text that is not a node"
        })
    }

    #[test]
    fn extracts_links_in_document_order() {
        let links = extract_observation_links(&pneumonia_graph());
        let observations: Vec<_> = links.iter().map(|l| l.observation.as_str()).collect();
        assert_eq!(
            observations,
            vec!["productive cough", "fever of 39C", "chest x-ray consolidation"]
        );
        assert!(links.iter().all(|l| l.diagnosis == "Pneumonia"));
        assert_eq!(links[0].rationale, "Suspected Pneumonia$Intermedia_2");
        assert_eq!(links[2].rationale, "Pneumonia$Intermedia_1");
    }

    #[test]
    fn root_level_observation_uses_defaults() {
        let links = extract_observation_links(&json!({"headache$Input1": {}}));
        assert_eq!(
            links,
            vec![ObservationLink {
                observation: "headache".into(),
                rationale: DEFAULT_RATIONALE.into(),
                diagnosis: UNKNOWN_DIAGNOSIS.into(),
            }]
        );
    }

    #[test]
    fn input_keys_with_scalar_values_are_not_observations() {
        let links = extract_observation_links(&json!({"Stroke$Intermedia_1": {"weakness$Input1": "x"}}));
        assert!(links.is_empty());
    }

    #[test]
    fn non_mapping_graph_has_no_links() {
        assert!(extract_observation_links(&json!(["a", "b"])).is_empty());
        assert!(extract_observation_links(&Value::Null).is_empty());
    }

    #[test]
    fn deep_nesting_is_walked_without_recursion() {
        let mut node = json!({"leaf finding$Input1": {}});
        for depth in 0..2_000 {
            let mut wrapper = serde_json::Map::new();
            wrapper.insert(format!("level {depth}$Intermedia"), node);
            node = Value::Object(wrapper);
        }
        let links = extract_observation_links(&node);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].observation, "leaf finding");
        assert_eq!(links[0].diagnosis, "level 1999");
        assert_eq!(links[0].rationale, "level 0$Intermedia");
    }

    #[test]
    fn find_link_ignores_case_and_padding() {
        let links = extract_observation_links(&pneumonia_graph());
        let link = find_link(&links, " Productive Cough ", "pneumonia").expect("link");
        assert_eq!(link.rationale, "Suspected Pneumonia$Intermedia_2");
        assert!(find_link(&links, "rash", "Pneumonia").is_none());
    }

    #[test]
    fn find_link_prefers_the_matching_diagnosis() {
        let mut links = extract_observation_links(&json!({
            "Pneumonia$Intermedia_1": {"Suspected Pneumonia$Intermedia_2": {"fever$Input1": {}}}
        }));
        links.extend(extract_observation_links(&json!({
            "Sepsis$Intermedia_1": {"Suspected Sepsis$Intermedia_2": {"fever$Input1": {}}}
        })));

        let link = find_link(&links, "fever", "sepsis").expect("link");
        assert_eq!(link.rationale, "Suspected Sepsis$Intermedia_2");

        let fallback = find_link(&links, "fever", "Meningitis").expect("fallback");
        assert_eq!(fallback.diagnosis, "Pneumonia");
    }
}
