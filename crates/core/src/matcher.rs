//! Lexical guideline matching.
//!
//! Relevance is the mean of two ratios:
//! - `criteria_ratio`: criteria found (case-insensitively) in the chief complaint or history,
//! - `risk_ratio`: risk factors found anywhere in the serialised case.
//!
//! Only guidelines with both lists populated and a score strictly above
//! [`MATCH_SCORE_THRESHOLD`] are ranked. The risk channel searches field names as well as
//! values, so short risk factors can match by accident.

use crate::case::ClinicalVignette;
use crate::constants::MATCH_SCORE_THRESHOLD;
use crate::corpus::GuidelineCorpus;
use crate::guideline::Guideline;
use serde::Serialize;

/// A guideline paired with its relevance to one case.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MatchResult<'a> {
    pub guideline: &'a Guideline,
    pub match_score: f64,
}

/// Fraction of `needles` contained in any of `haystacks`. Haystacks must already be lowercase.
fn found_ratio(needles: &[String], haystacks: &[&str]) -> f64 {
    if needles.is_empty() {
        return 0.0;
    }
    let found = needles
        .iter()
        .map(|needle| needle.to_lowercase())
        .filter(|needle| haystacks.iter().any(|h| h.contains(needle.as_str())))
        .count();
    found as f64 / needles.len() as f64
}

/// Case text prepared once for matching against many guidelines.
struct MatchTarget {
    chief_complaint: String,
    history: String,
    full_text: String,
}

impl MatchTarget {
    fn new(vignette: &ClinicalVignette) -> Self {
        Self {
            chief_complaint: vignette.chief_complaint.to_lowercase(),
            history: vignette.history_of_present_illness.to_lowercase(),
            full_text: vignette.full_text().to_lowercase(),
        }
    }

    fn score(&self, guideline: &Guideline) -> Option<f64> {
        if !guideline.is_rankable() {
            return None;
        }
        let criteria_ratio = found_ratio(
            &guideline.criteria,
            &[self.chief_complaint.as_str(), self.history.as_str()],
        );
        let risk_ratio = found_ratio(&guideline.risk_factors, &[self.full_text.as_str()]);
        Some((criteria_ratio + risk_ratio) / 2.0)
    }
}

/// Raw match score of one guideline, or `None` when the guideline lacks criteria or risk
/// factors. Applies no threshold.
pub fn score_guideline(vignette: &ClinicalVignette, guideline: &Guideline) -> Option<f64> {
    MatchTarget::new(vignette).score(guideline)
}

/// Rank every guideline in the corpus against a vignette.
///
/// Results are sorted by descending score; equal scores keep corpus order. An empty corpus,
/// or one where nothing clears the threshold, gives an empty list.
pub fn rank_guidelines<'a>(
    vignette: &ClinicalVignette,
    corpus: &'a GuidelineCorpus,
) -> Vec<MatchResult<'a>> {
    let target = MatchTarget::new(vignette);

    let mut ranked: Vec<MatchResult<'a>> = corpus
        .guidelines()
        .filter_map(|guideline| {
            let match_score = target.score(guideline)?;
            tracing::debug!(
                "guideline {} scored {:.3} for case {}",
                guideline.id,
                match_score,
                vignette.patient_id
            );
            (match_score > MATCH_SCORE_THRESHOLD).then_some(MatchResult {
                guideline,
                match_score,
            })
        })
        .collect();

    ranked.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
    ranked
}
