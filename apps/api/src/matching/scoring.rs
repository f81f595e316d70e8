//! Score aggregation: four sub-scores combined with fixed weights into one
//! compatibility percentage.
//!
//! | sub-score               | range          | weight |
//! |-------------------------|----------------|--------|
//! | `semantic_similarity`   | [0, 1]         | 0.4    |
//! | `skill_overlap`         | [0, 1]         | 0.4    |
//! | `qualification_overlap` | {0.0, 1.0}     | 0.1    |
//! | `experience_alignment`  | {0.0, 0.5}     | 0.1    |
//!
//! `overall_score = round(Σ subscore × weight × 100, 2)`; the breakdown keeps the
//! unweighted sub-scores rounded to 3 decimals.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::matching::embedding::{cosine_similarity, EmbeddingError, EmbeddingProvider};
use crate::matching::entities::{EntityMap, NerError};

/// Substrings that signal seniority or tenure in normalized text. "year" also
/// matches "years".
pub const EXPERIENCE_INDICATORS: [&str; 6] =
    ["year", "experience", "senior", "lead", "junior", "entry"];

/// The only non-zero value experience alignment can take.
pub const EXPERIENCE_MATCH_SCORE: f64 = 0.5;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Ner(#[from] NerError),

    #[error("invalid score weights: {0}")]
    InvalidWeights(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Weights
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub semantic_similarity: f64,
    pub skill_overlap: f64,
    pub qualification_overlap: f64,
    pub experience_alignment: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            semantic_similarity: 0.4,
            skill_overlap: 0.4,
            qualification_overlap: 0.1,
            experience_alignment: 0.1,
        }
    }
}

impl ScoreWeights {
    /// Each weight must lie in [0, 1] and together they must sum to 1.0.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let weights = [
            self.semantic_similarity,
            self.skill_overlap,
            self.qualification_overlap,
            self.experience_alignment,
        ];
        if weights.iter().any(|w| !(0.0..=1.0).contains(w)) {
            return Err(ScoringError::InvalidWeights(format!(
                "every weight must be within [0, 1], got {weights:?}"
            )));
        }
        let total: f64 = weights.iter().sum();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringError::InvalidWeights(format!(
                "weights must sum to 1.0, got {total}"
            )));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Result models
// ────────────────────────────────────────────────────────────────────────────

/// Unweighted sub-scores, serialized in this field order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub semantic_similarity: f64,
    pub skill_overlap: f64,
    pub qualification_overlap: f64,
    pub experience_alignment: f64,
}

/// One breakdown line for display: "Skill Overlap" → 33.3.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownPercent {
    pub label: String,
    pub percent: f64,
}

impl ScoreBreakdown {
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("semantic_similarity", self.semantic_similarity),
            ("skill_overlap", self.skill_overlap),
            ("qualification_overlap", self.qualification_overlap),
            ("experience_alignment", self.experience_alignment),
        ]
    }

    fn weighted_sum(&self, weights: &ScoreWeights) -> f64 {
        self.semantic_similarity * weights.semantic_similarity
            + self.skill_overlap * weights.skill_overlap
            + self.qualification_overlap * weights.qualification_overlap
            + self.experience_alignment * weights.experience_alignment
    }

    fn rounded(&self, places: i32) -> Self {
        Self {
            semantic_similarity: round_to(self.semantic_similarity, places),
            skill_overlap: round_to(self.skill_overlap, places),
            qualification_overlap: round_to(self.qualification_overlap, places),
            experience_alignment: round_to(self.experience_alignment, places),
        }
    }

    pub fn as_percentages(&self) -> Vec<BreakdownPercent> {
        self.entries()
            .into_iter()
            .map(|(name, score)| BreakdownPercent {
                label: title_case(name),
                percent: round_to(score * 100.0, 2),
            })
            .collect()
    }
}

/// Overall percentage plus the sub-score breakdown. Built only by
/// `ScoreAggregator::score`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    overall_score: f64,
    breakdown: ScoreBreakdown,
}

impl MatchResult {
    /// Percentage in [0, 100], 2 decimals.
    pub fn overall_score(&self) -> f64 {
        self.overall_score
    }

    pub fn breakdown(&self) -> &ScoreBreakdown {
        &self.breakdown
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Aggregator
// ────────────────────────────────────────────────────────────────────────────

pub struct ScoreAggregator {
    embeddings: EmbeddingProvider,
    weights: ScoreWeights,
}

impl ScoreAggregator {
    /// Rejects weights that fail `ScoreWeights::validate`.
    pub fn with_weights(
        embeddings: EmbeddingProvider,
        weights: ScoreWeights,
    ) -> Result<Self, ScoringError> {
        weights.validate()?;
        Ok(Self {
            embeddings,
            weights,
        })
    }

    pub fn embeddings(&self) -> &EmbeddingProvider {
        &self.embeddings
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Scores one résumé/job-description pair. Both texts must already be
    /// normalized; entity maps come from the raw texts.
    pub fn score(
        &self,
        normalized_resume: &str,
        normalized_job: &str,
        resume_entities: &EntityMap,
        job_entities: &EntityMap,
    ) -> Result<MatchResult, ScoringError> {
        let raw = ScoreBreakdown {
            semantic_similarity: self.semantic_similarity(normalized_resume, normalized_job)?,
            skill_overlap: jaccard_index(resume_entities.skills(), job_entities.skills()),
            qualification_overlap: qualification_overlap(
                resume_entities.qualifications(),
                job_entities.qualifications(),
            ),
            experience_alignment: experience_alignment(normalized_resume, normalized_job),
        };

        let overall = raw.weighted_sum(&self.weights);
        let result = MatchResult {
            overall_score: round_to(overall * 100.0, 2),
            breakdown: raw.rounded(3),
        };

        debug!(
            semantic = raw.semantic_similarity,
            skills = raw.skill_overlap,
            qualification = raw.qualification_overlap,
            experience = raw.experience_alignment,
            overall = result.overall_score,
            "Match scored"
        );

        Ok(result)
    }

    /// Cosine similarity of the two embeddings, clamped into [0, 1]. A zero
    /// vector on either side scores 0.0.
    pub fn semantic_similarity(
        &self,
        normalized_resume: &str,
        normalized_job: &str,
    ) -> Result<f64, ScoringError> {
        let resume_vector = self.embeddings.embed(normalized_resume)?;
        let job_vector = self.embeddings.embed(normalized_job)?;
        Ok(cosine_similarity(&resume_vector, &job_vector).clamp(0.0, 1.0))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sub-scores
// ────────────────────────────────────────────────────────────────────────────

/// |A ∩ B| / |A ∪ B| over lowercased sets. Empty on either side scores 0.0.
pub fn jaccard_index(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let set_a: HashSet<String> = a.iter().map(|s| s.to_lowercase()).collect();
    let set_b: HashSet<String> = b.iter().map(|s| s.to_lowercase()).collect();

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 0.0;
    }
    set_a.intersection(&set_b).count() as f64 / union as f64
}

/// 1.0 as soon as one résumé qualification and one job qualification contain
/// each other, else 0.0. Binary on purpose; note that short entries match
/// loosely ("ba" is inside "mba").
pub fn qualification_overlap(resume: &[String], job: &[String]) -> f64 {
    let matched = resume.iter().any(|q_r| {
        job.iter()
            .any(|q_j| q_j.contains(q_r.as_str()) || q_r.contains(q_j.as_str()))
    });
    if matched {
        1.0
    } else {
        0.0
    }
}

/// 0.5 when both normalized texts contain at least one experience indicator as a
/// substring, else 0.0.
pub fn experience_alignment(normalized_resume: &str, normalized_job: &str) -> f64 {
    let mentions = |text: &str| EXPERIENCE_INDICATORS.iter().any(|ind| text.contains(ind));
    if mentions(normalized_resume) && mentions(normalized_job) {
        EXPERIENCE_MATCH_SCORE
    } else {
        0.0
    }
}

/// Rounds to `places` decimals. Exact ties go to the even neighbour
/// (`0.0625` → `0.062`); values merely printed as ties round by their true
/// binary value (`2.675` → `2.67`).
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    let scaled = value * factor;
    let rounded = if (scaled - scaled.trunc()).abs() == 0.5 {
        // Rounding error of the product; zero means the tie is exact.
        let error = value.mul_add(factor, -scaled);
        if error == 0.0 {
            scaled.round_ties_even()
        } else if error > 0.0 {
            scaled.ceil()
        } else {
            scaled.floor()
        }
    } else {
        scaled.round()
    };
    rounded / factor
}

fn title_case(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
