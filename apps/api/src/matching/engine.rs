//! Match engine: runs the normalize, extract and score stages for one
//! résumé/job pair and assembles the report.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::matching::backends::LoadedBackends;
use crate::matching::embedding::EmbeddingProvider;
use crate::matching::entities::{EntityExtractor, EntityMap};
use crate::matching::normalizer::TextNormalizer;
use crate::matching::scoring::{
    BreakdownPercent, MatchResult, ScoreAggregator, ScoreWeights, ScoringError,
};

/// Character budget for the text previews echoed back in a report.
pub const PREVIEW_CHARS: usize = 2000;

#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub request_id: Uuid,
    pub scored_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: MatchResult,
    pub breakdown_percent: Vec<BreakdownPercent>,
    pub resume_entities: EntityMap,
    pub job_entities: EntityMap,
    pub resume_preview: String,
    pub job_preview: String,
}

/// Normalize → extract → score, wired to one set of loaded backends.
pub struct MatchEngine {
    normalizer: TextNormalizer,
    extractor: EntityExtractor,
    aggregator: ScoreAggregator,
}

impl MatchEngine {
    pub fn new(backends: &LoadedBackends, weights: ScoreWeights) -> Result<Self, ScoringError> {
        let aggregator = ScoreAggregator::with_weights(
            EmbeddingProvider::new(Arc::clone(&backends.embedder)),
            weights,
        )?;
        Ok(Self::with_parts(
            TextNormalizer::default(),
            EntityExtractor::new(Arc::clone(&backends.ner)),
            aggregator,
        ))
    }

    pub fn with_parts(
        normalizer: TextNormalizer,
        extractor: EntityExtractor,
        aggregator: ScoreAggregator,
    ) -> Self {
        Self {
            normalizer,
            extractor,
            aggregator,
        }
    }

    pub fn normalizer(&self) -> &TextNormalizer {
        &self.normalizer
    }

    pub fn extractor(&self) -> &EntityExtractor {
        &self.extractor
    }

    pub fn aggregator(&self) -> &ScoreAggregator {
        &self.aggregator
    }

    /// Full pipeline for one pair. Entities come from the raw texts, the
    /// semantic and experience scores from the normalized ones.
    pub fn analyze(&self, resume_text: &str, job_description: &str) -> Result<MatchReport, ScoringError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("match", %request_id);
        let _guard = span.enter();

        let normalized_resume = self.normalizer.normalize(resume_text);
        let normalized_job = self.normalizer.normalize(job_description);

        let resume_entities = self.extractor.extract(resume_text)?;
        let job_entities = self.extractor.extract(job_description)?;

        let result = self.aggregator.score(
            &normalized_resume,
            &normalized_job,
            &resume_entities,
            &job_entities,
        )?;
        info!("Match complete: overall {}%", result.overall_score());

        Ok(MatchReport {
            request_id,
            scored_at: Utc::now(),
            breakdown_percent: result.breakdown().as_percentages(),
            result,
            resume_entities,
            job_entities,
            resume_preview: preview(resume_text),
            job_preview: preview(job_description),
        })
    }
}

/// First `PREVIEW_CHARS` characters, with "..." appended when cut.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
