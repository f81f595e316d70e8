//! HTTP handlers for the matching API.

use anyhow::Context;
use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::matching::engine::MatchReport;
use crate::matching::entities::EntityMap;
use crate::matching::pdf::ExtractionError;
use crate::matching::scoring::ScoringError;
use crate::state::AppState;

pub const MISSING_RESUME_MESSAGE: &str = "Please upload a resume first.";
pub const MISSING_JOB_MESSAGE: &str = "Please paste a job description first.";

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub resume_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub job_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EntitiesRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntitiesResponse {
    pub entities: EntityMap,
    pub normalized: String,
}

/// Keeps JSON strings; anything else (number, null, object) reads as absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

/// POST /api/v1/match
pub async fn handle_match(
    State(state): State<AppState>,
    Json(req): Json<MatchRequest>,
) -> Result<Json<MatchReport>, AppError> {
    let resume = non_blank(req.resume_text)
        .ok_or_else(|| AppError::Validation(MISSING_RESUME_MESSAGE.to_string()))?;
    let job = non_blank(req.job_description)
        .ok_or_else(|| AppError::Validation(MISSING_JOB_MESSAGE.to_string()))?;

    let engine = state.engine.clone();
    let report = tokio::task::spawn_blocking(move || engine.analyze(&resume, &job))
        .await
        .context("scoring task panicked")??;

    Ok(Json(report))
}

/// POST /api/v1/match/upload
///
/// Multipart form: `resume` (PDF file) and `job_description` (text).
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<MatchReport>, AppError> {
    let mut resume: Option<Bytes> = None;
    let mut job: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("resume") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                resume = Some(data);
            }
            Some("job_description") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(e.body_text()))?;
                job = Some(text);
            }
            _ => {}
        }
    }

    let resume = resume
        .filter(|b| !b.is_empty())
        .ok_or_else(|| AppError::Validation(MISSING_RESUME_MESSAGE.to_string()))?;
    let job = non_blank(job).ok_or_else(|| AppError::Validation(MISSING_JOB_MESSAGE.to_string()))?;

    info!("Résumé upload received ({} bytes)", resume.len());

    let pdf = state.pdf.clone();
    let engine = state.engine.clone();
    let report = tokio::task::spawn_blocking(move || -> Result<MatchReport, AppError> {
        let text = pdf
            .extract(&resume)
            .map_err(|e| AppError::Extraction(e.to_string()))?;
        if text.is_empty() {
            return Err(AppError::Extraction(ExtractionError::Empty.to_string()));
        }
        Ok(engine.analyze(&text, &job)?)
    })
    .await
    .context("upload task panicked")??;

    Ok(Json(report))
}

/// POST /api/v1/entities
///
/// Preview of what the pipeline sees for one text.
pub async fn handle_entities(
    State(state): State<AppState>,
    Json(req): Json<EntitiesRequest>,
) -> Result<Json<EntitiesResponse>, AppError> {
    let engine = state.engine.clone();
    let response = tokio::task::spawn_blocking(move || -> Result<EntitiesResponse, AppError> {
        let text = req.text.as_deref();
        Ok(EntitiesResponse {
            entities: engine.extractor().extract(text).map_err(ScoringError::from)?,
            normalized: engine.normalizer().normalize(text),
        })
    })
    .await
    .context("entity task panicked")??;

    Ok(Json(response))
}
