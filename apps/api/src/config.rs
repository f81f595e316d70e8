use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::matching::backends::{BackendSettings, EmbeddingBackendKind};
use crate::matching::embedders::DEFAULT_EMBEDDING_DIM;
use crate::matching::scoring::ScoreWeights;

/// Application configuration loaded from environment variables.
/// Every variable is optional; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub embedding_backend: EmbeddingBackendKind,
    pub embedding_dim: usize,
    pub entity_lexicon_path: Option<PathBuf>,
    pub max_upload_bytes: usize,
    pub request_timeout: Duration,
    /// Sub-score weights; validated when the match engine is built.
    pub score_weights: ScoreWeights,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            embedding_backend: EmbeddingBackendKind::Hashed,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            entity_lexicon_path: None,
            max_upload_bytes: 10 * 1024 * 1024,
            request_timeout: Duration::from_secs(60),
            score_weights: ScoreWeights::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key → value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Config {
            port: parse_env(&lookup, "PORT", defaults.port)?,
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
            embedding_backend: match lookup("EMBEDDING_BACKEND") {
                Some(raw) => raw
                    .parse::<EmbeddingBackendKind>()
                    .map_err(|e| anyhow!(e))
                    .context("EMBEDDING_BACKEND is invalid")?,
                None => defaults.embedding_backend,
            },
            embedding_dim: parse_env(&lookup, "EMBEDDING_DIM", defaults.embedding_dim)?,
            entity_lexicon_path: lookup("ENTITY_LEXICON_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            max_upload_bytes: parse_env(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            request_timeout: Duration::from_secs(parse_env(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            score_weights: match lookup("SCORE_WEIGHTS") {
                Some(raw) => serde_json::from_str(&raw)
                    .with_context(|| format!("SCORE_WEIGHTS must be a JSON weights object, got '{raw}'"))?,
                None => defaults.score_weights,
            },
        })
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            embedding: self.embedding_backend,
            embedding_dim: self.embedding_dim,
            lexicon_path: self.entity_lexicon_path.clone(),
        }
    }
}

fn parse_env<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
