//! Résumé ↔ job-description matching: normalization, entity extraction,
//! embeddings, scoring, and the HTTP handlers that drive them.

pub mod backends;
pub mod embedders;
pub mod embedding;
pub mod engine;
pub mod entities;
pub mod handlers;
pub mod lemmatizer;
pub mod lexicon;
pub mod normalizer;
pub mod pdf;
pub mod scoring;
