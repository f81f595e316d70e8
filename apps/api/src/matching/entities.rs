//! Entity extraction: groups the spans an NER backend recognizes into a
//! deduplicated, lowercased, sorted `EntityMap`.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

pub const SKILLS: &str = "SKILLS";
pub const QUALIFICATION: &str = "QUALIFICATION";

#[derive(Debug, Error)]
pub enum NerError {
    #[error("entity recognition failed: {0}")]
    Recognition(String),

    #[error("invalid entity lexicon: {0}")]
    Lexicon(String),
}

/// One recognized span: its label and the surface text as it appeared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySpan {
    pub label: String,
    pub text: String,
}

impl EntitySpan {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }
}

/// Named-entity recognizer. Treated as a pure function of its input text.
pub trait NerBackend: Send + Sync {
    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>, NerError>;

    fn name(&self) -> &str;
}

/// Label → sorted, distinct, lowercase entity strings.
///
/// Lookups of a label the backend never emitted return an empty slice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EntityMap(BTreeMap<String, Vec<String>>);

impl EntityMap {
    pub fn from_spans(spans: impl IntoIterator<Item = EntitySpan>) -> Self {
        let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        for span in spans {
            grouped
                .entry(span.label)
                .or_default()
                .insert(span.text.to_lowercase());
        }
        Self(
            grouped
                .into_iter()
                .map(|(label, values)| (label, values.into_iter().collect()))
                .collect(),
        )
    }

    /// Adds (or extends) a label, applying the same lowercase/dedup/sort policy
    /// as extraction.
    pub fn with_label<S: AsRef<str>>(mut self, label: &str, values: &[S]) -> Self {
        let entry = self.0.entry(label.to_string()).or_default();
        let merged: BTreeSet<String> = entry
            .drain(..)
            .chain(values.iter().map(|v| v.as_ref().to_lowercase()))
            .collect();
        entry.extend(merged);
        self
    }

    pub fn get(&self, label: &str) -> &[String] {
        self.0.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn skills(&self) -> &[String] {
        self.get(SKILLS)
    }

    pub fn qualifications(&self) -> &[String] {
        self.get(QUALIFICATION)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Runs the injected backend over raw (non-normalized) text. Casing and
/// punctuation are left intact because recognizers rely on them.
#[derive(Clone)]
pub struct EntityExtractor {
    backend: Arc<dyn NerBackend>,
}

impl EntityExtractor {
    pub fn new(backend: Arc<dyn NerBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Absent or blank text has no entities; the backend is not called.
    pub fn extract<'a>(&self, text: impl Into<Option<&'a str>>) -> Result<EntityMap, NerError> {
        match text.into() {
            Some(text) if !text.trim().is_empty() => {
                let spans = self.backend.recognize(text)?;
                Ok(EntityMap::from_spans(spans))
            }
            _ => Ok(EntityMap::default()),
        }
    }
}
