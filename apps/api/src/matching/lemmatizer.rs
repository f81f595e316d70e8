//! Lemmatizer: reduces a lowercase token to its dictionary base form.
//!
//! The normalizer only depends on the `Lemmatizer` trait, so a dictionary-backed
//! implementation can replace `RuleLemmatizer` without touching the pipeline.

use std::borrow::Cow;

/// Maps a single lowercase, punctuation-free token to its base form.
pub trait Lemmatizer: Send + Sync {
    fn lemmatize<'a>(&self, token: &'a str) -> Cow<'a, str>;
}

/// Irregular plurals that suffix rules get wrong.
const EXCEPTIONS: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("people", "person"),
    ("mice", "mouse"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("analyses", "analysis"),
    ("theses", "thesis"),
    ("hypotheses", "hypothesis"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("lives", "life"),
    ("wives", "wife"),
    ("knives", "knife"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("caches", "cache"),
    ("niches", "niche"),
];

/// Words that end like plurals but are already base forms.
const INVARIANTS: &[&str] = &[
    "news",
    "series",
    "species",
    "physics",
    "mathematics",
    "economics",
    "politics",
    "ethics",
    "logistics",
    "analytics",
    "devops",
    "kubernetes",
    "jenkins",
    "pandas",
    "always",
    "perhaps",
    "whereas",
    "sometimes",
];

/// Rule-based English noun lemmatizer.
///
/// Rules, first match wins:
/// 1. exception table (irregular plurals) and invariant words
/// 2. tokens of 3 chars or fewer, or ending in `ss`, `us`, `is`, are kept
/// 3. `-ies` → `-y` (only when at least two chars remain before it)
/// 4. `-sses` → `-ss`; `-ches`, `-shes`, `-xes` drop `-es`
/// 5. trailing `-s` is dropped
///
/// A stem produced by rules 3-5 is looked up in the exception table once more
/// ("childrens" → "children" → "child"), so every output is a fixed point.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleLemmatizer;

impl Lemmatizer for RuleLemmatizer {
    fn lemmatize<'a>(&self, token: &'a str) -> Cow<'a, str> {
        if let Some(lemma) = irregular(token) {
            return Cow::Borrowed(lemma);
        }
        let stem = strip_plural(token);
        match irregular(&stem) {
            Some(lemma) => Cow::Borrowed(lemma),
            None => stem,
        }
    }
}

fn irregular(token: &str) -> Option<&'static str> {
    EXCEPTIONS
        .iter()
        .find(|(plural, _)| *plural == token)
        .map(|(_, lemma)| *lemma)
}

fn strip_plural(token: &str) -> Cow<'_, str> {
    if INVARIANTS.contains(&token) || token.chars().count() <= 3 {
        return Cow::Borrowed(token);
    }
    if token.ends_with("ss") || token.ends_with("us") || token.ends_with("is") {
        return Cow::Borrowed(token);
    }

    if let Some(stem) = token.strip_suffix("ies") {
        if stem.chars().count() >= 2 {
            return Cow::Owned(format!("{stem}y"));
        }
    }
    if let Some(stem) = token.strip_suffix("sses") {
        return Cow::Owned(format!("{stem}ss"));
    }
    for suffix in ["ches", "shes", "xes"] {
        if token.ends_with(suffix) {
            return Cow::Borrowed(&token[..token.len() - 2]);
        }
    }
    match token.strip_suffix('s') {
        Some(stem) => Cow::Borrowed(stem),
        None => Cow::Borrowed(token),
    }
}
