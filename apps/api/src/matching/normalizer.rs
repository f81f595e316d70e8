//! Text normalizer: reduces raw text to the canonical token stream used for
//! semantic comparison and experience-indicator lookup.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::matching::lemmatizer::{Lemmatizer, RuleLemmatizer};

static DIGIT_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("digit pattern is valid"));

/// English stop words (the standard NLTK list). Entries containing an apostrophe
/// can never survive punctuation removal; they are kept so the list stays complete.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

/// Lowercase → strip ASCII punctuation → strip digit runs → collapse whitespace →
/// tokenize → drop stop words → lemmatize → join with single spaces.
///
/// Output is idempotent: `normalize(normalize(t)) == normalize(t)`.
pub struct TextNormalizer {
    stop_words: HashSet<&'static str>,
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(Arc::new(RuleLemmatizer))
    }
}

impl TextNormalizer {
    pub fn new(lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self {
            stop_words: ENGLISH_STOP_WORDS.iter().copied().collect(),
            lemmatizer,
        }
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Absent input normalizes to the empty string.
    pub fn normalize<'a>(&self, text: impl Into<Option<&'a str>>) -> String {
        let Some(text) = text.into() else {
            return String::new();
        };

        let lowered = text.to_lowercase();
        let without_punctuation: String = lowered
            .chars()
            .filter(|c| !c.is_ascii_punctuation())
            .collect();
        let without_digits = DIGIT_RUNS.replace_all(&without_punctuation, "");

        without_digits
            .split_whitespace()
            .filter(|token| !self.is_stop_word(token))
            .map(|token| self.lemmatize(token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    // A lemma that lands on a stop word would be dropped by a second pass.
    fn lemmatize<'t>(&self, token: &'t str) -> Cow<'t, str> {
        let lemma = self.lemmatizer.lemmatize(token);
        if self.is_stop_word(&lemma) {
            Cow::Borrowed(token)
        } else {
            lemma
        }
    }
}
