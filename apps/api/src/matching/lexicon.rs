//! Gazetteer NER backend: recognizes skills and qualifications by matching a
//! fixed lexicon against raw text with an Aho-Corasick automaton.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::Path;

use aho_corasick::{AhoCorasick, MatchKind};
use tracing::info;

use crate::matching::entities::{EntitySpan, NerBackend, NerError, QUALIFICATION, SKILLS};

/// Label → surface patterns.
pub type Lexicon = BTreeMap<String, Vec<String>>;

const BUILTIN_SKILLS: &[&str] = &[
    "python", "java", "javascript", "typescript", "rust", "golang", "c++", "c#", "ruby", "php",
    "scala", "kotlin", "swift", "r programming", "matlab", "bash", "sql", "nosql", "postgresql",
    "mysql", "sqlite", "mongodb", "redis", "elasticsearch", "kafka", "spark", "hadoop", "airflow",
    "snowflake", "dbt", "docker", "kubernetes", "terraform", "ansible", "aws", "azure", "gcp",
    "google cloud", "linux", "git", "ci/cd", "jenkins", "github actions", "react", "angular",
    "vue", "node.js", "django", "flask", "fastapi", "spring boot", ".net", "graphql",
    "rest api", "restful", "microservices", "machine learning", "deep learning", "nlp",
    "natural language processing", "computer vision", "data science", "data analysis",
    "data visualization", "data engineering", "etl", "tensorflow", "pytorch", "scikit-learn",
    "pandas", "numpy", "tableau", "power bi", "statistics", "html", "css", "agile", "scrum",
    "project management", "communication", "leadership",
];

const BUILTIN_QUALIFICATIONS: &[&str] = &[
    "bachelor", "bachelor's degree", "bachelor of science", "bachelor of arts",
    "bachelor of engineering", "b.sc", "bsc", "b.tech", "btech", "b.e.", "ba", "master",
    "master's degree", "master of science", "master of engineering", "m.sc", "msc", "m.tech",
    "mtech", "mba", "phd", "ph.d", "doctorate", "associate degree", "diploma",
    "high school diploma", "pmp", "cpa", "cfa", "cissp", "aws certified",
    "certified scrum master",
];

/// The lexicon compiled into the binary.
pub fn builtin_lexicon() -> Lexicon {
    let mut lexicon = Lexicon::new();
    lexicon.insert(
        SKILLS.to_string(),
        BUILTIN_SKILLS.iter().map(|s| s.to_string()).collect(),
    );
    lexicon.insert(
        QUALIFICATION.to_string(),
        BUILTIN_QUALIFICATIONS.iter().map(|s| s.to_string()).collect(),
    );
    lexicon
}

/// Case-insensitive lexicon matcher. A match only counts when it is not glued to
/// a neighbouring letter or digit, so "java" is not found inside "javanese"; a
/// single trailing plural `s` is tolerated ("REST APIs" finds "rest api").
///
/// All overlapping candidates are collected first and boundary-checked, then the
/// longest surviving candidate wins at each position. A rejected long pattern
/// therefore never hides a shorter valid one starting at the same place.
pub struct LexiconNer {
    automaton: AhoCorasick,
    /// Label of each pattern, indexed by pattern id.
    labels: Vec<String>,
}

impl LexiconNer {
    pub fn builtin() -> Result<Self, NerError> {
        Self::from_lexicon(&builtin_lexicon())
    }

    /// Reads a JSON object of `{"LABEL": ["pattern", ...]}`.
    pub fn from_path(path: &Path) -> Result<Self, NerError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| NerError::Lexicon(format!("cannot read {}: {e}", path.display())))?;
        let lexicon: Lexicon = serde_json::from_str(&raw)
            .map_err(|e| NerError::Lexicon(format!("cannot parse {}: {e}", path.display())))?;
        Self::from_lexicon(&lexicon)
    }

    pub fn from_lexicon(lexicon: &Lexicon) -> Result<Self, NerError> {
        let mut patterns = Vec::new();
        let mut labels = Vec::new();
        for (label, entries) in lexicon {
            for entry in entries {
                let pattern = entry.trim().to_lowercase();
                if pattern.is_empty() {
                    continue;
                }
                patterns.push(pattern);
                labels.push(label.clone());
            }
        }

        if patterns.is_empty() {
            return Err(NerError::Lexicon("lexicon contains no patterns".to_string()));
        }

        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(&patterns)
            .map_err(|e| NerError::Lexicon(format!("failed to build matcher: {e}")))?;

        info!(
            "Entity lexicon loaded: {} patterns across {} labels",
            patterns.len(),
            lexicon.len()
        );

        Ok(Self { automaton, labels })
    }

    pub fn pattern_count(&self) -> usize {
        self.labels.len()
    }
}

impl NerBackend for LexiconNer {
    fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>, NerError> {
        let mut candidates: Vec<_> = self
            .automaton
            .find_overlapping_iter(text)
            .filter(|m| on_word_boundary(text, m.start(), m.end()))
            .collect();
        candidates.sort_by_key(|m| (m.start(), Reverse(m.end())));

        let mut spans = Vec::new();
        let mut covered = 0;
        for m in candidates {
            if m.start() < covered {
                continue;
            }
            covered = m.end();
            let label = self.labels.get(m.pattern().as_usize()).ok_or_else(|| {
                NerError::Recognition(format!("no label for pattern {}", m.pattern().as_usize()))
            })?;
            spans.push(EntitySpan::new(label.clone(), &text[m.start()..m.end()]));
        }
        Ok(spans)
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}

fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    if text[..start].chars().next_back().is_some_and(char::is_alphanumeric) {
        return false;
    }
    let mut after = text[end..].chars();
    match after.next() {
        None => true,
        Some('s' | 'S') => !after.next().is_some_and(char::is_alphanumeric),
        Some(c) => !c.is_alphanumeric(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::entities::EntityMap;
    use std::io::Write;

    fn recognize(text: &str) -> EntityMap {
        let ner = LexiconNer::builtin().unwrap();
        EntityMap::from_spans(ner.recognize(text).unwrap())
    }

    #[test]
    fn test_finds_skills_case_insensitively() {
        let map = recognize("Built services in Python and PostgreSQL on AWS.");
        assert_eq!(map.skills(), ["aws", "postgresql", "python"]);
    }

    #[test]
    fn test_prefers_longest_match() {
        let map = recognize("Experience with machine learning and Spring Boot.");
        assert_eq!(map.skills(), ["machine learning", "spring boot"]);
    }

    #[test]
    fn test_rejects_matches_inside_words() {
        let map = recognize("Fluent in Javanese; enjoys rusty bikes and sqlite3dump");
        assert!(map.skills().is_empty(), "got {:?}", map.skills());
    }

    #[test]
    fn test_symbol_patterns() {
        let map = recognize("Shipped C++ and C# tools, plus Node.js APIs and CI/CD.");
        assert_eq!(map.skills(), ["c#", "c++", "ci/cd", "node.js"]);
    }

    #[test]
    fn test_finds_qualifications() {
        let map = recognize("Holds an MBA and a Bachelor of Science; PMP certified.");
        assert_eq!(map.qualifications(), ["bachelor of science", "mba", "pmp"]);
    }

    #[test]
    fn test_plural_forms_recognized() {
        let map = recognize("Built REST APIs in Go. Bachelor's degrees in CS, Master of Sciences.");
        assert_eq!(map.skills(), ["rest api"]);
        assert_eq!(
            map.qualifications(),
            ["bachelor's degree", "master of science"]
        );
    }

    #[test]
    fn test_rejected_long_match_falls_back_to_shorter() {
        let mut lexicon = Lexicon::new();
        lexicon.insert(
            SKILLS.to_string(),
            vec!["data".to_string(), "data science".to_string()],
        );
        let ner = LexiconNer::from_lexicon(&lexicon).unwrap();

        // "data science" is glued to "x"; "data" alone still counts.
        let map = EntityMap::from_spans(ner.recognize("data sciencex team").unwrap());
        assert_eq!(map.skills(), ["data"]);
    }

    #[test]
    fn test_plural_suffix_must_end_the_word() {
        let map = recognize("Pythonsx and sqlsy");
        assert!(map.skills().is_empty(), "got {:?}", map.skills());
    }

    #[test]
    fn test_empty_lexicon_rejected() {
        let mut lexicon = Lexicon::new();
        lexicon.insert(SKILLS.to_string(), vec!["  ".to_string()]);
        let err = LexiconNer::from_lexicon(&lexicon).err().unwrap();
        assert!(err.to_string().contains("no patterns"));
    }

    #[test]
    fn test_loads_lexicon_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"SKILLS": ["Elixir"], "TOOL": ["Vim"]}}"#).unwrap();

        let ner = LexiconNer::from_path(file.path()).unwrap();
        assert_eq!(ner.pattern_count(), 2);

        let map = EntityMap::from_spans(ner.recognize("Elixir in Vim").unwrap());
        assert_eq!(map.skills(), ["elixir"]);
        assert_eq!(map.get("TOOL"), ["vim"]);
    }

    #[test]
    fn test_malformed_lexicon_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = LexiconNer::from_path(file.path()).err().unwrap();
        assert!(err.to_string().contains("cannot parse"));
    }
}
