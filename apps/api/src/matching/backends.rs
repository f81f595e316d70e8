//! Backend loading: NER and embedding models are constructed once per process
//! and shared read-only afterwards.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::info;

use crate::matching::embedders::{HashedEmbedder, DEFAULT_EMBEDDING_DIM};
use crate::matching::embedding::{EmbeddingBackend, EmbeddingError};
use crate::matching::entities::{NerBackend, NerError};
use crate::matching::lexicon::LexiconNer;

#[derive(Debug, Error)]
pub enum BackendInitError {
    #[error("failed to load NER backend: {0}")]
    Ner(#[from] NerError),

    #[error("failed to load embedding backend: {0}")]
    Embedding(#[from] EmbeddingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackendKind {
    Hashed,
    FastEmbed,
}

impl FromStr for EmbeddingBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashed" => Ok(Self::Hashed),
            "fastembed" => Ok(Self::FastEmbed),
            other => Err(format!(
                "unknown embedding backend '{other}' (expected 'hashed' or 'fastembed')"
            )),
        }
    }
}

impl fmt::Display for EmbeddingBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hashed => f.write_str("hashed"),
            Self::FastEmbed => f.write_str("fastembed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackendSettings {
    pub embedding: EmbeddingBackendKind,
    pub embedding_dim: usize,
    pub lexicon_path: Option<PathBuf>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            embedding: EmbeddingBackendKind::Hashed,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            lexicon_path: None,
        }
    }
}

/// Ready-to-use backend handles.
#[derive(Clone)]
pub struct LoadedBackends {
    pub ner: Arc<dyn NerBackend>,
    pub embedder: Arc<dyn EmbeddingBackend>,
}

type Loader = Box<dyn Fn() -> Result<LoadedBackends, BackendInitError> + Send + Sync>;

/// Single-flight holder: the first caller runs the loader, concurrent callers
/// block until it finishes, and everyone gets the same instance. A failed load
/// is not cached.
pub struct Backends {
    loader: Loader,
    cell: OnceCell<LoadedBackends>,
}

impl Backends {
    pub fn from_settings(settings: BackendSettings) -> Self {
        Self::with_loader(move || load_backends(&settings))
    }

    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> Result<LoadedBackends, BackendInitError> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            cell: OnceCell::new(),
        }
    }

    pub fn get_or_load(&self) -> Result<&LoadedBackends, BackendInitError> {
        self.cell.get_or_try_init(|| (self.loader)())
    }
}

fn load_backends(settings: &BackendSettings) -> Result<LoadedBackends, BackendInitError> {
    let ner: Arc<dyn NerBackend> = match &settings.lexicon_path {
        Some(path) => {
            let lexicon = LexiconNer::from_path(path)?;
            info!(
                "Custom entity lexicon {} loaded ({} patterns)",
                path.display(),
                lexicon.pattern_count()
            );
            Arc::new(lexicon)
        }
        None => Arc::new(LexiconNer::builtin()?),
    };

    let embedder = load_embedder(settings)?;
    info!(
        "Backends ready: ner={}, embedding={} (dim {})",
        ner.name(),
        embedder.name(),
        embedder.dimension()
    );

    Ok(LoadedBackends { ner, embedder })
}

fn load_embedder(settings: &BackendSettings) -> Result<Arc<dyn EmbeddingBackend>, EmbeddingError> {
    match settings.embedding {
        EmbeddingBackendKind::Hashed => Ok(Arc::new(HashedEmbedder::new(settings.embedding_dim)?)),
        #[cfg(feature = "fastembed")]
        EmbeddingBackendKind::FastEmbed => {
            Ok(Arc::new(crate::matching::embedders::FastEmbedder::load()?))
        }
        #[cfg(not(feature = "fastembed"))]
        EmbeddingBackendKind::FastEmbed => Err(EmbeddingError::Unavailable(
            "built without the `fastembed` feature".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn hashed_backends() -> Result<LoadedBackends, BackendInitError> {
        Ok(LoadedBackends {
            ner: Arc::new(LexiconNer::builtin()?),
            embedder: Arc::new(HashedEmbedder::new(16)?),
        })
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!(
            "hashed".parse::<EmbeddingBackendKind>(),
            Ok(EmbeddingBackendKind::Hashed)
        );
        assert_eq!(
            " FastEmbed ".parse::<EmbeddingBackendKind>(),
            Ok(EmbeddingBackendKind::FastEmbed)
        );
        assert!("bert".parse::<EmbeddingBackendKind>().is_err());
    }

    #[test]
    fn test_loads_once_under_concurrency() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let backends = Arc::new(Backends::with_loader(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(20));
            hashed_backends()
        }));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let backends = backends.clone();
                std::thread::spawn(move || {
                    let loaded = backends.get_or_load().unwrap();
                    Arc::as_ptr(&loaded.embedder) as *const () as usize
                })
            })
            .collect();
        let addresses: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(addresses.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_failed_load_is_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let backends = Backends::with_loader(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(EmbeddingError::Unavailable("model download failed".to_string()).into())
            } else {
                hashed_backends()
            }
        });

        assert!(backends.get_or_load().is_err());
        assert!(backends.get_or_load().is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_default_settings_load_hashed_backend() {
        let backends = Backends::from_settings(BackendSettings::default());
        let loaded = backends.get_or_load().unwrap();
        assert_eq!(loaded.embedder.name(), "hashed");
        assert_eq!(loaded.embedder.dimension(), DEFAULT_EMBEDDING_DIM);
        assert_eq!(loaded.ner.name(), "lexicon");
    }

    #[test]
    fn test_missing_lexicon_file_is_init_error() {
        let settings = BackendSettings {
            lexicon_path: Some(PathBuf::from("/nonexistent/lexicon.json")),
            ..BackendSettings::default()
        };
        let err = Backends::from_settings(settings).get_or_load().err().unwrap();
        assert!(matches!(err, BackendInitError::Ner(_)));
    }

    #[cfg(not(feature = "fastembed"))]
    #[test]
    fn test_fastembed_unavailable_without_feature() {
        let settings = BackendSettings {
            embedding: EmbeddingBackendKind::FastEmbed,
            ..BackendSettings::default()
        };
        let err = Backends::from_settings(settings).get_or_load().err().unwrap();
        assert!(err.to_string().contains("fastembed"));
    }
}
