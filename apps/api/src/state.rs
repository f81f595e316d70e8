use std::sync::Arc;

use crate::config::Config;
use crate::matching::engine::MatchEngine;
use crate::matching::pdf::PdfTextExtractor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Built once from the loaded backends; read-only afterwards.
    pub engine: Arc<MatchEngine>,
    /// Pluggable PDF reader. Default: `PdfExtract`.
    pub pdf: Arc<dyn PdfTextExtractor>,
}
