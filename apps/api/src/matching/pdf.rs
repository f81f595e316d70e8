//! PDF text extraction for uploaded résumés.

use std::panic;

use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("document is empty")]
    Empty,

    #[error("could not read PDF (it may be encrypted or corrupted): {0}")]
    Unreadable(String),
}

/// Binary document → raw text.
pub trait PdfTextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// `pdf-extract` backed extractor. Output is trimmed.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtract;

impl PdfTextExtractor for PdfExtract {
    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        if bytes.is_empty() {
            return Err(ExtractionError::Empty);
        }

        // pdf-extract panics on some malformed inputs instead of returning Err.
        let outcome = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
        match outcome {
            Ok(Ok(text)) => Ok(text.trim().to_string()),
            Ok(Err(e)) => {
                warn!("PDF extraction failed: {e}");
                Err(ExtractionError::Unreadable(e.to_string()))
            }
            Err(_) => {
                warn!("PDF parser panicked on malformed input");
                Err(ExtractionError::Unreadable(
                    "parser aborted on malformed input".to_string(),
                ))
            }
        }
    }
}
