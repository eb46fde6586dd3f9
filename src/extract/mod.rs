// Extraction module
// Seam between uploaded file bytes and plain text. Word-format parsing lives
// behind this trait in external tooling; the built-in extractor covers UTF-8
// text formats so the pipeline is usable end to end.


use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("File content is not valid UTF-8: {0}")]
    InvalidEncoding(String),

    #[error("Document is empty or unreadable: {0}")]
    EmptyDocument(String),
}

/// Produces one plain-text string per uploaded file
pub trait TextExtractor: Send + Sync {
    fn extract(&self, raw: &[u8], filename: &str) -> Result<String, ExtractError>;

    /// File extensions (lowercase, with leading dot) this extractor accepts
    fn supported_extensions(&self) -> &[&'static str];

    #[inline]
    fn supports(&self, filename: &str) -> bool {
        file_extension(filename)
            .map(|ext| self.supported_extensions().contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

/// Extractor for plain UTF-8 text formats
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    #[inline]
    fn extract(&self, raw: &[u8], filename: &str) -> Result<String, ExtractError> {
        if !self.supports(filename) {
            return Err(ExtractError::UnsupportedFormat(filename.to_string()));
        }

        let text = std::str::from_utf8(raw)
            .map_err(|_| ExtractError::InvalidEncoding(filename.to_string()))?;

        // strip control characters that word splitting would otherwise carry
        // into chunk text
        let cleaned: String = text
            .chars()
            .map(|c| {
                if c.is_control() && c != '\n' && c != '\t' {
                    ' '
                } else {
                    c
                }
            })
            .collect();

        if cleaned.trim().is_empty() {
            return Err(ExtractError::EmptyDocument(filename.to_string()));
        }

        Ok(cleaned)
    }

    #[inline]
    fn supported_extensions(&self) -> &[&'static str] {
        &[".txt", ".md"]
    }
}

/// Lowercased extension of `filename`, with leading dot
#[inline]
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
}
