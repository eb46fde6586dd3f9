// Chunking module
// Splits extracted document text into overlapping word windows for embedding


use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for word-window chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in words
    pub window_size: usize,
    /// Number of words shared between adjacent windows
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            window_size: 500,
            overlap: 50,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    #[error("Window size {window_size} must be greater than overlap {overlap}")]
    WindowNotLargerThanOverlap { window_size: usize, overlap: usize },
    #[error("Window size must be greater than zero")]
    ZeroWindowSize,
}

impl ChunkingConfig {
    /// Reject configurations whose advance step would be non-positive.
    /// A window no larger than the overlap would never make progress.
    #[inline]
    pub fn validate(&self) -> Result<(), ChunkingError> {
        if self.window_size == 0 {
            return Err(ChunkingError::ZeroWindowSize);
        }
        if self.window_size <= self.overlap {
            return Err(ChunkingError::WindowNotLargerThanOverlap {
                window_size: self.window_size,
                overlap: self.overlap,
            });
        }
        Ok(())
    }
}

/// Split text into successive windows of `window_size` whitespace-separated
/// words, each window sharing `overlap` words with its predecessor. Windows
/// are rejoined with single spaces, so the original spacing is not preserved.
///
/// The final window ends exactly at the last word; once a window reaches the
/// end of the token stream no further (shorter) windows are emitted.
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<String>, ChunkingError> {
    config.validate()?;

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let step = config.window_size - config.overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + config.window_size).min(words.len());
        let chunk = words[start..end].join(" ");
        if !chunk.trim().is_empty() {
            chunks.push(chunk);
        }

        if end == words.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}
