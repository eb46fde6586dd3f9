#[cfg(test)]
mod tests;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::EmbeddingConfig;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Errors from the embedding model server. Same-input retries fail the same
/// way for everything except transport-level errors, so callers treat these
/// as fatal for the current request.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("Cannot embed an empty input list")]
    EmptyInput,

    #[error("Invalid embedding server URL: {0}")]
    InvalidUrl(String),

    #[error("Embedding server unavailable: {0}")]
    ServerUnavailable(String),

    #[error("Model '{model}' is not available on the embedding server")]
    ModelUnavailable { model: String },

    #[error("Malformed response from embedding server: {0}")]
    InvalidResponse(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding request failed: {0}")]
    Request(String),
}

/// Client for an Ollama-compatible embedding endpoint.
///
/// Constructed once at startup from validated configuration and shared by
/// reference; the loaded model lives in the server process, so the client
/// itself is cheap and stateless.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    base_url: Url,
    model: String,
    batch_size: usize,
    expected_dimension: usize,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub size: Option<u64>,
    pub digest: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

impl EmbeddingClient {
    #[inline]
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let base_url = config
            .server_url()
            .map_err(|e| EmbeddingError::InvalidUrl(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.model.clone(),
            batch_size: config.batch_size as usize,
            expected_dimension: config.embedding_dimension as usize,
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Check that the server is reachable and the configured model is loaded
    #[inline]
    pub fn health_check(&self) -> Result<(), EmbeddingError> {
        self.ping()?;
        self.validate_model()?;
        debug!(
            "Embedding server at {} healthy with model {}",
            self.base_url, self.model
        );
        Ok(())
    }

    #[inline]
    pub fn ping(&self) -> Result<(), EmbeddingError> {
        let url = self.endpoint("/api/tags")?;

        self.request_with_retry(|| {
            self.agent
                .get(url.as_str())
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        Ok(())
    }

    /// Verify the configured model is present on the server
    #[inline]
    pub fn validate_model(&self) -> Result<(), EmbeddingError> {
        let models = self.list_models()?;

        if models.iter().any(|m| m.name == self.model) {
            Ok(())
        } else {
            warn!(
                "Model {} not found. Available models: {:?}",
                self.model,
                models.iter().map(|m| m.name.as_str()).collect::<Vec<_>>()
            );
            Err(EmbeddingError::ModelUnavailable {
                model: self.model.clone(),
            })
        }
    }

    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>, EmbeddingError> {
        let url = self.endpoint("/api/tags")?;

        let response_text = self.request_with_retry(|| {
            self.agent
                .get(url.as_str())
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        let models: ModelsResponse = serde_json::from_str(&response_text)
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        Ok(models.models)
    }

    /// Embed a single text
    #[inline]
    pub fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()])?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding list".to_string()))
    }

    /// Embed a list of texts, preserving order. The request is split into
    /// server-side batches of at most `batch_size` texts.
    #[inline]
    pub fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size.max(1)) {
            vectors.extend(self.embed_single_batch(batch)?);
        }

        Ok(vectors)
    }

    fn embed_single_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = EmbedRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
        };

        let url = self.endpoint("/api/embed")?;
        let request_json = serde_json::to_string(&request)
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;

        let response_text = self.request_with_retry(|| {
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        let response: EmbedResponse = serde_json::from_str(&response_text)
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if response.embeddings.len() != texts.len() {
            return Err(EmbeddingError::InvalidResponse(format!(
                "requested {} embeddings, server returned {}",
                texts.len(),
                response.embeddings.len()
            )));
        }

        for vector in &response.embeddings {
            if vector.len() != self.expected_dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.expected_dimension,
                    actual: vector.len(),
                });
            }
        }

        Ok(response.embeddings)
    }

    fn endpoint(&self, path: &str) -> Result<Url, EmbeddingError> {
        self.base_url
            .join(path)
            .map_err(|e| EmbeddingError::InvalidUrl(e.to_string()))
    }

    fn request_with_retry<F>(&self, mut request_fn: F) -> Result<String, EmbeddingError>
    where
        F: FnMut() -> Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            match request_fn() {
                Ok(response_text) => return Ok(response_text),
                Err(error) => {
                    // retry server and transport errors; everything else is
                    // deterministic and fails immediately
                    match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                            } else {
                                return Err(EmbeddingError::Request(format!("HTTP {status}")));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                        }
                        _ => return Err(EmbeddingError::Request(error.to_string())),
                    }

                    last_error = Some(error.to_string());

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        std::thread::sleep(Duration::from_millis(delay_ms));
                    }
                }
            }
        }

        Err(EmbeddingError::ServerUnavailable(
            last_error.unwrap_or_else(|| "request failed after retries".to_string()),
        ))
    }
}
