// Synthesis module
// Turns a question plus retrieved context chunks into a final answer via the
// local model server. The retrieval core only supplies ranked context; the
// synthesizer is a swappable collaborator behind a trait.

#[cfg(test)]
mod tests;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::{EmbeddingConfig, SynthesisConfig};

const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

/// System prompt pinning the answer model to the supplied context
const SYSTEM_PROMPT: &str = "\
Sen kurumsal prosedür dokümanlarına dayalı bir asistansın. Sadece verilen \
doküman içeriğini kullanarak Türkçe cevap ver.

ÖNEMLİ KURALLAR:
1. Sadece verilen kontekst bilgilerini kullan
2. Kontekstde bulunmayan bilgileri asla uydurma
3. Eğer sorunun cevabı kontekstte yoksa \"Bu bilgi mevcut dokümanlarımda \
bulunmamaktadır.\" de
4. Cevaplarını net, anlaşılır ve profesyonel şekilde ver
5. Mümkün olduğunca detaylı ve yapılandırılmış cevaplar ver";

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Invalid synthesis server URL: {0}")]
    InvalidUrl(String),

    #[error("Answer model request failed: {0}")]
    Request(String),

    #[error("Malformed response from answer model: {0}")]
    InvalidResponse(String),
}

/// Produces one answer string from a question and its retrieved context
#[async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        question: &str,
        context_chunks: &[String],
    ) -> Result<String, SynthesisError>;
}

/// Answer synthesis against the same Ollama-compatible server that serves
/// embeddings, using its `/api/generate` endpoint
#[derive(Debug, Clone)]
pub struct OllamaSynthesizer {
    base_url: Url,
    model: String,
    max_tokens: u32,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    system: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaSynthesizer {
    #[inline]
    pub fn new(
        embedding: &EmbeddingConfig,
        synthesis: &SynthesisConfig,
    ) -> Result<Self, SynthesisError> {
        let base_url = embedding
            .server_url()
            .map_err(|e| SynthesisError::InvalidUrl(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: synthesis.model.clone(),
            max_tokens: synthesis.max_tokens,
            agent,
        })
    }

    fn build_prompt(question: &str, context_chunks: &[String]) -> String {
        let context = context_chunks.join("\n\n");

        format!(
            "Kontekst Bilgileri:\n{context}\n\nSoru: {question}\n\n\
             Lütfen sadece yukarıdaki kontekst bilgilerini kullanarak soruyu cevapla."
        )
    }
}

#[async_trait]
impl AnswerSynthesizer for OllamaSynthesizer {
    #[inline]
    async fn synthesize(
        &self,
        question: &str,
        context_chunks: &[String],
    ) -> Result<String, SynthesisError> {
        debug!(
            "Synthesizing answer from {} context chunks",
            context_chunks.len()
        );

        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: Self::build_prompt(question, context_chunks),
            system: SYSTEM_PROMPT.to_string(),
            stream: false,
            options: GenerateOptions {
                num_predict: self.max_tokens,
            },
        };

        let url = self
            .base_url
            .join("/api/generate")
            .map_err(|e| SynthesisError::InvalidUrl(e.to_string()))?;

        let request_json = serde_json::to_string(&request)
            .map_err(|e| SynthesisError::Request(e.to_string()))?;

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| SynthesisError::Request(e.to_string()))?;

        let response: GenerateResponse = serde_json::from_str(&response_text)
            .map_err(|e| SynthesisError::InvalidResponse(e.to_string()))?;

        Ok(response.response.trim().to_string())
    }
}
