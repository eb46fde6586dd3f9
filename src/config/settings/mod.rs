
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::chunking::{ChunkingConfig, ChunkingError};

pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 384;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Connection settings for the local embedding model server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub model: String,
    pub batch_size: u32,
    pub embedding_dimension: u32,
}

impl Default for EmbeddingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            model: "all-minilm:latest".to_string(),
            batch_size: 16,
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
        }
    }
}

/// Settings for the answer model, served from the same server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisConfig {
    pub model: String,
    pub max_tokens: u32,
    pub enabled: bool,
}

impl Default for SynthesisConfig {
    #[inline]
    fn default() -> Self {
        Self {
            model: "qwen2.5:7b".to_string(),
            max_tokens: 4096,
            enabled: true,
        }
    }
}

/// Tuning knobs for similarity search over chunks and past questions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// How many chunks to hand to the answer model
    pub top_k: usize,
    /// Similarity floor for the similar-question search
    pub min_similarity: f32,
    /// How many recent questions to embed per similar-question lookup
    pub recent_question_window: usize,
    /// Maximum autocomplete suggestions per request
    pub suggestion_limit: usize,
}

impl Default for RetrievalConfig {
    #[inline]
    fn default() -> Self {
        Self {
            top_k: 5,
            min_similarity: 0.6,
            recent_question_window: 100,
            suggestion_limit: 5,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid embedding dimension: {0} (must be between 64 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid top-k: {0} (must be between 1 and 100)")]
    InvalidTopK(usize),
    #[error("Invalid minimum similarity: {0} (must be between 0.0 and 1.0)")]
    InvalidMinSimilarity(f32),
    #[error("Invalid recent question window: {0} (must be between 1 and 1000)")]
    InvalidQuestionWindow(usize),
    #[error("Invalid chunking configuration: {0}")]
    Chunking(#[from] ChunkingError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join("config.toml");

        if !config_path.exists() {
            return Ok(Self {
                embedding: EmbeddingConfig::default(),
                synthesis: SynthesisConfig::default(),
                chunking: ChunkingConfig::default(),
                retrieval: RetrievalConfig::default(),
                base_dir: config_dir.as_ref().to_path_buf(),
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        fs::create_dir_all(&self.base_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                self.base_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.embedding.validate()?;
        self.chunking.validate()?;

        if self.synthesis.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.synthesis.model.clone()));
        }

        let retrieval = &self.retrieval;
        if retrieval.top_k == 0 || retrieval.top_k > 100 {
            return Err(ConfigError::InvalidTopK(retrieval.top_k));
        }
        if !(0.0..=1.0).contains(&retrieval.min_similarity) {
            return Err(ConfigError::InvalidMinSimilarity(retrieval.min_similarity));
        }
        if retrieval.recent_question_window == 0 || retrieval.recent_question_window > 1000 {
            return Err(ConfigError::InvalidQuestionWindow(
                retrieval.recent_question_window,
            ));
        }

        Ok(())
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.base_dir.join("config.toml")
    }

    /// Path of the SQLite database holding documents, chunks, chat history,
    /// and FAQ items
    #[inline]
    pub fn database_path(&self) -> PathBuf {
        self.base_dir.join("asistan.db")
    }
}

impl EmbeddingConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        self.server_url()?;

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if !(64..=4096).contains(&self.embedding_dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding_dimension,
            ));
        }

        Ok(())
    }

    #[inline]
    pub fn server_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }

    #[inline]
    pub fn set_protocol(&mut self, protocol: String) -> Result<(), ConfigError> {
        if protocol != "http" && protocol != "https" {
            return Err(ConfigError::InvalidProtocol(protocol));
        }
        self.protocol = protocol;
        Ok(())
    }

    #[inline]
    pub fn set_host(&mut self, host: String) -> Result<(), ConfigError> {
        let temp_config = EmbeddingConfig {
            host: host.clone(),
            ..self.clone()
        };
        temp_config.validate()?;
        self.host = host;
        Ok(())
    }

    #[inline]
    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port));
        }
        self.port = port;
        Ok(())
    }

    #[inline]
    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.model = model;
        Ok(())
    }

    #[inline]
    pub fn set_batch_size(&mut self, batch_size: u32) -> Result<(), ConfigError> {
        if batch_size == 0 || batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(batch_size));
        }
        self.batch_size = batch_size;
        Ok(())
    }

    #[inline]
    pub fn set_embedding_dimension(&mut self, dimension: u32) -> Result<(), ConfigError> {
        if !(64..=4096).contains(&dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(dimension));
        }
        self.embedding_dimension = dimension;
        Ok(())
    }
}
