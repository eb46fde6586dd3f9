use thiserror::Error;

pub type Result<T> = std::result::Result<T, AsistanError>;

#[derive(Error, Debug)]
pub enum AsistanError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Extraction error: {0}")]
    Extraction(#[from] extract::ExtractError),

    #[error("Chunking error: {0}")]
    Chunking(#[from] chunking::ChunkingError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] embeddings::EmbeddingError),

    #[error("Index error: {0}")]
    Index(#[from] index::IndexError),

    #[error("Synthesis error: {0}")]
    Synthesis(#[from] synthesis::SynthesisError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod assistant;
pub mod chunking;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod extract;
pub mod faq;
pub mod index;
pub mod indexer;
pub mod retrieval;
pub mod store;
pub mod suggest;
pub mod synthesis;
