// Embeddings module
// Client for the local embedding model server

pub mod client;

pub use client::{EmbeddingClient, EmbeddingError, ModelInfo};
