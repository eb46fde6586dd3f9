// Indexer module
// Coordinates document processing and full index rebuilds. The index is a
// pure function of "all chunks of embeddings-ready documents": every
// lifecycle event (upload completion, deletion, bulk clear) recomputes it
// from the store and publishes a fresh snapshot.


use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chunking::{ChunkingConfig, chunk_text};
use crate::embeddings::EmbeddingClient;
use crate::extract::{TextExtractor, file_extension};
use crate::index::{ChunkEmbedding, SharedIndex, VectorIndex};
use crate::store::{Database, Document, NewDocument};

/// Outcome of one full index rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildStats {
    pub documents: usize,
    pub chunks: usize,
}

/// Owns the shared index handle and serializes rebuilds.
///
/// Cloning is cheap; clones share the same index handle and rebuild lock, so
/// two concurrent rebuild calls run one after the other while searches keep
/// reading the last published snapshot.
#[derive(Debug, Clone)]
pub struct Indexer {
    database: Database,
    embeddings: Arc<EmbeddingClient>,
    index: SharedIndex,
    chunking: ChunkingConfig,
    rebuild_lock: Arc<Mutex<()>>,
}

impl Indexer {
    #[inline]
    pub fn new(
        database: Database,
        embeddings: Arc<EmbeddingClient>,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            database,
            embeddings,
            index: SharedIndex::new(),
            chunking,
            rebuild_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Handle to the live index snapshot, for the retrieval layer
    #[inline]
    pub fn index(&self) -> SharedIndex {
        self.index.clone()
    }

    /// Extract, chunk, and persist an uploaded file. The document starts in
    /// `Processing` status; it becomes searchable only after
    /// `finalize_document` completes.
    #[inline]
    pub async fn process_upload(
        &self,
        filename: &str,
        raw: &[u8],
        extractor: &dyn TextExtractor,
    ) -> Result<Document> {
        info!("Processing upload: {}", filename);

        let text = extractor
            .extract(raw, filename)
            .with_context(|| format!("Failed to extract text from {filename}"))?;

        let chunks = chunk_text(&text, &self.chunking).context("Failed to chunk document text")?;

        let document = self
            .database
            .create_document(NewDocument {
                id: Uuid::new_v4().to_string(),
                filename: filename.to_string(),
                file_type: file_extension(filename).unwrap_or_default(),
                file_size: raw.len() as i64,
                content: text,
            })
            .await?;

        self.database.insert_chunks(&document.id, &chunks).await?;

        debug!(
            "Stored document {} with {} chunks",
            document.id,
            chunks.len()
        );

        Ok(document)
    }

    /// Mark a stored document embeddings-ready and rebuild the index over
    /// the whole corpus. On failure the document is marked failed so it is
    /// excluded from future rebuilds.
    #[inline]
    pub async fn finalize_document(&self, document_id: &str) -> Result<RebuildStats> {
        let chunks =
            crate::store::ChunkQueries::list_for_document(self.database.pool(), document_id)
                .await?;

        self.database
            .mark_document_embeddings_ready(document_id, chunks.len() as i64)
            .await?;

        match self.rebuild().await {
            Ok(stats) => {
                info!("Document processing completed: {}", document_id);
                Ok(stats)
            }
            Err(e) => {
                warn!("Index rebuild failed for document {}: {}", document_id, e);
                let _ = self
                    .database
                    .mark_document_failed(document_id, &e.to_string())
                    .await;
                Err(e)
            }
        }
    }

    /// Recompute the entire index from the store and publish it atomically.
    /// Rebuilds are serialized; only one runs at a time.
    #[inline]
    pub async fn rebuild(&self) -> Result<RebuildStats> {
        let _guard = self.rebuild_lock.lock().await;

        let chunks = self.database.list_embeddable_chunks().await?;

        if chunks.is_empty() {
            self.index.publish(VectorIndex::default());
            info!("Index rebuilt empty: no embeddings-ready documents");
            return Ok(RebuildStats {
                documents: 0,
                chunks: 0,
            });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self
            .embeddings
            .embed_batch(&texts)
            .context("Failed to generate embeddings for index rebuild")?;

        let documents = chunks
            .iter()
            .map(|c| c.document_id.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len();

        let entries: Vec<ChunkEmbedding> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| ChunkEmbedding {
                chunk_id: chunk.id,
                text: chunk.content,
                vector,
            })
            .collect();

        let stats = RebuildStats {
            documents,
            chunks: entries.len(),
        };

        let index = VectorIndex::build(entries).context("Failed to build vector index")?;
        self.index.publish(index);

        info!(
            "Index rebuilt: {} chunks across {} documents",
            stats.chunks, stats.documents
        );

        Ok(stats)
    }

    /// Delete one document and rebuild without it
    #[inline]
    pub async fn delete_document(&self, document_id: &str) -> Result<bool> {
        let deleted = self.database.delete_document(document_id).await?;

        if deleted {
            self.rebuild().await?;
        }

        Ok(deleted)
    }

    /// Delete the whole corpus and publish an empty index
    #[inline]
    pub async fn clear_all(&self) -> Result<u64> {
        let deleted = self.database.delete_all_documents().await?;
        self.rebuild().await?;
        Ok(deleted)
    }
}
