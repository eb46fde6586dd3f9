// Vector index module
// In-memory nearest-neighbor search over chunk embeddings. The index is a
// derived artifact: it is always rebuilt from the full chunk corpus and
// published as an immutable snapshot, never mutated in place.

#[cfg(test)]
mod tests;

use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::debug;

/// A chunk together with its embedding, the unit of index construction
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkEmbedding {
    pub chunk_id: String,
    pub text: String,
    pub vector: Vec<f32>,
}

/// One search match: the stored chunk and its cosine similarity to the query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub chunk_id: String,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Zero-length embedding vector")]
    EmptyVector,
}

/// Flat inner-product index over L2-normalized vectors.
///
/// Chunk ids, chunk texts, and vector rows are parallel arrays: position `i`
/// in one always corresponds to position `i` in the others.
#[derive(Debug, Default)]
pub struct VectorIndex {
    dimension: usize,
    chunk_ids: Vec<String>,
    texts: Vec<String>,
    // row-major, `dimension` floats per chunk, normalized to unit length
    vectors: Vec<f32>,
}

impl VectorIndex {
    /// Build a fresh index from the full chunk corpus. An empty corpus is a
    /// valid, searchable (always-empty) index rather than an error.
    #[inline]
    pub fn build(entries: Vec<ChunkEmbedding>) -> Result<Self, IndexError> {
        let Some(first) = entries.first() else {
            return Ok(Self::default());
        };

        let dimension = first.vector.len();
        if dimension == 0 {
            return Err(IndexError::EmptyVector);
        }

        let mut index = Self {
            dimension,
            chunk_ids: Vec::with_capacity(entries.len()),
            texts: Vec::with_capacity(entries.len()),
            vectors: Vec::with_capacity(entries.len() * dimension),
        };

        for entry in entries {
            if entry.vector.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: entry.vector.len(),
                });
            }

            let mut vector = entry.vector;
            normalize(&mut vector);

            index.chunk_ids.push(entry.chunk_id);
            index.texts.push(entry.text);
            index.vectors.extend_from_slice(&vector);
        }

        debug!(
            "Built vector index with {} chunks of dimension {}",
            index.chunk_ids.len(),
            dimension
        );

        Ok(index)
    }

    /// Top-k search by cosine similarity (inner product on normalized
    /// vectors). Results are sorted by descending score; equal scores keep
    /// insertion order. An empty index returns an empty result set.
    #[inline]
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if self.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut query = query.to_vec();
        normalize(&mut query);

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(position, row)| (position, dot(row, &query)))
            .collect();

        // stable sort keeps insertion order for equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(position, score)| SearchHit {
                chunk_id: self.chunk_ids[position].clone(),
                text: self.texts[position].clone(),
                score,
            })
            .collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunk_ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunk_ids.is_empty()
    }

    /// Embedding dimension, or zero for an empty index
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Cosine similarity between two raw (not necessarily normalized) vectors.
/// Zero or mismatched-length vectors score 0.0.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product = dot(a, b);
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

/// Scale a vector to unit length. Zero vectors are left untouched so they
/// score zero against everything instead of producing NaN.
fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Shared handle to the currently published index snapshot.
///
/// Searches clone the inner `Arc` and run against an immutable snapshot;
/// a rebuild publishes a complete replacement with a single pointer swap, so
/// readers see either the fully-old or the fully-new index.
#[derive(Debug, Clone, Default)]
pub struct SharedIndex {
    inner: Arc<RwLock<Arc<VectorIndex>>>,
}

impl SharedIndex {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently published snapshot
    #[inline]
    pub fn snapshot(&self) -> Arc<VectorIndex> {
        let guard = self
            .inner
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Atomically replace the published snapshot
    #[inline]
    pub fn publish(&self, index: VectorIndex) {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Arc::new(index);
    }
}
