// Retrieval module
// Question-side similarity search: top-k chunk lookup for answer context and
// similar-question lookup over recent chat history. Retrieval is a
// best-effort enhancement; embedding and index failures degrade to empty
// results instead of blocking the surrounding QA flow.


use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::RetrievalConfig;
use crate::embeddings::EmbeddingClient;
use crate::index::{SharedIndex, cosine_similarity};
use crate::store::Database;

/// A historical question scored against the current query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarQuestion {
    pub question: String,
    pub similarity: f32,
    pub session_id: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct RetrievalService {
    embeddings: Arc<EmbeddingClient>,
    index: SharedIndex,
    database: Database,
    options: RetrievalConfig,
}

impl RetrievalService {
    #[inline]
    pub fn new(
        embeddings: Arc<EmbeddingClient>,
        index: SharedIndex,
        database: Database,
        options: RetrievalConfig,
    ) -> Self {
        Self {
            embeddings,
            index,
            database,
            options,
        }
    }

    #[inline]
    pub fn options(&self) -> &RetrievalConfig {
        &self.options
    }

    /// Top-k chunk texts for a question, best ranked first. No similarity
    /// floor is applied; all top-k matches are returned regardless of
    /// absolute score. Returns an empty list when the index is empty or any
    /// embedding/index error occurs.
    #[inline]
    pub fn find_similar_chunks(&self, question: &str, top_k: usize) -> Vec<String> {
        let snapshot = self.index.snapshot();
        if snapshot.is_empty() {
            debug!("Chunk search skipped: index is empty");
            return Vec::new();
        }

        let query_vector = match self.embeddings.embed_one(question) {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Query embedding failed, returning no chunks: {}", e);
                return Vec::new();
            }
        };

        match snapshot.search(&query_vector, top_k) {
            Ok(hits) => hits.into_iter().map(|hit| hit.text).collect(),
            Err(e) => {
                warn!("Index search failed, returning no chunks: {}", e);
                Vec::new()
            }
        }
    }

    /// Historical questions similar to `question`, scored by cosine over a
    /// bounded window of the most recent chat sessions. Exact
    /// case-insensitive matches of the query itself are excluded. Store
    /// errors propagate; embedding errors degrade to an empty list.
    #[inline]
    pub async fn find_similar_past_questions(
        &self,
        question: &str,
        min_similarity: f32,
        top_k: usize,
    ) -> Result<Vec<SimilarQuestion>> {
        let sessions = self
            .database
            .list_recent_chat_sessions(self.options.recent_question_window as i64)
            .await?;

        if sessions.is_empty() {
            return Ok(Vec::new());
        }

        let mut texts = Vec::with_capacity(sessions.len() + 1);
        texts.push(question.to_string());
        texts.extend(sessions.iter().map(|s| s.question.clone()));

        let vectors = match self.embeddings.embed_batch(&texts) {
            Ok(vectors) => vectors,
            Err(e) => {
                warn!("Question embedding failed, returning no matches: {}", e);
                return Ok(Vec::new());
            }
        };

        let query_lowered = question.trim().to_lowercase();
        let query_vector = &vectors[0];

        let mut matches: Vec<SimilarQuestion> = sessions
            .iter()
            .zip(vectors.iter().skip(1))
            .filter(|(session, _)| session.question.trim().to_lowercase() != query_lowered)
            .map(|(session, vector)| SimilarQuestion {
                question: session.question.clone(),
                similarity: cosine_similarity(query_vector, vector),
                session_id: session.session_id.clone(),
                created_at: session.created_at,
            })
            .filter(|m| m.similarity >= min_similarity)
            .collect();

        matches.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);

        Ok(matches)
    }
}
