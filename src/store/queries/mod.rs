#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::models::{
    ChatSession, Document, DocumentChunk, FaqItem, NewChatSession, NewDocument, NewFaqItem,
};

const DOCUMENT_COLUMNS: &str = "id, filename, file_type, file_size, content, chunk_count, \
     status, embeddings_ready, error_message, created_at, processed_at";

const FAQ_COLUMNS: &str = "id, question, answer, category, frequency, similar_questions, \
     source_session_ids, is_active, created_at, updated_at";

pub struct DocumentQueries;

impl DocumentQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_document: NewDocument) -> Result<Document> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            "INSERT INTO documents (id, filename, file_type, file_size, content, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_document.id)
        .bind(&new_document.filename)
        .bind(&new_document.file_type)
        .bind(new_document.file_size)
        .bind(&new_document.content)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create document")?;

        Self::get_by_id(pool, &new_document.id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created document"))
    }

    #[inline]
    pub async fn get_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Document>> {
        let result = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get document by id")?;

        Ok(result)
    }

    #[inline]
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Document>> {
        let documents = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
        .context("Failed to list documents")?;

        Ok(documents)
    }

    #[inline]
    pub async fn mark_embeddings_ready(
        pool: &SqlitePool,
        id: &str,
        chunk_count: i64,
    ) -> Result<()> {
        let now = Utc::now().naive_utc();
        sqlx::query(
            "UPDATE documents SET embeddings_ready = 1, status = 'completed', \
             chunk_count = ?, processed_at = ?, error_message = NULL WHERE id = ?",
        )
        .bind(chunk_count)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to mark document embeddings-ready")?;

        Ok(())
    }

    #[inline]
    pub async fn mark_failed(pool: &SqlitePool, id: &str, error_message: &str) -> Result<()> {
        sqlx::query("UPDATE documents SET status = 'failed', error_message = ? WHERE id = ?")
            .bind(error_message)
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to mark document failed")?;

        Ok(())
    }

    /// Delete a document; its chunks go with it via the foreign-key cascade
    #[inline]
    pub async fn delete(pool: &SqlitePool, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to delete document")?;

        Ok(result.rows_affected() > 0)
    }

    #[inline]
    pub async fn delete_all(pool: &SqlitePool) -> Result<u64> {
        let result = sqlx::query("DELETE FROM documents")
            .execute(pool)
            .await
            .context("Failed to delete all documents")?;

        Ok(result.rows_affected())
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents")
            .fetch_one(pool)
            .await
            .context("Failed to count documents")?;

        Ok(count.0)
    }
}

pub struct ChunkQueries;

impl ChunkQueries {
    /// Insert the chunk sequence for a document, ordinals in input order
    #[inline]
    pub async fn insert_for_document(
        pool: &SqlitePool,
        document_id: &str,
        chunk_texts: &[String],
    ) -> Result<Vec<DocumentChunk>> {
        let mut chunks = Vec::with_capacity(chunk_texts.len());

        for (ordinal, content) in chunk_texts.iter().enumerate() {
            let chunk = DocumentChunk {
                id: Uuid::new_v4().to_string(),
                document_id: document_id.to_string(),
                ordinal: ordinal as i64,
                content: content.clone(),
            };

            sqlx::query(
                "INSERT INTO chunks (id, document_id, ordinal, content) VALUES (?, ?, ?, ?)",
            )
            .bind(&chunk.id)
            .bind(&chunk.document_id)
            .bind(chunk.ordinal)
            .bind(&chunk.content)
            .execute(pool)
            .await
            .context("Failed to insert chunk")?;

            chunks.push(chunk);
        }

        Ok(chunks)
    }

    #[inline]
    pub async fn list_for_document(
        pool: &SqlitePool,
        document_id: &str,
    ) -> Result<Vec<DocumentChunk>> {
        let chunks = sqlx::query_as::<_, DocumentChunk>(
            "SELECT id, document_id, ordinal, content FROM chunks \
             WHERE document_id = ? ORDER BY ordinal ASC",
        )
        .bind(document_id)
        .fetch_all(pool)
        .await
        .context("Failed to list chunks for document")?;

        Ok(chunks)
    }

    /// Every chunk belonging to an embeddings-ready document, ordered by
    /// document creation then ordinal. This is the authoritative corpus for
    /// an index rebuild.
    #[inline]
    pub async fn list_embeddable(pool: &SqlitePool) -> Result<Vec<DocumentChunk>> {
        let chunks = sqlx::query_as::<_, DocumentChunk>(
            "SELECT c.id, c.document_id, c.ordinal, c.content \
             FROM chunks c JOIN documents d ON d.id = c.document_id \
             WHERE d.embeddings_ready = 1 \
             ORDER BY d.created_at ASC, d.rowid ASC, c.ordinal ASC",
        )
        .fetch_all(pool)
        .await
        .context("Failed to list embeddable chunks")?;

        Ok(chunks)
    }

    /// Distinct ids of documents owning chunks with exactly these texts,
    /// in first-match order
    #[inline]
    pub async fn find_document_ids_by_contents(
        pool: &SqlitePool,
        contents: &[String],
    ) -> Result<Vec<String>> {
        let mut document_ids = Vec::new();

        for content in contents {
            let rows: Vec<(String,)> =
                sqlx::query_as("SELECT DISTINCT document_id FROM chunks WHERE content = ?")
                    .bind(content)
                    .fetch_all(pool)
                    .await
                    .context("Failed to find documents for chunk content")?;

            for (document_id,) in rows {
                if !document_ids.contains(&document_id) {
                    document_ids.push(document_id);
                }
            }
        }

        Ok(document_ids)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chunks")
            .fetch_one(pool)
            .await
            .context("Failed to count chunks")?;

        Ok(count.0)
    }
}

pub struct ChatSessionQueries;

impl ChatSessionQueries {
    #[inline]
    pub async fn create(pool: &SqlitePool, new_session: NewChatSession) -> Result<ChatSession> {
        let session = ChatSession {
            id: Uuid::new_v4().to_string(),
            session_id: new_session.session_id,
            question: new_session.question,
            answer: new_session.answer,
            context_chunks: new_session.context_chunks,
            source_documents: new_session.source_documents,
            created_at: Utc::now().naive_utc(),
        };

        let context_chunks = serde_json::to_string(&session.context_chunks)
            .context("Failed to serialize context chunks")?;
        let source_documents = serde_json::to_string(&session.source_documents)
            .context("Failed to serialize source documents")?;

        sqlx::query(
            "INSERT INTO chat_sessions \
             (id, session_id, question, answer, context_chunks, source_documents, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&session.id)
        .bind(&session.session_id)
        .bind(&session.question)
        .bind(&session.answer)
        .bind(&context_chunks)
        .bind(&source_documents)
        .bind(session.created_at)
        .execute(pool)
        .await
        .context("Failed to create chat session")?;

        Ok(session)
    }

    /// Most recent sessions first, bounded by `limit`
    #[inline]
    pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<ChatSession>> {
        let sessions = sqlx::query_as::<_, ChatSession>(
            "SELECT id, session_id, question, answer, context_chunks, source_documents, \
             created_at FROM chat_sessions ORDER BY created_at DESC, rowid DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list recent chat sessions")?;

        Ok(sessions)
    }

    /// Oldest sessions first, bounded by `limit`; the FAQ miner depends on
    /// this order to pick the first recorded answer per question group
    #[inline]
    pub async fn list_chronological(pool: &SqlitePool, limit: i64) -> Result<Vec<ChatSession>> {
        let sessions = sqlx::query_as::<_, ChatSession>(
            "SELECT id, session_id, question, answer, context_chunks, source_documents, \
             created_at FROM chat_sessions ORDER BY created_at ASC, rowid ASC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list chat sessions chronologically")?;

        Ok(sessions)
    }

    #[inline]
    pub async fn list_for_session(pool: &SqlitePool, session_id: &str) -> Result<Vec<ChatSession>> {
        let sessions = sqlx::query_as::<_, ChatSession>(
            "SELECT id, session_id, question, answer, context_chunks, source_documents, \
             created_at FROM chat_sessions WHERE session_id = ? ORDER BY created_at ASC",
        )
        .bind(session_id)
        .fetch_all(pool)
        .await
        .context("Failed to list chat sessions for session id")?;

        Ok(sessions)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_sessions")
            .fetch_one(pool)
            .await
            .context("Failed to count chat sessions")?;

        Ok(count.0)
    }
}

pub struct FaqQueries;

impl FaqQueries {
    #[inline]
    pub async fn get_by_question(pool: &SqlitePool, question: &str) -> Result<Option<FaqItem>> {
        let item = sqlx::query_as::<_, FaqItem>(&format!(
            "SELECT {FAQ_COLUMNS} FROM faq_items WHERE question = ?"
        ))
        .bind(question)
        .fetch_optional(pool)
        .await
        .context("Failed to get FAQ item by question")?;

        Ok(item)
    }

    #[inline]
    pub async fn insert(pool: &SqlitePool, new_item: NewFaqItem) -> Result<FaqItem> {
        let now = Utc::now().naive_utc();
        let item = FaqItem {
            id: Uuid::new_v4().to_string(),
            question: new_item.question,
            answer: new_item.answer,
            category: new_item.category,
            frequency: new_item.frequency,
            similar_questions: new_item.similar_questions,
            source_session_ids: new_item.source_session_ids,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let similar_questions = serde_json::to_string(&item.similar_questions)
            .context("Failed to serialize similar questions")?;
        let source_session_ids = serde_json::to_string(&item.source_session_ids)
            .context("Failed to serialize source session ids")?;

        sqlx::query(
            "INSERT INTO faq_items (id, question, answer, category, frequency, \
             similar_questions, source_session_ids, is_active, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.question)
        .bind(&item.answer)
        .bind(&item.category)
        .bind(item.frequency)
        .bind(&similar_questions)
        .bind(&source_session_ids)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(pool)
        .await
        .context("Failed to insert FAQ item")?;

        Ok(item)
    }

    /// Refresh only the mining-derived fields. Manually edited fields
    /// (category, answer, is_active) survive regeneration.
    #[inline]
    pub async fn update_mining_fields(
        pool: &SqlitePool,
        id: &str,
        frequency: i64,
        source_session_ids: &[String],
    ) -> Result<()> {
        let now = Utc::now().naive_utc();
        let source_session_ids = serde_json::to_string(source_session_ids)
            .context("Failed to serialize source session ids")?;

        sqlx::query(
            "UPDATE faq_items SET frequency = ?, source_session_ids = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(frequency)
        .bind(&source_session_ids)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update FAQ mining fields")?;

        Ok(())
    }

    #[inline]
    pub async fn list_active(pool: &SqlitePool, category: Option<&str>) -> Result<Vec<FaqItem>> {
        let items = match category {
            Some(category) => {
                sqlx::query_as::<_, FaqItem>(&format!(
                    "SELECT {FAQ_COLUMNS} FROM faq_items \
                     WHERE is_active = 1 AND category = ? \
                     ORDER BY frequency DESC, question ASC"
                ))
                .bind(category)
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, FaqItem>(&format!(
                    "SELECT {FAQ_COLUMNS} FROM faq_items WHERE is_active = 1 \
                     ORDER BY frequency DESC, question ASC"
                ))
                .fetch_all(pool)
                .await
            }
        }
        .context("Failed to list active FAQ items")?;

        Ok(items)
    }

    #[inline]
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM faq_items")
            .fetch_one(pool)
            .await
            .context("Failed to count FAQ items")?;

        Ok(count.0)
    }
}
