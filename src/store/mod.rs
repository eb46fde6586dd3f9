// Store module
// SQLite persistence for documents, chunks, chat history, and FAQ items


pub mod models;
pub mod queries;

use std::path::Path;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};

pub use models::{
    ChatSession, Document, DocumentChunk, DocumentStatus, FaqItem, NewChatSession, NewDocument,
    NewFaqItem,
};
pub use queries::{ChatSessionQueries, ChunkQueries, DocumentQueries, FaqQueries};

pub type DbPool = Pool<Sqlite>;

#[derive(Debug, Clone)]
pub struct Database {
    pool: DbPool,
}

impl Database {
    #[inline]
    pub async fn new<P: AsRef<Path>>(database_path: P) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);

        Self::with_options(options).await
    }

    /// An in-memory database, used by tests and throwaway runs.
    /// Pool is capped at one connection; every pooled connection would
    /// otherwise get its own private in-memory database.
    #[inline]
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to create in-memory database")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    async fn with_options(options: SqliteConnectOptions) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await
            .context("Failed to create database connection pool")?;

        let database = Self { pool };
        database.run_migrations().await?;

        Ok(database)
    }

    #[inline]
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    #[inline]
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("src/store/migrations")
            .run(&self.pool)
            .await
            .context("Failed to run schema migration")?;

        debug!("Database migrations completed successfully");
        Ok(())
    }

    // Document operations
    #[inline]
    pub async fn create_document(&self, new_document: NewDocument) -> Result<Document> {
        DocumentQueries::create(&self.pool, new_document).await
    }

    #[inline]
    pub async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        DocumentQueries::get_by_id(&self.pool, id).await
    }

    #[inline]
    pub async fn list_documents(&self) -> Result<Vec<Document>> {
        DocumentQueries::list_all(&self.pool).await
    }

    #[inline]
    pub async fn mark_document_embeddings_ready(&self, id: &str, chunk_count: i64) -> Result<()> {
        DocumentQueries::mark_embeddings_ready(&self.pool, id, chunk_count).await
    }

    #[inline]
    pub async fn mark_document_failed(&self, id: &str, error_message: &str) -> Result<()> {
        DocumentQueries::mark_failed(&self.pool, id, error_message).await
    }

    #[inline]
    pub async fn delete_document(&self, id: &str) -> Result<bool> {
        DocumentQueries::delete(&self.pool, id).await
    }

    #[inline]
    pub async fn delete_all_documents(&self) -> Result<u64> {
        DocumentQueries::delete_all(&self.pool).await
    }

    // Chunk operations
    #[inline]
    pub async fn insert_chunks(
        &self,
        document_id: &str,
        chunk_texts: &[String],
    ) -> Result<Vec<DocumentChunk>> {
        ChunkQueries::insert_for_document(&self.pool, document_id, chunk_texts).await
    }

    /// All chunks of embeddings-ready documents, the corpus for index rebuilds
    #[inline]
    pub async fn list_embeddable_chunks(&self) -> Result<Vec<DocumentChunk>> {
        ChunkQueries::list_embeddable(&self.pool).await
    }

    #[inline]
    pub async fn find_document_ids_by_chunk_contents(
        &self,
        contents: &[String],
    ) -> Result<Vec<String>> {
        ChunkQueries::find_document_ids_by_contents(&self.pool, contents).await
    }

    // Chat session operations
    #[inline]
    pub async fn create_chat_session(&self, new_session: NewChatSession) -> Result<ChatSession> {
        ChatSessionQueries::create(&self.pool, new_session).await
    }

    #[inline]
    pub async fn list_recent_chat_sessions(&self, limit: i64) -> Result<Vec<ChatSession>> {
        ChatSessionQueries::list_recent(&self.pool, limit).await
    }

    #[inline]
    pub async fn list_chat_sessions_chronological(&self, limit: i64) -> Result<Vec<ChatSession>> {
        ChatSessionQueries::list_chronological(&self.pool, limit).await
    }

    // FAQ operations
    #[inline]
    pub async fn get_faq_item_by_question(&self, question: &str) -> Result<Option<FaqItem>> {
        FaqQueries::get_by_question(&self.pool, question).await
    }

    #[inline]
    pub async fn insert_faq_item(&self, new_item: NewFaqItem) -> Result<FaqItem> {
        FaqQueries::insert(&self.pool, new_item).await
    }

    #[inline]
    pub async fn update_faq_mining_fields(
        &self,
        id: &str,
        frequency: i64,
        source_session_ids: &[String],
    ) -> Result<()> {
        FaqQueries::update_mining_fields(&self.pool, id, frequency, source_session_ids).await
    }

    #[inline]
    pub async fn list_active_faq_items(&self, category: Option<&str>) -> Result<Vec<FaqItem>> {
        FaqQueries::list_active(&self.pool, category).await
    }

    // Counts for the status report
    #[inline]
    pub async fn counts(&self) -> Result<StoreCounts> {
        Ok(StoreCounts {
            documents: DocumentQueries::count(&self.pool).await?,
            chunks: ChunkQueries::count(&self.pool).await?,
            chat_sessions: ChatSessionQueries::count(&self.pool).await?,
            faq_items: FaqQueries::count(&self.pool).await?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreCounts {
    pub documents: i64,
    pub chunks: i64,
    pub chat_sessions: i64,
    pub faq_items: i64,
}
