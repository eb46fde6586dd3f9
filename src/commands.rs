use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::assistant::Assistant;
use crate::config::{Config, get_config_dir};
use crate::embeddings::EmbeddingClient;
use crate::extract::PlainTextExtractor;
use crate::faq::FaqMiner;
use crate::indexer::Indexer;
use crate::retrieval::RetrievalService;
use crate::store::Database;
use crate::suggest::SuggestionEngine;
use crate::synthesis::OllamaSynthesizer;

/// Everything a command needs, assembled once per invocation. The vector
/// index lives in process memory, so commands that search call
/// `warm_index` first to rebuild it from the store.
pub struct AppContext {
    pub config: Config,
    pub database: Database,
    pub embeddings: Arc<EmbeddingClient>,
    pub indexer: Indexer,
    pub retrieval: RetrievalService,
}

impl AppContext {
    #[inline]
    pub async fn init() -> Result<Self> {
        let config_dir = get_config_dir()?;
        let config = Config::load(&config_dir).context("Failed to load configuration")?;

        std::fs::create_dir_all(&config.base_dir).with_context(|| {
            format!("Failed to create data directory: {}", config.base_dir.display())
        })?;

        let database = Database::new(config.database_path())
            .await
            .context("Failed to initialize database")?;

        let embeddings = Arc::new(
            EmbeddingClient::new(&config.embedding)
                .context("Failed to create embedding client")?,
        );

        let indexer = Indexer::new(
            database.clone(),
            Arc::clone(&embeddings),
            config.chunking.clone(),
        );

        let retrieval = RetrievalService::new(
            Arc::clone(&embeddings),
            indexer.index(),
            database.clone(),
            config.retrieval.clone(),
        );

        Ok(Self {
            config,
            database,
            embeddings,
            indexer,
            retrieval,
        })
    }

    /// Rebuild the in-memory index from the stored corpus
    #[inline]
    pub async fn warm_index(&self) -> Result<()> {
        let stats = self.indexer.rebuild().await?;
        info!(
            "Index warmed: {} chunks across {} documents",
            stats.chunks, stats.documents
        );
        Ok(())
    }
}

/// Upload a document: extract, chunk, embed, and make it searchable
#[inline]
pub async fn upload_document(file: &Path) -> Result<()> {
    let filename = file
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", file.display()))?;

    let raw = std::fs::read(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;

    let context = AppContext::init().await?;

    let document = context
        .indexer
        .process_upload(filename, &raw, &PlainTextExtractor)
        .await?;

    println!("Uploaded: {} (ID: {})", document.filename, document.id);
    println!("  Size: {} bytes", document.file_size);

    let stats = context.indexer.finalize_document(&document.id).await?;

    println!("  Indexed chunks: {}", stats.chunks);
    println!("  Corpus: {} documents, {} chunks", stats.documents, stats.chunks);

    Ok(())
}

/// List all uploaded documents with their processing state
#[inline]
pub async fn list_documents() -> Result<()> {
    let context = AppContext::init().await?;

    let documents = context.database.list_documents().await?;

    if documents.is_empty() {
        println!("No documents have been uploaded yet.");
        println!("Use 'prosedur-asistan upload <file>' to add one.");
        return Ok(());
    }

    println!("Documents ({} total):", documents.len());
    println!();

    for document in &documents {
        println!("📄 {} (ID: {})", document.filename, document.id);
        println!("   Status: {}", document.status);
        println!("   Chunks: {}", document.chunk_count);
        println!("   Size: {} bytes", document.file_size);

        if let Some(error) = &document.error_message {
            println!("   ⚠️  Error: {}", error);
        }

        println!(
            "   Uploaded: {}",
            document.created_at.format("%Y-%m-%d %H:%M:%S")
        );
        println!();
    }

    let ready = documents.iter().filter(|d| d.embeddings_ready).count();
    let failed = documents.iter().filter(|d| d.is_failed()).count();

    println!("Summary:");
    println!("  Total: {}", documents.len());
    println!("  Searchable: {}", ready);
    println!("  Failed: {}", failed);

    Ok(())
}

/// Delete a single document and rebuild the index without it
#[inline]
pub async fn delete_document(document_id: &str) -> Result<()> {
    let context = AppContext::init().await?;

    let Some(document) = context.database.get_document(document_id).await? else {
        println!("Document not found: {}", document_id);
        return Ok(());
    };

    let deleted = context.indexer.delete_document(&document.id).await?;

    if deleted {
        println!("Deleted: {} (ID: {})", document.filename, document.id);
    } else {
        println!("Document not found: {}", document_id);
    }

    Ok(())
}

/// Delete the entire corpus
#[inline]
pub async fn clear_documents(confirm: bool) -> Result<()> {
    if !confirm {
        println!("This deletes every uploaded document and its index data.");
        println!("Re-run with --confirm to proceed.");
        return Ok(());
    }

    let context = AppContext::init().await?;
    let removed = context.indexer.clear_all().await?;

    println!("Deleted {} documents. The index is now empty.", removed);

    Ok(())
}

/// Force a full index rebuild from the stored corpus
#[inline]
pub async fn reindex() -> Result<()> {
    let context = AppContext::init().await?;

    let stats = context.indexer.rebuild().await?;

    println!(
        "Index rebuilt: {} chunks across {} documents",
        stats.chunks, stats.documents
    );

    Ok(())
}

/// Ask a question against the indexed corpus
#[inline]
pub async fn ask_question(question: &str, session_id: Option<String>) -> Result<()> {
    let context = AppContext::init().await?;
    context.warm_index().await?;

    if !context.config.synthesis.enabled {
        println!("Answer synthesis is disabled in the configuration.");
        println!("Showing retrieved content instead:");
        println!();
        let top_k = context.config.retrieval.top_k;
        for chunk in context.retrieval.find_similar_chunks(question, top_k) {
            println!("• {}", chunk);
        }
        return Ok(());
    }

    let synthesizer = Arc::new(OllamaSynthesizer::new(
        &context.config.embedding,
        &context.config.synthesis,
    )?);

    let assistant = Assistant::new(
        context.retrieval.clone(),
        synthesizer,
        context.database.clone(),
    );

    let session = assistant.ask(question, session_id).await?;

    println!("{}", session.answer);

    if !session.source_documents.is_empty() {
        println!();
        println!("Kaynaklar:");
        for document_id in &session.source_documents {
            if let Some(document) = context.database.get_document(document_id).await? {
                println!("  • {}", document.filename);
            }
        }
    }

    println!();
    println!("(oturum: {})", session.session_id);

    Ok(())
}

/// Show the raw top-k chunks retrieved for a question
#[inline]
pub async fn search_chunks(question: &str) -> Result<()> {
    let context = AppContext::init().await?;
    context.warm_index().await?;

    let top_k = context.config.retrieval.top_k;
    let chunks = context.retrieval.find_similar_chunks(question, top_k);

    if chunks.is_empty() {
        println!("No matching content found.");
        return Ok(());
    }

    for (i, chunk) in chunks.iter().enumerate() {
        println!("--- {} ---", i + 1);
        println!("{}", chunk);
        println!();
    }

    Ok(())
}

/// Show past questions similar to the given one
#[inline]
pub async fn similar_questions(question: &str) -> Result<()> {
    let context = AppContext::init().await?;

    let retrieval_config = &context.config.retrieval;
    let matches = context
        .retrieval
        .find_similar_past_questions(
            question,
            retrieval_config.min_similarity,
            retrieval_config.top_k,
        )
        .await?;

    if matches.is_empty() {
        println!("No similar past questions found.");
        return Ok(());
    }

    for m in &matches {
        println!(
            "{:.2}  {}  ({})",
            m.similarity,
            m.question,
            m.created_at.format("%Y-%m-%d")
        );
    }

    Ok(())
}

/// Autocomplete-style suggestions for a partial query
#[inline]
pub async fn suggest_questions(partial: &str) -> Result<()> {
    let context = AppContext::init().await?;
    context.warm_index().await?;

    let limit = context.config.retrieval.suggestion_limit;
    let engine = SuggestionEngine::new(context.retrieval.clone(), context.database.clone());

    let suggestions = engine.suggest(partial, limit).await?;

    if suggestions.is_empty() {
        println!("No suggestions.");
        return Ok(());
    }

    for suggestion in &suggestions {
        println!(
            "{} {:.2}  {}",
            suggestion.icon, suggestion.similarity, suggestion.text
        );
    }

    Ok(())
}

/// Print all exchanges of one conversation, oldest first
#[inline]
pub async fn show_history(session_id: &str) -> Result<()> {
    let context = AppContext::init().await?;

    let sessions = crate::store::ChatSessionQueries::list_for_session(
        context.database.pool(),
        session_id,
    )
    .await?;

    if sessions.is_empty() {
        println!("No history for session: {}", session_id);
        return Ok(());
    }

    for session in &sessions {
        println!("[{}]", session.created_at.format("%Y-%m-%d %H:%M:%S"));
        println!("S: {}", session.question);
        println!("C: {}", session.answer);
        println!();
    }

    Ok(())
}

/// Mine the chat history and sync the resulting FAQ list to the store
#[inline]
pub async fn generate_faq(min_frequency: usize, max_items: usize) -> Result<()> {
    let context = AppContext::init().await?;
    let miner = FaqMiner::new(context.database.clone());

    let items = miner.generate(min_frequency, max_items).await?;

    if items.is_empty() {
        println!("No questions reached the frequency threshold ({min_frequency}).");
        return Ok(());
    }

    let stats = miner.sync_to_store(&items).await?;

    println!(
        "Generated {} FAQ entries ({} new, {} refreshed):",
        items.len(),
        stats.inserted,
        stats.updated
    );
    println!();
    for item in &items {
        println!("[{}] ({}×) {}", item.category, item.frequency, item.question);
    }

    Ok(())
}

/// List active FAQ entries, optionally for one category
#[inline]
pub async fn list_faq(category: Option<String>) -> Result<()> {
    let context = AppContext::init().await?;

    let items = context
        .database
        .list_active_faq_items(category.as_deref())
        .await?;

    if items.is_empty() {
        println!("No FAQ entries yet. Run 'prosedur-asistan faq generate' first.");
        return Ok(());
    }

    for item in &items {
        println!("[{}] ({}×) {}", item.category, item.frequency, item.question);
        println!("    {}", item.answer);
        println!();
    }

    Ok(())
}

/// Summary statistics over the mined chat history
#[inline]
pub async fn faq_analytics() -> Result<()> {
    let context = AppContext::init().await?;
    let miner = FaqMiner::new(context.database.clone());

    let analytics = miner.analytics().await?;

    println!("Questions analyzed: {}", analytics.total_questions_analyzed);
    println!("Chat sessions: {}", analytics.total_chat_sessions);
    println!();

    println!("Top questions:");
    for top in &analytics.top_questions {
        println!("  {}× {}", top.count, top.question);
    }
    println!();

    println!("Category distribution:");
    for (category, count) in &analytics.category_distribution {
        println!("  {}: {}", category, count);
    }

    Ok(())
}

/// Health and content report for the whole pipeline
#[inline]
pub async fn show_status() -> Result<()> {
    println!("📊 Prosedür Asistanı Status Report");
    println!("{}", "=".repeat(50));
    println!();

    let config_dir = get_config_dir()?;
    let config = Config::load(&config_dir).context("Failed to load configuration")?;

    println!("🗄️  Store Status:");
    let database = match Database::new(config.database_path()).await {
        Ok(db) => {
            println!("   ✅ SQLite: Connected");
            Some(db)
        }
        Err(e) => {
            println!("   ❌ SQLite: Failed to connect - {}", e);
            None
        }
    };

    println!("🤖 Embedding Server Status:");
    match EmbeddingClient::new(&config.embedding) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Server: Connected ({}:{})",
                    config.embedding.host, config.embedding.port
                );
                println!("   📋 Embedding Model: {}", config.embedding.model);
                println!("   📋 Answer Model: {}", config.synthesis.model);
                println!("   🔢 Dimension: {}", config.embedding.embedding_dimension);
            }
            Err(e) => {
                println!("   ⚠️  Server: Connected but unhealthy - {}", e);
            }
        },
        Err(e) => {
            println!("   ❌ Server: Failed to configure - {}", e);
        }
    }

    if let Some(database) = database {
        println!();
        println!("📚 Corpus Overview:");
        match database.counts().await {
            Ok(counts) => {
                println!("   📄 Documents: {}", counts.documents);
                println!("   🧩 Chunks: {}", counts.chunks);
                println!("   💬 Chat Sessions: {}", counts.chat_sessions);
                println!("   ❓ FAQ Entries: {}", counts.faq_items);
            }
            Err(e) => {
                println!("   ❌ Failed to load counts: {}", e);
            }
        }

        match database.list_documents().await {
            Ok(documents) => {
                let ready = documents.iter().filter(|d| d.embeddings_ready).count();
                let failed = documents.iter().filter(|d| d.is_failed()).count();
                println!("   ✅ Searchable: {}", ready);
                if failed > 0 {
                    println!("   ❌ Failed: {}", failed);
                }
            }
            Err(e) => {
                println!("   ❌ Failed to list documents: {}", e);
            }
        }
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • Use 'prosedur-asistan upload <file>' to index a document");
    println!("   • Use 'prosedur-asistan ask \"<soru>\"' to ask a question");
    println!("   • Use 'prosedur-asistan faq generate' to mine the FAQ list");

    Ok(())
}
