// Assistant module
// The question-answering flow: retrieve context, synthesize an answer, and
// append the exchange to chat history. Question answering always produces
// an answer string; an empty retrieval result is a normal outcome answered
// with a fixed not-found message, not an error.


use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use uuid::Uuid;

use crate::retrieval::RetrievalService;
use crate::store::{ChatSession, Database, NewChatSession};
use crate::synthesis::AnswerSynthesizer;

/// Returned when retrieval finds nothing to answer from
pub const NO_CONTEXT_ANSWER: &str = "Bu bilgi mevcut dokümanlarımda bulunmamaktadır.";

/// Returned when the answer model itself fails
pub const SYNTHESIS_FALLBACK_ANSWER: &str =
    "Üzgünüm, şu anda sorunuzu cevaplayamıyorum. Lütfen daha sonra tekrar deneyin.";

#[derive(Clone)]
pub struct Assistant {
    retrieval: RetrievalService,
    synthesizer: Arc<dyn AnswerSynthesizer>,
    database: Database,
}

impl Assistant {
    #[inline]
    pub fn new(
        retrieval: RetrievalService,
        synthesizer: Arc<dyn AnswerSynthesizer>,
        database: Database,
    ) -> Self {
        Self {
            retrieval,
            synthesizer,
            database,
        }
    }

    /// Answer a question from the indexed corpus and record the exchange.
    /// A missing `session_id` starts a new conversation.
    #[inline]
    pub async fn ask(&self, question: &str, session_id: Option<String>) -> Result<ChatSession> {
        let top_k = self.retrieval.options().top_k;
        let context_chunks = self.retrieval.find_similar_chunks(question, top_k);

        let answer = if context_chunks.is_empty() {
            info!("No context retrieved, answering with the not-found message");
            NO_CONTEXT_ANSWER.to_string()
        } else {
            match self
                .synthesizer
                .synthesize(question, &context_chunks)
                .await
            {
                Ok(answer) => answer,
                Err(e) => {
                    warn!("Answer synthesis failed: {}", e);
                    SYNTHESIS_FALLBACK_ANSWER.to_string()
                }
            }
        };

        let source_documents = if context_chunks.is_empty() {
            Vec::new()
        } else {
            self.database
                .find_document_ids_by_chunk_contents(&context_chunks)
                .await?
        };

        let session = self
            .database
            .create_chat_session(NewChatSession {
                session_id: session_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                question: question.to_string(),
                answer,
                context_chunks,
                source_documents,
            })
            .await?;

        Ok(session)
    }
}
