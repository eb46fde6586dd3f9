
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, Type};

/// An uploaded document and its extracted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub content: String,
    pub chunk_count: i64,
    pub status: DocumentStatus,
    pub embeddings_ready: bool,
    pub error_message: Option<String>,
    pub created_at: NaiveDateTime,
    pub processed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum DocumentStatus {
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for DocumentStatus {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            DocumentStatus::Processing => write!(f, "Processing"),
            DocumentStatus::Completed => write!(f, "Completed"),
            DocumentStatus::Failed => write!(f, "Failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub id: String,
    pub filename: String,
    pub file_type: String,
    pub file_size: i64,
    pub content: String,
}

/// One overlapping word-window of a document's text.
/// Immutable once created; deleted with its parent document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DocumentChunk {
    pub id: String,
    pub document_id: String,
    pub ordinal: i64,
    pub content: String,
}

/// One question/answer exchange, the append-only corpus for FAQ mining and
/// similar-question search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub session_id: String,
    pub question: String,
    pub answer: String,
    pub context_chunks: Vec<String>,
    pub source_documents: Vec<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewChatSession {
    pub session_id: String,
    pub question: String,
    pub answer: String,
    pub context_chunks: Vec<String>,
    pub source_documents: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqItem {
    pub id: String,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub frequency: i64,
    pub similar_questions: Vec<String>,
    pub source_session_ids: Vec<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFaqItem {
    pub question: String,
    pub answer: String,
    pub category: String,
    pub frequency: i64,
    pub similar_questions: Vec<String>,
    pub source_session_ids: Vec<String>,
}

impl Document {
    #[inline]
    pub fn is_completed(&self) -> bool {
        self.status == DocumentStatus::Completed
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        self.status == DocumentStatus::Failed
    }
}

fn decode_json_column(row: &SqliteRow, column: &str) -> Result<Vec<String>, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    serde_json::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

// context_chunks and source_documents are stored as JSON arrays in TEXT
// columns, so the row mapping is spelled out by hand.
impl<'r> FromRow<'r, SqliteRow> for ChatSession {
    #[inline]
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            question: row.try_get("question")?,
            answer: row.try_get("answer")?,
            context_chunks: decode_json_column(row, "context_chunks")?,
            source_documents: decode_json_column(row, "source_documents")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for FaqItem {
    #[inline]
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            question: row.try_get("question")?,
            answer: row.try_get("answer")?,
            category: row.try_get("category")?,
            frequency: row.try_get("frequency")?,
            similar_questions: decode_json_column(row, "similar_questions")?,
            source_session_ids: decode_json_column(row, "source_session_ids")?,
            is_active: row.try_get("is_active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
