// Suggestion module
// Autocomplete-style question suggestions from three sources: semantically
// similar past questions, substring matches over recent history, and
// templated follow-ups grounded in retrieved chunks.


use anyhow::Result;
use itertools::Itertools;
use serde::Serialize;
use tracing::debug;

use crate::retrieval::RetrievalService;
use crate::store::Database;

/// Minimum query length before suggestions are attempted
const MIN_PARTIAL_CHARS: usize = 3;
/// Similarity floor for the semantic source
const SEMANTIC_MIN_SIMILARITY: f32 = 0.4;
/// How many semantic candidates to request
const SEMANTIC_TOP_K: usize = 3;
/// Synthetic score assigned to substring matches
const PARTIAL_SIMILARITY: f32 = 0.8;
/// Synthetic score of the first generated template; each next one drops 0.1
const GENERATED_BASE_SIMILARITY: f32 = 0.7;
const GENERATED_MAX: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Similar,
    Partial,
    Generated,
}

impl SuggestionKind {
    #[inline]
    pub fn icon(self) -> &'static str {
        match self {
            SuggestionKind::Similar => "🔍",
            SuggestionKind::Partial => "💬",
            SuggestionKind::Generated => "💡",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub text: String,
    pub similarity: f32,
    pub icon: &'static str,
}

impl Suggestion {
    fn new(kind: SuggestionKind, text: String, similarity: f32) -> Self {
        Self {
            kind,
            text,
            similarity,
            icon: kind.icon(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    retrieval: RetrievalService,
    database: Database,
}

impl SuggestionEngine {
    #[inline]
    pub fn new(retrieval: RetrievalService, database: Database) -> Self {
        Self {
            retrieval,
            database,
        }
    }

    /// Suggest up to `limit` questions for a partially typed query. Sources
    /// are consulted in priority order, each filling only the remaining
    /// budget; the final list is sorted by similarity descending.
    #[inline]
    pub async fn suggest(&self, partial: &str, limit: usize) -> Result<Vec<Suggestion>> {
        let partial = partial.trim();
        if partial.chars().count() < MIN_PARTIAL_CHARS || limit == 0 {
            return Ok(Vec::new());
        }

        let mut suggestions: Vec<Suggestion> = Vec::with_capacity(limit);

        self.collect_semantic(partial, limit, &mut suggestions)
            .await?;
        self.collect_substring(partial, limit, &mut suggestions)
            .await?;
        self.collect_generated(partial, limit, &mut suggestions);

        suggestions.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        suggestions.truncate(limit);

        debug!(
            "Produced {} suggestions for partial query '{}'",
            suggestions.len(),
            partial
        );

        Ok(suggestions)
    }

    async fn collect_semantic(
        &self,
        partial: &str,
        limit: usize,
        suggestions: &mut Vec<Suggestion>,
    ) -> Result<()> {
        if suggestions.len() >= limit {
            return Ok(());
        }

        let matches = self
            .retrieval
            .find_similar_past_questions(partial, SEMANTIC_MIN_SIMILARITY, SEMANTIC_TOP_K)
            .await?;

        let budget = limit - suggestions.len();
        suggestions.extend(matches.into_iter().take(budget).map(|m| {
            Suggestion::new(SuggestionKind::Similar, m.question, m.similarity)
        }));

        Ok(())
    }

    async fn collect_substring(
        &self,
        partial: &str,
        limit: usize,
        suggestions: &mut Vec<Suggestion>,
    ) -> Result<()> {
        if suggestions.len() >= limit {
            return Ok(());
        }

        let window = self.retrieval.options().recent_question_window as i64;
        let sessions = self.database.list_recent_chat_sessions(window).await?;
        let lowered_partial = partial.to_lowercase();

        let candidates = sessions
            .into_iter()
            .map(|s| s.question)
            .filter(|q| q.to_lowercase().contains(&lowered_partial))
            .unique_by(|q| q.to_lowercase());

        for question in candidates {
            if suggestions.len() >= limit {
                break;
            }
            let already_collected = suggestions
                .iter()
                .any(|s| s.text.to_lowercase() == question.to_lowercase());
            if !already_collected {
                suggestions.push(Suggestion::new(
                    SuggestionKind::Partial,
                    question,
                    PARTIAL_SIMILARITY,
                ));
            }
        }

        Ok(())
    }

    fn collect_generated(&self, partial: &str, limit: usize, suggestions: &mut Vec<Suggestion>) {
        if suggestions.len() >= limit {
            return;
        }

        let top_k = self.retrieval.options().top_k;
        if self.retrieval.find_similar_chunks(partial, top_k).is_empty() {
            return;
        }

        let templates = [
            format!("{partial} nedir?"),
            format!("{partial} nasıl yapılır?"),
            format!("{partial} hakkında detaylı bilgi verir misiniz?"),
        ];

        for (i, text) in templates.into_iter().take(GENERATED_MAX).enumerate() {
            if suggestions.len() >= limit {
                break;
            }
            let similarity = GENERATED_BASE_SIMILARITY - 0.1 * i as f32;
            suggestions.push(Suggestion::new(SuggestionKind::Generated, text, similarity));
        }
    }
}
