// FAQ module
// Mines frequently asked questions from chat history: normalizes question
// text, groups duplicates, ranks by frequency, and upserts the result into
// the FAQ store.


use std::collections::BTreeMap;

use anyhow::Result;
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info};

use crate::store::{Database, NewFaqItem};

/// How many chat sessions (oldest first) one mining run reads
const ANALYSIS_WINDOW: i64 = 1000;
/// How many literal variants to keep per FAQ entry
const MAX_SIMILAR_QUESTIONS: usize = 5;
/// How many questions the analytics report lists
const TOP_QUESTION_COUNT: usize = 10;

pub const DEFAULT_CATEGORY: &str = "Genel";

/// First matching keyword decides the category; the table is checked top to
/// bottom.
const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "İnsan Kaynakları",
        &[
            "izin", "maaş", "bordro", "mesai", "personel", "işe alım", "özlük", "avans",
        ],
    ),
    (
        "Prosedürler",
        &["prosedür", "süreç", "adım", "onay", "talimat", "yönetmelik"],
    ),
    (
        "Formlar ve Dokümanlar",
        &["form", "belge", "doküman", "şablon", "rapor"],
    ),
    (
        "Bilgi Teknolojileri",
        &["sistem", "şifre", "e-posta", "bilgisayar", "yazılım", "erişim"],
    ),
];

/// All sessions that asked the same question, modulo case and punctuation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionGroup {
    pub count: usize,
    /// Literal question strings in chronological order
    pub original_questions: Vec<String>,
    pub session_ids: Vec<String>,
    /// Answer of the first chronologically recorded session
    pub first_answer: String,
}

/// FAQ entry produced by one mining run, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFaq {
    pub question: String,
    pub answer: String,
    pub category: String,
    pub frequency: i64,
    pub similar_questions: Vec<String>,
    pub source_session_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStats {
    pub inserted: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaqAnalytics {
    pub total_questions_analyzed: usize,
    pub total_chat_sessions: usize,
    pub top_questions: Vec<TopQuestion>,
    pub category_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopQuestion {
    pub question: String,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct FaqMiner {
    database: Database,
}

impl FaqMiner {
    #[inline]
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Group chat history by normalized question text. Keys are normalized
    /// questions; groups keep their literals in chronological order.
    #[inline]
    pub async fn analyze_frequency(&self) -> Result<BTreeMap<String, QuestionGroup>> {
        let sessions = self
            .database
            .list_chat_sessions_chronological(ANALYSIS_WINDOW)
            .await?;

        let mut groups: BTreeMap<String, QuestionGroup> = BTreeMap::new();

        for session in sessions {
            let normalized = normalize_question(&session.question);
            if normalized.is_empty() {
                continue;
            }

            groups
                .entry(normalized)
                .and_modify(|group| {
                    group.count += 1;
                    group.original_questions.push(session.question.clone());
                    group.session_ids.push(session.id.clone());
                })
                .or_insert_with(|| QuestionGroup {
                    count: 1,
                    original_questions: vec![session.question.clone()],
                    session_ids: vec![session.id.clone()],
                    first_answer: session.answer.clone(),
                });
        }

        debug!("Frequency analysis produced {} question groups", groups.len());
        Ok(groups)
    }

    /// Derive the ranked FAQ list. Pure function of chat history and the
    /// parameters: unchanged history yields identical output.
    #[inline]
    pub async fn generate(
        &self,
        min_frequency: usize,
        max_items: usize,
    ) -> Result<Vec<GeneratedFaq>> {
        let groups = self.analyze_frequency().await?;

        let items: Vec<GeneratedFaq> = groups
            .into_iter()
            .filter(|(_, group)| group.count >= min_frequency)
            .sorted_by(|(key_a, group_a), (key_b, group_b)| {
                group_b.count.cmp(&group_a.count).then(key_a.cmp(key_b))
            })
            .take(max_items)
            .map(|(_, group)| {
                let question = group.original_questions[0].clone();
                let category = categorize_question(&question).to_string();
                let similar_questions: Vec<String> = group
                    .original_questions
                    .iter()
                    .skip(1)
                    .filter(|q| **q != question)
                    .unique()
                    .take(MAX_SIMILAR_QUESTIONS)
                    .cloned()
                    .collect();

                GeneratedFaq {
                    question,
                    answer: group.first_answer,
                    category,
                    frequency: group.count as i64,
                    similar_questions,
                    source_session_ids: group.session_ids,
                }
            })
            .collect();

        info!("Generated {} FAQ entries", items.len());
        Ok(items)
    }

    /// Upsert generated entries into the FAQ store, keyed on the exact
    /// question text. Existing items only get their mining-derived fields
    /// refreshed, so manual edits survive regeneration.
    #[inline]
    pub async fn sync_to_store(&self, items: &[GeneratedFaq]) -> Result<SyncStats> {
        let mut stats = SyncStats::default();

        for item in items {
            match self
                .database
                .get_faq_item_by_question(&item.question)
                .await?
            {
                Some(existing) => {
                    self.database
                        .update_faq_mining_fields(
                            &existing.id,
                            item.frequency,
                            &item.source_session_ids,
                        )
                        .await?;
                    stats.updated += 1;
                }
                None => {
                    self.database
                        .insert_faq_item(NewFaqItem {
                            question: item.question.clone(),
                            answer: item.answer.clone(),
                            category: item.category.clone(),
                            frequency: item.frequency,
                            similar_questions: item.similar_questions.clone(),
                            source_session_ids: item.source_session_ids.clone(),
                        })
                        .await?;
                    stats.inserted += 1;
                }
            }
        }

        info!(
            "FAQ sync complete: {} inserted, {} updated",
            stats.inserted, stats.updated
        );
        Ok(stats)
    }

    /// Summary statistics over the analyzed history
    #[inline]
    pub async fn analytics(&self) -> Result<FaqAnalytics> {
        let groups = self.analyze_frequency().await?;

        let total_chat_sessions = groups.values().map(|g| g.count).sum();

        let top_questions: Vec<TopQuestion> = groups
            .iter()
            .sorted_by(|(key_a, group_a), (key_b, group_b)| {
                group_b.count.cmp(&group_a.count).then(key_a.cmp(key_b))
            })
            .take(TOP_QUESTION_COUNT)
            .map(|(_, group)| TopQuestion {
                question: group.original_questions[0].clone(),
                count: group.count,
            })
            .collect();

        let mut category_distribution: BTreeMap<String, usize> = BTreeMap::new();
        for group in groups.values() {
            let category = categorize_question(&group.original_questions[0]);
            *category_distribution.entry(category.to_string()).or_insert(0) += group.count;
        }

        Ok(FaqAnalytics {
            total_questions_analyzed: groups.len(),
            total_chat_sessions,
            top_questions,
            category_distribution,
        })
    }
}

/// Lowercase with Turkish casing rules: dotted capital İ maps to i, dotless
/// capital I maps to ı. The standard Unicode lowering would leave a
/// combining mark behind for İ and break substring matching.
#[inline]
pub fn turkish_lowercase(text: &str) -> String {
    let mut lowered = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            'İ' => lowered.push('i'),
            'I' => lowered.push('ı'),
            c => lowered.extend(c.to_lowercase()),
        }
    }
    lowered
}

/// Canonical form used to decide that two questions are "the same":
/// lowercased, `?` `.` `,` stripped, internal whitespace collapsed.
#[inline]
pub fn normalize_question(question: &str) -> String {
    let lowered = turkish_lowercase(question);
    let stripped: String = lowered
        .chars()
        .filter(|c| *c != '?' && *c != '.' && *c != ',')
        .collect();

    stripped.split_whitespace().join(" ")
}

/// First matching category from the keyword table; `DEFAULT_CATEGORY` when
/// nothing matches
#[inline]
pub fn categorize_question(question: &str) -> &'static str {
    let lowered = turkish_lowercase(question);

    for (category, keywords) in CATEGORY_KEYWORDS {
        if keywords.iter().any(|keyword| lowered.contains(keyword)) {
            return category;
        }
    }

    DEFAULT_CATEGORY
}
