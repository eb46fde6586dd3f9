use super::*;
use crate::store::{Database, DocumentStatus};

fn new_document(id: &str, filename: &str) -> NewDocument {
    NewDocument {
        id: id.to_string(),
        filename: filename.to_string(),
        file_type: ".txt".to_string(),
        file_size: 128,
        content: "izin prosedürü onay süreci".to_string(),
    }
}

fn new_session(question: &str, answer: &str) -> NewChatSession {
    NewChatSession {
        session_id: "oturum-1".to_string(),
        question: question.to_string(),
        answer: answer.to_string(),
        context_chunks: vec!["bağlam".to_string()],
        source_documents: vec!["d1".to_string()],
    }
}

#[tokio::test]
async fn document_create_and_fetch() {
    let db = Database::in_memory().await.expect("can create database");

    let created = DocumentQueries::create(db.pool(), new_document("d1", "prosedur.txt"))
        .await
        .expect("can create document");

    assert_eq!(created.id, "d1");
    assert_eq!(created.status, DocumentStatus::Processing);
    assert!(!created.embeddings_ready);

    let fetched = DocumentQueries::get_by_id(db.pool(), "d1")
        .await
        .expect("can fetch document");
    assert_eq!(fetched, Some(created));
}

#[tokio::test]
async fn mark_embeddings_ready_completes_document() {
    let db = Database::in_memory().await.expect("can create database");
    DocumentQueries::create(db.pool(), new_document("d1", "prosedur.txt"))
        .await
        .expect("can create document");

    DocumentQueries::mark_embeddings_ready(db.pool(), "d1", 7)
        .await
        .expect("can mark ready");

    let doc = DocumentQueries::get_by_id(db.pool(), "d1")
        .await
        .expect("can fetch document")
        .expect("document exists");
    assert!(doc.embeddings_ready);
    assert_eq!(doc.status, DocumentStatus::Completed);
    assert_eq!(doc.chunk_count, 7);
    assert!(doc.processed_at.is_some());
}

#[tokio::test]
async fn mark_failed_records_error() {
    let db = Database::in_memory().await.expect("can create database");
    DocumentQueries::create(db.pool(), new_document("d1", "bozuk.txt"))
        .await
        .expect("can create document");

    DocumentQueries::mark_failed(db.pool(), "d1", "metin çıkarılamadı")
        .await
        .expect("can mark failed");

    let doc = DocumentQueries::get_by_id(db.pool(), "d1")
        .await
        .expect("can fetch document")
        .expect("document exists");
    assert!(doc.is_failed());
    assert_eq!(doc.error_message.as_deref(), Some("metin çıkarılamadı"));
}

#[tokio::test]
async fn deleting_document_cascades_to_chunks() {
    let db = Database::in_memory().await.expect("can create database");
    DocumentQueries::create(db.pool(), new_document("d1", "prosedur.txt"))
        .await
        .expect("can create document");
    ChunkQueries::insert_for_document(
        db.pool(),
        "d1",
        &["birinci parça".to_string(), "ikinci parça".to_string()],
    )
    .await
    .expect("can insert chunks");

    assert_eq!(
        ChunkQueries::count(db.pool()).await.expect("can count"),
        2
    );

    let deleted = DocumentQueries::delete(db.pool(), "d1")
        .await
        .expect("can delete document");
    assert!(deleted);

    assert_eq!(
        ChunkQueries::count(db.pool()).await.expect("can count"),
        0
    );
}

#[tokio::test]
async fn embeddable_chunks_exclude_pending_documents() {
    let db = Database::in_memory().await.expect("can create database");

    DocumentQueries::create(db.pool(), new_document("hazir", "a.txt"))
        .await
        .expect("can create document");
    ChunkQueries::insert_for_document(db.pool(), "hazir", &["hazır parça".to_string()])
        .await
        .expect("can insert chunks");
    DocumentQueries::mark_embeddings_ready(db.pool(), "hazir", 1)
        .await
        .expect("can mark ready");

    DocumentQueries::create(db.pool(), new_document("bekleyen", "b.txt"))
        .await
        .expect("can create document");
    ChunkQueries::insert_for_document(db.pool(), "bekleyen", &["bekleyen parça".to_string()])
        .await
        .expect("can insert chunks");

    let embeddable = ChunkQueries::list_embeddable(db.pool())
        .await
        .expect("can list embeddable chunks");

    assert_eq!(embeddable.len(), 1);
    assert_eq!(embeddable[0].document_id, "hazir");
}

#[tokio::test]
async fn chunk_ordinals_follow_input_order() {
    let db = Database::in_memory().await.expect("can create database");
    DocumentQueries::create(db.pool(), new_document("d1", "prosedur.txt"))
        .await
        .expect("can create document");

    let texts: Vec<String> = (0..5).map(|i| format!("parça {i}")).collect();
    ChunkQueries::insert_for_document(db.pool(), "d1", &texts)
        .await
        .expect("can insert chunks");

    let chunks = ChunkQueries::list_for_document(db.pool(), "d1")
        .await
        .expect("can list chunks");

    let ordinals: Vec<i64> = chunks.iter().map(|c| c.ordinal).collect();
    assert_eq!(ordinals, vec![0, 1, 2, 3, 4]);
    assert_eq!(chunks[3].content, "parça 3");
}

#[tokio::test]
async fn find_documents_by_chunk_content() {
    let db = Database::in_memory().await.expect("can create database");
    for id in ["d1", "d2"] {
        DocumentQueries::create(db.pool(), new_document(id, "a.txt"))
            .await
            .expect("can create document");
    }
    ChunkQueries::insert_for_document(db.pool(), "d1", &["ortak metin".to_string()])
        .await
        .expect("can insert chunks");
    ChunkQueries::insert_for_document(
        db.pool(),
        "d2",
        &["ortak metin".to_string(), "sadece ikinci".to_string()],
    )
    .await
    .expect("can insert chunks");

    let ids = ChunkQueries::find_document_ids_by_contents(
        db.pool(),
        &["ortak metin".to_string(), "sadece ikinci".to_string()],
    )
    .await
    .expect("can find documents");

    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"d1".to_string()));
    assert!(ids.contains(&"d2".to_string()));
}

#[tokio::test]
async fn chat_sessions_round_trip_json_columns() {
    let db = Database::in_memory().await.expect("can create database");

    let created = ChatSessionQueries::create(
        db.pool(),
        new_session("İzin nasıl alınır?", "Formu doldurun."),
    )
    .await
    .expect("can create session");

    let recent = ChatSessionQueries::list_recent(db.pool(), 10)
        .await
        .expect("can list sessions");

    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0], created);
    assert_eq!(recent[0].context_chunks, vec!["bağlam".to_string()]);
}

#[tokio::test]
async fn chat_session_orderings() {
    let db = Database::in_memory().await.expect("can create database");
    for i in 0..4 {
        ChatSessionQueries::create(db.pool(), new_session(&format!("soru {i}"), "cevap"))
            .await
            .expect("can create session");
    }

    let chronological = ChatSessionQueries::list_chronological(db.pool(), 10)
        .await
        .expect("can list chronological");
    let questions: Vec<&str> = chronological.iter().map(|s| s.question.as_str()).collect();
    assert_eq!(questions, vec!["soru 0", "soru 1", "soru 2", "soru 3"]);

    let recent = ChatSessionQueries::list_recent(db.pool(), 2)
        .await
        .expect("can list recent");
    let questions: Vec<&str> = recent.iter().map(|s| s.question.as_str()).collect();
    assert_eq!(questions, vec!["soru 3", "soru 2"]);
}

#[tokio::test]
async fn faq_insert_and_lookup_by_question() {
    let db = Database::in_memory().await.expect("can create database");

    let item = FaqQueries::insert(
        db.pool(),
        NewFaqItem {
            question: "İzin nasıl alınır?".to_string(),
            answer: "Formu doldurun.".to_string(),
            category: "İnsan Kaynakları".to_string(),
            frequency: 3,
            similar_questions: vec!["izin nasıl alınır".to_string()],
            source_session_ids: vec!["s1".to_string(), "s2".to_string()],
        },
    )
    .await
    .expect("can insert FAQ item");

    assert!(item.is_active);

    let found = FaqQueries::get_by_question(db.pool(), "İzin nasıl alınır?")
        .await
        .expect("can query FAQ item");
    assert_eq!(found, Some(item));

    let missing = FaqQueries::get_by_question(db.pool(), "Bilinmeyen soru")
        .await
        .expect("can query FAQ item");
    assert!(missing.is_none());
}

#[tokio::test]
async fn faq_mining_update_preserves_category_and_answer() {
    let db = Database::in_memory().await.expect("can create database");

    let item = FaqQueries::insert(
        db.pool(),
        NewFaqItem {
            question: "Mesai saatleri nedir?".to_string(),
            answer: "09:00 - 18:00".to_string(),
            category: "Çalışma Düzeni".to_string(),
            frequency: 2,
            similar_questions: vec![],
            source_session_ids: vec!["s1".to_string()],
        },
    )
    .await
    .expect("can insert FAQ item");

    FaqQueries::update_mining_fields(
        db.pool(),
        &item.id,
        5,
        &["s1".to_string(), "s2".to_string(), "s3".to_string()],
    )
    .await
    .expect("can update mining fields");

    let updated = FaqQueries::get_by_question(db.pool(), "Mesai saatleri nedir?")
        .await
        .expect("can query FAQ item")
        .expect("item exists");

    assert_eq!(updated.frequency, 5);
    assert_eq!(updated.source_session_ids.len(), 3);
    // untouched by mining updates
    assert_eq!(updated.answer, "09:00 - 18:00");
    assert_eq!(updated.category, "Çalışma Düzeni");
    assert!(updated.updated_at >= item.updated_at);
}

#[tokio::test]
async fn active_faq_listing_filters_by_category() {
    let db = Database::in_memory().await.expect("can create database");
    for (question, category) in [
        ("İzin nasıl alınır?", "İnsan Kaynakları"),
        ("Sunucuya nasıl bağlanılır?", "Bilgi Teknolojileri"),
    ] {
        FaqQueries::insert(
            db.pool(),
            NewFaqItem {
                question: question.to_string(),
                answer: "cevap".to_string(),
                category: category.to_string(),
                frequency: 1,
                similar_questions: vec![],
                source_session_ids: vec![],
            },
        )
        .await
        .expect("can insert FAQ item");
    }

    let all = FaqQueries::list_active(db.pool(), None)
        .await
        .expect("can list active items");
    assert_eq!(all.len(), 2);

    let hr_only = FaqQueries::list_active(db.pool(), Some("İnsan Kaynakları"))
        .await
        .expect("can list active items");
    assert_eq!(hr_only.len(), 1);
    assert_eq!(hr_only[0].question, "İzin nasıl alınır?");
}
