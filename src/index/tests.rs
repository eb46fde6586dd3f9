use super::*;

fn entry(chunk_id: &str, text: &str, vector: Vec<f32>) -> ChunkEmbedding {
    ChunkEmbedding {
        chunk_id: chunk_id.to_string(),
        text: text.to_string(),
        vector,
    }
}

#[test]
fn empty_index_returns_no_results() {
    let index = VectorIndex::build(Vec::new()).expect("empty build should succeed");

    assert!(index.is_empty());
    assert_eq!(index.dimension(), 0);

    let hits = index.search(&[1.0, 0.0], 5).expect("search should succeed");
    assert!(hits.is_empty());
}

#[test]
fn identical_vector_scores_one() {
    let index = VectorIndex::build(vec![entry("c1", "kedi bir hayvandır", vec![3.0, 4.0])])
        .expect("build should succeed");

    let hits = index.search(&[3.0, 4.0], 1).expect("search should succeed");

    assert_eq!(hits.len(), 1);
    assert!((hits[0].score - 1.0).abs() < 1e-6);
}

#[test]
fn scores_are_within_cosine_bounds() {
    let index = VectorIndex::build(vec![
        entry("c1", "a", vec![1.0, 0.0, 0.0]),
        entry("c2", "b", vec![-1.0, 0.0, 0.0]),
        entry("c3", "c", vec![0.3, -0.7, 2.0]),
    ])
    .expect("build should succeed");

    let hits = index
        .search(&[0.5, 0.5, -0.5], 10)
        .expect("search should succeed");

    for hit in &hits {
        assert!(hit.score >= -1.0 - 1e-6 && hit.score <= 1.0 + 1e-6);
    }
}

#[test]
fn results_sorted_by_descending_score() {
    let index = VectorIndex::build(vec![
        entry("c1", "kedi bir hayvandır", vec![0.9, 0.1]),
        entry("c2", "köpek bir hayvandır", vec![0.8, 0.2]),
        entry("c3", "masa bir mobilyadır", vec![0.0, 1.0]),
    ])
    .expect("build should succeed");

    let hits = index.search(&[1.0, 0.0], 3).expect("search should succeed");

    assert_eq!(hits.len(), 3);
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    assert_eq!(hits[0].text, "kedi bir hayvandır");
    assert_eq!(hits[1].text, "köpek bir hayvandır");
    assert_eq!(hits[2].text, "masa bir mobilyadır");
}

#[test]
fn top_k_truncates() {
    let entries: Vec<ChunkEmbedding> = (0..20)
        .map(|i| entry(&format!("c{i}"), &format!("text {i}"), vec![i as f32, 1.0]))
        .collect();
    let index = VectorIndex::build(entries).expect("build should succeed");

    let hits = index.search(&[1.0, 0.0], 5).expect("search should succeed");

    assert_eq!(hits.len(), 5);
}

#[test]
fn equal_scores_keep_insertion_order() {
    let index = VectorIndex::build(vec![
        entry("first", "first", vec![1.0, 0.0]),
        entry("second", "second", vec![2.0, 0.0]),
        entry("third", "third", vec![0.0, 1.0]),
    ])
    .expect("build should succeed");

    // first and second normalize to the same unit vector
    let hits = index.search(&[1.0, 0.0], 3).expect("search should succeed");

    assert_eq!(hits[0].chunk_id, "first");
    assert_eq!(hits[1].chunk_id, "second");
}

#[test]
fn rebuild_with_same_corpus_gives_identical_results() {
    let entries = vec![
        entry("c1", "izin prosedürü", vec![0.2, 0.9, 0.1]),
        entry("c2", "mesai saatleri", vec![0.7, 0.1, 0.4]),
        entry("c3", "bordro bilgisi", vec![0.1, 0.1, 0.9]),
    ];

    let first = VectorIndex::build(entries.clone()).expect("build should succeed");
    let second = VectorIndex::build(entries).expect("build should succeed");

    let query = [0.3, 0.5, 0.2];
    assert_eq!(
        first.search(&query, 3).expect("search should succeed"),
        second.search(&query, 3).expect("search should succeed")
    );
}

#[test]
fn mixed_dimensions_are_rejected() {
    let result = VectorIndex::build(vec![
        entry("c1", "a", vec![1.0, 0.0]),
        entry("c2", "b", vec![1.0, 0.0, 0.0]),
    ]);

    assert_eq!(
        result.err(),
        Some(IndexError::DimensionMismatch {
            expected: 2,
            actual: 3,
        })
    );
}

#[test]
fn query_dimension_mismatch_is_rejected() {
    let index =
        VectorIndex::build(vec![entry("c1", "a", vec![1.0, 0.0])]).expect("build should succeed");

    let result = index.search(&[1.0, 0.0, 0.0], 1);

    assert!(result.is_err());
}

#[test]
fn zero_top_k_returns_nothing() {
    let index =
        VectorIndex::build(vec![entry("c1", "a", vec![1.0, 0.0])]).expect("build should succeed");

    let hits = index.search(&[1.0, 0.0], 0).expect("search should succeed");

    assert!(hits.is_empty());
}

#[test]
fn shared_index_publish_replaces_snapshot() {
    let shared = SharedIndex::new();
    assert!(shared.snapshot().is_empty());

    let index =
        VectorIndex::build(vec![entry("c1", "a", vec![1.0, 0.0])]).expect("build should succeed");
    shared.publish(index);

    assert_eq!(shared.snapshot().len(), 1);

    shared.publish(VectorIndex::default());
    assert!(shared.snapshot().is_empty());
}

#[test]
fn old_snapshot_survives_publish() {
    let shared = SharedIndex::new();
    shared.publish(
        VectorIndex::build(vec![entry("c1", "a", vec![1.0, 0.0])]).expect("build should succeed"),
    );

    let old = shared.snapshot();
    shared.publish(VectorIndex::default());

    // a reader holding the old snapshot still sees the old contents
    assert_eq!(old.len(), 1);
    assert!(shared.snapshot().is_empty());
}
