use super::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::EmbeddingConfig;

fn config_for(server_uri: &str, dimension: u32) -> EmbeddingConfig {
    let url = Url::parse(server_uri).expect("mock server uri should parse");
    EmbeddingConfig {
        protocol: url.scheme().to_string(),
        host: url.host_str().expect("mock server has a host").to_string(),
        port: url.port().expect("mock server has a port"),
        model: "test-embed".to_string(),
        batch_size: 16,
        embedding_dimension: dimension,
    }
}

fn client_for(server_uri: &str, dimension: u32) -> EmbeddingClient {
    EmbeddingClient::new(&config_for(server_uri, dimension))
        .expect("client should build from valid config")
        .with_retry_attempts(1)
}

#[test]
fn empty_input_is_rejected() {
    let config = config_for("http://localhost:11434", 3);
    let client = EmbeddingClient::new(&config).expect("client should build");

    let result = client.embed_batch(&[]);

    assert!(matches!(result, Err(EmbeddingError::EmptyInput)));
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_batch_returns_vectors_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), 3);
    let texts = vec!["izin prosedürü".to_string(), "mesai saatleri".to_string()];

    let vectors = tokio::task::spawn_blocking(move || client.embed_batch(&texts))
        .await
        .expect("task should join")
        .expect("embed_batch should succeed");

    assert_eq!(vectors, vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]]);
}

#[tokio::test(flavor = "multi_thread")]
async fn embed_one_unwraps_single_vector() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embeddings": [[1.0, 0.0, 0.0]]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), 3);

    let vector = tokio::task::spawn_blocking(move || client.embed_one("soru"))
        .await
        .expect("task should join")
        .expect("embed_one should succeed");

    assert_eq!(vector, vec![1.0, 0.0, 0.0]);
}

#[tokio::test(flavor = "multi_thread")]
async fn unexpected_dimension_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embeddings": [[0.1, 0.2, 0.3]]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), 4);

    let result = tokio::task::spawn_blocking(move || client.embed_one("soru"))
        .await
        .expect("task should join");

    assert!(matches!(
        result,
        Err(EmbeddingError::DimensionMismatch {
            expected: 4,
            actual: 3,
        })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn count_mismatch_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embeddings": [[0.1, 0.2, 0.3]]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), 3);
    let texts = vec!["bir".to_string(), "iki".to_string()];

    let result = tokio::task::spawn_blocking(move || client.embed_batch(&texts))
        .await
        .expect("task should join");

    assert!(matches!(result, Err(EmbeddingError::InvalidResponse(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), 3).with_retry_attempts(3);

    let result = tokio::task::spawn_blocking(move || client.embed_one("soru"))
        .await
        .expect("task should join");

    assert!(matches!(result, Err(EmbeddingError::Request(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn validate_model_accepts_listed_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [{"name": "test-embed", "size": 1024, "digest": "abc"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), 3);

    let result = tokio::task::spawn_blocking(move || client.validate_model())
        .await
        .expect("task should join");

    assert!(result.is_ok());
}

#[tokio::test(flavor = "multi_thread")]
async fn validate_model_rejects_missing_model() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "models": [{"name": "other-model"}]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server.uri(), 3);

    let result = tokio::task::spawn_blocking(move || client.validate_model())
        .await
        .expect("task should join");

    assert!(matches!(
        result,
        Err(EmbeddingError::ModelUnavailable { .. })
    ));
}
