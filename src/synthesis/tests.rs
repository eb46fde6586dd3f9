use super::*;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn synthesizer_for(server_uri: &str) -> OllamaSynthesizer {
    let url = Url::parse(server_uri).expect("mock server uri should parse");
    let embedding = EmbeddingConfig {
        protocol: url.scheme().to_string(),
        host: url.host_str().expect("mock server has a host").to_string(),
        port: url.port().expect("mock server has a port"),
        ..EmbeddingConfig::default()
    };
    let synthesis = SynthesisConfig {
        model: "test-answer".to_string(),
        max_tokens: 256,
        enabled: true,
    };

    OllamaSynthesizer::new(&embedding, &synthesis).expect("synthesizer should build")
}

#[test]
fn prompt_contains_context_and_question() {
    let prompt = OllamaSynthesizer::build_prompt(
        "İzin nasıl alınır?",
        &[
            "izin talebi formu doldurulur".to_string(),
            "yönetici onayı gerekir".to_string(),
        ],
    );

    assert!(prompt.contains("izin talebi formu doldurulur"));
    assert!(prompt.contains("yönetici onayı gerekir"));
    assert!(prompt.contains("Soru: İzin nasıl alınır?"));
}

#[tokio::test(flavor = "multi_thread")]
async fn synthesize_returns_model_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(
            serde_json::json!({"model": "test-answer", "stream": false}),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "response": "  İzin talebi formu doldurularak yöneticiye iletilir.  "
        })))
        .mount(&server)
        .await;

    let synthesizer = synthesizer_for(&server.uri());

    let answer = synthesizer
        .synthesize(
            "İzin nasıl alınır?",
            &["izin talebi formu doldurulur".to_string()],
        )
        .await
        .expect("synthesize should succeed");

    assert_eq!(answer, "İzin talebi formu doldurularak yöneticiye iletilir.");
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_reports_request_error() {
    let synthesizer = synthesizer_for("http://127.0.0.1:9");

    let result = synthesizer.synthesize("soru", &["bağlam".to_string()]).await;

    assert!(matches!(result, Err(SynthesisError::Request(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_body_reports_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let synthesizer = synthesizer_for(&server.uri());

    let result = synthesizer.synthesize("soru", &["bağlam".to_string()]).await;

    assert!(matches!(result, Err(SynthesisError::InvalidResponse(_))));
}
