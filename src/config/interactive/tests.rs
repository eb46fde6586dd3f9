use super::*;

#[test]
fn connection_test_handles_unreachable_server() {
    let embedding = EmbeddingConfig {
        host: "127.0.0.1".to_string(),
        // reserved port, nothing should be listening
        port: 9,
        ..EmbeddingConfig::default()
    };

    let reachable = test_server_connection(&embedding).expect("probe should not error");

    assert!(!reachable);
}
