use propertybot_api::config::GeminiConfig;
use propertybot_api::llm::{GeminiClient, GenerationRequest, Generator, LlmError};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GeminiClient {
    let config = GeminiConfig {
        api_key: Some("key-123".to_string()),
        model: "gemini-test".to_string(),
        base_url: server.uri(),
        timeout_secs: 5,
    };
    GeminiClient::new(&config, "key-123".to_string()).unwrap()
}

fn request() -> GenerationRequest {
    GenerationRequest {
        system_instruction: Some("be brief".to_string()),
        prompt: "Rents in Pune?".to_string(),
        temperature: 0.7,
        max_output_tokens: 8192,
        grounded_search: true,
    }
}

#[tokio::test]
async fn test_generate_joins_candidate_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-test:generateContent"))
        .and(header("x-goog-api-key", "key-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "<p>Rents " }, { "text": "are up.</p>" }] }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let text = client_for(&server).generate(request()).await.unwrap();
    assert_eq!(text, "<p>Rents are up.</p>");

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["contents"][0]["parts"][0]["text"], "Rents in Pune?");
    assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be brief");
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
    assert!(body["tools"][0].get("google_search").is_some());
}

#[tokio::test]
async fn test_api_error_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let err = client_for(&server).generate(request()).await.unwrap_err();
    match err {
        LlmError::Api { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "quota exceeded");
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_candidates_are_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = client_for(&server).generate(request()).await.unwrap_err();
    assert!(matches!(err, LlmError::EmptyResponse));
}
