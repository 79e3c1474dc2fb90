mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{create_test_app, post_json, send};
use propertybot_api::llm::LlmError;
use serde_json::json;

#[tokio::test]
async fn test_chat_returns_html_without_fences() {
    let app = create_test_app();
    app.generator
        .push_reply("```html\n<p>Average rents in Pune are rising.</p>\n```");

    let (status, body) = post_json(
        &app.router,
        "/api/chat",
        json!({ "message": "Rents in Pune?", "city": "Pune", "user_id": "chat-user-1" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["response"], "<p>Average rents in Pune are rising.</p>");

    let request = &app.generator.requests()[0];
    assert!(request.prompt.ends_with("User Query: Rents in Pune?"));
    assert!(request.grounded_search);
}

#[tokio::test]
async fn test_chat_history_is_capped_at_ten() {
    let app = create_test_app();

    for i in 0..12 {
        app.generator.push_reply("ok");
        let (status, _) = post_json(
            &app.router,
            "/api/chat",
            json!({ "message": format!("question {}", i), "user_id": "chat-user-2" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let history = app.store.history("chat-user-2");
    assert_eq!(history.len(), 10);
    assert_eq!(history[0].question, "question 2");
    assert_eq!(history[9].question, "question 11");

    // The last prompt saw the ten questions before it.
    let last = app.generator.requests().pop().unwrap();
    let context = last.system_instruction.unwrap();
    assert!(context.contains("Previous Question: question 1\n"));
    assert!(!context.contains("Previous Question: question 11"));
}

#[tokio::test]
async fn test_phone_header_identifies_chat_user() {
    let app = create_test_app();
    app.generator.push_reply("ok");

    let (status, _) = send(
        &app.router,
        Request::builder()
            .method("POST")
            .uri("/api/chat")
            .header("content-type", "application/json")
            .header("x-user-phone", "9876543210")
            .body(Body::from(json!({ "message": "hi" }).to_string()))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.store.history("9876543210").len(), 1);
}

#[tokio::test]
async fn test_anonymous_chat_is_answered_without_history() {
    let app = create_test_app();
    app.generator.push_reply("ok");
    app.generator.push_reply("ok");

    post_json(&app.router, "/api/chat", json!({ "message": "first" })).await;
    let (status, _) = post_json(&app.router, "/api/chat", json!({ "message": "second" })).await;

    assert_eq!(status, StatusCode::OK);
    assert!(app.store.history("anonymous").is_empty());
    let second = &app.generator.requests()[1];
    assert!(second
        .system_instruction
        .as_deref()
        .unwrap()
        .contains("No previous questions."));
}

#[tokio::test]
async fn test_generator_failure_is_500_with_error_key() {
    let app = create_test_app();
    app.generator.push_error(LlmError::Api {
        status: 429,
        message: "quota".into(),
    });

    let (status, body) = post_json(
        &app.router,
        "/api/chat",
        json!({ "message": "hi", "user_id": "chat-user-3" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Error generating chat response"));
    // The question is still remembered.
    assert_eq!(app.store.history("chat-user-3").len(), 1);
}

#[tokio::test]
async fn test_chat_without_message_is_400() {
    let app = create_test_app();

    let (status, body) = post_json(&app.router, "/api/chat", json!({ "city": "Pune" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Failed to parse JSON request body"));
}
