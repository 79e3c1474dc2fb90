mod common;

use axum::http::StatusCode;
use common::{create_test_app_with, post_json};
use propertybot_api::config::Config;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(gateway: &MockServer) -> Config {
    let mut config = Config::for_tests();
    config.otp.base_url = gateway.uri();
    config
}

#[tokio::test]
async fn test_send_otp_forwards_body_and_passes_json_through() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/otp/send"))
        .and(body_json(json!({ "countryCode": "91", "mobile": "9876543210" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": true, "requestId": "r-42" })),
        )
        .expect(1)
        .mount(&gateway)
        .await;
    let app = create_test_app_with(config_for(&gateway));

    let (status, body) = post_json(
        &app.router,
        "/api/otp/send",
        json!({ "countryCode": "91", "mobile": "9876543210" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": true, "requestId": "r-42" }));
}

#[tokio::test]
async fn test_verify_otp_passes_upstream_error_status_through() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/otp/verify"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Invalid OTP" })),
        )
        .expect(1)
        .mount(&gateway)
        .await;
    let app = create_test_app_with(config_for(&gateway));

    let (status, body) = post_json(
        &app.router,
        "/api/otp/verify",
        json!({ "countryCode": "91", "mobile": "9876543210", "otp": "0000" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body, json!({ "message": "Invalid OTP" }));
}

#[tokio::test]
async fn test_plain_text_reply_is_wrapped_in_message() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/otp/send"))
        .respond_with(ResponseTemplate::new(200).set_body_string(""))
        .mount(&gateway)
        .await;
    let app = create_test_app_with(config_for(&gateway));

    let (status, body) = post_json(
        &app.router,
        "/api/otp/send",
        json!({ "countryCode": "91", "mobile": "9876543210" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "OTP sent successfully" }));
}

#[tokio::test]
async fn test_gateway_failure_is_not_retried() {
    let gateway = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/otp/send"))
        .respond_with(ResponseTemplate::new(503).set_body_string("gateway down"))
        .expect(1)
        .mount(&gateway)
        .await;
    let app = create_test_app_with(config_for(&gateway));

    let (status, body) = post_json(
        &app.router,
        "/api/otp/send",
        json!({ "countryCode": "91", "mobile": "9876543210" }),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body, json!({ "message": "gateway down" }));
}

#[tokio::test]
async fn test_unreachable_gateway_is_500() {
    let mut config = Config::for_tests();
    config.otp.base_url = "http://127.0.0.1:9".to_string();
    let app = create_test_app_with(config);

    let (status, body) = post_json(
        &app.router,
        "/api/otp/verify",
        json!({ "countryCode": "91", "mobile": "9876543210", "otp": "1234" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Error verifying OTP: "));
}
