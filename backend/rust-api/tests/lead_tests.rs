mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{create_test_app, create_test_app_with, post_json, send};
use propertybot_api::config::Config;
use serde_json::{json, Value};

fn owner_body(phone: &str) -> Value {
    json!({
        "customerName": "Asha Rao",
        "customerEmail": "",
        "customerPhoneNumber": phone,
        "source": "WhatsAppChat",
        "countryId": 1,
        "requirementType": 0,
        "listingType": "1",
        "cityId": 12,
        "userType": "OWNER"
    })
}

fn owner_request(api_key: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/SecondaryPortal/ownerRegistration")
        .header("content-type", "application/json");
    if let Some(key) = api_key {
        builder = builder.header("api_key", key);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_submit_property_success() {
    let app = create_test_app();

    let (status, body) = post_json(
        &app.router,
        "/submit",
        json!({
            "userType": "Owner",
            "listingType": "Rent",
            "city": "Pune",
            "name": "Asha Rao",
            "number": "9876543210"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "status": "success", "message": "Data submitted successfully" })
    );
    let listings = app.store.listings();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].name, "Asha Rao");
}

#[tokio::test]
async fn test_submit_property_validation_names_field() {
    let app = create_test_app();

    let (status, body) = post_json(
        &app.router,
        "/submit",
        json!({
            "userType": "Landlord",
            "listingType": "Sale",
            "city": "Pune",
            "name": "Asha Rao",
            "number": "9876543210"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("userType must be Owner or Agent"));
    assert!(app.store.listings().is_empty());
}

#[tokio::test]
async fn test_owner_registration_success_returns_lead_id() {
    let app = create_test_app();

    let (status, body) = send(
        &app.router,
        owner_request(Some("test-api-key"), &owner_body("91-9876543210")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 1);
    let lead_id = body["leadId"].as_str().unwrap();
    assert!(uuid::Uuid::parse_str(lead_id).is_ok());

    let stored = app.store.owner_registrations();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].lead_id, lead_id);
    assert_eq!(stored[0].customer_email, None);
}

#[tokio::test]
async fn test_owner_registration_accepts_x_api_key_header() {
    let app = create_test_app();

    let (status, _) = send(
        &app.router,
        Request::builder()
            .method("POST")
            .uri("/api/SecondaryPortal/ownerRegistration")
            .header("content-type", "application/json")
            .header("x-api-key", "test-api-key")
            .body(Body::from(owner_body("91-9123456789").to_string()))
            .unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_owner_registration_bad_key_is_401() {
    let app = create_test_app();

    let (status, body) = send(
        &app.router,
        owner_request(Some("wrong"), &owner_body("91-9876543210")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid API key");

    let (status, _) = send(&app.router, owner_request(None, &owner_body("91-9876543210"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_owner_registration_without_configured_key_is_401() {
    let mut config = Config::for_tests();
    config.owner_registration_api_key = None;
    let app = create_test_app_with(config);

    let (status, _) = send(
        &app.router,
        owner_request(Some("test-api-key"), &owner_body("91-9876543210")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_owner_registration_invalid_phone_is_400() {
    let app = create_test_app();

    let (status, body) = send(
        &app.router,
        owner_request(Some("test-api-key"), &owner_body("9876543210")),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("91-XXXXXXXXXX"));
}

#[tokio::test]
async fn test_owner_registration_duplicate_phone_is_403() {
    let app = create_test_app();
    let body = owner_body("91-9876543210");

    let (status, _) = send(&app.router, owner_request(Some("test-api-key"), &body)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, response) = send(&app.router, owner_request(Some("test-api-key"), &body)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["message"], "Phone number already registered");
    assert_eq!(app.store.owner_registrations().len(), 1);
}
