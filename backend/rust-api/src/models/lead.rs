use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

lazy_static! {
    static ref MOBILE_NUMBER_REGEX: Regex = Regex::new(r"^[6-9][0-9]{9}$").unwrap();
    static ref COUNTRY_PREFIXED_PHONE_REGEX: Regex = Regex::new(r"^91-[6-9][0-9]{9}$").unwrap();
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
    static ref PERSON_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z][A-Za-z .'\-]*$").unwrap();
}

/// Body of `POST /submit`.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PropertyData {
    #[validate(custom(function = "validate_user_type"))]
    pub user_type: String,
    #[validate(custom(function = "validate_listing_type"))]
    pub listing_type: String,
    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,
    #[validate(
        length(min = 2, max = 50, message = "Name must be 2-50 characters"),
        custom(function = "validate_person_name")
    )]
    pub name: String,
    #[validate(custom(function = "validate_mobile_number"))]
    pub number: String,
}

/// Stored in `property_listing`. `submission_id` is fixed before the first
/// insert attempt so a retried insert cannot create a second document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyListing {
    #[serde(rename = "_id")]
    pub submission_id: String,
    #[serde(rename = "userType")]
    pub user_type: String,
    #[serde(rename = "listingType")]
    pub listing_type: String,
    pub city: String,
    pub name: String,
    pub number: String,
    pub created_at: DateTime<Utc>,
}

impl PropertyListing {
    pub fn from_submission(data: PropertyData, submission_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            submission_id,
            user_type: data.user_type,
            listing_type: data.listing_type,
            city: data.city.trim().to_string(),
            name: data.name.trim().to_string(),
            number: data.number,
            created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Body of `POST /api/SecondaryPortal/ownerRegistration`.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRegistrationRequest {
    #[validate(
        length(min = 2, max = 50, message = "Name must be 2-50 characters"),
        custom(function = "validate_person_name")
    )]
    pub customer_name: String,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub customer_email: String,
    #[validate(custom(function = "validate_country_prefixed_phone"))]
    pub customer_phone_number: String,
    #[validate(length(min = 1, message = "Source is required"))]
    pub source: String,
    pub country_id: i64,
    #[serde(default)]
    pub requirement_type: i64,
    #[validate(custom(function = "validate_listing_code"))]
    pub listing_type: String,
    #[validate(range(min = 1, message = "cityId must be positive"))]
    pub city_id: i64,
    #[validate(custom(function = "validate_user_type_code"))]
    pub user_type: String,
}

/// Stored in `owner_registrations`, keyed by the generated lead id. A unique
/// index on `customerPhoneNumber` backs the duplicate check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRegistrationRecord {
    #[serde(rename = "_id")]
    pub lead_id: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone_number: String,
    pub source: String,
    pub country_id: i64,
    pub requirement_type: i64,
    pub listing_type: String,
    pub city_id: i64,
    pub user_type: String,
    #[serde(rename = "created_at")]
    pub created_at: DateTime<Utc>,
}

impl OwnerRegistrationRecord {
    pub fn new(req: OwnerRegistrationRequest, lead_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            lead_id,
            customer_name: req.customer_name.trim().to_string(),
            customer_email: Some(req.customer_email.trim().to_string()).filter(|e| !e.is_empty()),
            customer_phone_number: req.customer_phone_number,
            source: req.source,
            country_id: req.country_id,
            requirement_type: req.requirement_type,
            listing_type: req.listing_type,
            city_id: req.city_id,
            user_type: req.user_type,
            created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerRegistrationResponse {
    pub status: u8,
    pub message: &'static str,
    pub lead_id: String,
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

fn validate_user_type(value: &str) -> Result<(), ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "owner" | "agent" => Ok(()),
        _ => Err(invalid("user_type", "userType must be Owner or Agent")),
    }
}

fn validate_listing_type(value: &str) -> Result<(), ValidationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "sale" | "rent" => Ok(()),
        _ => Err(invalid("listing_type", "listingType must be Sale or Rent")),
    }
}

fn validate_user_type_code(value: &str) -> Result<(), ValidationError> {
    match value {
        "OWNER" | "AGENT" => Ok(()),
        _ => Err(invalid("user_type", "userType must be OWNER or AGENT")),
    }
}

fn validate_listing_code(value: &str) -> Result<(), ValidationError> {
    match value {
        "1" | "2" => Ok(()),
        _ => Err(invalid("listing_type", "listingType must be \"1\" (sale) or \"2\" (rent)")),
    }
}

fn validate_person_name(value: &str) -> Result<(), ValidationError> {
    if PERSON_NAME_REGEX.is_match(value.trim()) {
        Ok(())
    } else {
        Err(invalid("name", "Name may only contain letters and spaces"))
    }
}

fn validate_optional_email(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.is_empty() || EMAIL_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(invalid("email", "Invalid email format"))
    }
}

fn validate_mobile_number(value: &str) -> Result<(), ValidationError> {
    if MOBILE_NUMBER_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(invalid(
            "number",
            "Phone number must be 10 digits starting with 6-9",
        ))
    }
}

fn validate_country_prefixed_phone(value: &str) -> Result<(), ValidationError> {
    if COUNTRY_PREFIXED_PHONE_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(invalid(
            "phone",
            "Phone number must look like 91-XXXXXXXXXX starting with 6-9",
        ))
    }
}
