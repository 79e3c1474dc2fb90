use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::config::{Config, TimeoutConfig};
use crate::error::{ApiError, StoreError};
use crate::models::lead::{
    OwnerRegistrationRecord, OwnerRegistrationRequest, PropertyData, PropertyListing,
};
use crate::store::{bounded, LeadStore};
use crate::utils::retry::{retry_with_policy, RetryPolicy};

const DB_TIMEOUT_MESSAGE: &str = "Database timeout - please try again later";
pub const DUPLICATE_PHONE_MESSAGE: &str = "Phone number already registered";
pub const INVALID_API_KEY_MESSAGE: &str = "Invalid API key";

pub struct LeadService {
    store: Arc<dyn LeadStore>,
    timeouts: TimeoutConfig,
    retry: RetryPolicy,
    owner_api_key: Option<String>,
}

impl LeadService {
    pub fn new(store: Arc<dyn LeadStore>, config: &Config) -> Self {
        Self {
            store,
            timeouts: config.timeouts.clone(),
            retry: RetryPolicy::fixed(
                config.retry.max_attempts,
                Duration::from_millis(config.retry.write_delay_ms),
            ),
            owner_api_key: config.owner_registration_api_key.clone(),
        }
    }

    /// Validates and stores one property listing lead.
    pub async fn submit_listing(&self, data: PropertyData) -> Result<(), ApiError> {
        data.validate()?;

        // The id is fixed before the first attempt so a retried insert after an
        // ambiguous timeout lands on the same document.
        let listing = PropertyListing::from_submission(data, Uuid::new_v4().to_string(), Utc::now());
        let deadline = self.timeouts.write();

        retry_with_policy(&self.retry, "listing.insert", || {
            bounded("listing.insert", deadline, self.store.insert_listing(&listing))
        })
        .await
        .map_err(|e| ApiError::from_store(e, DB_TIMEOUT_MESSAGE, "Error submitting data"))?;

        tracing::info!(
            "Property listing {} submitted for {} ({})",
            listing.submission_id,
            listing.city,
            listing.listing_type
        );
        Ok(())
    }

    /// Registers an owner lead and returns the generated lead id.
    pub async fn register_owner(
        &self,
        api_key: Option<&str>,
        request: OwnerRegistrationRequest,
    ) -> Result<String, ApiError> {
        match (self.owner_api_key.as_deref(), api_key) {
            (Some(expected), Some(given)) if expected == given => {}
            _ => {
                tracing::warn!("Owner registration rejected: invalid API key");
                return Err(ApiError::Unauthorized(INVALID_API_KEY_MESSAGE.to_string()));
            }
        }

        request.validate()?;

        let read_deadline = self.timeouts.read();
        let phone = request.customer_phone_number.as_str();
        let taken = retry_with_policy(&self.retry, "owner_registration.lookup", || {
            bounded(
                "owner_registration.lookup",
                read_deadline,
                self.store.phone_registered(phone),
            )
        })
        .await
        .map_err(owner_error)?;

        if taken {
            return Err(ApiError::Conflict(DUPLICATE_PHONE_MESSAGE.to_string()));
        }

        let record = OwnerRegistrationRecord::new(request, Uuid::new_v4().to_string(), Utc::now());
        let write_deadline = self.timeouts.write();

        retry_with_policy(&self.retry, "owner_registration.insert", || {
            bounded(
                "owner_registration.insert",
                write_deadline,
                self.store.insert_owner_registration(&record),
            )
        })
        .await
        .map_err(owner_error)?;

        tracing::info!("Owner registration stored with lead id {}", record.lead_id);
        Ok(record.lead_id)
    }
}

fn owner_error(err: StoreError) -> ApiError {
    match err {
        StoreError::Duplicate(_) => ApiError::Conflict(DUPLICATE_PHONE_MESSAGE.to_string()),
        other => ApiError::from_store(other, DB_TIMEOUT_MESSAGE, "Error registering owner"),
    }
}
