//! Document store seams.
//!
//! Every mutation is a single keyed document operation (upsert, `$set`,
//! `$push` with `$slice`, delete), so repeating one after an ambiguous timeout
//! is safe and concurrent writers rely only on per-document atomicity.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::error::StoreError;
use crate::identity::UserId;
use crate::models::{
    ChatHistoryEntry, OwnerRegistrationRecord, PropertyListing, Question, QuizState,
};

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[async_trait]
pub trait ChatHistoryStore: Send + Sync {
    async fn recent_questions(&self, user_id: &UserId) -> Result<Vec<ChatHistoryEntry>, StoreError>;

    /// Appends one entry, keeping only the newest `keep` entries.
    async fn append_question(
        &self,
        user_id: &UserId,
        entry: &ChatHistoryEntry,
        keep: usize,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait QuizStore: Send + Sync {
    async fn load(&self, user_id: &UserId) -> Result<Option<QuizState>, StoreError>;

    /// Inserts `state` unless a session for the user already exists, and
    /// returns whichever session is stored afterwards.
    async fn create_if_absent(&self, state: &QuizState) -> Result<QuizState, StoreError>;

    /// Stores the round just served along with the city it was generated for.
    async fn save_round(
        &self,
        user_id: &UserId,
        city: &str,
        questions_asked: &[String],
        current_questions: &[Question],
    ) -> Result<(), StoreError>;

    async fn record_submission(
        &self,
        user_id: &UserId,
        attempts_left: u32,
        score: u32,
    ) -> Result<(), StoreError>;

    async fn delete(&self, user_id: &UserId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Insert keyed by `submission_id`; a repeat of an insert that already
    /// landed is a no-op.
    async fn insert_listing(&self, listing: &PropertyListing) -> Result<(), StoreError>;

    async fn phone_registered(&self, phone: &str) -> Result<bool, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the phone number is taken.
    async fn insert_owner_registration(
        &self,
        record: &OwnerRegistrationRecord,
    ) -> Result<(), StoreError>;
}

#[async_trait]
pub trait StoreProbe: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Bounds one store call by its own deadline. Overrunning maps to
/// [`StoreError::Timeout`], which the retry wrapper treats as retryable.
pub async fn bounded<T, Fut>(
    operation: &'static str,
    deadline: Duration,
    fut: Fut,
) -> Result<T, StoreError>
where
    Fut: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            operation,
            after: deadline,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_bounded_maps_elapsed_to_timeout() {
        let result: Result<(), StoreError> = bounded("slow.op", Duration::from_secs(5), async {
            tokio::time::sleep(Duration::from_secs(6)).await;
            Ok(())
        })
        .await;

        match result {
            Err(StoreError::Timeout { operation, after }) => {
                assert_eq!(operation, "slow.op");
                assert_eq!(after, Duration::from_secs(5));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bounded_passes_through_results() {
        let ok: Result<u32, StoreError> =
            bounded("fast.op", Duration::from_secs(1), async { Ok(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err: Result<u32, StoreError> = bounded("fast.op", Duration::from_secs(1), async {
            Err(StoreError::Backend("down".into()))
        })
        .await;
        assert!(matches!(err, Err(StoreError::Backend(_))));
    }
}
