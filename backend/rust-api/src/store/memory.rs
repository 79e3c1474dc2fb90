use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{ChatHistoryStore, LeadStore, QuizStore, StoreProbe};
use crate::error::StoreError;
use crate::identity::UserId;
use crate::models::{
    chat::push_capped, ChatHistoryEntry, OwnerRegistrationRecord, PropertyListing, Question,
    QuizState,
};

#[derive(Default)]
struct Collections {
    chat_history: HashMap<String, Vec<ChatHistoryEntry>>,
    quiz_state: HashMap<String, QuizState>,
    listings: HashMap<String, PropertyListing>,
    owner_registrations: HashMap<String, OwnerRegistrationRecord>,
}

/// Process-local store with the same per-document semantics as [`super::MongoStore`].
/// Selected with `STORE_BACKEND=memory`; integration tests use it too.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    pub fn quiz_session(&self, user_id: &str) -> Option<QuizState> {
        self.lock().ok()?.quiz_state.get(user_id).cloned()
    }

    pub fn put_quiz_session(&self, state: QuizState) {
        if let Ok(mut collections) = self.lock() {
            collections.quiz_state.insert(state.user_id.clone(), state);
        }
    }

    pub fn history(&self, user_id: &str) -> Vec<ChatHistoryEntry> {
        self.lock()
            .ok()
            .and_then(|c| c.chat_history.get(user_id).cloned())
            .unwrap_or_default()
    }

    pub fn listings(&self) -> Vec<PropertyListing> {
        self.lock()
            .map(|c| c.listings.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn owner_registrations(&self) -> Vec<OwnerRegistrationRecord> {
        self.lock()
            .map(|c| c.owner_registrations.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatHistoryStore for MemoryStore {
    async fn recent_questions(&self, user_id: &UserId) -> Result<Vec<ChatHistoryEntry>, StoreError> {
        Ok(self
            .lock()?
            .chat_history
            .get(user_id.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn append_question(
        &self,
        user_id: &UserId,
        entry: &ChatHistoryEntry,
        keep: usize,
    ) -> Result<(), StoreError> {
        let mut collections = self.lock()?;
        let entries = collections
            .chat_history
            .entry(user_id.as_str().to_string())
            .or_default();
        push_capped(entries, entry.clone(), keep);
        Ok(())
    }
}

#[async_trait]
impl QuizStore for MemoryStore {
    async fn load(&self, user_id: &UserId) -> Result<Option<QuizState>, StoreError> {
        Ok(self.lock()?.quiz_state.get(user_id.as_str()).cloned())
    }

    async fn create_if_absent(&self, state: &QuizState) -> Result<QuizState, StoreError> {
        let mut collections = self.lock()?;
        let stored = collections
            .quiz_state
            .entry(state.user_id.clone())
            .or_insert_with(|| state.clone());
        Ok(stored.clone())
    }

    async fn save_round(
        &self,
        user_id: &UserId,
        city: &str,
        questions_asked: &[String],
        current_questions: &[Question],
    ) -> Result<(), StoreError> {
        if let Some(state) = self.lock()?.quiz_state.get_mut(user_id.as_str()) {
            state.city = city.to_string();
            state.questions_asked = questions_asked.to_vec();
            state.current_questions = current_questions.to_vec();
        }
        Ok(())
    }

    async fn record_submission(
        &self,
        user_id: &UserId,
        attempts_left: u32,
        score: u32,
    ) -> Result<(), StoreError> {
        if let Some(state) = self.lock()?.quiz_state.get_mut(user_id.as_str()) {
            state.attempts_left = attempts_left;
            state.score = score;
        }
        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> Result<(), StoreError> {
        self.lock()?.quiz_state.remove(user_id.as_str());
        Ok(())
    }
}

#[async_trait]
impl LeadStore for MemoryStore {
    async fn insert_listing(&self, listing: &PropertyListing) -> Result<(), StoreError> {
        self.lock()?
            .listings
            .entry(listing.submission_id.clone())
            .or_insert_with(|| listing.clone());
        Ok(())
    }

    async fn phone_registered(&self, phone: &str) -> Result<bool, StoreError> {
        Ok(self
            .lock()?
            .owner_registrations
            .values()
            .any(|r| r.customer_phone_number == phone))
    }

    async fn insert_owner_registration(
        &self,
        record: &OwnerRegistrationRecord,
    ) -> Result<(), StoreError> {
        let mut collections = self.lock()?;
        if collections.owner_registrations.contains_key(&record.lead_id) {
            return Ok(());
        }
        if collections
            .owner_registrations
            .values()
            .any(|r| r.customer_phone_number == record.customer_phone_number)
        {
            return Err(StoreError::Duplicate(format!(
                "customerPhoneNumber {} already registered",
                record.customer_phone_number
            )));
        }
        collections
            .owner_registrations
            .insert(record.lead_id.clone(), record.clone());
        Ok(())
    }
}

#[async_trait]
impl StoreProbe for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}
