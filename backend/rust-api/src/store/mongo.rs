use async_trait::async_trait;
use mongodb::{
    bson::{self, doc, Document},
    options::{ClientOptions, IndexOptions, ReturnDocument},
    Client, Collection, Database, IndexModel,
};
use std::time::Duration;

use super::{ChatHistoryStore, LeadStore, QuizStore, StoreProbe};
use crate::config::Config;
use crate::error::StoreError;
use crate::identity::UserId;
use crate::models::{
    ChatHistoryEntry, ChatHistoryRecord, OwnerRegistrationRecord, PropertyListing, Question,
    QuizState,
};

const CHAT_HISTORY: &str = "chat_history";
const QUIZ_STATE: &str = "quiz_state";
const PROPERTY_LISTING: &str = "property_listing";
const OWNER_REGISTRATIONS: &str = "owner_registrations";

/// MongoDB-backed implementation of every store trait. Cheap to clone: the
/// driver's client is a pooled handle.
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db: Database,
}

impl MongoStore {
    /// Builds the pooled client. The driver connects lazily, so this only
    /// fails on a malformed URI or options.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(&config.mongo_uri).await?;
        options.app_name = Some("propertybot-api".to_string());
        options.max_pool_size = Some(config.mongo_max_pool_size);
        options.connect_timeout = Some(Duration::from_secs(10));
        options.server_selection_timeout = Some(Duration::from_secs(10));

        let client = Client::with_options(options)?;
        let db = client.database(&config.mongo_database);
        Ok(Self { client, db })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Unique keys the store relies on. Failures are logged, not fatal: the
    /// service still works without them, minus duplicate-phone protection
    /// under races.
    pub async fn ensure_indexes(&self) {
        let unique = || IndexOptions::builder().unique(true).build();
        let indexes = [
            (CHAT_HISTORY, doc! { "user_id": 1 }),
            (QUIZ_STATE, doc! { "user_id": 1 }),
            (OWNER_REGISTRATIONS, doc! { "customerPhoneNumber": 1 }),
        ];

        for (collection, keys) in indexes {
            let model = IndexModel::builder().keys(keys).options(unique()).build();
            match self.db.collection::<Document>(collection).create_index(model).await {
                Ok(_) => tracing::debug!("Index ensured on {}", collection),
                Err(e) => tracing::warn!("Failed to ensure index on {}: {}", collection, e),
            }
        }
    }

    fn chat_history(&self) -> Collection<ChatHistoryRecord> {
        self.db.collection(CHAT_HISTORY)
    }

    fn quiz_state(&self) -> Collection<QuizState> {
        self.db.collection(QUIZ_STATE)
    }
}

fn to_document<T: serde::Serialize>(value: &T) -> Result<Document, StoreError> {
    bson::to_document(value).map_err(|e| StoreError::Backend(format!("Failed to encode document: {}", e)))
}

fn to_bson<T: serde::Serialize + ?Sized>(value: &T) -> Result<bson::Bson, StoreError> {
    bson::to_bson(value).map_err(|e| StoreError::Backend(format!("Failed to encode value: {}", e)))
}

/// `$setOnInsert` body for an upsert keyed by `_id`.
fn insert_only(mut document: Document) -> Document {
    document.remove("_id");
    doc! { "$setOnInsert": document }
}

#[async_trait]
impl ChatHistoryStore for MongoStore {
    async fn recent_questions(&self, user_id: &UserId) -> Result<Vec<ChatHistoryEntry>, StoreError> {
        let record = self
            .chat_history()
            .find_one(doc! { "user_id": user_id.as_str() })
            .await?;
        Ok(record.map(|r| r.questions).unwrap_or_default())
    }

    async fn append_question(
        &self,
        user_id: &UserId,
        entry: &ChatHistoryEntry,
        keep: usize,
    ) -> Result<(), StoreError> {
        let keep = i64::try_from(keep).unwrap_or(i64::MAX);
        self.chat_history()
            .update_one(
                doc! { "user_id": user_id.as_str() },
                doc! {
                    "$push": {
                        "questions": {
                            "$each": [to_bson(entry)?],
                            "$slice": -keep,
                        }
                    }
                },
            )
            .upsert(true)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl QuizStore for MongoStore {
    async fn load(&self, user_id: &UserId) -> Result<Option<QuizState>, StoreError> {
        Ok(self
            .quiz_state()
            .find_one(doc! { "user_id": user_id.as_str() })
            .await?)
    }

    async fn create_if_absent(&self, state: &QuizState) -> Result<QuizState, StoreError> {
        let result = self
            .quiz_state()
            .find_one_and_update(
                doc! { "user_id": state.user_id.as_str() },
                doc! { "$setOnInsert": to_document(state)? },
            )
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await;

        match result {
            Ok(Some(stored)) => Ok(stored),
            Ok(None) => Ok(state.clone()),
            // A concurrent upsert won the unique index; read what it stored.
            Err(e) => match StoreError::from(e) {
                StoreError::Duplicate(_) => Ok(self
                    .quiz_state()
                    .find_one(doc! { "user_id": state.user_id.as_str() })
                    .await?
                    .unwrap_or_else(|| state.clone())),
                other => Err(other),
            },
        }
    }

    async fn save_round(
        &self,
        user_id: &UserId,
        city: &str,
        questions_asked: &[String],
        current_questions: &[Question],
    ) -> Result<(), StoreError> {
        self.quiz_state()
            .update_one(
                doc! { "user_id": user_id.as_str() },
                doc! {
                    "$set": {
                        "city": city,
                        "questions_asked": to_bson(questions_asked)?,
                        "current_questions": to_bson(current_questions)?,
                    }
                },
            )
            .await?;
        Ok(())
    }

    async fn record_submission(
        &self,
        user_id: &UserId,
        attempts_left: u32,
        score: u32,
    ) -> Result<(), StoreError> {
        self.quiz_state()
            .update_one(
                doc! { "user_id": user_id.as_str() },
                doc! {
                    "$set": {
                        "attempts_left": i64::from(attempts_left),
                        "score": i64::from(score),
                    }
                },
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> Result<(), StoreError> {
        self.quiz_state()
            .delete_one(doc! { "user_id": user_id.as_str() })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LeadStore for MongoStore {
    async fn insert_listing(&self, listing: &PropertyListing) -> Result<(), StoreError> {
        self.db
            .collection::<Document>(PROPERTY_LISTING)
            .update_one(
                doc! { "_id": listing.submission_id.as_str() },
                insert_only(to_document(listing)?),
            )
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn phone_registered(&self, phone: &str) -> Result<bool, StoreError> {
        let count = self
            .db
            .collection::<Document>(OWNER_REGISTRATIONS)
            .count_documents(doc! { "customerPhoneNumber": phone })
            .limit(1)
            .await?;
        Ok(count > 0)
    }

    async fn insert_owner_registration(
        &self,
        record: &OwnerRegistrationRecord,
    ) -> Result<(), StoreError> {
        self.db
            .collection::<Document>(OWNER_REGISTRATIONS)
            .update_one(
                doc! { "_id": record.lead_id.as_str() },
                insert_only(to_document(record)?),
            )
            .upsert(true)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl StoreProbe for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
