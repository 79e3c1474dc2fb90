use crate::config::{Config, StoreBackend};
use crate::llm::{GeminiClient, Generator, UnconfiguredGenerator};
use crate::store::{
    bounded, ChatHistoryStore, LeadStore, MemoryStore, MongoStore, QuizStore, StoreProbe,
};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;

/// Process-wide handles, built once in `main` and passed to every handler.
pub struct AppState {
    pub config: Config,
    pub chat_history: Arc<dyn ChatHistoryStore>,
    pub quiz_store: Arc<dyn QuizStore>,
    pub leads: Arc<dyn LeadStore>,
    pub probe: Arc<dyn StoreProbe>,
    pub generator: Arc<dyn Generator>,
    pub http: reqwest::Client,
    mongo_client: Option<mongodb::Client>,
}

impl AppState {
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let generator: Arc<dyn Generator> = match config.gemini.api_key.clone() {
            Some(api_key) => Arc::new(
                GeminiClient::new(&config.gemini, api_key)
                    .context("Failed to build Gemini client")?,
            ),
            None => {
                tracing::warn!("GEMINI_API_KEY is not set, chat and quiz generation are disabled");
                Arc::new(UnconfiguredGenerator)
            }
        };

        match config.store {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store, data is lost on restart");
                let store = Arc::new(MemoryStore::new());
                Self::with_store(config, store, generator)
            }
            StoreBackend::Mongo => {
                tracing::info!("Connecting to MongoDB database {}", config.mongo_database);
                let store = MongoStore::connect(&config)
                    .await
                    .context("Failed to create MongoDB client")?;

                // The service starts even if the database is down; /pingdb reports it.
                let deadline = config.timeouts.startup_ping();
                match bounded("startup.ping", deadline, store.ping()).await {
                    Ok(()) => tracing::info!("MongoDB connection established successfully"),
                    Err(e) => tracing::warn!("MongoDB is not reachable at startup: {}", e),
                }
                store.ensure_indexes().await;

                let mongo_client = store.client().clone();
                let mut state = Self::with_store(config, Arc::new(store), generator)?;
                state.mongo_client = Some(mongo_client);
                Ok(state)
            }
        }
    }

    /// Wires one store value behind every store seam.
    pub fn with_store<S>(
        config: Config,
        store: Arc<S>,
        generator: Arc<dyn Generator>,
    ) -> anyhow::Result<Self>
    where
        S: ChatHistoryStore + QuizStore + LeadStore + StoreProbe + 'static,
    {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.otp.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            chat_history: store.clone(),
            quiz_store: store.clone(),
            leads: store.clone(),
            probe: store,
            generator,
            http,
            mongo_client: None,
        })
    }

    /// Releases the store connection pool. Called once after the server stops.
    pub async fn shutdown(&self) {
        if let Some(client) = &self.mongo_client {
            client.clone().shutdown().await;
            tracing::info!("MongoDB client shut down");
        }
    }
}

pub mod chat_service;
pub mod lead_service;
pub mod otp_service;
pub mod question_generation;
pub mod quiz_service;
