use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, TimeoutConfig};
use crate::error::ApiError;
use crate::identity::{UserId, UserIdentity};
use crate::llm::{strip_code_fences, GenerationRequest, Generator};
use crate::models::chat::{ChatHistoryEntry, CHAT_HISTORY_LIMIT};
use crate::store::{bounded, ChatHistoryStore};
use crate::utils::retry::{retry_with_policy, RetryPolicy};

pub const PRIME_MEMBERSHIP_URL: &str = "https://www.squareyards.com/prime";

const LISTING_FAQ: &str = "Q: What are the advantages of taking an owner subscription? \
A: The foremost advantage is that there is no limit on the number of listings. Other unique features include 10X More Visibility, Unlimited Enquiries, 20 Matching Buyer Leads, Relationship Manager (RM) Assistance, Assisted Listing, Access Buyer Verification (Litigation Report), and Recent Registered Transactions. \
Q: What is the total price of the owner plan? A: The price starts from ₹3999 (including GST) and varies based on individual requirements. \
Q: Is Post Property as an owner, free? A: Yes, owners can list 3 properties for free and see the inquiries. However, the Seller Prime Subscription is recommended for more benefits. \
Q: Will I get genuine/interested clients, even after posting a free property? A: Yes, you will be able to see inquiries from interested clients on free listings. \
Q: What modes of payment are possible to buy owner subscription? A: Payment modes include Debit/Credit Card, UPI, and Net Banking. \
Q: How much time will it take for the subscription to get active? A: In most cases, it's instant, but sometimes it may take 24 to 48 hours. \
Q: How many interested clients I will get after posting a property? A: There is no limit. Better images attract more clients. \
Q: Is the amount of subscription refundable? A: No.";

/// Persona and context sent as the system instruction of every chat call.
pub fn build_chat_prompt(city: Option<&str>, history: &[ChatHistoryEntry]) -> String {
    let city = city.map(str::trim).unwrap_or_default();
    let history_text = if history.is_empty() {
        "No previous questions.".to_string()
    } else {
        history
            .iter()
            .map(|entry| format!("Previous Question: {}", entry.question))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "You are the SquareYards AI chatbot, a professional real-estate assistant. \
         Only represent SquareYards and never promote any other organisation. \
         Give accurate, concise and helpful answers about properties and real-estate markets. \
         If a city is provided, tailor the answer to that city ({city}). \
         Use Google Search results to keep answers accurate and current. \
         If the user asks about a different city, answer from your own knowledge. \
         If the question is unrelated to real estate, or asks where your information comes from, politely steer back to real-estate topics. \
         Reply in well-formatted HTML that reads well in both the day and night modes of the chat UI. \
         Keep replies short like a chatbot and answer directly without explanations. \
         If the question relates to these FAQ, answer from them: {LISTING_FAQ} \
         The Prime Membership of Square Yards is at {PRIME_MEMBERSHIP_URL}. \
         User context: {history_text}"
    )
}

pub struct ChatService {
    history: Arc<dyn ChatHistoryStore>,
    generator: Arc<dyn Generator>,
    timeouts: TimeoutConfig,
    retry: RetryPolicy,
}

impl ChatService {
    pub fn new(
        history: Arc<dyn ChatHistoryStore>,
        generator: Arc<dyn Generator>,
        config: &Config,
    ) -> Self {
        Self {
            history,
            generator,
            timeouts: config.timeouts.clone(),
            retry: RetryPolicy::fixed(
                config.retry.max_attempts,
                Duration::from_millis(config.retry.history_delay_ms),
            ),
        }
    }

    /// Answers one chat message as HTML. Anonymous callers get no history.
    pub async fn reply(
        &self,
        identity: &UserIdentity,
        message: &str,
        city: Option<&str>,
    ) -> Result<String, ApiError> {
        let history = match identity.user_id() {
            Some(user_id) => {
                let history = self.recent_questions(user_id).await;
                self.remember(user_id, message).await;
                history
            }
            None => Vec::new(),
        };

        let system_prompt = build_chat_prompt(city, &history);
        let request = GenerationRequest {
            prompt: format!("{}\n\nUser Query: {}", system_prompt, message),
            system_instruction: Some(system_prompt),
            temperature: 0.7,
            max_output_tokens: 8192,
            grounded_search: true,
        };

        let raw = self.generator.generate(request).await.map_err(|e| {
            tracing::error!("Chat generation failed: {}", e);
            ApiError::Transient(format!("Error generating chat response: {}", e))
        })?;

        Ok(strip_code_fences(&raw))
    }

    /// Previous questions, oldest first. Degrades to an empty history once
    /// the retries are used up.
    async fn recent_questions(&self, user_id: &UserId) -> Vec<ChatHistoryEntry> {
        let deadline = self.timeouts.read();
        let result = retry_with_policy(&self.retry, "chat_history.read", || {
            bounded(
                "chat_history.read",
                deadline,
                self.history.recent_questions(user_id),
            )
        })
        .await;

        result.unwrap_or_else(|e| {
            tracing::error!("Chat history unavailable for {}, continuing without it: {}", user_id, e);
            Vec::new()
        })
    }

    async fn remember(&self, user_id: &UserId, message: &str) {
        let entry = ChatHistoryEntry::now(message);
        let deadline = self.timeouts.write();
        let result = retry_with_policy(&self.retry, "chat_history.append", || {
            bounded(
                "chat_history.append",
                deadline,
                self.history
                    .append_question(user_id, &entry, CHAT_HISTORY_LIMIT),
            )
        })
        .await;

        if let Err(e) = result {
            tracing::error!("Failed to update chat history for {}: {}", user_id, e);
        }
    }
}
