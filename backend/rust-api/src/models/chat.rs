use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Number of previous questions kept per user.
pub const CHAT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub status: &'static str,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    pub question: String,
    #[serde(deserialize_with = "lenient_timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl ChatHistoryEntry {
    pub fn now(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Parses an RFC 3339 timestamp, or an offset-less ISO-8601 one read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

// Older entries in `chat_history` were written without an offset.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| de::Error::custom(format!("invalid timestamp '{}'", raw)))
}

/// Stored in the `chat_history` collection, one document per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistoryRecord {
    pub user_id: String,
    #[serde(default)]
    pub questions: Vec<ChatHistoryEntry>,
}

/// Appends `entry` and evicts the oldest entries beyond `keep`.
pub fn push_capped(entries: &mut Vec<ChatHistoryEntry>, entry: ChatHistoryEntry, keep: usize) {
    entries.push(entry);
    if entries.len() > keep {
        let overflow = entries.len() - keep;
        entries.drain(..overflow);
    }
}
