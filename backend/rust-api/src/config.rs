use serde::Deserialize;
use std::env;
use std::time::Duration;

pub const DEFAULT_ORIGIN: &str = "https://chat-bot2-xy11.onrender.com";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_OTP_BASE_URL: &str = "https://apigee.squareyards.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Per-operation deadlines applied to every store call.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    pub read_ms: u64,
    pub write_ms: u64,
    pub ping_ms: u64,
    pub startup_ping_ms: u64,
}

impl TimeoutConfig {
    pub fn read(&self) -> Duration {
        Duration::from_millis(self.read_ms)
    }

    pub fn write(&self) -> Duration {
        Duration::from_millis(self.write_ms)
    }

    pub fn ping(&self) -> Duration {
        Duration::from_millis(self.ping_ms)
    }

    pub fn startup_ping(&self) -> Duration {
        Duration::from_millis(self.startup_ping_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetrySettings {
    pub max_attempts: usize,
    pub history_delay_ms: u64,
    pub write_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub store: StoreBackend,
    pub mongo_uri: String,
    pub mongo_database: String,
    pub mongo_max_pool_size: u32,
    pub default_origin: String,
    pub owner_registration_api_key: Option<String>,
    pub quiz_fallback_city: String,
    pub gemini: GeminiConfig,
    pub otp: OtpConfig,
    pub timeouts: TimeoutConfig,
    pub retry: RetrySettings,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/*.toml first, APP__ prefixed variables override it
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let string = |key: &str, fallback_env: &str| -> Option<String> {
            settings
                .get_string(key)
                .ok()
                .or_else(|| env::var(fallback_env).ok())
                .filter(|value| !value.trim().is_empty())
        };
        let number = |key: &str, fallback_env: &str, default: u64| -> u64 {
            settings
                .get_int(key)
                .ok()
                .and_then(|value| u64::try_from(value).ok())
                .or_else(|| env::var(fallback_env).ok().and_then(|v| v.parse().ok()))
                .unwrap_or(default)
        };

        let store = match string("store.backend", "STORE_BACKEND").as_deref() {
            Some("memory") => StoreBackend::Memory,
            Some("mongo") | None => StoreBackend::Mongo,
            Some(other) => {
                return Err(config::ConfigError::Message(format!(
                    "unknown store backend '{}', expected 'mongo' or 'memory'",
                    other
                )))
            }
        };

        let mongo_max_pool_size =
            pool_size(number("database.max_pool_size", "MONGO_MAX_POOL_SIZE", 10))?;

        let max_attempts = number("retry.max_attempts", "RETRY_MAX_ATTEMPTS", 3);
        if max_attempts == 0 {
            return Err(config::ConfigError::Message(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(Config {
            bind_addr: string("server.bind_addr", "BIND_ADDR")
                .unwrap_or_else(|| "0.0.0.0:8000".to_string()),
            store,
            mongo_uri: string("database.mongo_uri", "MONGO_URI")
                .unwrap_or_else(|| "mongodb://localhost:27017".to_string()),
            mongo_database: string("database.mongo_database", "MONGO_DATABASE")
                .unwrap_or_else(|| "propertylst".to_string()),
            mongo_max_pool_size,
            default_origin: string("cors.default_origin", "DEFAULT_ORIGIN")
                .unwrap_or_else(|| DEFAULT_ORIGIN.to_string()),
            owner_registration_api_key: string(
                "owner_registration.api_key",
                "OWNER_REGISTRATION_API_KEY",
            ),
            quiz_fallback_city: string("quiz.fallback_city", "QUIZ_FALLBACK_CITY")
                .unwrap_or_else(|| "Wanaparthy".to_string()),
            gemini: GeminiConfig {
                api_key: string("gemini.api_key", "GEMINI_API_KEY"),
                model: string("gemini.model", "GEMINI_MODEL")
                    .unwrap_or_else(|| "gemini-2.0-flash-001".to_string()),
                base_url: string("gemini.base_url", "GEMINI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string()),
                timeout_secs: number("gemini.timeout_secs", "GEMINI_TIMEOUT_SECS", 30),
            },
            otp: OtpConfig {
                base_url: string("otp.base_url", "OTP_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OTP_BASE_URL.to_string()),
                timeout_secs: number("otp.timeout_secs", "OTP_TIMEOUT_SECS", 10),
            },
            timeouts: TimeoutConfig {
                read_ms: number("timeouts.read_ms", "STORE_READ_TIMEOUT_MS", 5_000),
                write_ms: number("timeouts.write_ms", "STORE_WRITE_TIMEOUT_MS", 10_000),
                ping_ms: number("timeouts.ping_ms", "STORE_PING_TIMEOUT_MS", 5_000),
                startup_ping_ms: number(
                    "timeouts.startup_ping_ms",
                    "STORE_STARTUP_PING_TIMEOUT_MS",
                    10_000,
                ),
            },
            retry: RetrySettings {
                max_attempts: max_attempts as usize,
                history_delay_ms: number("retry.history_delay_ms", "RETRY_HISTORY_DELAY_MS", 1_000),
                write_delay_ms: number("retry.write_delay_ms", "RETRY_WRITE_DELAY_MS", 2_000),
            },
        })
    }

    /// Deterministic configuration for tests: in-memory store, short deadlines,
    /// no delay between retries. Never reads the environment.
    pub fn for_tests() -> Self {
        Config {
            bind_addr: "127.0.0.1:0".to_string(),
            store: StoreBackend::Memory,
            mongo_uri: "mongodb://localhost:27017".to_string(),
            mongo_database: "propertylst_test".to_string(),
            mongo_max_pool_size: 2,
            default_origin: DEFAULT_ORIGIN.to_string(),
            owner_registration_api_key: Some("test-api-key".to_string()),
            quiz_fallback_city: "Wanaparthy".to_string(),
            gemini: GeminiConfig {
                api_key: None,
                model: "gemini-test".to_string(),
                base_url: "http://127.0.0.1:9".to_string(),
                timeout_secs: 2,
            },
            otp: OtpConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                timeout_secs: 2,
            },
            timeouts: TimeoutConfig {
                read_ms: 200,
                write_ms: 200,
                ping_ms: 200,
                startup_ping_ms: 200,
            },
            retry: RetrySettings {
                max_attempts: 3,
                history_delay_ms: 0,
                write_delay_ms: 0,
            },
        }
    }
}

fn pool_size(raw: u64) -> Result<u32, config::ConfigError> {
    u32::try_from(raw).map_err(|_| {
        config::ConfigError::Message(format!("database.max_pool_size {} is too large", raw))
    })
}
