//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default API root (the backend mounts its routers under `/api`).
pub const DEFAULT_API_URL: &str = "http://localhost:8001/api";

/// Name of the single durable slot holding the session token.
pub const TOKEN_SLOT_NAME: &str = "authToken";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Whether completion toggles are persisted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionSync {
    /// Toggles only change the in-memory list; the next full fetch wins.
    #[default]
    Local,
    /// Toggles are sent to `/task/updateTask` and confirmed before they stick.
    Remote,
}

impl FromStr for CompletionSync {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            _ => Err(ConfigError::Invalid("TASKMASTER_COMPLETION_SYNC", s.to_string())),
        }
    }
}

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the task API, without trailing slash
    pub api_url: String,
    /// File backing the durable token slot
    pub token_file: PathBuf,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Completion toggle persistence
    pub completion_sync: CompletionSync,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let api_url = env::var("TASKMASTER_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let token_file = match env::var("TASKMASTER_TOKEN_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_token_file()?,
        };

        let request_timeout = match env::var("TASKMASTER_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid("TASKMASTER_TIMEOUT_SECS", raw))?,
            Err(_) => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let completion_sync = match env::var("TASKMASTER_COMPLETION_SYNC") {
            Ok(raw) => raw.parse()?,
            Err(_) => CompletionSync::default(),
        };

        Ok(Self {
            api_url,
            token_file,
            request_timeout,
            completion_sync,
        })
    }

    /// Config pointing at a local test backend.
    pub fn test_default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_file: env::temp_dir().join("taskmaster-test").join(TOKEN_SLOT_NAME),
            request_timeout: Duration::from_secs(5),
            completion_sync: CompletionSync::Local,
        }
    }
}

fn default_token_file() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("taskmaster").join(TOKEN_SLOT_NAME))
        .ok_or(ConfigError::Missing("TASKMASTER_TOKEN_FILE"))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}
