//! Client configuration

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Backend used when none is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// Where client state is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    File,
    Memory,
    Redis,
}

/// Client configuration
///
/// # Environment Variables
/// - `DEPTCHAT_API_BASE_URL`: chat backend (default: `http://localhost:5000`)
/// - `DEPTCHAT_STORE_BACKEND`: `file`, `memory` or `redis` (default: `file`)
/// - `DEPTCHAT_STORE_PATH`: directory for the file backend (default: `.deptchat`)
/// - `DEPTCHAT_SPEECH_COMMAND`: command that prints one transcript to stdout
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub store_backend: StoreKind,
    pub store_path: String,
    #[serde(default)]
    pub speech_command: Option<String>,
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config: ClientConfig = Config::builder()
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("store_backend", "file")?
            .set_default("store_path", ".deptchat")?
            .add_source(Environment::with_prefix("DEPTCHAT"))
            .build()?
            .try_deserialize()?;

        Ok(config.normalized())
    }

    fn normalized(mut self) -> Self {
        let base = self.api_base_url.trim().trim_end_matches('/');
        self.api_base_url = if base.is_empty() {
            DEFAULT_API_BASE_URL.to_string()
        } else {
            base.to_string()
        };
        self.speech_command = self
            .speech_command
            .filter(|command| !command.trim().is_empty());
        self
    }
}
