//! Application state

use std::sync::Arc;

use anyhow::Result;
use auth::{AuthClient, AuthGate};
use chat::{CommandRecognizer, ConversationEngine, HttpResponder, SessionStore, VoiceInput};
use common::cache::{RedisConfig, RedisStore};
use common::store::{FileStore, MemoryStore};
use common::StoreBackend;
use tokio::sync::Mutex;
use tracing::info;

use crate::settings::{ClientConfig, StoreKind};
use crate::theme::ThemeSetting;

/// Everything the shell works with, built once per process
pub struct AppState {
    pub config: ClientConfig,
    pub engine: ConversationEngine<StoreBackend, HttpResponder>,
    pub auth_client: AuthClient,
    pub voice: VoiceInput<CommandRecognizer>,
    pub theme: ThemeSetting<StoreBackend>,
}

impl AppState {
    pub async fn init(config: ClientConfig) -> Result<Self> {
        let store = Arc::new(open_store(&config).await?);
        info!("Using {} store", store.name());

        let auth = AuthGate::load(store.clone()).await;
        let sessions = SessionStore::load(store.clone()).await;
        let theme = ThemeSetting::load(store).await;

        let engine = ConversationEngine::new(
            Arc::new(Mutex::new(sessions)),
            Arc::new(Mutex::new(auth)),
            HttpResponder::new(config.api_base_url.clone()),
        );
        let voice = VoiceInput::new(
            config
                .speech_command
                .as_deref()
                .and_then(CommandRecognizer::from_command_line),
        );

        Ok(Self {
            auth_client: AuthClient::new(config.api_base_url.clone()),
            config,
            engine,
            voice,
            theme,
        })
    }
}

async fn open_store(config: &ClientConfig) -> Result<StoreBackend> {
    let backend = match config.store_backend {
        StoreKind::Memory => StoreBackend::Memory(MemoryStore::new()),
        StoreKind::File => StoreBackend::File(FileStore::open(&config.store_path).await?),
        StoreKind::Redis => {
            let redis = RedisStore::new(&RedisConfig::from_env()?)?;
            if !redis.health_check().await? {
                anyhow::bail!("Failed to connect to Redis");
            }
            StoreBackend::Redis(redis)
        }
    };
    Ok(backend)
}
