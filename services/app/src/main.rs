use anyhow::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod routes;
mod settings;
mod shell;
mod state;
mod theme;

use crate::{settings::ClientConfig, shell::Shell, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the transcript
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let config = ClientConfig::load()?;
    info!("Starting department chat client against {}", config.api_base_url);

    let state = AppState::init(config).await?;
    Shell::new(state).run().await
}
