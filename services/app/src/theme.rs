//! Persisted display preference

use std::sync::Arc;

use common::{PersistentStore, StoreResult, keys};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    fn parse(value: &[u8]) -> Option<Self> {
        match value {
            b"light" => Some(Theme::Light),
            b"dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Decorate a speaker label for the terminal
    pub fn label(self, label: &str) -> String {
        match self {
            Theme::Light => format!("{}:", label),
            Theme::Dark => format!("\x1b[1;36m{}:\x1b[0m", label),
        }
    }
}

/// Theme preference backed by the `theme` key
pub struct ThemeSetting<S> {
    store: Arc<S>,
    current: Theme,
}

impl<S: PersistentStore> ThemeSetting<S> {
    /// Read the saved preference; anything unreadable is the default
    pub async fn load(store: Arc<S>) -> Self {
        let current = match store.read(keys::THEME).await {
            Ok(Some(value)) => Theme::parse(&value).unwrap_or_else(|| {
                warn!("Ignoring unknown stored theme");
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                warn!("Failed to read stored theme: {}", e);
                Theme::default()
            }
        };
        Self { store, current }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub async fn toggle(&mut self) -> StoreResult<Theme> {
        let next = self.current.toggled();
        self.store.write(keys::THEME, next.as_str().as_bytes()).await?;
        self.current = next;
        Ok(next)
    }
}
