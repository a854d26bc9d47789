//! Conversation models

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Title given to a session before anything has been said in it
pub const DEFAULT_TITLE: &str = "New Chat";

/// Longest title derived from a message, in characters
pub const TITLE_LIMIT: usize = 20;

/// Session identifier
///
/// Built from a UUIDv7, so ids created later sort after earlier ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// One immutable utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    text: String,
    sender: Sender,
    time: DateTime<Utc>,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Bot)
    }

    fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            text: text.into(),
            sender,
            time: Utc::now(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    /// Local wall-clock time the message was recorded, as `HH:MM`
    pub fn display_time(&self) -> String {
        self.time.with_timezone(&Local).format("%H:%M").to_string()
    }
}

/// One conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub messages: Vec<Message>,
    /// Set once the user names the session; derivation no longer applies
    #[serde(default)]
    pub title_pinned: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: SessionId::generate(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            title_pinned: false,
        }
    }

    /// Recompute the title from the first message
    ///
    /// A session without messages keeps whatever title it had.
    pub fn derive_title(&mut self) {
        if self.title_pinned {
            return;
        }
        if let Some(title) = self.messages.first().map(title_for) {
            self.title = title;
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn title_for(first: &Message) -> String {
    let prefix: String = first.text.trim().chars().take(TITLE_LIMIT).collect();
    let prefix = prefix.trim_end();
    if prefix.is_empty() {
        format!(
            "Chat - {}",
            first.time.with_timezone(&Local).format("%m/%d/%y %H:%M")
        )
    } else {
        prefix.to_string()
    }
}
