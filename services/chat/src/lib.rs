//! Conversation sessions for the department chat client
//!
//! - [`models`]: sessions, messages and their identifiers
//! - [`store`]: the persisted session collection
//! - [`responder`]: the backend that answers queries
//! - [`engine`]: one exchange at a time per session
//! - [`voice`]: optional speech capture into the draft

pub mod engine;
pub mod error;
pub mod models;
pub mod responder;
pub mod store;
pub mod voice;

pub use engine::{ConversationEngine, ExchangeState, RejectReason, SubmitOutcome};
pub use error::{ResponderError, SessionError, SessionResult, VoiceError};
pub use models::{Message, Sender, Session, SessionId};
pub use responder::{HttpResponder, Responder};
pub use store::{Confirm, Deletion, SessionStore};
pub use voice::{CommandRecognizer, SpeechRecognizer, VoiceInput, VoiceOutcome};

/// Quick-reply prompts offered on an empty chat
pub const SUGGESTIONS: [&str; 3] = [
    "Who is the chair of computer science department?",
    "What are the degree requirements?",
    "What is the first day of class for fall 2025?",
];
