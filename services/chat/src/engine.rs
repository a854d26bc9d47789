//! Conversation engine
//!
//! Drives the exchange between the user and the responder for the active
//! session. Each session is either idle or sending; a second submit while
//! a session is sending is rejected rather than queued, so replies always
//! arrive in the order their questions were asked.

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};

use auth::AuthGate;
use common::PersistentStore;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::{ResponderError, SessionError, SessionResult};
use crate::models::{Message, SessionId};
use crate::responder::Responder;
use crate::store::SessionStore;

/// Exchange state of one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Sending,
}

/// Why a submit was refused without contacting the responder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Blank,
    InFlight,
}

/// Result of [`ConversationEngine::submit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing was appended and no request was made
    Rejected(RejectReason),
    /// The responder answered; the reply is in the transcript
    Replied(String),
    /// The exchange failed; the error is in the transcript
    Failed(ResponderError),
    /// The credential was refused and has been dropped
    ReauthRequired,
}

/// Marks a session as sending until dropped
struct InFlight<'a> {
    sessions: &'a StdMutex<HashSet<SessionId>>,
    id: SessionId,
}

impl<'a> InFlight<'a> {
    fn acquire(sessions: &'a StdMutex<HashSet<SessionId>>, id: &SessionId) -> Option<Self> {
        let mut guard = sessions.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(id.clone()).then(|| Self {
            sessions,
            id: id.clone(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut guard = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        guard.remove(&self.id);
    }
}

/// Coordinates sessions, credentials and the responder
pub struct ConversationEngine<S, R> {
    sessions: Arc<Mutex<SessionStore<S>>>,
    auth: Arc<Mutex<AuthGate<S>>>,
    responder: R,
    in_flight: StdMutex<HashSet<SessionId>>,
}

impl<S: PersistentStore, R: Responder> ConversationEngine<S, R> {
    pub fn new(
        sessions: Arc<Mutex<SessionStore<S>>>,
        auth: Arc<Mutex<AuthGate<S>>>,
        responder: R,
    ) -> Self {
        Self {
            sessions,
            auth,
            responder,
            in_flight: StdMutex::new(HashSet::new()),
        }
    }

    pub fn sessions(&self) -> &Arc<Mutex<SessionStore<S>>> {
        &self.sessions
    }

    pub fn auth(&self) -> &Arc<Mutex<AuthGate<S>>> {
        &self.auth
    }

    pub fn responder(&self) -> &R {
        &self.responder
    }

    pub fn state(&self, id: &SessionId) -> ExchangeState {
        let guard = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if guard.contains(id) {
            ExchangeState::Sending
        } else {
            ExchangeState::Idle
        }
    }

    /// Send `text` as a question in the active session
    ///
    /// The user message is persisted before the request goes out and the
    /// bot message after it settles. Errors are only returned when the
    /// transcript itself could not be written.
    pub async fn submit(&self, text: &str) -> SessionResult<SubmitOutcome> {
        let query = text.trim();
        if query.is_empty() {
            return Ok(SubmitOutcome::Rejected(RejectReason::Blank));
        }

        let (id, _in_flight) = {
            let mut sessions = self.sessions.lock().await;
            let id = sessions.active_id().clone();
            let Some(in_flight) = InFlight::acquire(&self.in_flight, &id) else {
                return Ok(SubmitOutcome::Rejected(RejectReason::InFlight));
            };
            sessions.push_message(&id, Message::user(query)).await?;
            (id, in_flight)
        };

        let bearer = self.auth.lock().await.token().map(str::to_string);
        info!("Sending query for session {}", id);
        let result = self.responder.respond(query, bearer.as_deref()).await;

        match result {
            Ok(reply) => {
                info!("Received reply for session {}", id);
                self.record_reply(&id, reply.clone()).await?;
                Ok(SubmitOutcome::Replied(reply))
            }
            Err(ResponderError::Unauthorized) => {
                warn!("Credential refused during exchange, signing out");
                // the gate clears its in-memory credential even if removal fails
                if let Err(e) = self.auth.lock().await.logout().await {
                    warn!("Failed to remove stored credential: {}", e);
                }
                self.record_reply(&id, format!("Error: {}", ResponderError::Unauthorized))
                    .await?;
                Ok(SubmitOutcome::ReauthRequired)
            }
            Err(e) => {
                warn!("Exchange for session {} failed: {}", id, e);
                self.record_reply(&id, format!("Error: {}", e)).await?;
                Ok(SubmitOutcome::Failed(e))
            }
        }
    }

    async fn record_reply(&self, id: &SessionId, text: String) -> SessionResult<()> {
        let mut sessions = self.sessions.lock().await;
        match sessions.push_message(id, Message::bot(text)).await {
            Err(SessionError::NotFound(_)) => {
                warn!("Session {} was deleted before its reply arrived", id);
                Ok(())
            }
            other => other,
        }
    }
}
