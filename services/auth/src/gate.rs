//! Client-side authentication state
//!
//! [`AuthGate`] owns the bearer credential. It is the only writer of the
//! `token` key and re-derives the role claim every time the credential
//! changes, so the role can never drift from the token it came from.

use std::sync::Arc;

use common::{PersistentStore, keys};
use tracing::{info, warn};

use crate::error::{AuthError, AuthResult};
use crate::guard::{self, Access, Authorization};
use crate::models::Role;
use crate::token::{self, DecodedToken};

/// Holder of the current credential and its derived role
pub struct AuthGate<S> {
    store: Arc<S>,
    token: Option<String>,
    claims: DecodedToken,
}

impl<S: PersistentStore> AuthGate<S> {
    /// Restore the credential saved by a previous run
    ///
    /// Unreadable or non-UTF-8 storage content counts as signed out.
    pub async fn load(store: Arc<S>) -> Self {
        let token = match store.read(keys::TOKEN).await {
            Ok(Some(bytes)) => match String::from_utf8(bytes) {
                Ok(token) => Some(token.trim().to_string()).filter(|t| !t.is_empty()),
                Err(_) => {
                    warn!("Stored credential is not valid UTF-8, ignoring it");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read stored credential: {}", e);
                None
            }
        };

        let claims = token.as_deref().map(token::decode).unwrap_or_default();
        if token.is_some() {
            info!("Restored credential (role: {:?})", claims.role);
        }

        Self {
            store,
            token,
            claims,
        }
    }

    /// Whether a non-empty credential is held
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Role claimed by the held credential
    pub fn role(&self) -> Option<&Role> {
        self.claims.role.as_ref()
    }

    /// Email or subject claimed by the held credential
    pub fn subject(&self) -> Option<&str> {
        self.claims.subject.as_deref()
    }

    /// Raw credential for the `Authorization` header
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Store a freshly issued credential
    pub async fn login(&mut self, token: impl Into<String>) -> AuthResult<()> {
        let token = token.into().trim().to_string();
        if token.is_empty() {
            return Err(AuthError::EmptyToken);
        }

        self.store.write(keys::TOKEN, token.as_bytes()).await?;
        self.claims = token::decode(&token);
        self.token = Some(token);

        info!("Signed in (role: {:?})", self.claims.role);
        Ok(())
    }

    /// Drop the credential
    ///
    /// Memory is cleared before storage, so the gate reports signed out
    /// even when the stored copy could not be removed.
    pub async fn logout(&mut self) -> AuthResult<()> {
        self.token = None;
        self.claims = DecodedToken::default();
        self.store.remove(keys::TOKEN).await?;

        info!("Signed out");
        Ok(())
    }

    /// Check an access requirement against the held credential
    pub fn authorize(&self, access: &Access) -> Authorization {
        guard::authorize(self.is_authenticated(), self.role(), access)
    }
}
