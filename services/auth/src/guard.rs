//! Access rules for navigation targets
//!
//! Unauthenticated callers are always sent to login. Only an
//! authenticated caller holding the wrong role is shown "forbidden".

use crate::models::Role;

/// What a navigation target requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Reachable by anyone
    Public,
    /// Requires a held credential
    Authenticated,
    /// Requires a held credential whose role claim matches
    Role(Role),
}

/// Outcome of checking an [`Access`] requirement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Allow,
    RedirectToLogin,
    Forbidden,
}

/// Decide whether a caller may open a target
pub fn authorize(authenticated: bool, role: Option<&Role>, access: &Access) -> Authorization {
    match access {
        Access::Public => Authorization::Allow,
        _ if !authenticated => Authorization::RedirectToLogin,
        Access::Authenticated => Authorization::Allow,
        Access::Role(required) if role == Some(required) => Authorization::Allow,
        Access::Role(_) => Authorization::Forbidden,
    }
}
