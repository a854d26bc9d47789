//! Authentication for the department chat client
//!
//! Holds the bearer credential issued at login, derives the caller's
//! role from it, and answers whether a navigation target may be opened.

pub mod client;
pub mod error;
pub mod gate;
pub mod guard;
pub mod models;
pub mod token;
pub mod validation;

pub use client::AuthClient;
pub use error::{AuthError, AuthResult};
pub use gate::AuthGate;
pub use guard::{Access, Authorization};
pub use models::{Credentials, Role};
pub use token::{DecodedToken, decode};
