//! Common library for the department chat client
//!
//! This crate provides the pieces shared by the client services: the
//! durable key/value store and its backends, store error handling, and
//! helpers for reading backend error responses.
//!
//! ```rust,no_run
//! use common::store::{FileStore, PersistentStore, keys};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FileStore::open(".deptchat").await?;
//!     store.write(keys::THEME, b"dark").await?;
//!     let theme = store.read(keys::THEME).await?;
//!     println!("Stored theme: {:?}", theme);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod error;
pub mod response;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::{PersistentStore, StoreBackend, keys};
