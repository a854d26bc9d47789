//! Integration tests for the store backends
//!
//! These tests exercise the backends through the shared trait the way
//! the client services use them.

use common::{
    PersistentStore, StoreBackend, keys,
    store::{FileStore, MemoryStore},
};

async fn exercise<S: PersistentStore>(store: &S) -> Result<(), Box<dyn std::error::Error>> {
    assert_eq!(store.read(keys::TOKEN).await?, None);

    store.write(keys::TOKEN, b"header.payload.signature").await?;
    store.write(keys::CHAT_SESSIONS, br#"{"version":1,"sessions":[]}"#).await?;

    assert_eq!(
        store.read(keys::TOKEN).await?,
        Some(b"header.payload.signature".to_vec())
    );

    // keys are independent
    store.remove(keys::TOKEN).await?;
    assert_eq!(store.read(keys::TOKEN).await?, None);
    assert!(store.read(keys::CHAT_SESSIONS).await?.is_some());

    Ok(())
}

#[tokio::test]
async fn test_memory_backend() -> Result<(), Box<dyn std::error::Error>> {
    exercise(&StoreBackend::Memory(MemoryStore::new())).await
}

#[tokio::test]
async fn test_file_backend() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let store = StoreBackend::File(FileStore::open(dir.path()).await?);
    exercise(&store).await?;

    // state is durable across a fresh handle
    let reopened = FileStore::open(dir.path()).await?;
    assert!(reopened.read(keys::CHAT_SESSIONS).await?.is_some());
    Ok(())
}
