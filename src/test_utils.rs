//! Test utilities shared by unit and integration tests.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::Mutex;

use crate::bus::{BusError, MessageHandler, Result as BusResult};
use crate::storage::{open_pool, SqliteAccountStore, SqliteItemStore};

/// Message handler that records every payload it is given.
///
/// A failing handler still records the payload before returning its error.
#[derive(Default)]
pub struct RecordingHandler {
    received: Arc<Mutex<Vec<Vec<u8>>>>,
    failure: Option<String>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that fails every delivery with `error`.
    pub fn failing(error: BusError) -> Self {
        Self {
            received: Arc::default(),
            failure: Some(error.to_string()),
        }
    }

    /// Shared view of the payloads received so far.
    pub fn received(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.received)
    }
}

impl MessageHandler for RecordingHandler {
    fn handle(&self, payload: Vec<u8>) -> BoxFuture<'static, BusResult<()>> {
        let received = Arc::clone(&self.received);
        let failure = self.failure.clone();
        Box::pin(async move {
            received.lock().await.push(payload);
            match failure {
                Some(message) => Err(BusError::Handler(message)),
                None => Ok(()),
            }
        })
    }
}

/// Item store over a private in-memory database.
pub async fn memory_item_store() -> Arc<SqliteItemStore> {
    let store = SqliteItemStore::new(open_pool(":memory:").await.unwrap());
    store.init().await.unwrap();
    Arc::new(store)
}

/// Account store over a private in-memory database.
pub async fn memory_account_store() -> Arc<SqliteAccountStore> {
    let store = SqliteAccountStore::new(open_pool(":memory:").await.unwrap());
    store.init().await.unwrap();
    Arc::new(store)
}
