//! Storage interfaces and implementations.
//!
//! Each service owns its own database: the catalog service the item table,
//! the identity service the account table.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::config::StorageConfig;
use crate::models::{Account, Item, NewItem};

pub mod mock;
pub mod schema;
pub mod sqlite;

pub use mock::{MockAccountStore, MockItemStore};
pub use sqlite::{SqliteAccountStore, SqliteItemStore};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },
}

/// Item persistence owned by the catalog service.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Persist a new item and return it with its assigned id.
    async fn add(&self, item: NewItem) -> Result<Item>;

    /// All items in id order.
    async fn list_all(&self) -> Result<Vec<Item>>;

    /// Items created by `owner_id`, in id order. Empty if none.
    async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Item>>;
}

/// Account persistence owned by the identity service.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Create an account. Fails with `Duplicate` if the email is taken.
    async fn create(&self, email: &str, credential: &str) -> Result<Account>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn get(&self, id: i64) -> Result<Option<Account>>;

    /// All accounts in id order.
    async fn list_all(&self) -> Result<Vec<Account>>;
}

/// Open a SQLite pool at `path`, creating the file and its directory.
///
/// `:memory:` opens a single-connection in-memory database that lives as
/// long as the pool.
pub async fn open_pool(path: &str) -> Result<SqlitePool> {
    if path == ":memory:" {
        let opts = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;
        return Ok(pool);
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    Ok(SqlitePool::connect(&format!("sqlite:{}?mode=rwc", path)).await?)
}

/// Initialize the catalog service's item store.
pub async fn init_item_store(config: &StorageConfig) -> Result<Arc<dyn ItemStore>> {
    info!(path = %config.catalog_path, "Item storage: sqlite");

    let store = SqliteItemStore::new(open_pool(&config.catalog_path).await?);
    store.init().await?;
    Ok(Arc::new(store))
}

/// Initialize the identity service's account store.
pub async fn init_account_store(config: &StorageConfig) -> Result<Arc<dyn AccountStore>> {
    info!(path = %config.identity_path, "Account storage: sqlite");

    let store = SqliteAccountStore::new(open_pool(&config.identity_path).await?);
    store.init().await?;
    Ok(Arc::new(store))
}
