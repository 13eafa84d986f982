//! Mock storage implementations for testing.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{AccountStore, ItemStore, Result, StorageError};
use crate::models::{Account, Item, NewItem};

fn injected_failure() -> StorageError {
    StorageError::Database(sqlx::Error::PoolClosed)
}

/// Mock item store that keeps items in memory.
#[derive(Default)]
pub struct MockItemStore {
    items: RwLock<Vec<Item>>,
    fail_on_add: RwLock<bool>,
    fail_on_query: RwLock<bool>,
}

impl MockItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_add(&self, fail: bool) {
        *self.fail_on_add.write().await = fail;
    }

    pub async fn set_fail_on_query(&self, fail: bool) {
        *self.fail_on_query.write().await = fail;
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

#[async_trait]
impl ItemStore for MockItemStore {
    async fn add(&self, item: NewItem) -> Result<Item> {
        if *self.fail_on_add.read().await {
            return Err(injected_failure());
        }
        let mut items = self.items.write().await;
        let item = Item {
            id: items.len() as i64 + 1,
            name: item.name,
            price: item.price,
            owner_id: item.owner_id,
        };
        items.push(item.clone());
        Ok(item)
    }

    async fn list_all(&self) -> Result<Vec<Item>> {
        if *self.fail_on_query.read().await {
            return Err(injected_failure());
        }
        Ok(self.items.read().await.clone())
    }

    async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Item>> {
        if *self.fail_on_query.read().await {
            return Err(injected_failure());
        }
        Ok(self
            .items
            .read()
            .await
            .iter()
            .filter(|i| i.owner_id == owner_id)
            .cloned()
            .collect())
    }
}

/// Mock account store that keeps accounts in memory.
#[derive(Default)]
pub struct MockAccountStore {
    accounts: RwLock<Vec<Account>>,
    fail_on_query: RwLock<bool>,
}

impl MockAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_query(&self, fail: bool) {
        *self.fail_on_query.write().await = fail;
    }

    async fn check(&self) -> Result<()> {
        if *self.fail_on_query.read().await {
            return Err(injected_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl AccountStore for MockAccountStore {
    async fn create(&self, email: &str, credential: &str) -> Result<Account> {
        self.check().await?;
        let mut accounts = self.accounts.write().await;
        if accounts.iter().any(|a| a.email == email) {
            return Err(StorageError::Duplicate {
                entity: "account",
                key: email.to_string(),
            });
        }
        let account = Account {
            id: accounts.len() as i64 + 1,
            email: email.to_string(),
            credential: credential.to_string(),
        };
        accounts.push(account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.check().await?;
        Ok(self
            .accounts
            .read()
            .await
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn get(&self, id: i64) -> Result<Option<Account>> {
        self.check().await?;
        Ok(self
            .accounts
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Account>> {
        self.check().await?;
        Ok(self.accounts.read().await.clone())
    }
}
