use crate::models::NewItem;
use crate::storage::{open_pool, AccountStore, ItemStore, StorageError};

use super::*;

async fn item_store() -> SqliteItemStore {
    let store = SqliteItemStore::new(open_pool(":memory:").await.unwrap());
    store.init().await.unwrap();
    store
}

async fn account_store() -> SqliteAccountStore {
    let store = SqliteAccountStore::new(open_pool(":memory:").await.unwrap());
    store.init().await.unwrap();
    store
}

fn new_item(name: &str, price: f64, owner_id: i64) -> NewItem {
    NewItem {
        name: name.to_string(),
        price,
        owner_id,
    }
}

#[tokio::test]
async fn test_item_add_assigns_increasing_ids() {
    let store = item_store().await;

    let first = store.add(new_item("Widget", 9.99, 7)).await.unwrap();
    let second = store.add(new_item("Gadget", 5.0, 7)).await.unwrap();

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(first.name, "Widget");
    assert_eq!(first.owner_id, 7);
}

#[tokio::test]
async fn test_item_find_by_owner_filters_and_orders() {
    let store = item_store().await;
    store.add(new_item("Widget", 9.99, 7)).await.unwrap();
    store.add(new_item("Lamp", 12.5, 42)).await.unwrap();
    store.add(new_item("Gadget", 5.0, 7)).await.unwrap();

    let items = store.find_by_owner(7).await.unwrap();

    let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Widget", "Gadget"]);
    assert!(items.iter().all(|i| i.owner_id == 7));
}

#[tokio::test]
async fn test_item_find_by_unknown_owner_is_empty() {
    let store = item_store().await;
    store.add(new_item("Widget", 9.99, 7)).await.unwrap();

    assert!(store.find_by_owner(42).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_item_list_all() {
    let store = item_store().await;
    store.add(new_item("Widget", 9.99, 7)).await.unwrap();
    store.add(new_item("Lamp", 12.5, 42)).await.unwrap();

    let items = store.list_all().await.unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[1].price, 12.5);
}

#[tokio::test]
async fn test_item_init_is_idempotent() {
    let store = item_store().await;
    store.add(new_item("Widget", 9.99, 7)).await.unwrap();

    store.init().await.unwrap();

    assert_eq!(store.list_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_account_create_and_lookup() {
    let store = account_store().await;

    let created = store.create("a@x.io", "hash").await.unwrap();

    let by_email = store.find_by_email("a@x.io").await.unwrap().unwrap();
    let by_id = store.get(created.id).await.unwrap().unwrap();
    assert_eq!(by_email, created);
    assert_eq!(by_id, created);
}

#[tokio::test]
async fn test_account_duplicate_email_rejected() {
    let store = account_store().await;
    store.create("a@x.io", "hash").await.unwrap();

    let err = store.create("a@x.io", "other").await.unwrap_err();

    assert!(matches!(
        err,
        StorageError::Duplicate { entity: "account", ref key } if key == "a@x.io"
    ));
}

#[tokio::test]
async fn test_account_missing_lookups_return_none() {
    let store = account_store().await;

    assert!(store.find_by_email("nobody@x.io").await.unwrap().is_none());
    assert!(store.get(99).await.unwrap().is_none());
}

#[tokio::test]
async fn test_account_list_all_in_id_order() {
    let store = account_store().await;
    store.create("b@x.io", "h").await.unwrap();
    store.create("a@x.io", "h").await.unwrap();

    let emails: Vec<_> = store
        .list_all()
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.email)
        .collect();

    assert_eq!(emails, vec!["b@x.io", "a@x.io"]);
}

#[tokio::test]
async fn test_file_backed_store_persists_across_pools() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("items.db");
    let path = path.to_str().unwrap();

    {
        let store = SqliteItemStore::new(open_pool(path).await.unwrap());
        store.init().await.unwrap();
        store.add(new_item("Widget", 9.99, 7)).await.unwrap();
    }

    let store = SqliteItemStore::new(open_pool(path).await.unwrap());
    store.init().await.unwrap();
    assert_eq!(store.find_by_owner(7).await.unwrap().len(), 1);
}
