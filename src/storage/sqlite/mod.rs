//! SQLite implementations of storage interfaces.

mod account_store;
mod item_store;

pub use account_store::SqliteAccountStore;
pub use item_store::SqliteItemStore;

#[cfg(test)]
mod tests;
