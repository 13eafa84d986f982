//! Records owned by the two services.

use serde::{Deserialize, Serialize};

/// A catalog item. Owned by the catalog store; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub price: f64,
    /// Identity account id of the creator.
    pub owner_id: i64,
}

/// Fields supplied when creating an item; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub price: f64,
    pub owner_id: i64,
}

/// An identity account.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: i64,
    /// Unique across accounts.
    pub email: String,
    /// Argon2 PHC string, never the plain password.
    pub credential: String,
}
