//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Items table schema (catalog service).
#[derive(Iden)]
pub enum Items {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "name"]
    Name,
    #[iden = "price"]
    Price,
    #[iden = "created_by"]
    OwnerId,
}

/// Accounts table schema (identity service).
#[derive(Iden)]
pub enum Accounts {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "email"]
    Email,
    #[iden = "credential"]
    Credential,
}

/// SQL for creating the items table.
pub const CREATE_ITEMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    price REAL NOT NULL,
    created_by INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_created_by ON items(created_by);
"#;

/// SQL for creating the accounts table.
pub const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL UNIQUE,
    credential TEXT NOT NULL
);
"#;
