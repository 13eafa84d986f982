//! Storage configuration types.

use serde::Deserialize;

/// SQLite database locations, one per service.
///
/// `:memory:` gives a private in-memory database.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the identity service's account database.
    pub identity_path: String,
    /// Path to the catalog service's item database.
    pub catalog_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            identity_path: "./data/users.db".to_string(),
            catalog_path: "./data/products.db".to_string(),
        }
    }
}
