//! SQLite AccountStore implementation.

use async_trait::async_trait;
use sea_query::{Expr, Order, Query, SelectStatement, SqliteQueryBuilder};
use sea_query_binder::SqlxBinder;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::models::Account;
use crate::storage::schema::{Accounts, CREATE_ACCOUNTS_TABLE};
use crate::storage::{AccountStore, Result, StorageError};

/// SQLite implementation of AccountStore.
pub struct SqliteAccountStore {
    pool: SqlitePool,
}

impl SqliteAccountStore {
    /// Create a new SQLite account store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the accounts table if it does not exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::raw_sql(CREATE_ACCOUNTS_TABLE)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn select() -> SelectStatement {
        Query::select()
            .columns([Accounts::Id, Accounts::Email, Accounts::Credential])
            .from(Accounts::Table)
            .to_owned()
    }

    fn row_to_account(row: &SqliteRow) -> Result<Account> {
        Ok(Account {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            credential: row.try_get("credential")?,
        })
    }

    async fn fetch_one(&self, query: &mut SelectStatement) -> Result<Option<Account>> {
        let (sql, values) = query.limit(1).build_sqlx(SqliteQueryBuilder);

        let row = sqlx::query_with(&sql, values)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::row_to_account).transpose()
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn create(&self, email: &str, credential: &str) -> Result<Account> {
        let (sql, values) = Query::insert()
            .into_table(Accounts::Table)
            .columns([Accounts::Email, Accounts::Credential])
            .values_panic([email.into(), credential.into()])
            .build_sqlx(SqliteQueryBuilder);

        let result = sqlx::query_with(&sql, values)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StorageError::Duplicate {
                        entity: "account",
                        key: email.to_string(),
                    }
                }
                other => StorageError::Database(other),
            })?;

        Ok(Account {
            id: result.last_insert_rowid(),
            email: email.to_string(),
            credential: credential.to_string(),
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.fetch_one(Self::select().and_where(Expr::col(Accounts::Email).eq(email)))
            .await
    }

    async fn get(&self, id: i64) -> Result<Option<Account>> {
        self.fetch_one(Self::select().and_where(Expr::col(Accounts::Id).eq(id)))
            .await
    }

    async fn list_all(&self) -> Result<Vec<Account>> {
        let (sql, values) = Self::select()
            .order_by(Accounts::Id, Order::Asc)
            .build_sqlx(SqliteQueryBuilder);

        let rows = sqlx::query_with(&sql, values).fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_account).collect()
    }
}
