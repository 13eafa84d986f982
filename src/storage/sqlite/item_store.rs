//! SQLite ItemStore implementation.

use async_trait::async_trait;
use sea_query::{Expr, Order, Query, SqliteQueryBuilder};
use sea_query_binder::SqlxBinder;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::models::{Item, NewItem};
use crate::storage::schema::{Items, CREATE_ITEMS_TABLE};
use crate::storage::{ItemStore, Result};

/// SQLite implementation of ItemStore.
pub struct SqliteItemStore {
    pool: SqlitePool,
}

impl SqliteItemStore {
    /// Create a new SQLite item store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the items table if it does not exist.
    pub async fn init(&self) -> Result<()> {
        sqlx::raw_sql(CREATE_ITEMS_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    fn select() -> sea_query::SelectStatement {
        Query::select()
            .columns([Items::Id, Items::Name, Items::Price, Items::OwnerId])
            .from(Items::Table)
            .order_by(Items::Id, Order::Asc)
            .to_owned()
    }

    fn row_to_item(row: &SqliteRow) -> Result<Item> {
        Ok(Item {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            owner_id: row.try_get("created_by")?,
        })
    }
}

#[async_trait]
impl ItemStore for SqliteItemStore {
    async fn add(&self, item: NewItem) -> Result<Item> {
        let (sql, values) = Query::insert()
            .into_table(Items::Table)
            .columns([Items::Name, Items::Price, Items::OwnerId])
            .values_panic([
                item.name.clone().into(),
                item.price.into(),
                item.owner_id.into(),
            ])
            .build_sqlx(SqliteQueryBuilder);

        let result = sqlx::query_with(&sql, values).execute(&self.pool).await?;

        Ok(Item {
            id: result.last_insert_rowid(),
            name: item.name,
            price: item.price,
            owner_id: item.owner_id,
        })
    }

    async fn list_all(&self) -> Result<Vec<Item>> {
        let (sql, values) = Self::select().build_sqlx(SqliteQueryBuilder);

        let rows = sqlx::query_with(&sql, values).fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_item).collect()
    }

    async fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Item>> {
        let (sql, values) = Self::select()
            .and_where(Expr::col(Items::OwnerId).eq(owner_id))
            .build_sqlx(SqliteQueryBuilder);

        let rows = sqlx::query_with(&sql, values).fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_item).collect()
    }
}
