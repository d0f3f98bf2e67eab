// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Catalog store: item definitions and their stock levels.
//!
//! Every item has exactly one `store` row holding its stock. Saving an
//! existing name overwrites price and stock (stock is set, not added);
//! saving a new name creates both rows in one transaction.

use crate::base::ItemId;
use crate::db::Database;
use crate::error::{PosError, ValidationError};
use crate::money;
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

/// One row of the catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    #[serde(skip)]
    pub id: ItemId,
    pub name: String,
    pub price: Decimal,
    pub stock: i64,
}

impl CatalogEntry {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: ItemId(row.try_get("id")?),
            name: row.try_get("name")?,
            price: money::from_column(row, "price")?,
            stock: row.try_get("stock")?,
        })
    }
}

const SELECT_ENTRIES: &str = r#"
    SELECT i.id, i.name, i.price, s.stock
    FROM items i
    JOIN store s ON s.item_id = i.id
"#;

/// Catalog operations over a [`Database`].
#[derive(Debug, Clone)]
pub struct Catalog {
    pool: SqlitePool,
}

impl Catalog {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Returns the whole catalog in insertion order.
    pub async fn list_items(&self) -> Result<Vec<CatalogEntry>, PosError> {
        let rows = sqlx::query(&format!("{SELECT_ENTRIES} ORDER BY i.id"))
            .fetch_all(&self.pool)
            .await?;
        let entries = rows
            .iter()
            .map(CatalogEntry::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Returns the entries whose name contains `filter`, ignoring case.
    ///
    /// An empty filter matches every item.
    pub async fn search_items(&self, filter: &str) -> Result<Vec<CatalogEntry>, PosError> {
        let needle = filter.trim().to_lowercase();
        let mut entries = self.list_items().await?;
        entries.retain(|entry| entry.name.to_lowercase().contains(&needle));
        Ok(entries)
    }

    /// Looks up one item by exact name.
    ///
    /// # Errors
    ///
    /// [`PosError::ItemNotFound`] if no item has that name.
    pub async fn find_item(&self, name: &str) -> Result<CatalogEntry, PosError> {
        let row = sqlx::query(&format!("{SELECT_ENTRIES} WHERE i.name = ?1"))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| PosError::ItemNotFound(name.to_string()))?;
        Ok(CatalogEntry::from_row(&row)?)
    }

    /// Creates or updates the item called `name`.
    ///
    /// An existing item keeps its id; its price is replaced and its stock is
    /// set to `stock`. Returns the item id.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyName`] - `name` is blank.
    /// - [`ValidationError::NegativePrice`] - `price` is below zero.
    /// - [`ValidationError::NegativeStock`] - `stock` is below zero.
    pub async fn upsert_item(
        &self,
        name: &str,
        price: Decimal,
        stock: i64,
    ) -> Result<ItemId, PosError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if price.is_sign_negative() && !price.is_zero() {
            return Err(ValidationError::NegativePrice.into());
        }
        if stock < 0 {
            return Err(ValidationError::NegativeStock.into());
        }

        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM items WHERE name = ?1")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?;

        let item_id = match existing {
            Some(id) => {
                sqlx::query("UPDATE items SET price = ?1 WHERE id = ?2")
                    .bind(money::to_column(price))
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                // Upsert on the unique item_id also repairs a missing stock row.
                sqlx::query(
                    r#"
                    INSERT INTO store (item_id, stock) VALUES (?1, ?2)
                    ON CONFLICT(item_id) DO UPDATE SET stock = excluded.stock
                    "#,
                )
                .bind(id)
                .bind(stock)
                .execute(&mut *tx)
                .await?;
                debug!(item_id = id, name, %price, stock, "item updated");
                ItemId(id)
            }
            None => {
                let id = sqlx::query("INSERT INTO items (name, price) VALUES (?1, ?2)")
                    .bind(name)
                    .bind(money::to_column(price))
                    .execute(&mut *tx)
                    .await?
                    .last_insert_rowid();
                sqlx::query("INSERT INTO store (item_id, stock) VALUES (?1, ?2)")
                    .bind(id)
                    .bind(stock)
                    .execute(&mut *tx)
                    .await?;
                info!(item_id = id, name, %price, stock, "item created");
                ItemId(id)
            }
        };

        tx.commit().await?;
        Ok(item_id)
    }

    /// Deletes the item called `name` together with its stock row.
    ///
    /// Line items of past sales keep their name and price snapshot; their
    /// item reference is cleared by the database.
    ///
    /// # Errors
    ///
    /// [`PosError::ItemNotFound`] if no item has that name.
    pub async fn remove_item(&self, name: &str) -> Result<(), PosError> {
        let mut tx = self.pool.begin().await?;

        let id: i64 = sqlx::query_scalar("SELECT id FROM items WHERE name = ?1")
            .bind(name)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| PosError::ItemNotFound(name.to_string()))?;

        sqlx::query("DELETE FROM store WHERE item_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM items WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!(item_id = id, name, "item removed");
        Ok(())
    }

    /// Subtracts `quantity` from the stock of `item_id` and returns the new level.
    ///
    /// See [`decrement_stock`] for the version that joins a caller's transaction.
    pub async fn decrement_stock(&self, item_id: ItemId, quantity: i64) -> Result<i64, PosError> {
        let mut conn = self.pool.acquire().await?;
        decrement_stock(&mut conn, item_id, quantity).await
    }
}

/// Name and stock on hand for `item_id`, or `None` if the item is gone.
pub(crate) async fn stock_of(
    conn: &mut SqliteConnection,
    item_id: ItemId,
) -> Result<Option<(String, i64)>, PosError> {
    let row = sqlx::query(
        r#"
        SELECT i.name, s.stock
        FROM items i
        JOIN store s ON s.item_id = i.id
        WHERE i.id = ?1
        "#,
    )
    .bind(item_id.0)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some((row.try_get("name")?, row.try_get("stock")?))),
        None => Ok(None),
    }
}

/// Atomically subtracts `quantity` from the stock of `item_id`.
///
/// The guard is part of the `UPDATE`, so the check and the write happen in
/// one statement and stock can never be driven below zero.
///
/// # Errors
///
/// - [`ValidationError::InvalidQuantity`] - `quantity` is not positive.
/// - [`PosError::InsufficientStock`] - stock on hand is below `quantity`.
/// - [`PosError::ItemNotFound`] - the item (or its stock row) does not exist.
pub async fn decrement_stock(
    conn: &mut SqliteConnection,
    item_id: ItemId,
    quantity: i64,
) -> Result<i64, PosError> {
    if quantity <= 0 {
        return Err(ValidationError::InvalidQuantity.into());
    }

    let remaining: Option<i64> = sqlx::query_scalar(
        "UPDATE store SET stock = stock - ?1 WHERE item_id = ?2 AND stock >= ?1 RETURNING stock",
    )
    .bind(quantity)
    .bind(item_id.0)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(stock) = remaining {
        debug!(%item_id, quantity, stock, "stock decremented");
        return Ok(stock);
    }

    match stock_of(conn, item_id).await? {
        Some((item, available)) => Err(PosError::InsufficientStock {
            item,
            requested: quantity,
            available,
        }),
        None => Err(PosError::ItemNotFound(format!("#{item_id}"))),
    }
}
