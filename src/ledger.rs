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

//! Append-only sales ledger.
//!
//! A sale is one `transactions` row plus one `transaction_items` row per cart
//! line. Rows are written once, inside the caller's database transaction, and
//! never updated or deleted afterwards.
//!
//! Line items carry a snapshot of the item name and unit price, so history
//! survives removal of the item from the catalog.

use crate::base::{ItemId, TransactionId};
use crate::cart::CartLine;
use crate::db::Database;
use crate::error::{PosError, ValidationError};
use crate::money;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use tracing::debug;

/// A sale about to be written.
#[derive(Debug, Clone, Copy)]
pub struct NewSale<'a> {
    pub total: Decimal,
    pub tendered: Decimal,
    pub change: Decimal,
    pub timestamp: NaiveDateTime,
    pub lines: &'a [CartLine],
}

/// Result of [`Ledger::record_sale`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSale {
    pub transaction_id: TransactionId,
    /// Quantity sold per item, for the stock decrement step.
    pub quantities: BTreeMap<ItemId, i64>,
}

/// A persisted line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    /// `None` once the item has been removed from the catalog.
    pub item_id: Option<ItemId>,
    pub item_name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
}

/// A persisted sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleRecord {
    pub id: TransactionId,
    pub total_amount: Decimal,
    pub payment_received: Decimal,
    pub change_returned: Decimal,
    pub timestamp: NaiveDateTime,
    pub lines: Vec<LineItem>,
}

impl SaleRecord {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: TransactionId(row.try_get("id")?),
            total_amount: money::from_column(row, "total_amount")?,
            payment_received: money::from_column(row, "payment_received")?,
            change_returned: money::from_column(row, "change_returned")?,
            timestamp: row.try_get("timestamp")?,
            lines: Vec::new(),
        })
    }
}

/// Total sales for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub total: Decimal,
}

/// Total quantity sold of one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSales {
    pub item: String,
    pub quantity: i64,
}

/// Read access to the ledger, plus the write entry point used by checkout.
#[derive(Debug, Clone)]
pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    /// Writes a sale and its line items on `conn`.
    ///
    /// Every line's item is looked up by id before anything is written.
    /// Run this inside a transaction: on error the caller rolls back and no
    /// partial sale remains.
    ///
    /// # Errors
    ///
    /// - [`PosError::UnknownItem`] - a line's item no longer exists.
    /// - [`ValidationError::InvalidQuantity`] - a line has a non-positive quantity.
    pub async fn record_sale(
        conn: &mut SqliteConnection,
        sale: NewSale<'_>,
    ) -> Result<RecordedSale, PosError> {
        for line in sale.lines {
            if line.quantity <= 0 {
                return Err(ValidationError::InvalidQuantity.into());
            }
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM items WHERE id = ?1")
                .bind(line.item_id.0)
                .fetch_optional(&mut *conn)
                .await?;
            if exists.is_none() {
                return Err(PosError::UnknownItem(line.item_name.clone()));
            }
        }

        let transaction_id = sqlx::query(
            r#"
            INSERT INTO transactions (total_amount, payment_received, change_returned, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(money::to_column(sale.total))
        .bind(money::to_column(sale.tendered))
        .bind(money::to_column(sale.change))
        .bind(sale.timestamp)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        let mut quantities = BTreeMap::new();
        for line in sale.lines {
            sqlx::query(
                r#"
                INSERT INTO transaction_items (transaction_id, item_id, item_name, unit_price, quantity)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(transaction_id)
            .bind(line.item_id.0)
            .bind(&line.item_name)
            .bind(money::to_column(line.unit_price))
            .bind(line.quantity)
            .execute(&mut *conn)
            .await?;

            let sold = quantities.entry(line.item_id).or_insert(0_i64);
            *sold = sold
                .checked_add(line.quantity)
                .ok_or(ValidationError::InvalidQuantity)?;
        }

        debug!(
            transaction_id,
            lines = sale.lines.len(),
            total = %sale.total,
            "sale recorded"
        );
        Ok(RecordedSale {
            transaction_id: TransactionId(transaction_id),
            quantities,
        })
    }

    /// Loads one sale with its line items.
    ///
    /// # Errors
    ///
    /// [`PosError::TransactionNotFound`] if no sale has that id.
    pub async fn transaction(&self, id: TransactionId) -> Result<SaleRecord, PosError> {
        let row = sqlx::query(
            r#"
            SELECT id, total_amount, payment_received, change_returned, timestamp
            FROM transactions
            WHERE id = ?1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(PosError::TransactionNotFound(id))?;
        let mut record = SaleRecord::from_row(&row)?;

        let lines = sqlx::query(
            r#"
            SELECT item_id, item_name, unit_price, quantity
            FROM transaction_items
            WHERE transaction_id = ?1
            ORDER BY id
            "#,
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await?;

        for line in &lines {
            let item_id: Option<i64> = line.try_get("item_id")?;
            record.lines.push(LineItem {
                item_id: item_id.map(ItemId),
                item_name: line.try_get("item_name")?,
                unit_price: money::from_column(line, "unit_price")?,
                quantity: line.try_get("quantity")?,
            });
        }
        Ok(record)
    }

    /// All sales, oldest first, without their line items.
    pub async fn transactions(&self) -> Result<Vec<SaleRecord>, PosError> {
        let rows = sqlx::query(
            r#"
            SELECT id, total_amount, payment_received, change_returned, timestamp
            FROM transactions
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        let records = rows
            .iter()
            .map(SaleRecord::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Sale totals grouped by calendar date, ascending.
    pub async fn sales_by_day(&self) -> Result<Vec<DailySales>, PosError> {
        let rows = sqlx::query("SELECT total_amount, timestamp FROM transactions")
            .fetch_all(&self.pool)
            .await?;

        let mut days: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for row in &rows {
            let timestamp: NaiveDateTime = row.try_get("timestamp")?;
            let amount = money::from_column(row, "total_amount")?;
            let total = days.entry(timestamp.date()).or_default();
            *total = total
                .checked_add(amount)
                .ok_or(ValidationError::AmountOverflow)?;
        }

        Ok(days
            .into_iter()
            .map(|(date, total)| DailySales { date, total })
            .collect())
    }

    /// Quantity sold per item name, ascending by quantity.
    ///
    /// Ties keep the order in which the items were first sold.
    pub async fn quantity_sold_by_item(&self) -> Result<Vec<ItemSales>, PosError> {
        let rows = sqlx::query(
            r#"
            SELECT item_name, SUM(quantity) AS total_quantity, MIN(id) AS first_line
            FROM transaction_items
            GROUP BY item_name
            ORDER BY total_quantity ASC, first_line ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<ItemSales, PosError> {
                Ok(ItemSales {
                    item: row.try_get("item_name")?,
                    quantity: row.try_get("total_quantity")?,
                })
            })
            .collect()
    }
}
