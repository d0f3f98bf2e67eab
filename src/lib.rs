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

//! # POS Ledger
//!
//! This library provides the core of a point-of-sale application: a catalog
//! of items with stock levels, an in-memory cart, a checkout sequencer that
//! commits a sale atomically, and read-only sales reports. State lives in a
//! local SQLite database.
//!
//! ## Core Components
//!
//! - [`Database`]: Handle to the SQLite store, passed to every component
//! - [`Catalog`]: Item definitions and stock levels
//! - [`Cart`]: Unpersisted item selections, resolved to stable item ids
//! - [`Checkout`]: Validates payment and stock, then records the sale and
//!   decrements stock in one transaction
//! - [`Ledger`]: Append-only history of completed sales
//! - [`Reports`]: Sales per day and quantity sold per item
//! - [`PosError`]: Error types for all of the above
//!
//! ## Example
//!
//! ```
//! use pos_ledger_rs::{Cart, Catalog, Checkout, Database, PosError};
//! use rust_decimal_macros::dec;
//!
//! # async fn run() -> Result<(), PosError> {
//! let db = Database::open_in_memory().await?;
//! let catalog = Catalog::new(&db);
//! catalog.upsert_item("Widget", dec!(2.00), 10).await?;
//!
//! let mut cart = Cart::new();
//! cart.add(&catalog.find_item("Widget").await?, 4)?;
//!
//! let receipt = Checkout::new().process(&db, &mut cart, dec!(10.00)).await?;
//! assert_eq!(receipt.change, dec!(2.00));
//! assert_eq!(catalog.find_item("Widget").await?.stock, 6);
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! The application is a single writer. Multi-step writes run inside one
//! database transaction, so a failed checkout never leaves a partial sale.

pub mod base;
pub mod cart;
pub mod catalog;
mod checkout;
mod db;
pub mod error;
pub mod ledger;
pub mod money;
mod reports;
pub mod settings;
pub mod telemetry;

pub use base::{ItemId, TransactionId};
pub use cart::{Cart, CartLine};
pub use catalog::{Catalog, CatalogEntry};
pub use checkout::{Checkout, CheckoutState, Receipt};
pub use db::Database;
pub use error::{PosError, ValidationError};
pub use ledger::{DailySales, ItemSales, Ledger, NewSale, RecordedSale, SaleRecord};
pub use reports::{DEFAULT_RANKING_LIMIT, Reports};
pub use settings::PosConfig;
