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

//! Checkout sequencing.
//!
//! One [`Checkout`] drives one attempt through a linear state machine:
//!
//! ```text
//! Idle ──► Validating ──► Committing ──► Applied
//!              │               │
//!              └───────────────┴──► Rejected
//! ```
//!
//! The ledger write and every stock decrement run inside a single database
//! transaction. A rejected attempt leaves no trace in the database.

use crate::base::{ItemId, TransactionId};
use crate::cart::{Cart, CartLine};
use crate::catalog::{decrement_stock, stock_of};
use crate::db::Database;
use crate::error::PosError;
use crate::ledger::{Ledger, NewSale};
use chrono::{Local, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{error, info, instrument, warn};

/// Result of an applied checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub transaction_id: TransactionId,
    pub total: Decimal,
    pub tendered: Decimal,
    pub change: Decimal,
    pub timestamp: NaiveDateTime,
    pub lines: Vec<CartLine>,
}

/// Where a checkout attempt currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    Validating,
    Committing,
    /// Terminal: the sale is committed.
    Applied(Receipt),
    /// Terminal: nothing was written. Holds the rejection message.
    Rejected(String),
}

impl CheckoutState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Applied(_) | Self::Rejected(_))
    }
}

/// A single checkout attempt.
///
/// Start a new `Checkout` for every sale; a finished one refuses to run again.
#[derive(Debug)]
pub struct Checkout {
    state: CheckoutState,
}

impl Checkout {
    pub fn new() -> Self {
        Self {
            state: CheckoutState::Idle,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    /// Sells the contents of `cart` against `tendered`.
    ///
    /// On success the cart is emptied and the receipt carries the change to
    /// hand back. On failure the cart is left as it was.
    ///
    /// # Errors
    ///
    /// - [`PosError::EmptyCart`] - the cart has no lines.
    /// - [`PosError::InsufficientPayment`] - `tendered` is below the cart total.
    /// - [`PosError::InsufficientStock`] - a line exceeds the stock currently on hand.
    /// - [`PosError::UnknownItem`] - a line's item was removed after it was added.
    /// - [`PosError::StockDivergence`] - a decrement failed after the ledger write.
    /// - [`PosError::CheckoutClosed`] - this attempt already finished.
    #[instrument(skip_all, fields(lines = cart.len(), tendered = %tendered))]
    pub async fn process(
        &mut self,
        db: &Database,
        cart: &mut Cart,
        tendered: Decimal,
    ) -> Result<Receipt, PosError> {
        if self.state != CheckoutState::Idle {
            return Err(PosError::CheckoutClosed);
        }

        match self.run(db, cart, tendered).await {
            Ok(receipt) => {
                info!(
                    transaction_id = %receipt.transaction_id,
                    total = %receipt.total,
                    change = %receipt.change,
                    "checkout applied"
                );
                cart.clear();
                self.state = CheckoutState::Applied(receipt.clone());
                Ok(receipt)
            }
            Err(err) => {
                if err.is_user_error() {
                    warn!(error = %err, "checkout rejected");
                } else {
                    error!(error = %err, "checkout failed");
                }
                self.state = CheckoutState::Rejected(err.to_string());
                Err(err)
            }
        }
    }

    async fn run(
        &mut self,
        db: &Database,
        cart: &Cart,
        tendered: Decimal,
    ) -> Result<Receipt, PosError> {
        self.state = CheckoutState::Validating;

        if cart.is_empty() {
            return Err(PosError::EmptyCart);
        }
        let total = cart.total();
        if tendered < total {
            return Err(PosError::InsufficientPayment { total, tendered });
        }

        // Dropping `tx` without commit rolls back everything below.
        let mut tx = db.pool().begin().await?;

        // An item may span several lines; stock is checked against their sum.
        let mut requested: BTreeMap<ItemId, (&str, i64)> = BTreeMap::new();
        for line in cart.lines() {
            requested
                .entry(line.item_id)
                .or_insert((line.item_name.as_str(), 0))
                .1 += line.quantity;
        }

        for (&item_id, &(name, quantity)) in &requested {
            match stock_of(&mut tx, item_id).await? {
                None => return Err(PosError::UnknownItem(name.to_string())),
                Some((item, available)) if available < quantity => {
                    return Err(PosError::InsufficientStock {
                        item,
                        requested: quantity,
                        available,
                    });
                }
                Some(_) => {}
            }
        }

        let change = tendered - total;
        self.state = CheckoutState::Committing;

        let timestamp = Local::now().naive_local();
        let recorded = Ledger::record_sale(
            &mut tx,
            NewSale {
                total,
                tendered,
                change,
                timestamp,
                lines: cart.lines(),
            },
        )
        .await?;

        for (&item_id, &quantity) in &recorded.quantities {
            if let Err(err) = decrement_stock(&mut tx, item_id, quantity).await {
                error!(
                    transaction_id = %recorded.transaction_id,
                    %item_id,
                    quantity,
                    error = %err,
                    "stock decrement failed after ledger write, rolling back"
                );
                return Err(PosError::StockDivergence {
                    item_id,
                    reason: err.to_string(),
                });
            }
        }

        tx.commit().await?;

        Ok(Receipt {
            transaction_id: recorded.transaction_id,
            total,
            tendered,
            change,
            timestamp,
            lines: cart.lines().to_vec(),
        })
    }
}

impl Default for Checkout {
    fn default() -> Self {
        Self::new()
    }
}
