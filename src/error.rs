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

//! Error types for catalog, cart and checkout operations.

use crate::base::{ItemId, TransactionId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Rejected input values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Item name is empty or whitespace
    #[error("item name must not be empty")]
    EmptyName,

    /// Unit price below zero
    #[error("price must not be negative")]
    NegativePrice,

    /// Stock level below zero
    #[error("stock must not be negative")]
    NegativeStock,

    /// Cart or sale quantity is zero or negative
    #[error("quantity must be positive")]
    InvalidQuantity,

    /// A line or sale total does not fit a `Decimal`
    #[error("amount too large")]
    AmountOverflow,

    /// Text that does not parse as a money amount
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),

    /// Text that does not match the cart line display format
    #[error("unrecognized cart line: {0:?}")]
    InvalidCartLine(String),
}

/// Point-of-sale errors.
#[derive(Error, Debug)]
pub enum PosError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No catalog item with this name
    #[error("item not found: {0}")]
    ItemNotFound(String),

    /// No recorded sale with this id
    #[error("transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    /// Requested quantity exceeds the stock on hand
    #[error("insufficient stock for {item}: requested {requested}, available {available}")]
    InsufficientStock {
        item: String,
        requested: i64,
        available: i64,
    },

    /// Tendered amount is below the cart total
    #[error("insufficient payment: total {total}, tendered {tendered}")]
    InsufficientPayment { total: Decimal, tendered: Decimal },

    /// Checkout attempted with nothing in the cart
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line refers to an item that has since been removed
    #[error("item no longer in catalog: {0}")]
    UnknownItem(String),

    /// Stock decrement failed after the sale was written to the ledger.
    ///
    /// The surrounding database transaction is rolled back, so neither the
    /// sale nor any decrement is persisted.
    #[error("stock update for item {item_id} failed after ledger write: {reason}")]
    StockDivergence { item_id: ItemId, reason: String },

    /// The checkout attempt already reached a terminal state
    #[error("checkout already finished")]
    CheckoutClosed,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl PosError {
    /// Returns `true` for conditions caused by user input that the caller
    /// should show as a warning and recover from.
    ///
    /// Ledger/stock divergence, misuse of a finished checkout and storage
    /// failures return `false`.
    pub fn is_user_error(&self) -> bool {
        match self {
            Self::Validation(_)
            | Self::ItemNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::InsufficientStock { .. }
            | Self::InsufficientPayment { .. }
            | Self::EmptyCart
            | Self::UnknownItem(_) => true,
            Self::StockDivergence { .. } | Self::CheckoutClosed | Self::Database(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn error_display_messages() {
        assert_eq!(
            PosError::from(ValidationError::EmptyName).to_string(),
            "item name must not be empty"
        );
        assert_eq!(
            ValidationError::AmountOverflow.to_string(),
            "amount too large"
        );
        assert_eq!(
            ValidationError::InvalidAmount("abc".into()).to_string(),
            "invalid amount: \"abc\""
        );
        assert_eq!(
            PosError::ItemNotFound("Widget".into()).to_string(),
            "item not found: Widget"
        );
        assert_eq!(
            PosError::TransactionNotFound(TransactionId(7)).to_string(),
            "transaction not found: 7"
        );
        assert_eq!(
            PosError::InsufficientStock {
                item: "Widget".into(),
                requested: 5,
                available: 3,
            }
            .to_string(),
            "insufficient stock for Widget: requested 5, available 3"
        );
        assert_eq!(
            PosError::InsufficientPayment {
                total: dec!(12.50),
                tendered: dec!(10.00),
            }
            .to_string(),
            "insufficient payment: total 12.50, tendered 10.00"
        );
        assert_eq!(PosError::EmptyCart.to_string(), "cart is empty");
        assert_eq!(
            PosError::UnknownItem("Widget".into()).to_string(),
            "item no longer in catalog: Widget"
        );
    }

    #[test]
    fn user_errors_are_separated_from_consistency_failures() {
        assert!(PosError::EmptyCart.is_user_error());
        assert!(PosError::UnknownItem("x".into()).is_user_error());
        assert!(PosError::from(ValidationError::NegativePrice).is_user_error());
        assert!(
            !PosError::StockDivergence {
                item_id: ItemId(1),
                reason: "stock went negative".into(),
            }
            .is_user_error()
        );
        assert!(!PosError::CheckoutClosed.is_user_error());
        assert!(!PosError::Database(sqlx::Error::RowNotFound).is_user_error());
    }
}
