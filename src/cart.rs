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

//! In-memory cart built before checkout.
//!
//! Lines are resolved to an [`ItemId`] when they are added, so checkout can
//! tell a removed item apart from a renamed one. Each line renders as
//! `"{name}: {qty} x ${price} = ${line total}"`, and that text can be parsed
//! back to find the line again.

use crate::base::ItemId;
use crate::catalog::CatalogEntry;
use crate::error::{PosError, ValidationError};
use crate::money::format_amount;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use std::sync::LazyLock;

static DISPLAY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*?): (\d+) x \$.+ = \$(\d+\.\d{2})$").expect("cart line pattern is valid")
});

/// A selected item and quantity, priced at the time it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub item_id: ItemId,
    pub item_name: String,
    pub unit_price: Decimal,
    pub quantity: i64,
}

impl CartLine {
    /// `unit_price × quantity`.
    ///
    /// # Errors
    ///
    /// [`ValidationError::AmountOverflow`] if the product does not fit a `Decimal`.
    pub fn line_total(&self) -> Result<Decimal, ValidationError> {
        self.unit_price
            .checked_mul(Decimal::from(self.quantity))
            .ok_or(ValidationError::AmountOverflow)
    }

    /// Display text, e.g. `"Widget: 4 x $2.00 = $8.00"`.
    pub fn display(&self) -> String {
        let total = match self.line_total() {
            Ok(total) => format_amount(total),
            Err(err) => err.to_string(),
        };
        format!(
            "{}: {} x {} = {}",
            self.item_name,
            self.quantity,
            format_amount(self.unit_price),
            total
        )
    }
}

/// Fields recovered from a cart display line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayLine {
    pub item_name: String,
    pub quantity: i64,
    pub line_total: Decimal,
}

/// Parses text produced by [`CartLine::display`].
///
/// # Errors
///
/// [`ValidationError::InvalidCartLine`] if the text does not have the
/// display shape.
pub fn parse_display_line(text: &str) -> Result<DisplayLine, ValidationError> {
    let invalid = || ValidationError::InvalidCartLine(text.to_string());
    let captures = DISPLAY_LINE.captures(text).ok_or_else(invalid)?;

    let quantity = captures[2].parse::<i64>().map_err(|_| invalid())?;
    let line_total = Decimal::from_str(&captures[3]).map_err(|_| invalid())?;

    Ok(DisplayLine {
        item_name: captures[1].to_string(),
        quantity,
        line_total,
    })
}

/// Ordered cart lines.
///
/// The same item may appear on several lines; checkout sums them per item.
/// The running total is kept alongside the lines, so it always fits a
/// `Decimal`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
    total: Decimal,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` of a catalog item.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::InvalidQuantity`] - `quantity` is not positive.
    /// - [`PosError::InsufficientStock`] - `quantity`, plus what the cart
    ///   already holds of the item, exceeds the entry's stock.
    /// - [`ValidationError::AmountOverflow`] - the line or cart total is too large.
    pub fn add(&mut self, entry: &CatalogEntry, quantity: i64) -> Result<&CartLine, PosError> {
        if quantity <= 0 {
            return Err(ValidationError::InvalidQuantity.into());
        }
        let requested = self
            .quantity_of(entry.id)
            .checked_add(quantity)
            .ok_or(ValidationError::InvalidQuantity)?;
        if requested > entry.stock {
            return Err(PosError::InsufficientStock {
                item: entry.name.clone(),
                requested,
                available: entry.stock,
            });
        }

        let line = CartLine {
            item_id: entry.id,
            item_name: entry.name.clone(),
            unit_price: entry.price,
            quantity,
        };
        self.total = self
            .total
            .checked_add(line.line_total()?)
            .ok_or(ValidationError::AmountOverflow)?;

        let index = self.lines.len();
        self.lines.push(line);
        Ok(&self.lines[index])
    }

    /// Quantity of `item_id` across all lines.
    pub fn quantity_of(&self, item_id: ItemId) -> i64 {
        self.lines
            .iter()
            .filter(|line| line.item_id == item_id)
            .map(|line| line.quantity)
            .sum()
    }

    /// Removes the line for the item called `name`.
    pub fn remove(&mut self, name: &str) -> Result<CartLine, PosError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.item_name == name)
            .ok_or_else(|| PosError::ItemNotFound(name.to_string()))?;
        self.take_line(index)
    }

    /// Removes the line whose display text is `text`.
    ///
    /// Matches on item name and quantity, as shown in the text.
    pub fn remove_display_line(&mut self, text: &str) -> Result<CartLine, PosError> {
        let parsed = parse_display_line(text)?;
        let index = self
            .lines
            .iter()
            .position(|line| line.item_name == parsed.item_name && line.quantity == parsed.quantity)
            .ok_or(PosError::ItemNotFound(parsed.item_name))?;
        self.take_line(index)
    }

    fn take_line(&mut self, index: usize) -> Result<CartLine, PosError> {
        let line = self.lines.remove(index);
        // Part of a total that already fit, so the subtraction cannot overflow.
        self.total -= line.line_total()?;
        Ok(line)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.total = Decimal::ZERO;
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all line totals.
    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn display_lines(&self) -> Vec<String> {
        self.lines.iter().map(CartLine::display).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(id: i64, name: &str, price: Decimal, stock: i64) -> CatalogEntry {
        CatalogEntry {
            id: ItemId(id),
            name: name.to_string(),
            price,
            stock,
        }
    }

    #[test]
    fn add_prices_line_and_updates_total() {
        let mut cart = Cart::new();
        cart.add(&entry(1, "Widget", dec!(2.00), 10), 4).unwrap();
        cart.add(&entry(2, "Gadget", dec!(1.25), 5), 2).unwrap();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.lines()[0].line_total(), Ok(dec!(8.00)));
        assert_eq!(cart.total(), dec!(10.50));
    }

    #[test]
    fn add_rejects_quantity_above_stock() {
        let mut cart = Cart::new();
        let result = cart.add(&entry(1, "Widget", dec!(2.00), 3), 5);

        assert!(matches!(
            result,
            Err(PosError::InsufficientStock {
                requested: 5,
                available: 3,
                ..
            })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn add_rejects_non_positive_quantity() {
        let mut cart = Cart::new();
        let result = cart.add(&entry(1, "Widget", dec!(2.00), 3), 0);
        assert!(matches!(
            result,
            Err(PosError::Validation(ValidationError::InvalidQuantity))
        ));
    }

    #[test]
    fn same_item_can_be_added_twice() {
        let mut cart = Cart::new();
        let widget = entry(1, "Widget", dec!(2.00), 10);
        cart.add(&widget, 2).unwrap();
        cart.add(&widget, 3).unwrap();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.quantity_of(ItemId(1)), 5);
        assert_eq!(cart.total(), dec!(10.00));
    }

    #[test]
    fn repeated_item_is_checked_against_combined_stock() {
        let mut cart = Cart::new();
        let widget = entry(1, "Widget", dec!(2.00), 10);
        cart.add(&widget, 6).unwrap();

        let result = cart.add(&widget, 5);
        assert!(matches!(
            result,
            Err(PosError::InsufficientStock {
                ref item,
                requested: 11,
                available: 10,
            }) if item == "Widget"
        ));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total(), dec!(12.00));
    }

    #[test]
    fn line_total_overflow_is_rejected() {
        let mut cart = Cart::new();
        let gold = entry(1, "Gold", dec!(10000000000000000000000), 100_000_000);

        let result = cart.add(&gold, 100_000_000);

        assert!(matches!(
            result,
            Err(PosError::Validation(ValidationError::AmountOverflow))
        ));
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn cart_total_overflow_is_rejected() {
        let mut cart = Cart::new();
        let big = entry(1, "Big", Decimal::MAX, 2);
        cart.add(&big, 1).unwrap();

        let result = cart.add(&big, 1);

        assert!(matches!(
            result,
            Err(PosError::Validation(ValidationError::AmountOverflow))
        ));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total(), Decimal::MAX);
    }

    #[test]
    fn display_line_format() {
        let mut cart = Cart::new();
        cart.add(&entry(1, "Widget", dec!(2), 10), 4).unwrap();
        assert_eq!(cart.display_lines(), vec!["Widget: 4 x $2.00 = $8.00"]);
    }

    #[test]
    fn parse_display_line_extracts_fields() {
        let parsed = parse_display_line("Widget: 4 x $2.00 = $8.00").unwrap();
        assert_eq!(
            parsed,
            DisplayLine {
                item_name: "Widget".into(),
                quantity: 4,
                line_total: dec!(8.00),
            }
        );
    }

    #[test]
    fn parse_display_line_handles_names_with_colons() {
        let line = CartLine {
            item_id: ItemId(3),
            item_name: "Tea: Green, loose".into(),
            unit_price: dec!(3.5),
            quantity: 3,
        };
        let parsed = parse_display_line(&line.display()).unwrap();
        assert_eq!(parsed.item_name, "Tea: Green, loose");
        assert_eq!(parsed.quantity, 3);
        assert_eq!(parsed.line_total, dec!(10.50));
    }

    #[test]
    fn parse_display_line_rejects_other_text() {
        assert_eq!(
            parse_display_line("Total: $8.00"),
            Err(ValidationError::InvalidCartLine("Total: $8.00".into()))
        );
    }

    #[test]
    fn remove_display_line_drops_matching_line() {
        let mut cart = Cart::new();
        cart.add(&entry(1, "Widget", dec!(2.00), 10), 4).unwrap();
        cart.add(&entry(2, "Gadget", dec!(1.25), 5), 2).unwrap();

        let removed = cart.remove_display_line("Widget: 4 x $2.00 = $8.00").unwrap();

        assert_eq!(removed.item_id, ItemId(1));
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total(), dec!(2.50));
    }

    #[test]
    fn remove_display_line_requires_matching_quantity() {
        let mut cart = Cart::new();
        cart.add(&entry(1, "Widget", dec!(2.00), 10), 4).unwrap();

        let result = cart.remove_display_line("Widget: 3 x $2.00 = $6.00");
        assert!(matches!(result, Err(PosError::ItemNotFound(ref name)) if name == "Widget"));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn remove_by_name_and_clear() {
        let mut cart = Cart::new();
        cart.add(&entry(1, "Widget", dec!(2.00), 10), 1).unwrap();
        cart.add(&entry(2, "Gadget", dec!(1.25), 5), 1).unwrap();

        cart.remove("Gadget").unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total(), dec!(2.00));
        assert!(matches!(cart.remove("Gadget"), Err(PosError::ItemNotFound(_))));

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }
}
