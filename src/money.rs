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

//! Money parsing, formatting and column storage.
//!
//! Amounts are [`Decimal`] end to end. SQLite has no decimal type, so they
//! are stored as TEXT and parsed back on read.

use crate::error::ValidationError;
use rust_decimal::Decimal;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use std::str::FromStr;

/// Decimal places shown for currency amounts.
pub const CURRENCY_PRECISION: u32 = 2;

/// Parses a user-entered, non-negative amount.
///
/// Accepts an optional leading `$` and a comma as the decimal separator,
/// so `"2,50"`, `"$2.50"` and `" 2.5 "` all parse to `2.50`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidAmount`] for empty, non-numeric or
/// negative input.
pub fn parse_amount(input: &str) -> Result<Decimal, ValidationError> {
    let trimmed = input.trim();
    let unsigned = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    let normalized = unsigned.replace(',', ".");

    let amount = Decimal::from_str(&normalized)
        .map_err(|_| ValidationError::InvalidAmount(input.to_string()))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ValidationError::InvalidAmount(input.to_string()));
    }
    Ok(amount)
}

/// Formats an amount as `$` plus exactly two decimal places.
pub fn format_amount(amount: Decimal) -> String {
    let mut value = amount.round_dp(CURRENCY_PRECISION);
    value.rescale(CURRENCY_PRECISION);
    format!("${value}")
}

/// Encodes an amount for a TEXT column.
pub(crate) fn to_column(amount: Decimal) -> String {
    amount.to_string()
}

/// Reads an amount stored by [`to_column`].
pub(crate) fn from_column(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let text: String = row.try_get(column)?;
    Decimal::from_str(&text).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_plain_and_dollar_prefixed_amounts() {
        assert_eq!(parse_amount("10").unwrap(), dec!(10));
        assert_eq!(parse_amount("$12.50").unwrap(), dec!(12.50));
        assert_eq!(parse_amount("  7.25 ").unwrap(), dec!(7.25));
    }

    #[test]
    fn comma_is_accepted_as_decimal_separator() {
        assert_eq!(parse_amount("2,50").unwrap(), dec!(2.50));
    }

    #[test]
    fn rejects_empty_garbage_and_negative_input() {
        assert_eq!(
            parse_amount(""),
            Err(ValidationError::InvalidAmount(String::new()))
        );
        assert_eq!(
            parse_amount("ten"),
            Err(ValidationError::InvalidAmount("ten".into()))
        );
        assert_eq!(
            parse_amount("-1.00"),
            Err(ValidationError::InvalidAmount("-1.00".into()))
        );
    }

    #[test]
    fn zero_is_a_valid_amount() {
        assert_eq!(parse_amount("0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn formats_with_two_decimal_places() {
        assert_eq!(format_amount(dec!(8)), "$8.00");
        assert_eq!(format_amount(dec!(2.5)), "$2.50");
        assert_eq!(format_amount(dec!(0.125)), "$0.12");
        assert_eq!(format_amount(dec!(1234.5678)), "$1234.57");
    }
}
