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

//! Read-only sales views for charting.

use crate::db::Database;
use crate::error::PosError;
use crate::ledger::{DailySales, ItemSales, Ledger};

/// Number of items shown in the most/least sold rankings.
pub const DEFAULT_RANKING_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct Reports {
    ledger: Ledger,
}

impl Reports {
    pub fn new(db: &Database) -> Self {
        Self {
            ledger: Ledger::new(db),
        }
    }

    pub async fn sales_by_day(&self) -> Result<Vec<DailySales>, PosError> {
        self.ledger.sales_by_day().await
    }

    pub async fn quantity_sold_by_item(&self) -> Result<Vec<ItemSales>, PosError> {
        self.ledger.quantity_sold_by_item().await
    }

    /// The `limit` best sellers, still in ascending order (best seller last).
    pub async fn most_sold(&self, limit: usize) -> Result<Vec<ItemSales>, PosError> {
        let mut sold = self.quantity_sold_by_item().await?;
        let start = sold.len().saturating_sub(limit);
        Ok(sold.split_off(start))
    }

    /// The `limit` worst sellers, ascending (worst seller first).
    pub async fn least_sold(&self, limit: usize) -> Result<Vec<ItemSales>, PosError> {
        let mut sold = self.quantity_sold_by_item().await?;
        sold.truncate(limit);
        Ok(sold)
    }
}
