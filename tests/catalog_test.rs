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

//! Catalog store integration tests.

use pos_ledger_rs::{Catalog, Database, ItemId, PosError, ValidationError};
use rust_decimal_macros::dec;

async fn setup() -> (Database, Catalog) {
    let db = Database::open_in_memory().await.unwrap();
    let catalog = Catalog::new(&db);
    (db, catalog)
}

#[tokio::test]
async fn upsert_then_list_contains_item() {
    let (_db, catalog) = setup().await;
    catalog.upsert_item("Widget", dec!(2.00), 10).await.unwrap();

    let items = catalog.list_items().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Widget");
    assert_eq!(items[0].price, dec!(2.00));
    assert_eq!(items[0].stock, 10);
}

#[tokio::test]
async fn upsert_existing_name_overwrites_price_and_stock() {
    let (_db, catalog) = setup().await;
    let first = catalog.upsert_item("Widget", dec!(2.00), 10).await.unwrap();
    let second = catalog.upsert_item("Widget", dec!(2.50), 3).await.unwrap();

    assert_eq!(first, second);
    let items = catalog.list_items().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].price, dec!(2.50));
    // Stock is set, not added
    assert_eq!(items[0].stock, 3);
}

#[tokio::test]
async fn list_keeps_insertion_order_after_update() {
    let (_db, catalog) = setup().await;
    catalog.upsert_item("Widget", dec!(2.00), 10).await.unwrap();
    catalog.upsert_item("Gadget", dec!(5.00), 1).await.unwrap();
    catalog.upsert_item("Bolt", dec!(0.10), 500).await.unwrap();
    catalog.upsert_item("Widget", dec!(2.20), 8).await.unwrap();

    let names: Vec<_> = catalog
        .list_items()
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(names, vec!["Widget", "Gadget", "Bolt"]);
}

#[tokio::test]
async fn upsert_trims_name() {
    let (_db, catalog) = setup().await;
    catalog.upsert_item("  Widget ", dec!(2.00), 1).await.unwrap();

    let entry = catalog.find_item("Widget").await.unwrap();
    assert_eq!(entry.name, "Widget");
}

#[tokio::test]
async fn upsert_rejects_empty_name() {
    let (_db, catalog) = setup().await;
    let result = catalog.upsert_item("   ", dec!(1.00), 1).await;

    assert!(matches!(
        result,
        Err(PosError::Validation(ValidationError::EmptyName))
    ));
    assert!(catalog.list_items().await.unwrap().is_empty());
}

#[tokio::test]
async fn upsert_rejects_negative_price() {
    let (_db, catalog) = setup().await;
    let result = catalog.upsert_item("Widget", dec!(-0.01), 1).await;

    assert!(matches!(
        result,
        Err(PosError::Validation(ValidationError::NegativePrice))
    ));
}

#[tokio::test]
async fn upsert_rejects_negative_stock() {
    let (_db, catalog) = setup().await;
    let result = catalog.upsert_item("Widget", dec!(1.00), -1).await;

    assert!(matches!(
        result,
        Err(PosError::Validation(ValidationError::NegativeStock))
    ));
}

#[tokio::test]
async fn zero_price_and_zero_stock_are_valid() {
    let (_db, catalog) = setup().await;
    catalog.upsert_item("Sample", dec!(0), 0).await.unwrap();

    let entry = catalog.find_item("Sample").await.unwrap();
    assert_eq!(entry.price, dec!(0));
    assert_eq!(entry.stock, 0);
}

#[tokio::test]
async fn remove_missing_item_returns_not_found() {
    let (_db, catalog) = setup().await;
    let result = catalog.remove_item("Widget").await;

    assert!(matches!(result, Err(PosError::ItemNotFound(ref name)) if name == "Widget"));
}

#[tokio::test]
async fn remove_present_item_drops_it_and_its_stock() {
    let (db, catalog) = setup().await;
    catalog.upsert_item("Widget", dec!(2.00), 10).await.unwrap();
    catalog.upsert_item("Gadget", dec!(5.00), 1).await.unwrap();

    catalog.remove_item("Widget").await.unwrap();

    let names: Vec<_> = catalog
        .list_items()
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(names, vec!["Gadget"]);

    let stock_rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM store")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(stock_rows, 1);
}

#[tokio::test]
async fn removed_name_can_be_created_again() {
    let (_db, catalog) = setup().await;
    let old = catalog.upsert_item("Widget", dec!(2.00), 10).await.unwrap();
    catalog.remove_item("Widget").await.unwrap();
    let new = catalog.upsert_item("Widget", dec!(3.00), 4).await.unwrap();

    assert_ne!(old, new);
    assert_eq!(catalog.find_item("Widget").await.unwrap().stock, 4);
}

#[tokio::test]
async fn find_missing_item_returns_not_found() {
    let (_db, catalog) = setup().await;
    let result = catalog.find_item("Nothing").await;
    assert!(matches!(result, Err(PosError::ItemNotFound(_))));
}

#[tokio::test]
async fn search_is_case_insensitive_substring() {
    let (_db, catalog) = setup().await;
    catalog.upsert_item("Blue Widget", dec!(2.00), 1).await.unwrap();
    catalog.upsert_item("Gadget", dec!(5.00), 1).await.unwrap();
    catalog.upsert_item("widget stand", dec!(9.00), 1).await.unwrap();

    let found: Vec<_> = catalog
        .search_items("WIDGET")
        .await
        .unwrap()
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(found, vec!["Blue Widget", "widget stand"]);

    assert_eq!(catalog.search_items("").await.unwrap().len(), 3);
    assert!(catalog.search_items("bolt").await.unwrap().is_empty());
}

#[tokio::test]
async fn decrement_stock_subtracts_quantity() {
    let (_db, catalog) = setup().await;
    let id = catalog.upsert_item("Widget", dec!(2.00), 10).await.unwrap();

    let remaining = catalog.decrement_stock(id, 4).await.unwrap();

    assert_eq!(remaining, 6);
    assert_eq!(catalog.find_item("Widget").await.unwrap().stock, 6);
}

#[tokio::test]
async fn decrement_stock_to_exactly_zero() {
    let (_db, catalog) = setup().await;
    let id = catalog.upsert_item("Widget", dec!(2.00), 3).await.unwrap();

    assert_eq!(catalog.decrement_stock(id, 3).await.unwrap(), 0);
}

#[tokio::test]
async fn decrement_stock_never_goes_negative() {
    let (_db, catalog) = setup().await;
    let id = catalog.upsert_item("Widget", dec!(2.00), 3).await.unwrap();

    let result = catalog.decrement_stock(id, 5).await;

    assert!(matches!(
        result,
        Err(PosError::InsufficientStock {
            ref item,
            requested: 5,
            available: 3,
        }) if item == "Widget"
    ));
    assert_eq!(catalog.find_item("Widget").await.unwrap().stock, 3);
}

#[tokio::test]
async fn decrement_stock_of_unknown_item_fails() {
    let (_db, catalog) = setup().await;
    let result = catalog.decrement_stock(ItemId(42), 1).await;
    assert!(matches!(result, Err(PosError::ItemNotFound(_))));
}

#[tokio::test]
async fn decrement_stock_rejects_non_positive_quantity() {
    let (_db, catalog) = setup().await;
    let id = catalog.upsert_item("Widget", dec!(2.00), 3).await.unwrap();

    let result = catalog.decrement_stock(id, 0).await;
    assert!(matches!(
        result,
        Err(PosError::Validation(ValidationError::InvalidQuantity))
    ));
}
