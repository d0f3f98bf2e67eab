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

use anyhow::Context;
use clap::{Parser, Subcommand};
use csv::Writer;
use pos_ledger_rs::money::{format_amount, parse_amount};
use pos_ledger_rs::telemetry::init_tracing;
use pos_ledger_rs::{
    Cart, Catalog, CatalogEntry, Checkout, DailySales, Database, ItemSales, PosConfig, PosError,
    Receipt, Reports,
};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::PathBuf;
use std::process;

/// Point of Sale - Manage the catalog, sell items and report on sales
///
/// Catalog listings and reports are written to stdout as CSV.
#[derive(Parser, Debug)]
#[command(name = "pos")]
#[command(about = "A point-of-sale terminal backed by a local SQLite database", long_about = None)]
struct Args {
    /// SQLite database file (overrides the configuration)
    #[arg(long, global = true, value_name = "PATH")]
    database: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true, value_name = "FILE", env = "POS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List catalog items as CSV
    Items {
        /// Only items whose name contains this text (case-insensitive)
        #[arg(long, default_value = "")]
        filter: String,
    },
    /// Add an item, or update price and stock of an existing one
    Save {
        name: String,
        /// Unit price, e.g. 2.50 or 2,50
        #[arg(value_parser = parse_price)]
        price: Decimal,
        stock: i64,
    },
    /// Remove an item and its stock entry
    Remove { name: String },
    /// Sell the given items
    ///
    /// Example: pos checkout --tendered 10 Widget=4 Gadget=1
    Checkout {
        /// Amount handed over by the customer
        #[arg(long, value_parser = parse_price)]
        tendered: Decimal,
        /// Cart lines as NAME=QUANTITY
        #[arg(required = true, value_parser = parse_cart_arg)]
        lines: Vec<(String, i64)>,
    },
    /// Sales totals per day as CSV
    Sales,
    /// Quantity sold per item as CSV, ascending
    Sold {
        /// Only the N best sellers
        #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "5", conflicts_with = "least")]
        most: Option<usize>,
        /// Only the N worst sellers
        #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "5")]
        least: Option<usize>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    let mut config = match PosConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };
    if let Some(path) = args.database.clone() {
        config.database_path = path;
    }

    init_tracing(&config.log_level, config.log_json);

    if let Err(e) = run(&config, args.command).await {
        match e.downcast_ref::<PosError>() {
            Some(pos) if pos.is_user_error() => eprintln!("Warning: {}", pos),
            _ => eprintln!("Error: {:#}", e),
        }
        process::exit(1);
    }
}

async fn run(config: &PosConfig, command: Command) -> anyhow::Result<()> {
    let db = Database::open(&config.database_path, config.max_connections)
        .await
        .with_context(|| {
            format!(
                "failed to open database at {}",
                config.database_path.display()
            )
        })?;

    let result = execute(&db, command).await;
    db.close().await;
    result
}

async fn execute(db: &Database, command: Command) -> anyhow::Result<()> {
    let catalog = Catalog::new(db);
    let reports = Reports::new(db);
    let stdout = std::io::stdout();

    match command {
        Command::Items { filter } => {
            let entries = catalog.search_items(&filter).await?;
            write_catalog(&entries, stdout.lock())?;
        }
        Command::Save { name, price, stock } => {
            catalog.upsert_item(&name, price, stock).await?;
            println!("Saved '{}'", name.trim());
        }
        Command::Remove { name } => {
            catalog.remove_item(&name).await?;
            println!("Removed '{}'", name);
        }
        Command::Checkout { tendered, lines } => {
            let mut cart = Cart::new();
            for (name, quantity) in lines {
                let entry = catalog.find_item(&name).await?;
                cart.add(&entry, quantity)?;
            }
            let receipt = Checkout::new().process(db, &mut cart, tendered).await?;
            write_receipt(&receipt, stdout.lock())?;
        }
        Command::Sales => {
            write_daily_sales(&reports.sales_by_day().await?, stdout.lock())?;
        }
        Command::Sold { most, least } => {
            let sold = match (most, least) {
                (Some(n), _) => reports.most_sold(n).await?,
                (None, Some(n)) => reports.least_sold(n).await?,
                (None, None) => reports.quantity_sold_by_item().await?,
            };
            write_item_sales(&sold, stdout.lock())?;
        }
    }

    Ok(())
}

fn parse_price(value: &str) -> Result<Decimal, String> {
    parse_amount(value).map_err(|e| e.to_string())
}

/// Parses a `NAME=QUANTITY` cart argument. The name may itself contain `=`.
fn parse_cart_arg(value: &str) -> Result<(String, i64), String> {
    let (name, quantity) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=QUANTITY, got {:?}", value))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing item name in {:?}", value));
    }
    let quantity = quantity
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("invalid quantity in {:?}: {}", value, e))?;
    Ok((name.to_string(), quantity))
}

/// Write the catalog as CSV.
///
/// # CSV Format
///
/// Columns: `name, price, stock`
///
/// ```csv
/// name,price,stock
/// Widget,2.00,10
/// ```
fn write_catalog<W: Write>(entries: &[CatalogEntry], writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for entry in entries {
        wtr.serialize(entry)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write per-day sales totals as CSV (`date, total`).
fn write_daily_sales<W: Write>(days: &[DailySales], writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for day in days {
        wtr.serialize(day)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write quantity sold per item as CSV (`item, quantity`).
fn write_item_sales<W: Write>(sold: &[ItemSales], writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);
    for item in sold {
        wtr.serialize(item)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a human-readable receipt.
fn write_receipt<W: Write>(receipt: &Receipt, mut writer: W) -> std::io::Result<()> {
    writeln!(writer, "Transaction #{}", receipt.transaction_id)?;
    for line in &receipt.lines {
        writeln!(writer, "  {}", line.display())?;
    }
    writeln!(writer, "Total:    {}", format_amount(receipt.total))?;
    writeln!(writer, "Received: {}", format_amount(receipt.tendered))?;
    writeln!(writer, "Change:   {}", format_amount(receipt.change))?;
    Ok(())
}
