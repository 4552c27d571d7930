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

use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use market_rs::{AccountId, Market, Product, ProductId};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

/// Book Market - Seed a marketplace and settle deal batches
///
/// Reads a JSON seed file, optionally settles a CSV batch of deals against
/// the seeded account, and outputs the remaining catalog to stdout.
#[derive(Parser, Debug)]
#[command(name = "market-rs")]
#[command(about = "A book marketplace engine that settles purchase deals", long_about = None)]
struct Args {
    /// Path to JSON seed file with the account balance and product list
    #[arg(value_name = "SEED")]
    seed: PathBuf,

    /// Optional path to a CSV file of deals to settle
    ///
    /// Expected format: product,quantity
    /// Example: cargo run -- seed.json deals.csv > catalog.csv
    #[arg(value_name = "DEALS")]
    deals: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Seed the market. A malformed seed aborts before any store is touched.
    let market = Market::new();
    let seed_file = match File::open(&args.seed) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error opening seed file '{}': {}", args.seed.display(), e);
            process::exit(1);
        }
    };
    let account_id = match market.load_seed(BufReader::new(seed_file)) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("Error loading seed data: {}", e);
            process::exit(1);
        }
    };

    // Settle deals from CSV, if a batch was given.
    if let Some(deals_path) = &args.deals {
        let file = match File::open(deals_path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Error opening deals file '{}': {}", deals_path.display(), e);
                process::exit(1);
            }
        };
        if let Err(e) = settle_deals(&market, account_id, BufReader::new(file)) {
            eprintln!("Error processing deals: {}", e);
            process::exit(1);
        }
    }

    // Write the remaining catalog to stdout.
    if let Err(e) = write_catalog(&market, std::io::stdout()) {
        eprintln!("Error writing output: {}", e);
        process::exit(1);
    }
}

/// Raw CSV record matching the deal batch format.
///
/// Fields: `product, quantity`
#[derive(Debug, Deserialize)]
struct DealRecord {
    product: u64,
    quantity: u32,
}

/// Output row for the remaining-catalog report.
#[derive(Debug, Serialize)]
struct CatalogRow {
    id: u64,
    name: String,
    author: String,
    price: u32,
    amount: u32,
}

impl CatalogRow {
    fn from_product(market: &Market, product: &Product) -> Self {
        // Every product references an existing book; a missing book would be
        // an integrity violation, so fall back to empty fields rather than
        // aborting the report.
        let book = market.catalog().book(product.book_id);
        let (name, author) = book.map(|b| (b.name, b.author)).unwrap_or_default();
        CatalogRow {
            id: product.id.0,
            name,
            author,
            price: product.price,
            amount: product.amount,
        }
    }
}

/// Settles a batch of deals from a CSV reader against one account.
///
/// Rows with zero quantity, malformed rows, and rejected deals are skipped;
/// rejections are expected outcomes (depleted stock, exhausted balance) and
/// logged rather than aborting the batch.
///
/// # CSV Format
///
/// Expected columns: `product, quantity`
///
/// # Errors
///
/// Returns a CSV error if the reader fails or the CSV structure is invalid.
pub fn settle_deals<R: Read>(
    market: &Market,
    account_id: AccountId,
    reader: R,
) -> Result<(), csv::Error> {
    let mut rdr = ReaderBuilder::new()
        .trim(Trim::All)
        .has_headers(true)
        .from_reader(reader);

    for result in rdr.deserialize::<DealRecord>() {
        match result {
            Ok(record) => {
                // Quantity must be positive before the engine is invoked.
                if record.quantity == 0 {
                    tracing::debug!(product = record.product, "skipping zero-quantity deal");
                    continue;
                }
                let product_id = ProductId(record.product);
                if let Err(e) = market.settle_deal(account_id, product_id, record.quantity) {
                    tracing::info!(product = %product_id, error = %e, "skipping rejected deal");
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed deal row");
                continue;
            }
        }
    }

    Ok(())
}

/// Writes the remaining catalog to a CSV writer.
///
/// Depleted products do not appear: the catalog deletes them at zero stock.
///
/// # CSV Format
///
/// Columns: `id, name, author, price, amount`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
pub fn write_catalog<W: Write>(market: &Market, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for product in market.catalog().products() {
        wtr.serialize(CatalogRow::from_product(market, &product))?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SEED_JSON: &str = r#"{
        "account": { "money": 20000 },
        "books": [
            { "name": "Философия Java", "author": "Брюс Эккель", "price": 1500, "amount": 15 },
            { "name": "Чистый код", "author": "Роберт Мартин", "price": 1000, "amount": 1 }
        ]
    }"#;

    fn seeded_market() -> (Market, AccountId) {
        let market = Market::new();
        let account_id = market.load_seed(Cursor::new(SEED_JSON)).unwrap();
        (market, account_id)
    }

    #[test]
    fn settle_simple_batch() {
        let (market, account_id) = seeded_market();
        let csv = "product,quantity\n1,2\n";

        settle_deals(&market, account_id, Cursor::new(csv)).unwrap();

        assert_eq!(market.accounts().get(account_id).unwrap().balance, 17_000);
        assert_eq!(market.catalog().product(ProductId(1)).unwrap().amount, 13);
    }

    #[test]
    fn depleting_deal_removes_product_from_report() {
        let (market, account_id) = seeded_market();
        let csv = "product,quantity\n2,1\n";

        settle_deals(&market, account_id, Cursor::new(csv)).unwrap();

        let mut output = Vec::new();
        write_catalog(&market, &mut output).unwrap();
        let report = String::from_utf8(output).unwrap();

        assert!(report.contains("Философия Java"));
        assert!(!report.contains("Чистый код"));
    }

    #[test]
    fn rejected_deals_are_skipped() {
        let (market, account_id) = seeded_market();
        // Product 2 has stock 1; the second row is rejected but the batch
        // keeps going.
        let csv = "product,quantity\n2,5\n1,1\n";

        settle_deals(&market, account_id, Cursor::new(csv)).unwrap();

        assert_eq!(market.catalog().product(ProductId(2)).unwrap().amount, 1);
        assert_eq!(market.catalog().product(ProductId(1)).unwrap().amount, 14);
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let (market, account_id) = seeded_market();
        let csv = "product,quantity\nnot,a,row\n1,3\n";

        settle_deals(&market, account_id, Cursor::new(csv)).unwrap();

        assert_eq!(market.catalog().product(ProductId(1)).unwrap().amount, 12);
    }

    #[test]
    fn zero_quantity_rows_are_skipped() {
        let (market, account_id) = seeded_market();
        let csv = "product,quantity\n1,0\n";

        settle_deals(&market, account_id, Cursor::new(csv)).unwrap();

        assert_eq!(market.accounts().get(account_id).unwrap().balance, 20_000);
        assert_eq!(market.catalog().product(ProductId(1)).unwrap().amount, 15);
    }

    #[test]
    fn settle_with_whitespace() {
        let (market, account_id) = seeded_market();
        let csv = "product,quantity\n 1 , 2 \n";

        settle_deals(&market, account_id, Cursor::new(csv)).unwrap();

        assert_eq!(market.catalog().product(ProductId(1)).unwrap().amount, 13);
    }

    #[test]
    fn write_catalog_includes_header_and_rows() {
        let (market, _) = seeded_market();

        let mut output = Vec::new();
        write_catalog(&market, &mut output).unwrap();
        let report = String::from_utf8(output).unwrap();

        assert!(report.contains("id,name,author,price,amount"));
        assert!(report.contains("1,Философия Java,Брюс Эккель,1500,15"));
    }
}
