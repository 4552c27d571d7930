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

//! Concurrent settlement tests.
//!
//! The engine holds a settlement lock across check and apply, so deals
//! racing on the same product or account must never pass their precondition
//! checks against stale state and together overdraw stock or balance.

use market_rs::{Market, MarketError};
use std::sync::Arc;
use std::thread;

#[test]
fn concurrent_deals_never_oversell_stock() {
    let market = Arc::new(Market::new());
    let account_id = market.accounts().create(1_000_000);
    let book_id = market.catalog().add_book("Философия Java", "Брюс Эккель");
    let product_id = market.catalog().add_product(book_id, 10, 8).unwrap();

    // 32 threads race for 8 units of stock.
    let handles: Vec<_> = (0..32)
        .map(|_| {
            let market = Arc::clone(&market);
            thread::spawn(move || market.settle_deal(account_id, product_id, 1))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();

    // Exactly the stock was sold, and losers got a clean rejection.
    assert_eq!(successes, 8);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(
            result,
            Err(MarketError::ProductNotFound) | Err(MarketError::InsufficientStock)
        ));
    }

    // The depleting deal removed the product.
    assert_eq!(market.catalog().product(product_id), None);
    assert_eq!(market.ledger().find(account_id, book_id).unwrap().amount, 8);
    assert_eq!(
        market.accounts().get(account_id).unwrap().balance,
        1_000_000 - 8 * 10
    );
}

#[test]
fn concurrent_deals_never_overdraw_balance() {
    let market = Arc::new(Market::new());
    // Balance covers exactly 5 single-unit deals.
    let account_id = market.accounts().create(500);
    let book_id = market.catalog().add_book("Чистый код", "Роберт Мартин");
    let product_id = market.catalog().add_product(book_id, 100, 1_000).unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let market = Arc::clone(&market);
            thread::spawn(move || market.settle_deal(account_id, product_id, 1))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();

    assert_eq!(successes, 5);
    assert_eq!(market.accounts().get(account_id).unwrap().balance, 0);
    assert_eq!(market.catalog().product(product_id).unwrap().amount, 995);
    assert_eq!(market.ledger().find(account_id, book_id).unwrap().amount, 5);
}

#[test]
fn concurrent_deals_across_products_all_settle() {
    let market = Arc::new(Market::new());
    let account_id = market.accounts().create(1_000_000);

    let product_ids: Vec<_> = (0..8)
        .map(|i| {
            let book_id = market.catalog().add_book(format!("book {i}"), "author");
            market.catalog().add_product(book_id, 100, 50).unwrap()
        })
        .collect();

    let mut handles = Vec::new();
    for &product_id in &product_ids {
        for _ in 0..4 {
            let market = Arc::clone(&market);
            handles.push(thread::spawn(move || {
                market.settle_deal(account_id, product_id, 2)
            }));
        }
    }

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    // 8 products x 4 deals x 2 units each.
    for product_id in product_ids {
        assert_eq!(market.catalog().product(product_id).unwrap().amount, 42);
    }
    assert_eq!(
        market.accounts().get(account_id).unwrap().balance,
        1_000_000 - 8 * 4 * 2 * 100
    );
    assert_eq!(market.ledger().len(), 8);
}
