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

//! # Market
//!
//! This library provides a small book-marketplace engine: buyer accounts hold
//! a money balance, products carry a price and a stock count, and a "deal"
//! atomically exchanges money for stock while recording the purchase in a
//! per-(account, book) ledger.
//!
//! ## Core Components
//!
//! - [`Market`]: Settlement engine coordinating the three stores
//! - [`AccountStore`]: Buyer accounts with non-negative balances
//! - [`Catalog`]: Books and products, with a delete-at-zero stock policy
//! - [`Ledger`]: Cumulative purchase records keyed by (account, book)
//! - [`MarketError`]: Deal rejections and integrity errors
//!
//! ## Example
//!
//! ```
//! use market_rs::Market;
//!
//! let market = Market::new();
//! let account_id = market.accounts().create(20_000);
//! let book_id = market.catalog().add_book("Философия Java", "Брюс Эккель");
//! let product_id = market.catalog().add_product(book_id, 1_500, 15).unwrap();
//!
//! let deal = market.settle_deal(account_id, product_id, 2).unwrap();
//! assert_eq!(deal.balance_remaining, 17_000);
//! assert_eq!(deal.stock_remaining, 13);
//! assert_eq!(market.ledger().find(account_id, book_id).unwrap().amount, 2);
//! ```
//!
//! ## Thread Safety
//!
//! The stores handle concurrent access, and the engine serializes deal
//! settlement so concurrent deals on the same product or account cannot
//! overdraw stock or balance between check and apply.

pub mod account;
mod base;
pub mod catalog;
pub mod error;
pub mod ledger;
mod market;
pub mod seed;

pub use account::{Account, AccountStore};
pub use base::{AccountId, BookId, ProductId};
pub use catalog::{Book, Catalog, Product, ProductUpdate};
pub use error::MarketError;
pub use ledger::{Ledger, LedgerEntry};
pub use market::{Market, SettledDeal};
pub use seed::{SeedData, SeedError};
