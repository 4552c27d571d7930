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

//! Deal settlement engine.
//!
//! The [`Market`] owns the three stores (accounts, catalog, ledger) and
//! orchestrates a deal: it validates preconditions in a fixed order, then
//! applies three coordinated mutations - ledger increment, balance decrement,
//! stock decrement - or rejects the whole deal with no mutation.
//!
//! # Precondition order
//!
//! The first failing check determines the error; later checks are never
//! evaluated past it:
//!
//! 1. Product exists - else [`MarketError::ProductNotFound`].
//! 2. Acting account exists - else [`MarketError::AccountUnresolvable`].
//! 3. Stock covers the quantity - else [`MarketError::InsufficientStock`].
//! 4. Balance covers the total - else [`MarketError::InsufficientFunds`].
//!
//! # Concurrency
//!
//! A settlement lock is held across check and apply, so two concurrent deals
//! cannot both validate against the same stale stock or balance and together
//! overdraw either. With preconditions checked under the lock, the three
//! apply steps cannot fail, so a settled deal is all-or-nothing.

use crate::account::AccountStore;
use crate::base::{AccountId, BookId, ProductId};
use crate::catalog::Catalog;
use crate::error::MarketError;
use crate::ledger::Ledger;
use crate::seed::{SeedData, SeedError};
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Read;

/// Outcome of a successfully settled deal, for response shaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettledDeal {
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub book_id: BookId,
    pub quantity: u32,
    pub unit_price: u32,
    pub total_price: u64,
    /// Account balance after the deal.
    pub balance_remaining: u64,
    /// Product stock after the deal. Zero means the product was depleted and
    /// removed from the catalog.
    pub stock_remaining: u32,
    /// Cumulative ledger amount for (account, book) after the deal.
    pub ledger_amount: u32,
}

/// Marketplace engine owning the account, inventory, and ledger stores.
///
/// # Invariants
///
/// - Account balances and product stock never go negative.
/// - At most one ledger entry exists per (account, book) pair.
/// - A product with zero stock does not exist in the catalog.
/// - A rejected deal mutates nothing.
pub struct Market {
    accounts: AccountStore,
    catalog: Catalog,
    ledger: Ledger,
    /// Serializes deal settlement so precondition checks and the three
    /// mutations act on the same state.
    settle_lock: Mutex<()>,
}

impl Market {
    /// Creates an empty market with no accounts, books, or products.
    pub fn new() -> Self {
        Market {
            accounts: AccountStore::new(),
            catalog: Catalog::new(),
            ledger: Ledger::new(),
            settle_lock: Mutex::new(()),
        }
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Settles a deal: `account_id` buys `quantity` copies of the product.
    ///
    /// `quantity` must be positive; format-level validation is the caller's
    /// responsibility.
    ///
    /// On success the ledger entry for (account, product's book) is increased
    /// by `quantity`, the balance is decreased by `price * quantity`, and the
    /// stock is decreased by `quantity` (removing the product if depleted).
    /// On rejection no store is mutated.
    ///
    /// # Errors
    ///
    /// The deal errors of the module docs, in precedence order, plus
    /// integrity errors from the apply path, which are logged and indicate a
    /// violated engine assumption.
    pub fn settle_deal(
        &self,
        account_id: AccountId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<SettledDeal, MarketError> {
        debug_assert!(quantity > 0, "quantity must be validated by the caller");

        let _guard = self.settle_lock.lock();

        let Some(product) = self.catalog.product(product_id) else {
            tracing::info!(product = %product_id, "deal rejected - product not found");
            return Err(MarketError::ProductNotFound);
        };

        let Some(account) = self.accounts.get(account_id) else {
            tracing::info!(product = %product_id, account = %account_id, "deal rejected - account unknown");
            return Err(MarketError::AccountUnresolvable);
        };

        if product.amount < quantity {
            tracing::info!(product = %product_id, "deal rejected - not enough product");
            return Err(MarketError::InsufficientStock);
        }

        let total_price = u64::from(product.price) * u64::from(quantity);
        if total_price > account.balance {
            tracing::info!(product = %product_id, "deal rejected - not enough money");
            return Err(MarketError::InsufficientFunds);
        }

        // All checks passed; the three mutations below cannot fail while the
        // settlement lock is held. An error here is an integrity violation.
        let settled = self
            .apply(account_id, product, quantity, total_price)
            .inspect_err(|error| {
                tracing::error!(
                    product = %product_id,
                    account = %account_id,
                    %error,
                    "settlement failed after validation"
                );
            })?;

        tracing::debug!(
            product = %product_id,
            account = %account_id,
            quantity,
            total = total_price,
            "deal settled"
        );
        Ok(settled)
    }

    fn apply(
        &self,
        account_id: AccountId,
        product: crate::catalog::Product,
        quantity: u32,
        total_price: u64,
    ) -> Result<SettledDeal, MarketError> {
        let entry = self
            .ledger
            .add_purchase(&self.accounts, &self.catalog, account_id, product.book_id, quantity)?;
        let balance_remaining = self.accounts.decrease_balance(account_id, total_price)?;
        let stock_remaining = self.catalog.decrease_stock(product.id, quantity)?;

        Ok(SettledDeal {
            account_id,
            product_id: product.id,
            book_id: product.book_id,
            quantity,
            unit_price: product.price,
            total_price,
            balance_remaining,
            stock_remaining,
            ledger_amount: entry.amount,
        })
    }

    /// Clears all stores in referential order: ledger entries first (they
    /// reference accounts and books), then accounts, then products (they
    /// reference books), then books last. Each clear resets ID generation.
    pub fn reset_all(&self) {
        let _guard = self.settle_lock.lock();
        self.ledger.clear();
        self.accounts.clear();
        self.catalog.clear_products();
        self.catalog.clear_books();
    }

    /// Resets all stores and populates them from an already-parsed seed.
    ///
    /// Returns the ID of the seeded buyer account.
    pub fn apply_seed(&self, seed: &SeedData) -> AccountId {
        self.reset_all();

        let account_id = self.accounts.create(seed.account.money);
        for book in &seed.books {
            let book_id = self.catalog.add_book(book.name.clone(), book.author.clone());
            // The book was just created, so this cannot fail.
            let _ = self.catalog.add_product(book_id, book.price, book.amount);
        }

        tracing::info!(
            account = %account_id,
            products = seed.books.len(),
            "loaded seeding data"
        );
        account_id
    }

    /// Parses a JSON seed description and applies it.
    ///
    /// The reset is only triggered after the seed has been fully and
    /// successfully parsed: a malformed seed leaves all stores untouched.
    pub fn load_seed<R: Read>(&self, reader: R) -> Result<AccountId, SeedError> {
        let seed = SeedData::from_reader(reader)?;
        Ok(self.apply_seed(&seed))
    }
}

impl Default for Market {
    fn default() -> Self {
        Self::new()
    }
}
