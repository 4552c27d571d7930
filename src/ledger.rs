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

//! Purchase ledger keyed by (account, book).
//!
//! The ledger records the cumulative quantity of each book ever purchased by
//! each account. At most one entry exists per (account, book) pair: the first
//! purchase creates the entry at amount 0 and immediately increments it,
//! repeat purchases accumulate onto the same entry. Entries are never
//! decremented or deleted outside a full reset.

use crate::account::AccountStore;
use crate::base::{AccountId, BookId};
use crate::catalog::Catalog;
use crate::error::MarketError;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative purchase record for one (account, book) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedgerEntry {
    pub id: u64,
    pub account_id: AccountId,
    pub book_id: BookId,
    /// Total quantity ever purchased. Never decremented.
    pub amount: u32,
}

/// Purchase ledger enforcing at-most-one entry per (account, book).
///
/// The map key is the composite `(AccountId, BookId)`; matching is exact on
/// both identifiers, with no partial or fuzzy lookup.
#[derive(Debug)]
pub struct Ledger {
    entries: DashMap<(AccountId, BookId), LedgerEntry>,
    next_id: AtomicU64,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Returns the entry for the pair, or `None` if no purchase was recorded.
    pub fn find(&self, account_id: AccountId, book_id: BookId) -> Option<LedgerEntry> {
        self.entries.get(&(account_id, book_id)).map(|e| *e)
    }

    /// Records a purchase of `quantity` copies of `book_id` by `account_id`.
    ///
    /// Creates the entry at amount 0 if absent, then increments it; the net
    /// effect of a first purchase is an entry starting at `quantity`. Returns
    /// the updated entry.
    ///
    /// # Errors
    ///
    /// - [`MarketError::UnknownAccount`] - `account_id` does not resolve.
    /// - [`MarketError::UnknownBook`] - `book_id` does not resolve.
    ///
    /// Both are integrity errors: the settlement engine validates account and
    /// product before calling this.
    pub fn add_purchase(
        &self,
        accounts: &AccountStore,
        catalog: &Catalog,
        account_id: AccountId,
        book_id: BookId,
        quantity: u32,
    ) -> Result<LedgerEntry, MarketError> {
        if accounts.get(account_id).is_none() {
            tracing::error!(account = %account_id, book = %book_id, "purchase references unknown account");
            return Err(MarketError::UnknownAccount);
        }
        if catalog.book(book_id).is_none() {
            tracing::error!(account = %account_id, book = %book_id, "purchase references unknown book");
            return Err(MarketError::UnknownBook);
        }

        let mut entry = self.entries.entry((account_id, book_id)).or_insert_with(|| {
            tracing::debug!(account = %account_id, book = %book_id, "creating ledger entry");
            LedgerEntry {
                id: self.next_id.fetch_add(1, Ordering::Relaxed),
                account_id,
                book_id,
                amount: 0,
            }
        });
        entry.amount += quantity;
        tracing::debug!(
            account = %account_id,
            book = %book_id,
            quantity,
            amount = entry.amount,
            "updated ledger entry"
        );
        Ok(*entry)
    }

    /// Returns a snapshot of all entries, sorted by entry ID.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        let mut all: Vec<LedgerEntry> = self.entries.iter().map(|e| *e).collect();
        all.sort_by_key(|e| e.id);
        all
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes all entries and resets ID generation.
    pub fn clear(&self) {
        tracing::info!("clearing account-book ledger data");
        self.entries.clear();
        self.next_id.store(1, Ordering::Relaxed);
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
