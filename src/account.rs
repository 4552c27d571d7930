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

//! Buyer accounts and the account store.
//!
//! An account holds a single non-negative money balance in a
//! currency-agnostic integer unit. The balance is mutated only by the
//! settlement engine's decrement path; accounts are created during seeding
//! and removed only by a full reset.

use crate::MarketError;
use crate::base::AccountId;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// A buyer account with a money balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Account {
    pub id: AccountId,
    /// Non-negative balance in a currency-agnostic unit.
    pub balance: u64,
}

/// Store of buyer accounts indexed by account ID.
///
/// IDs are assigned from a sequence starting at 1. [`AccountStore::clear`]
/// resets the sequence so reseeded accounts get deterministic IDs.
#[derive(Debug)]
pub struct AccountStore {
    accounts: DashMap<AccountId, Account>,
    next_id: AtomicU64,
}

impl AccountStore {
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Creates an account with the given starting balance and returns its ID.
    pub fn create(&self, balance: u64) -> AccountId {
        let id = AccountId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.accounts.insert(id, Account { id, balance });
        tracing::debug!(account = %id, balance, "created account");
        id
    }

    /// Returns a snapshot of the account, or `None` if it does not exist.
    pub fn get(&self, id: AccountId) -> Option<Account> {
        self.accounts.get(&id).map(|a| *a)
    }

    /// Deducts `decrement` from the account balance and returns the new
    /// balance.
    ///
    /// # Errors
    ///
    /// - [`MarketError::UnknownAccount`] - No account exists for `id`.
    /// - [`MarketError::DecrementExceedsBalance`] - The balance would go
    ///   negative. The engine validates funds before calling this, so this
    ///   error indicates a race between check and apply.
    pub fn decrease_balance(&self, id: AccountId, decrement: u64) -> Result<u64, MarketError> {
        let mut account = self.accounts.get_mut(&id).ok_or(MarketError::UnknownAccount)?;
        account.balance = account
            .balance
            .checked_sub(decrement)
            .ok_or(MarketError::DecrementExceedsBalance)?;
        tracing::debug!(account = %id, decrement, balance = account.balance, "reduced balance");
        Ok(account.balance)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Removes all accounts and resets ID generation.
    pub fn clear(&self) {
        tracing::info!("clearing account data");
        self.accounts.clear();
        self.next_id.store(1, Ordering::Relaxed);
    }
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_assigns_sequential_ids_from_one() {
        let store = AccountStore::new();
        assert_eq!(store.create(100), AccountId(1));
        assert_eq!(store.create(200), AccountId(2));
    }

    #[test]
    fn get_returns_balance() {
        let store = AccountStore::new();
        let id = store.create(20_000);
        let account = store.get(id).unwrap();
        assert_eq!(account.balance, 20_000);
    }

    #[test]
    fn get_missing_account_returns_none() {
        let store = AccountStore::new();
        assert_eq!(store.get(AccountId(42)), None);
    }

    #[test]
    fn decrease_balance_deducts() {
        let store = AccountStore::new();
        let id = store.create(20_000);
        let remaining = store.decrease_balance(id, 3_000).unwrap();
        assert_eq!(remaining, 17_000);
        assert_eq!(store.get(id).unwrap().balance, 17_000);
    }

    #[test]
    fn decrease_balance_to_exactly_zero() {
        let store = AccountStore::new();
        let id = store.create(1_000);
        assert_eq!(store.decrease_balance(id, 1_000), Ok(0));
    }

    #[test]
    fn decrease_balance_unknown_account() {
        let store = AccountStore::new();
        let result = store.decrease_balance(AccountId(9), 100);
        assert_eq!(result, Err(MarketError::UnknownAccount));
    }

    #[test]
    fn decrease_balance_never_goes_negative() {
        let store = AccountStore::new();
        let id = store.create(500);
        let result = store.decrease_balance(id, 501);
        assert_eq!(result, Err(MarketError::DecrementExceedsBalance));
        assert_eq!(store.get(id).unwrap().balance, 500);
    }

    #[test]
    fn clear_resets_id_sequence() {
        let store = AccountStore::new();
        store.create(100);
        store.create(100);
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.create(100), AccountId(1));
    }
}
