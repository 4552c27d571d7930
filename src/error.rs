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

//! Error types for deal settlement and store access.
//!
//! Two classes share this enum. The first four variants are expected deal
//! rejections an adapter conveys to the end user. The remaining variants are
//! integrity errors: by the time a store surfaces one, the engine has already
//! validated the same condition, so reaching it means an assumption was
//! violated between check and apply (see [`MarketError::is_integrity`]).

use thiserror::Error;

/// Deal settlement and store access errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    /// No product exists for the requested product ID
    #[error("product not found")]
    ProductNotFound,

    /// The acting account could not be resolved
    #[error("account could not be resolved")]
    AccountUnresolvable,

    /// Requested quantity exceeds the product's remaining stock
    #[error("not enough product in stock")]
    InsufficientStock,

    /// Deal total exceeds the account balance
    #[error("account balance is too low for the deal")]
    InsufficientFunds,

    /// Ledger upsert referenced an account that does not resolve
    #[error("unknown account ID")]
    UnknownAccount,

    /// Ledger upsert referenced a book that does not resolve
    #[error("unknown book ID")]
    UnknownBook,

    /// Stock decrement is greater than the remaining product amount
    #[error("decrement is greater than product amount")]
    DecrementExceedsStock,

    /// Balance decrement is greater than the account balance
    #[error("decrement is greater than account balance")]
    DecrementExceedsBalance,
}

impl MarketError {
    /// Returns `true` for errors that indicate a violated engine assumption
    /// rather than a rejectable request.
    ///
    /// Integrity errors are logged and surfaced as unexpected failures for
    /// the current request; they are never retried inside the engine.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            MarketError::UnknownAccount
                | MarketError::UnknownBook
                | MarketError::DecrementExceedsStock
                | MarketError::DecrementExceedsBalance
        )
    }
}

#[cfg(test)]
mod tests {
    use super::MarketError;

    #[test]
    fn error_display_messages() {
        assert_eq!(MarketError::ProductNotFound.to_string(), "product not found");
        assert_eq!(
            MarketError::AccountUnresolvable.to_string(),
            "account could not be resolved"
        );
        assert_eq!(
            MarketError::InsufficientStock.to_string(),
            "not enough product in stock"
        );
        assert_eq!(
            MarketError::InsufficientFunds.to_string(),
            "account balance is too low for the deal"
        );
        assert_eq!(MarketError::UnknownAccount.to_string(), "unknown account ID");
        assert_eq!(MarketError::UnknownBook.to_string(), "unknown book ID");
        assert_eq!(
            MarketError::DecrementExceedsStock.to_string(),
            "decrement is greater than product amount"
        );
        assert_eq!(
            MarketError::DecrementExceedsBalance.to_string(),
            "decrement is greater than account balance"
        );
    }

    #[test]
    fn deal_errors_are_not_integrity_errors() {
        assert!(!MarketError::ProductNotFound.is_integrity());
        assert!(!MarketError::AccountUnresolvable.is_integrity());
        assert!(!MarketError::InsufficientStock.is_integrity());
        assert!(!MarketError::InsufficientFunds.is_integrity());
    }

    #[test]
    fn store_errors_are_integrity_errors() {
        assert!(MarketError::UnknownAccount.is_integrity());
        assert!(MarketError::UnknownBook.is_integrity());
        assert!(MarketError::DecrementExceedsStock.is_integrity());
        assert!(MarketError::DecrementExceedsBalance.is_integrity());
    }

    #[test]
    fn errors_are_cloneable() {
        let error = MarketError::InsufficientFunds;
        let cloned = error.clone();
        assert_eq!(error, cloned);
    }
}
