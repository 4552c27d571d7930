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

//! Books, products, and the inventory store.
//!
//! A product references exactly one book and carries a price and a remaining
//! stock count. The catalog enforces the stock-depletion policy: a product
//! whose stock reaches zero is removed entirely rather than kept as a
//! zero-stock row. The underlying book is kept, because the purchase ledger
//! references books, not products.

use crate::MarketError;
use crate::base::{BookId, ProductId};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// A book identified by name and author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub id: BookId,
    pub name: String,
    pub author: String,
}

/// A catalog product: one book offered at a price with a stock count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub book_id: BookId,
    /// Unit price in the same currency-agnostic unit as account balances.
    pub price: u32,
    /// Remaining stock. Never zero: a depleted product is deleted.
    pub amount: u32,
}

/// Partial product update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub price: Option<u32>,
    pub amount: Option<u32>,
    pub book_name: Option<String>,
    pub book_author: Option<String>,
}

/// Inventory store holding products and the books they reference.
///
/// Both ID sequences start at 1 and are reset by the respective clear
/// operation so reseeded records get deterministic IDs.
#[derive(Debug)]
pub struct Catalog {
    books: DashMap<BookId, Book>,
    products: DashMap<ProductId, Product>,
    next_book_id: AtomicU64,
    next_product_id: AtomicU64,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
            products: DashMap::new(),
            next_book_id: AtomicU64::new(1),
            next_product_id: AtomicU64::new(1),
        }
    }

    /// Registers a book and returns its ID.
    pub fn add_book(&self, name: impl Into<String>, author: impl Into<String>) -> BookId {
        let id = BookId(self.next_book_id.fetch_add(1, Ordering::Relaxed));
        let book = Book {
            id,
            name: name.into(),
            author: author.into(),
        };
        tracing::debug!(book = %id, name = %book.name, "saving book");
        self.books.insert(id, book);
        id
    }

    /// Adds a product for an existing book.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::UnknownBook`] if `book_id` does not resolve.
    pub fn add_product(
        &self,
        book_id: BookId,
        price: u32,
        amount: u32,
    ) -> Result<ProductId, MarketError> {
        if !self.books.contains_key(&book_id) {
            return Err(MarketError::UnknownBook);
        }
        let id = ProductId(self.next_product_id.fetch_add(1, Ordering::Relaxed));
        self.products.insert(
            id,
            Product {
                id,
                book_id,
                price,
                amount,
            },
        );
        tracing::debug!(product = %id, book = %book_id, price, amount, "saving product");
        Ok(id)
    }

    /// Returns a snapshot of the book, or `None` if it does not exist.
    pub fn book(&self, id: BookId) -> Option<Book> {
        self.books.get(&id).map(|b| b.clone())
    }

    /// Returns a snapshot of the product, or `None` if it does not exist.
    pub fn product(&self, id: ProductId) -> Option<Product> {
        self.products.get(&id).map(|p| *p)
    }

    /// Returns a snapshot of all products, sorted by ID.
    pub fn products(&self) -> Vec<Product> {
        let mut all: Vec<Product> = self.products.iter().map(|p| *p).collect();
        all.sort_by_key(|p| p.id);
        all
    }

    /// Applies a partial update to a product and its book, returning the
    /// updated product.
    ///
    /// # Errors
    ///
    /// - [`MarketError::ProductNotFound`] - No product exists for `id`.
    /// - [`MarketError::UnknownBook`] - The product references a book that no
    ///   longer resolves (integrity error).
    pub fn update_product(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, MarketError> {
        let mut product = self.products.get_mut(&id).ok_or(MarketError::ProductNotFound)?;

        if let Some(price) = update.price {
            product.price = price;
        }
        if let Some(amount) = update.amount {
            product.amount = amount;
        }

        if update.book_name.is_some() || update.book_author.is_some() {
            let mut book = self
                .books
                .get_mut(&product.book_id)
                .ok_or(MarketError::UnknownBook)?;
            if let Some(name) = update.book_name {
                book.name = name;
            }
            if let Some(author) = update.book_author {
                book.author = author;
            }
        }

        tracing::debug!(product = %id, "updated product");
        Ok(*product)
    }

    /// Deducts `decrement` from the product's stock and returns the remaining
    /// amount.
    ///
    /// If the stock reaches exactly zero the product is deleted from the
    /// catalog and `Ok(0)` is returned; a subsequent lookup by ID yields
    /// "not found". The underlying book is not deleted.
    ///
    /// # Errors
    ///
    /// - [`MarketError::ProductNotFound`] - No product exists for `id`.
    /// - [`MarketError::DecrementExceedsStock`] - `decrement` is greater than
    ///   the remaining amount. The engine validates stock before calling
    ///   this, so this error indicates a race between check and apply.
    pub fn decrease_stock(&self, id: ProductId, decrement: u32) -> Result<u32, MarketError> {
        let mut product = self.products.get_mut(&id).ok_or(MarketError::ProductNotFound)?;

        if decrement > product.amount {
            tracing::error!(
                product = %id,
                amount = product.amount,
                decrement,
                "failed to decrease product amount - decrement is greater than product amount"
            );
            return Err(MarketError::DecrementExceedsStock);
        }

        if product.amount == decrement {
            // Depleted products are removed, not kept as zero-stock rows.
            drop(product);
            self.products.remove(&id);
            tracing::debug!(product = %id, "product depleted, removed from catalog");
            return Ok(0);
        }

        product.amount -= decrement;
        tracing::debug!(product = %id, decrement, amount = product.amount, "reduced stock");
        Ok(product.amount)
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }

    /// Removes all products and resets product ID generation.
    ///
    /// Products reference books, so this must run before [`Catalog::clear_books`].
    pub fn clear_products(&self) {
        tracing::info!("clearing product data");
        self.products.clear();
        self.next_product_id.store(1, Ordering::Relaxed);
    }

    /// Removes all books and resets book ID generation.
    pub fn clear_books(&self) {
        tracing::info!("clearing book data");
        self.books.clear();
        self.next_book_id.store(1, Ordering::Relaxed);
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
