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

//! Seed data model for dataset (re)seeding.
//!
//! A seed describes one starting account balance and a list of product
//! descriptors. Parsing is separated from application: the stores are only
//! reset once the whole seed has been read successfully, so a malformed seed
//! file leaves previously persisted data untouched.
//!
//! # Format
//!
//! ```json
//! {
//!   "account": { "money": 20000 },
//!   "books": [
//!     { "name": "Философия Java", "author": "Брюс Эккель", "price": 1500, "amount": 15 }
//!   ]
//! }
//! ```

use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading a seed description.
#[derive(Error, Debug)]
pub enum SeedError {
    /// The seed file could not be read
    #[error("could not read seed data: {0}")]
    Io(#[from] std::io::Error),

    /// The seed data is not valid JSON or does not match the seed schema
    #[error("malformed seed data: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Fully parsed seed description.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SeedData {
    pub account: SeedAccount,
    pub books: Vec<SeedBook>,
}

/// Starting balance for the seeded buyer account.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct SeedAccount {
    pub money: u64,
}

/// One seeded product: a book with its price and stock count.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SeedBook {
    pub name: String,
    pub author: String,
    pub price: u32,
    pub amount: u32,
}

impl SeedData {
    /// Parses a seed description from a JSON reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, SeedError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Parses a seed description from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SeedError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }
}
