// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Domain types shared by the bank API crates
//!
//! Entities carry a technical id and audit information next to their
//! business fields. Neither takes part in equality or hashing, so the entity
//! tag of a resource only changes when its observable state does.

pub mod account;
pub mod audit;
pub mod customer;
pub mod event;
pub mod keys;

pub use account::{Account, Amount, ReconciledTransaction, Transaction};
pub use audit::AuditInfo;
pub use customer::Customer;
pub use event::{DEFAULT_CATEGORY, Event};
pub use keys::{AccountKey, CustomerNumber, KeyError};
