// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Storage boundary for the bank API
//!
//! Resources never touch storage directly. They ask an archivist for a
//! record by its business key, or for a windowed and sorted list of records.
//! The traits are synchronous: every call is one measured unit of work inside
//! the resource's own instrumented scope.
//!
//! Every save publishes an event on the customer or account feed, which
//! [`EventArchivist`] serves back by category and time interval.
//!
//! [`InMemoryArchivist`] implements all three traits on top of `DashMap` and
//! ships with seed data for development and tests.

use std::fmt::{self, Debug};

use shared_types::{
    Account, AccountKey, Customer, CustomerNumber, Event, ReconciledTransaction, Transaction,
};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod query;

pub use memory::InMemoryArchivist;
pub use query::{Interval, ListQuery, MAX_LIMIT, SortDirection};

/// Result type for archivist operations
pub type ArchivistResult<T> = Result<T, ArchivistError>;

/// Errors raised by archivists
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchivistError {
    /// No record exists for the key
    #[error("{kind} '{key}' not found")]
    NotFound {
        /// Kind of record, e.g. `customer`
        kind: &'static str,
        /// Key that was looked up
        key: String,
    },

    /// The record exists and may not change
    #[error("{kind} '{key}' already exists")]
    Conflict {
        /// Kind of record, e.g. `transaction`
        kind: &'static str,
        /// Key of the existing record
        key: String,
    },

    /// The backing store could not be reached
    #[error("archivist unavailable: {message}")]
    Unavailable {
        /// Description of the failure
        message: String,
    },
}

impl ArchivistError {
    /// Convenience constructor for [`ArchivistError::NotFound`]
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

/// Access to stored customers
pub trait CustomerArchivist: Send + Sync + Debug {
    /// List customers ordered by number
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::Unavailable`] if the store cannot be read
    fn list_customers(&self, query: &ListQuery) -> ArchivistResult<Vec<Customer>>;

    /// Get a customer that must exist
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::NotFound`] if no customer has the number
    fn get_customer(&self, number: &CustomerNumber) -> ArchivistResult<Customer>;

    /// Look up a customer that may not exist
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::Unavailable`] if the store cannot be read
    fn find_customer(&self, number: &CustomerNumber) -> ArchivistResult<Option<Customer>>;

    /// Insert or replace a customer, returning the stored record
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::Unavailable`] if the store cannot be written
    fn save_customer(&self, customer: Customer) -> ArchivistResult<Customer>;
}

/// Access to stored accounts and their transactions
pub trait AccountArchivist: Send + Sync + Debug {
    /// List accounts ordered by key
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::Unavailable`] if the store cannot be read
    fn list_accounts(&self, query: &ListQuery) -> ArchivistResult<Vec<Account>>;

    /// Get an account that must exist
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::NotFound`] if no account has the key
    fn get_account(&self, key: &AccountKey) -> ArchivistResult<Account>;

    /// Look up an account that may not exist
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::Unavailable`] if the store cannot be read
    fn find_account(&self, key: &AccountKey) -> ArchivistResult<Option<Account>>;

    /// Insert or replace an account, returning the stored record
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::Unavailable`] if the store cannot be written
    fn save_account(&self, account: Account) -> ArchivistResult<Account>;

    /// List the transactions of an account
    ///
    /// Transactions keep booking order unless the query sorts them by amount.
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::NotFound`] if the account does not exist
    fn list_transactions(
        &self,
        key: &AccountKey,
        query: &ListQuery,
    ) -> ArchivistResult<Vec<Transaction>>;

    /// Get a single transaction of an account
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::NotFound`] if the account or the transaction
    /// does not exist
    fn get_transaction(&self, key: &AccountKey, id: Uuid) -> ArchivistResult<Transaction>;

    /// Look up a transaction that may not exist
    ///
    /// An unknown account yields `None` as well.
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::Unavailable`] if the store cannot be read
    fn find_transaction(&self, key: &AccountKey, id: Uuid) -> ArchivistResult<Option<Transaction>>;

    /// Book a transaction on an existing account, returning the stored booking
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::NotFound`] if the account does not exist and
    /// [`ArchivistError::Conflict`] if the id is already booked
    fn add_transaction(
        &self,
        key: &AccountKey,
        transaction: Transaction,
    ) -> ArchivistResult<Transaction>;

    /// List the reconciliation states of an account's transactions
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::NotFound`] if the account does not exist
    fn list_reconciled(
        &self,
        key: &AccountKey,
        query: &ListQuery,
    ) -> ArchivistResult<Vec<ReconciledTransaction>>;

    /// Get the reconciliation state of a transaction
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::NotFound`] if the transaction was never
    /// reconciled
    fn get_reconciled(&self, key: &AccountKey, id: Uuid) -> ArchivistResult<ReconciledTransaction>;

    /// Insert or replace the reconciliation state of a transaction
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::NotFound`] if the account or the transaction
    /// does not exist
    fn save_reconciled(
        &self,
        key: &AccountKey,
        reconciled: ReconciledTransaction,
    ) -> ArchivistResult<ReconciledTransaction>;
}

/// Event feeds published by the archivist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventFeed {
    /// Changes to customers
    Customer,
    /// Changes to accounts and their transactions
    Account,
}

impl EventFeed {
    /// Lowercase feed name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Account => "account",
        }
    }
}

impl fmt::Display for EventFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access to published events
///
/// Events are listed in sequence order. An interval keeps only events
/// published strictly inside it.
pub trait EventArchivist: Send + Sync + Debug {
    /// List the events of a feed
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::Unavailable`] if the store cannot be read
    fn list_events(&self, feed: EventFeed, within: Option<&Interval>) -> ArchivistResult<Vec<Event>>;

    /// List the events of one category
    ///
    /// An unknown category has no events.
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::Unavailable`] if the store cannot be read
    fn list_category_events(
        &self,
        feed: EventFeed,
        category: &str,
        within: Option<&Interval>,
    ) -> ArchivistResult<Vec<Event>>;

    /// Get a single event
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::NotFound`] if the category holds no event
    /// with the id
    fn get_event(&self, feed: EventFeed, category: &str, id: Uuid) -> ArchivistResult<Event>;

    /// Publish an event
    ///
    /// # Errors
    ///
    /// Returns [`ArchivistError::Unavailable`] if the store cannot be written
    fn save_event(&self, feed: EventFeed, event: Event) -> ArchivistResult<Event>;
}
