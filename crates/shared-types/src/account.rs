// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Account and transaction entities

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use chrono::{DateTime, Utc};
use pipeline::Audited;
use uuid::Uuid;

use crate::{audit::AuditInfo, keys::AccountKey};

/// Monetary amount in minor units (hundredths), without currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Amount(i64);

impl Amount {
    /// Amount from minor units
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Minor units
    pub const fn minor(self) -> i64 {
        self.0
    }
}

/// Plain decimal notation with two fraction digits, e.g. `-12.50`
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let absolute = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", absolute / 100, absolute % 100)
    }
}

impl FromStr for Amount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid amount '{s}'");
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty()
            || fraction.len() > 2
            || !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let fraction: i64 = format!("{fraction:0<2}").parse().map_err(|_| invalid())?;
        let minor = whole
            .checked_mul(100)
            .and_then(|minor| minor.checked_add(fraction))
            .ok_or_else(invalid)?;
        Ok(Self(if negative { -minor } else { minor }))
    }
}

/// An immutable booking on an account
#[derive(Debug, Clone)]
pub struct Transaction {
    /// Technical id, never exposed
    pub tid: Uuid,
    /// Semantic id used in resource paths
    pub id: Uuid,
    /// Booked amount
    pub amount: Amount,
    /// Human readable description
    pub description: String,
    /// Last modification
    pub audit: AuditInfo,
}

impl Transaction {
    /// Create a transaction with a fresh id
    pub fn new(amount: Amount, description: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), amount, description)
    }

    /// Create a transaction with a known id
    pub fn with_id(id: Uuid, amount: Amount, description: impl Into<String>) -> Self {
        Self {
            tid: Uuid::new_v4(),
            id,
            amount,
            description: description.into(),
            audit: AuditInfo::default(),
        }
    }
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.amount == other.amount && self.description == other.description
    }
}

impl Eq for Transaction {}

impl Hash for Transaction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.amount.hash(state);
        self.description.hash(state);
    }
}

impl Audited for Transaction {
    fn last_modified_time(&self) -> Option<DateTime<Utc>> {
        Some(self.audit.last_modified_time())
    }
}

/// Reconciliation state kept next to an immutable transaction
///
/// Shares its id with the transaction it decorates.
#[derive(Debug, Clone)]
pub struct ReconciledTransaction {
    /// Technical id, never exposed
    pub tid: Uuid,
    /// Id of the reconciled transaction
    pub id: Uuid,
    /// Whether the transaction has been reconciled
    pub reconciled: bool,
    /// Free text note
    pub note: String,
    /// Last modification
    pub audit: AuditInfo,
}

impl ReconciledTransaction {
    /// Decorate `transaction` with a reconciliation state
    pub fn new(transaction: &Transaction, reconciled: bool, note: impl Into<String>) -> Self {
        Self {
            tid: Uuid::new_v4(),
            id: transaction.id,
            reconciled,
            note: note.into(),
            audit: AuditInfo::default(),
        }
    }
}

impl PartialEq for ReconciledTransaction {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.reconciled == other.reconciled && self.note == other.note
    }
}

impl Eq for ReconciledTransaction {}

impl Hash for ReconciledTransaction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.reconciled.hash(state);
        self.note.hash(state);
    }
}

impl Audited for ReconciledTransaction {
    fn last_modified_time(&self) -> Option<DateTime<Utc>> {
        Some(self.audit.last_modified_time())
    }
}

/// A bank account with its bookings
#[derive(Debug, Clone)]
pub struct Account {
    /// Technical id, never exposed
    pub tid: Uuid,
    /// Business key
    pub key: AccountKey,
    /// Human readable name
    pub name: String,
    /// Bookings in insertion order
    pub transactions: Vec<Transaction>,
    /// Last modification
    pub audit: AuditInfo,
}

impl Account {
    /// Create an unsaved account without transactions
    pub fn new(key: AccountKey, name: impl Into<String>) -> Self {
        Self {
            tid: Uuid::new_v4(),
            key,
            name: name.into(),
            transactions: Vec::new(),
            audit: AuditInfo::default(),
        }
    }

    /// Book a new transaction
    pub fn add_transaction(&mut self, amount: Amount, description: impl Into<String>) -> &Transaction {
        self.transactions.push(Transaction::new(amount, description));
        let last = self.transactions.len() - 1;
        &self.transactions[last]
    }

    /// Look up a booking by its id
    pub fn transaction(&self, id: Uuid) -> Option<&Transaction> {
        self.transactions.iter().find(|transaction| transaction.id == id)
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.name == other.name && self.transactions == other.transactions
    }
}

impl Eq for Account {}

impl Hash for Account {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.name.hash(state);
        self.transactions.hash(state);
    }
}

impl Audited for Account {
    fn last_modified_time(&self) -> Option<DateTime<Utc>> {
        Some(self.audit.last_modified_time())
    }
}
