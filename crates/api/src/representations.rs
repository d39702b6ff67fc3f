// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HAL representations exposed by the resources
//!
//! Representations are pure projections of entities. Links are rendered as
//! absolute paths without scheme or host.

use archivist::EventFeed;
use serde::{Deserialize, Serialize};
use shared_types::{
    Account, AccountKey, Customer, CustomerNumber, Event, ReconciledTransaction, Transaction,
};
use utoipa::ToSchema;

/// Path of the customer collection
pub fn customers_path() -> String {
    "/customers".to_string()
}

/// Path of a single customer
pub fn customer_path(number: &CustomerNumber) -> String {
    format!("/customers/{number}")
}

/// Path of the account collection
pub fn accounts_path() -> String {
    "/accounts".to_string()
}

/// Path of a single account
pub fn account_path(key: &AccountKey) -> String {
    format!("/accounts/{key}")
}

/// Path of the transactions of an account
pub fn transactions_path(key: &AccountKey) -> String {
    format!("/accounts/{key}/transactions")
}

/// Path of a single transaction
pub fn transaction_path(key: &AccountKey, id: impl std::fmt::Display) -> String {
    format!("/accounts/{key}/transactions/{id}")
}

/// Path of the reconciliation states of an account
pub fn reconciled_transactions_path(key: &AccountKey) -> String {
    format!("/accounts/{key}/reconciled-transactions")
}

/// Path of the reconciliation state of a transaction
pub fn reconciled_transaction_path(key: &AccountKey, id: impl std::fmt::Display) -> String {
    format!("/accounts/{key}/reconciled-transactions/{id}")
}

/// Path of an event feed
pub fn events_path(feed: EventFeed) -> String {
    format!("/{feed}-events")
}

/// Path of one category of an event feed
pub fn event_category_path(feed: EventFeed, category: &str) -> String {
    format!("/{feed}-events/{category}")
}

/// Path of a single event
pub fn event_path(feed: EventFeed, category: &str, id: impl std::fmt::Display) -> String {
    format!("/{feed}-events/{category}/{id}")
}

/// Path of the metadata of an event feed
pub fn events_metadata_path(feed: EventFeed) -> String {
    format!("/{feed}-events-metadata")
}

/// A HAL link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Link {
    /// Target path
    pub href: String,
}

impl Link {
    fn to(href: String) -> Self {
        Self { href }
    }
}

/// Links carrying only `self`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SelfLinks {
    /// The representation itself
    #[serde(rename = "self")]
    pub self_link: Link,
}

impl SelfLinks {
    fn to(href: String) -> Self {
        Self {
            self_link: Link::to(href),
        }
    }
}

/// A customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRepresentation {
    /// Ten-digit customer number
    pub number: String,
    /// First name
    pub first_name: String,
    /// Middle name, empty when absent
    pub middle_name: String,
    /// Surname
    pub surname: String,
    /// Links
    #[serde(rename = "_links")]
    pub links: SelfLinks,
}

impl CustomerRepresentation {
    /// Project a customer
    pub fn new(customer: &Customer) -> Self {
        Self {
            number: customer.number.to_string(),
            first_name: customer.first_name.clone(),
            middle_name: customer.middle_name.clone(),
            surname: customer.surname.clone(),
            links: SelfLinks::to(customer_path(&customer.number)),
        }
    }
}

/// Embedded customers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmbeddedCustomers {
    /// The customers in the window
    pub customers: Vec<CustomerRepresentation>,
}

/// The customer collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CustomersRepresentation {
    /// Links
    #[serde(rename = "_links")]
    pub links: SelfLinks,
    /// Embedded customers
    #[serde(rename = "_embedded")]
    pub embedded: EmbeddedCustomers,
}

impl CustomersRepresentation {
    /// Project a window of customers
    pub fn new(customers: &[Customer]) -> Self {
        Self {
            links: SelfLinks::to(customers_path()),
            embedded: EmbeddedCustomers {
                customers: customers.iter().map(CustomerRepresentation::new).collect(),
            },
        }
    }
}

/// A transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransactionRepresentation {
    /// Transaction id
    pub id: String,
    /// Description
    pub description: String,
    /// Amount in plain decimal notation, e.g. `-45.00`
    pub amount: String,
    /// Links
    #[serde(rename = "_links")]
    pub links: SelfLinks,
}

impl TransactionRepresentation {
    /// Project a transaction of the account identified by `key`
    pub fn new(key: &AccountKey, transaction: &Transaction) -> Self {
        Self {
            id: transaction.id.to_string(),
            description: transaction.description.clone(),
            amount: transaction.amount.to_string(),
            links: SelfLinks::to(transaction_path(key, transaction.id)),
        }
    }
}

/// Embedded transactions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmbeddedTransactions {
    /// The transactions in the window
    pub transactions: Vec<TransactionRepresentation>,
}

impl EmbeddedTransactions {
    fn new(key: &AccountKey, transactions: &[Transaction]) -> Self {
        Self {
            transactions: transactions
                .iter()
                .map(|transaction| TransactionRepresentation::new(key, transaction))
                .collect(),
        }
    }
}

/// The transactions of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransactionsRepresentation {
    /// Links
    #[serde(rename = "_links")]
    pub links: SelfLinks,
    /// Embedded transactions
    #[serde(rename = "_embedded")]
    pub embedded: EmbeddedTransactions,
}

impl TransactionsRepresentation {
    /// Project a window of transactions
    pub fn new(key: &AccountKey, transactions: &[Transaction]) -> Self {
        Self {
            links: SelfLinks::to(transactions_path(key)),
            embedded: EmbeddedTransactions::new(key, transactions),
        }
    }
}

/// Links of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountLinks {
    /// The account itself
    #[serde(rename = "self")]
    pub self_link: Link,
    /// The account's transactions
    pub transactions: Link,
}

/// An account
///
/// Version 1 leaves out the embedded transactions, version 2 embeds them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountRepresentation {
    /// Four-digit registration number
    pub reg_no: String,
    /// Account number
    pub account_no: String,
    /// Account name
    pub name: String,
    /// Links
    #[serde(rename = "_links")]
    pub links: AccountLinks,
    /// Embedded transactions, present in version 2
    #[serde(rename = "_embedded", default, skip_serializing_if = "Option::is_none")]
    pub embedded: Option<EmbeddedTransactions>,
}

impl AccountRepresentation {
    /// Project an account without its transactions
    pub fn sparse(account: &Account) -> Self {
        Self {
            reg_no: account.key.reg_no().to_string(),
            account_no: account.key.account_no().to_string(),
            name: account.name.clone(),
            links: AccountLinks {
                self_link: Link::to(account_path(&account.key)),
                transactions: Link::to(transactions_path(&account.key)),
            },
            embedded: None,
        }
    }

    /// Project an account with its transactions
    pub fn full(account: &Account) -> Self {
        Self {
            embedded: Some(EmbeddedTransactions::new(&account.key, &account.transactions)),
            ..Self::sparse(account)
        }
    }
}

/// Embedded accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmbeddedAccounts {
    /// The accounts in the window
    pub accounts: Vec<AccountRepresentation>,
}

/// The account overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AccountsRepresentation {
    /// Links
    #[serde(rename = "_links")]
    pub links: SelfLinks,
    /// Embedded accounts in sparse form
    #[serde(rename = "_embedded")]
    pub embedded: EmbeddedAccounts,
}

impl AccountsRepresentation {
    /// Project a window of accounts
    pub fn new(accounts: &[Account]) -> Self {
        Self {
            links: SelfLinks::to(accounts_path()),
            embedded: EmbeddedAccounts {
                accounts: accounts.iter().map(AccountRepresentation::sparse).collect(),
            },
        }
    }
}

/// Links of a reconciliation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReconciledTransactionLinks {
    /// The reconciliation state itself
    #[serde(rename = "self")]
    pub self_link: Link,
    /// The decorated transaction
    pub transaction: Link,
}

/// Reconciliation state of a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReconciledTransactionRepresentation {
    /// Id of the decorated transaction
    pub id: String,
    /// Free text note
    pub note: String,
    /// Whether the transaction has been reconciled
    pub reconciled: bool,
    /// Links
    #[serde(rename = "_links")]
    pub links: ReconciledTransactionLinks,
}

impl ReconciledTransactionRepresentation {
    /// Project the reconciliation state of a transaction of `key`
    pub fn new(key: &AccountKey, reconciled: &ReconciledTransaction) -> Self {
        Self {
            id: reconciled.id.to_string(),
            note: reconciled.note.clone(),
            reconciled: reconciled.reconciled,
            links: ReconciledTransactionLinks {
                self_link: Link::to(reconciled_transaction_path(key, reconciled.id)),
                transaction: Link::to(transaction_path(key, reconciled.id)),
            },
        }
    }
}

/// Embedded reconciliation states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedReconciledTransactions {
    /// The reconciliation states in the window
    pub reconciled_transactions: Vec<ReconciledTransactionRepresentation>,
}

/// The reconciliation states of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReconciledTransactionsRepresentation {
    /// Links
    #[serde(rename = "_links")]
    pub links: SelfLinks,
    /// Embedded reconciliation states
    #[serde(rename = "_embedded")]
    pub embedded: EmbeddedReconciledTransactions,
}

impl ReconciledTransactionsRepresentation {
    /// Project a window of reconciliation states
    pub fn new(key: &AccountKey, reconciled: &[ReconciledTransaction]) -> Self {
        Self {
            links: SelfLinks::to(reconciled_transactions_path(key)),
            embedded: EmbeddedReconciledTransactions {
                reconciled_transactions: reconciled
                    .iter()
                    .map(|reconciled| ReconciledTransactionRepresentation::new(key, reconciled))
                    .collect(),
            },
        }
    }
}

/// Links of an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventLinks {
    /// The event itself
    #[serde(rename = "self")]
    pub self_link: Link,
    /// The resource the event concerns
    pub origin: Link,
    /// Metadata of the feed
    pub metadata: Link,
}

/// An event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventRepresentation {
    /// Event id
    pub id: String,
    /// Publication time in RFC 3339
    pub time: String,
    /// Ordering within the feed
    pub sequence: String,
    /// Category the event belongs to
    pub category: String,
    /// What happened
    pub information: String,
    /// Links
    #[serde(rename = "_links")]
    pub links: EventLinks,
}

impl EventRepresentation {
    /// Project an event of `feed`
    pub fn new(feed: EventFeed, event: &Event) -> Self {
        Self {
            id: event.id.to_string(),
            time: event.time.to_rfc3339(),
            sequence: event.sequence.to_string(),
            category: event.category.clone(),
            information: event.information.clone(),
            links: EventLinks {
                self_link: Link::to(event_path(feed, &event.category, event.id)),
                origin: Link::to(event.origin.clone()),
                metadata: Link::to(events_metadata_path(feed)),
            },
        }
    }
}

/// Embedded events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EmbeddedEvents {
    /// The events in sequence order
    pub events: Vec<EventRepresentation>,
}

/// A list of events, a whole feed or one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventsRepresentation {
    /// Links
    #[serde(rename = "_links")]
    pub links: SelfLinks,
    /// Embedded events
    #[serde(rename = "_embedded")]
    pub embedded: EmbeddedEvents,
}

impl EventsRepresentation {
    /// Project the events listed at `self_path`
    pub fn new(feed: EventFeed, self_path: String, events: &[Event]) -> Self {
        Self {
            links: SelfLinks::to(self_path),
            embedded: EmbeddedEvents {
                events: events
                    .iter()
                    .map(|event| EventRepresentation::new(feed, event))
                    .collect(),
            },
        }
    }
}

/// Links of an event feed's metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventsMetadataLinks {
    /// The metadata itself
    #[serde(rename = "self")]
    pub self_link: Link,
    /// The described feed
    pub events: Link,
}

/// Description of an event feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EventsMetadataRepresentation {
    /// How the feed is organised
    pub metadata: String,
    /// Links
    #[serde(rename = "_links")]
    pub links: EventsMetadataLinks,
}

impl EventsMetadataRepresentation {
    /// Describe `feed` with `metadata`
    pub fn new(feed: EventFeed, metadata: impl Into<String>) -> Self {
        Self {
            metadata: metadata.into(),
            links: EventsMetadataLinks {
                self_link: Link::to(events_metadata_path(feed)),
                events: Link::to(events_path(feed)),
            },
        }
    }
}

/// Request body creating or updating a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdate {
    /// Must equal the number in the path
    pub number: String,
    /// First name
    pub first_name: String,
    /// Middle name
    #[serde(default)]
    pub middle_name: String,
    /// Surname
    pub surname: String,
}

/// Request body creating or renaming an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    /// Must equal the registration number in the path
    pub reg_no: String,
    /// Must equal the account number in the path
    pub account_no: String,
    /// Account name
    pub name: String,
}

/// Request body booking a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TransactionUpdate {
    /// Description, 1 to 256 characters
    pub description: String,
    /// Amount in plain decimal notation, e.g. `-45.00`
    pub amount: String,
}

/// Request body reconciling a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReconciledTransactionUpdate {
    /// Note, 1 to 256 characters
    pub note: String,
    /// `true` or `false`
    pub reconciled: String,
}
