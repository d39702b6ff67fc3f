// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory archivist backed by `DashMap`
//!
//! Every operation runs inside an instrumented scope owned by
//! `InMemoryArchivist`, so when called from a resource producer it shows up
//! as a child in the producer's duration breakdown. Saves publish their
//! event from within the save's scope.

use std::fmt::Display;

use chrono::Utc;
use dashmap::DashMap;
use pipeline::{ScopeSpec, measure};
use shared_types::{
    Account, AccountKey, Amount, Customer, CustomerNumber, Event, ReconciledTransaction,
    Transaction,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    AccountArchivist, ArchivistError, ArchivistResult, CustomerArchivist, EventArchivist,
    EventFeed, Interval, ListQuery,
};

const OWNER: &str = "InMemoryArchivist";

/// Default warning limit for archivist operations
pub const DEFAULT_LIMIT_MS: u64 = 50;

/// Modifier recorded in audit information when none is configured
pub const SYSTEM_USER: &str = "system";

/// Customers, accounts and their event feeds held in concurrent maps
#[derive(Debug)]
pub struct InMemoryArchivist {
    customers: DashMap<CustomerNumber, Customer>,
    accounts: DashMap<AccountKey, Account>,
    reconciled: DashMap<(AccountKey, Uuid), ReconciledTransaction>,
    events: DashMap<EventFeed, Vec<Event>>,
    limit_ms: u64,
    modifier: String,
}

impl Default for InMemoryArchivist {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT_MS)
    }
}

impl InMemoryArchivist {
    /// Create an empty archivist warning on operations slower than `limit_ms`
    pub fn new(limit_ms: u64) -> Self {
        Self {
            customers: DashMap::new(),
            accounts: DashMap::new(),
            reconciled: DashMap::new(),
            events: DashMap::new(),
            limit_ms,
            modifier: SYSTEM_USER.to_string(),
        }
    }

    /// Create an archivist holding the development data set
    pub fn seeded(limit_ms: u64) -> ArchivistResult<Self> {
        let archivist = Self::new(limit_ms);
        for customer in seed_customers() {
            archivist.save_customer(customer)?;
        }
        for account in seed_accounts() {
            archivist.save_account(account)?;
        }
        info!(
            customers = archivist.customers.len(),
            accounts = archivist.accounts.len(),
            "Seeded in-memory archivist"
        );
        Ok(archivist)
    }

    /// Record `modifier` in the audit information of saved records
    #[must_use]
    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifier = modifier.into();
        self
    }

    fn scope(&self, operation: &'static str, arguments: &[&dyn Display]) -> ScopeSpec {
        ScopeSpec::new(OWNER, operation, self.limit_ms).with_arguments(arguments)
    }

    fn account(&self, key: &AccountKey) -> ArchivistResult<Account> {
        self.accounts
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ArchivistError::not_found("account", key))
    }

    fn publish(
        &self,
        feed: EventFeed,
        origin: String,
        category: String,
        information: String,
    ) -> ArchivistResult<Event> {
        self.save_event(feed, Event::new(origin, category, information))
    }

    fn feed(&self, feed: EventFeed, keep: impl Fn(&Event) -> bool) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .events
            .get(&feed)
            .map(|entry| entry.value().iter().filter(|&event| keep(event)).cloned().collect())
            .unwrap_or_default();
        events.sort_by_key(|event| event.sequence);
        events
    }
}

/// Category of an account's events, `<account_no>-<reg_no>`
fn account_category(key: &AccountKey) -> String {
    Event::category(key.account_no(), key.reg_no())
}

impl CustomerArchivist for InMemoryArchivist {
    fn list_customers(&self, query: &ListQuery) -> ArchivistResult<Vec<Customer>> {
        measure(
            self.scope("list_customers", &[&query.offset, &query.effective_limit()]),
            || {
                let mut customers: Vec<Customer> = self
                    .customers
                    .iter()
                    .map(|entry| entry.value().clone())
                    .collect();
                customers.sort_by(|a, b| a.number.cmp(&b.number));
                Ok(query.window(customers))
            },
        )
    }

    fn get_customer(&self, number: &CustomerNumber) -> ArchivistResult<Customer> {
        measure(self.scope("get_customer", &[number]), || {
            self.customers
                .get(number)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| ArchivistError::not_found("customer", number))
        })
    }

    fn find_customer(&self, number: &CustomerNumber) -> ArchivistResult<Option<Customer>> {
        measure(self.scope("find_customer", &[number]), || {
            Ok(self.customers.get(number).map(|entry| entry.value().clone()))
        })
    }

    fn save_customer(&self, mut customer: Customer) -> ArchivistResult<Customer> {
        measure(self.scope("save_customer", &[&customer.number]), || {
            customer.audit.stamp(self.modifier.as_str(), Utc::now());
            debug!(number = %customer.number, "Saving customer");
            self.customers
                .insert(customer.number.clone(), customer.clone());
            self.publish(
                EventFeed::Customer,
                format!("/customers/{}", customer.number),
                customer.number.to_string(),
                format!("customer {} saved", customer.number),
            )?;
            Ok(customer)
        })
    }
}

impl AccountArchivist for InMemoryArchivist {
    fn list_accounts(&self, query: &ListQuery) -> ArchivistResult<Vec<Account>> {
        measure(
            self.scope("list_accounts", &[&query.offset, &query.effective_limit()]),
            || {
                let mut accounts: Vec<Account> = self
                    .accounts
                    .iter()
                    .map(|entry| entry.value().clone())
                    .collect();
                accounts.sort_by(|a, b| a.key.cmp(&b.key));
                Ok(query.window(accounts))
            },
        )
    }

    fn get_account(&self, key: &AccountKey) -> ArchivistResult<Account> {
        measure(self.scope("get_account", &[key]), || self.account(key))
    }

    fn find_account(&self, key: &AccountKey) -> ArchivistResult<Option<Account>> {
        measure(self.scope("find_account", &[key]), || {
            Ok(self.accounts.get(key).map(|entry| entry.value().clone()))
        })
    }

    fn save_account(&self, mut account: Account) -> ArchivistResult<Account> {
        measure(self.scope("save_account", &[&account.key]), || {
            let now = Utc::now();
            account.audit.stamp(self.modifier.as_str(), now);
            for transaction in account
                .transactions
                .iter_mut()
                .filter(|transaction| transaction.audit.last_modified_by().is_none())
            {
                transaction.audit.stamp(self.modifier.as_str(), now);
            }
            debug!(key = %account.key, "Saving account");
            self.accounts.insert(account.key.clone(), account.clone());
            self.publish(
                EventFeed::Account,
                format!("/accounts/{}", account.key),
                account_category(&account.key),
                format!("account {} saved", account.key),
            )?;
            Ok(account)
        })
    }

    fn list_transactions(
        &self,
        key: &AccountKey,
        query: &ListQuery,
    ) -> ArchivistResult<Vec<Transaction>> {
        measure(self.scope("list_transactions", &[key, &query.offset]), || {
            let mut transactions = self.account(key)?.transactions;
            if query.sort.is_some() {
                transactions.sort_by_key(|transaction| transaction.amount);
            }
            Ok(query.window(transactions))
        })
    }

    fn get_transaction(&self, key: &AccountKey, id: Uuid) -> ArchivistResult<Transaction> {
        measure(self.scope("get_transaction", &[key, &id]), || {
            self.account(key)?
                .transaction(id)
                .cloned()
                .ok_or_else(|| ArchivistError::not_found("transaction", id))
        })
    }

    fn find_transaction(&self, key: &AccountKey, id: Uuid) -> ArchivistResult<Option<Transaction>> {
        measure(self.scope("find_transaction", &[key, &id]), || {
            Ok(self
                .accounts
                .get(key)
                .and_then(|entry| entry.value().transaction(id).cloned()))
        })
    }

    fn add_transaction(
        &self,
        key: &AccountKey,
        mut transaction: Transaction,
    ) -> ArchivistResult<Transaction> {
        measure(self.scope("add_transaction", &[key, &transaction.id]), || {
            {
                let mut account = self
                    .accounts
                    .get_mut(key)
                    .ok_or_else(|| ArchivistError::not_found("account", key))?;
                if account.transaction(transaction.id).is_some() {
                    return Err(ArchivistError::Conflict {
                        kind: "transaction",
                        key: transaction.id.to_string(),
                    });
                }
                let now = Utc::now();
                transaction.audit.stamp(self.modifier.as_str(), now);
                account.audit.stamp(self.modifier.as_str(), now);
                account.transactions.push(transaction.clone());
            }
            debug!(%key, id = %transaction.id, "Booked transaction");
            self.publish(
                EventFeed::Account,
                format!("/accounts/{key}/transactions/{}", transaction.id),
                account_category(key),
                format!("new transaction on account {key}"),
            )?;
            Ok(transaction)
        })
    }

    fn list_reconciled(
        &self,
        key: &AccountKey,
        query: &ListQuery,
    ) -> ArchivistResult<Vec<ReconciledTransaction>> {
        measure(self.scope("list_reconciled", &[key, &query.offset]), || {
            self.account(key)?;
            let mut reconciled: Vec<ReconciledTransaction> = self
                .reconciled
                .iter()
                .filter(|entry| entry.key().0 == *key)
                .map(|entry| entry.value().clone())
                .collect();
            reconciled.sort_by_key(|reconciled| reconciled.id);
            Ok(query.window(reconciled))
        })
    }

    fn get_reconciled(&self, key: &AccountKey, id: Uuid) -> ArchivistResult<ReconciledTransaction> {
        measure(self.scope("get_reconciled", &[key, &id]), || {
            self.reconciled
                .get(&(key.clone(), id))
                .map(|entry| entry.value().clone())
                .ok_or_else(|| ArchivistError::not_found("reconciled transaction", id))
        })
    }

    fn save_reconciled(
        &self,
        key: &AccountKey,
        mut reconciled: ReconciledTransaction,
    ) -> ArchivistResult<ReconciledTransaction> {
        measure(self.scope("save_reconciled", &[key, &reconciled.id]), || {
            if self.account(key)?.transaction(reconciled.id).is_none() {
                return Err(ArchivistError::not_found("transaction", reconciled.id));
            }
            reconciled.audit.stamp(self.modifier.as_str(), Utc::now());
            debug!(%key, id = %reconciled.id, reconciled = reconciled.reconciled, "Saving reconciliation");
            self.reconciled
                .insert((key.clone(), reconciled.id), reconciled.clone());
            let state = if reconciled.reconciled { "reconciled" } else { "unreconciled" };
            self.publish(
                EventFeed::Account,
                format!("/accounts/{key}/reconciled-transactions/{}", reconciled.id),
                account_category(key),
                format!("transaction {} on account {key} {state}", reconciled.id),
            )?;
            Ok(reconciled)
        })
    }
}

impl EventArchivist for InMemoryArchivist {
    fn list_events(&self, feed: EventFeed, within: Option<&Interval>) -> ArchivistResult<Vec<Event>> {
        measure(self.scope("list_events", &[&feed]), || {
            Ok(self.feed(feed, |event| {
                within.is_none_or(|interval| interval.contains(event.time))
            }))
        })
    }

    fn list_category_events(
        &self,
        feed: EventFeed,
        category: &str,
        within: Option<&Interval>,
    ) -> ArchivistResult<Vec<Event>> {
        measure(self.scope("list_category_events", &[&feed, &category]), || {
            Ok(self.feed(feed, |event| {
                event.category == category
                    && within.is_none_or(|interval| interval.contains(event.time))
            }))
        })
    }

    fn get_event(&self, feed: EventFeed, category: &str, id: Uuid) -> ArchivistResult<Event> {
        measure(self.scope("get_event", &[&feed, &category, &id]), || {
            self.feed(feed, |event| event.category == category && event.id == id)
                .into_iter()
                .next()
                .ok_or_else(|| ArchivistError::not_found("event", id))
        })
    }

    fn save_event(&self, feed: EventFeed, mut event: Event) -> ArchivistResult<Event> {
        measure(self.scope("save_event", &[&feed, &event.category]), || {
            event.audit.stamp(self.modifier.as_str(), Utc::now());
            self.events.entry(feed).or_default().push(event.clone());
            Ok(event)
        })
    }
}

fn seed_customers() -> Vec<Customer> {
    [
        ("0123456789", "Hans", "Peter", "Hansen"),
        ("1234567890", "Anders", "", "Andersen"),
        ("2345678901", "Sofie", "Marie", "Jensen"),
    ]
    .into_iter()
    .filter_map(|(number, first, middle, surname)| {
        let number = CustomerNumber::new(number).ok()?;
        Some(Customer::new(number, first, middle, surname))
    })
    .collect()
}

fn seed_accounts() -> Vec<Account> {
    let bookings: [(&str, &str, &str, &[(u128, i64, &str)]); 2] = [
        (
            "5479",
            "1234567",
            "NemKonto",
            &[
                (0x0001, -4_500, "Starbucks Coffee"),
                (0x0002, 2_500_000, "Salary"),
                (0x0003, -12_995, "Groceries"),
            ],
        ),
        ("5479", "7654321", "Savings", &[(0x0004, 1_000_000, "Deposit")]),
    ];

    bookings
        .into_iter()
        .filter_map(|(reg_no, account_no, name, transactions)| {
            let mut account = Account::new(AccountKey::new(reg_no, account_no).ok()?, name);
            account.transactions = transactions
                .iter()
                .map(|&(id, amount, description)| {
                    Transaction::with_id(Uuid::from_u128(id), Amount::from_minor(amount), description)
                })
                .collect();
            Some(account)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pipeline::measure_scope;

    use super::*;
    use crate::SortDirection;

    fn archivist() -> InMemoryArchivist {
        InMemoryArchivist::seeded(DEFAULT_LIMIT_MS).expect("seed data saves")
    }

    fn nem_konto() -> AccountKey {
        "5479-1234567".parse().expect("valid key")
    }

    #[test]
    fn customers_are_listed_by_number() {
        let customers = archivist()
            .list_customers(&ListQuery::default())
            .expect("listing succeeds");
        let numbers: Vec<&str> = customers.iter().map(|c| c.number.as_str()).collect();
        assert_eq!(numbers, vec!["0123456789", "1234567890", "2345678901"]);
    }

    #[test]
    fn missing_customer_is_not_found() {
        let number: CustomerNumber = "9999999999".parse().expect("valid number");
        let archivist = archivist();

        assert_eq!(
            archivist.get_customer(&number).err(),
            Some(ArchivistError::not_found("customer", "9999999999"))
        );
        assert_eq!(archivist.find_customer(&number), Ok(None));
    }

    #[test]
    fn save_stamps_audit_information() {
        let archivist = InMemoryArchivist::new(DEFAULT_LIMIT_MS).with_modifier("advisor");
        let number: CustomerNumber = "5555555555".parse().expect("valid number");
        let before = Utc::now();

        let saved = archivist
            .save_customer(Customer::new(number.clone(), "Ida", "", "Holm"))
            .expect("save succeeds");

        assert_eq!(saved.audit.last_modified_by(), Some("advisor"));
        assert!(saved.audit.last_modified_time() >= before);
        assert_eq!(archivist.get_customer(&number), Ok(saved));
    }

    #[test]
    fn transactions_sort_by_amount_when_requested() {
        let archivist = archivist();
        let booking_order = archivist
            .list_transactions(&nem_konto(), &ListQuery::default())
            .expect("listing succeeds");
        let descriptions: Vec<&str> = booking_order
            .iter()
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(descriptions, vec!["Starbucks Coffee", "Salary", "Groceries"]);

        let largest_first = archivist
            .list_transactions(
                &nem_konto(),
                &ListQuery {
                    sort: Some(SortDirection::Desc),
                    ..ListQuery::default()
                },
            )
            .expect("listing succeeds");
        let amounts: Vec<i64> = largest_first.iter().map(|t| t.amount.minor()).collect();
        assert_eq!(amounts, vec![2_500_000, -4_500, -12_995]);
    }

    #[test]
    fn transaction_lookup_checks_account_and_id() {
        let archivist = archivist();
        let found = archivist
            .get_transaction(&nem_konto(), Uuid::from_u128(0x0002))
            .expect("seeded transaction exists");
        assert_eq!(found.description, "Salary");

        let other_account: AccountKey = "5479-7654321".parse().expect("valid key");
        assert!(matches!(
            archivist.get_transaction(&other_account, Uuid::from_u128(0x0002)),
            Err(ArchivistError::NotFound { kind: "transaction", .. })
        ));
        let unknown: AccountKey = "1111-1".parse().expect("valid key");
        assert!(matches!(
            archivist.list_transactions(&unknown, &ListQuery::default()),
            Err(ArchivistError::NotFound { kind: "account", .. })
        ));
    }

    #[test]
    fn booking_appends_and_publishes_an_account_event() {
        let archivist = archivist();
        let booked = archivist
            .add_transaction(
                &nem_konto(),
                Transaction::with_id(Uuid::from_u128(0x0010), Amount::from_minor(-2_000), "Cinema"),
            )
            .expect("account exists");

        assert_eq!(booked.audit.last_modified_by(), Some(SYSTEM_USER));
        assert_eq!(
            archivist.get_transaction(&nem_konto(), booked.id),
            Ok(booked.clone())
        );
        let events = archivist
            .list_category_events(EventFeed::Account, "1234567-5479", None)
            .expect("feed is readable");
        let last = events.last().expect("booking published an event");
        assert_eq!(last.information, "new transaction on account 5479-1234567");
        assert_eq!(
            last.origin,
            "/accounts/5479-1234567/transactions/00000000-0000-0000-0000-000000000010"
        );
    }

    #[test]
    fn booking_an_existing_id_conflicts() {
        let result = archivist().add_transaction(
            &nem_konto(),
            Transaction::with_id(Uuid::from_u128(0x0001), Amount::from_minor(1), "Again"),
        );

        assert!(matches!(
            result,
            Err(ArchivistError::Conflict { kind: "transaction", .. })
        ));
    }

    #[test]
    fn reconciliation_requires_a_booked_transaction() {
        let archivist = archivist();
        let salary = archivist
            .get_transaction(&nem_konto(), Uuid::from_u128(0x0002))
            .expect("seeded transaction exists");
        let saved = archivist
            .save_reconciled(&nem_konto(), ReconciledTransaction::new(&salary, true, "payslip checked"))
            .expect("transaction exists");

        assert_eq!(archivist.get_reconciled(&nem_konto(), salary.id), Ok(saved.clone()));
        assert_eq!(
            archivist.list_reconciled(&nem_konto(), &ListQuery::default()),
            Ok(vec![saved])
        );

        let unknown = Transaction::with_id(Uuid::from_u128(0x0099), Amount::from_minor(1), "Ghost");
        assert!(matches!(
            archivist.save_reconciled(&nem_konto(), ReconciledTransaction::new(&unknown, true, "")),
            Err(ArchivistError::NotFound { kind: "transaction", .. })
        ));
        assert_eq!(archivist.find_transaction(&nem_konto(), unknown.id), Ok(None));
    }

    #[test]
    fn saves_publish_on_their_own_feed() {
        let archivist = archivist();
        let customer_events = archivist
            .list_events(EventFeed::Customer, None)
            .expect("feed is readable");
        let account_events = archivist
            .list_events(EventFeed::Account, None)
            .expect("feed is readable");

        assert_eq!(customer_events.len(), 3);
        assert_eq!(account_events.len(), 2);
        assert!(customer_events.windows(2).all(|pair| pair[0].sequence <= pair[1].sequence));

        let hans = &customer_events[0];
        assert_eq!(hans.category, "0123456789");
        assert_eq!(
            archivist.get_event(EventFeed::Customer, "0123456789", hans.id),
            Ok(hans.clone())
        );
        assert!(matches!(
            archivist.get_event(EventFeed::Account, "0123456789", hans.id),
            Err(ArchivistError::NotFound { kind: "event", .. })
        ));
    }

    #[test]
    fn interval_filters_events_by_publication_time() {
        let archivist = InMemoryArchivist::default();
        let noon = Utc::now() - chrono::Duration::hours(1);
        for minutes in [0, 10, 20] {
            archivist
                .save_event(
                    EventFeed::Customer,
                    Event::at(
                        noon + chrono::Duration::minutes(minutes),
                        "/customers/0123456789",
                        "0123456789",
                        format!("change {minutes}"),
                    ),
                )
                .expect("event saves");
        }
        let interval = Interval::new(noon, noon + chrono::Duration::minutes(15)).expect("valid interval");

        let events = archivist
            .list_category_events(EventFeed::Customer, "0123456789", Some(&interval))
            .expect("feed is readable");

        let information: Vec<&str> = events.iter().map(|e| e.information.as_str()).collect();
        assert_eq!(information, vec!["change 10"]);
    }

    #[test]
    fn operations_nest_under_the_calling_scope() {
        let archivist = archivist();
        let (result, scope) = measure_scope(ScopeSpec::new("AccountResource", "get", 1_000), || {
            archivist.get_account(&nem_konto())
        });

        assert!(result.is_ok());
        let scope = scope.expect("scope completes");
        assert_eq!(scope.children().len(), 1);
        assert_eq!(scope.children()[0].label().to_string(), "InMemoryArchivist:get_account");
        assert_eq!(scope.children()[0].extra(), Some("5479-1234567"));
    }
}
