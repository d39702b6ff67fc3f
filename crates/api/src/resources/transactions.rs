// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Transaction resource
//!
//! Transactions are immutable once booked, so a single transaction may be
//! cached for a week. Booking puts a new transaction at its id.

use std::sync::{Arc, LazyLock};

use archivist::{AccountArchivist, ListQuery};
use axum::response::Response;
use pipeline::{MediaTypeGrammar, PipelineResult, Preconditions};
use regex::Regex;
use shared_types::{AccountKey, Amount, Transaction};
use tracing::info;
use uuid::Uuid;

use super::{ProducerTable, Producers, Resource, ResourceSettings, instrumented, negotiate, record};
use crate::{
    error::{ServerError, ServerResult},
    extractors::RequestContext,
    representations::{
        TransactionRepresentation, TransactionUpdate, TransactionsRepresentation, transaction_path,
    },
};

const ONE_WEEK: u32 = 7 * 24 * 60 * 60;
const MAX_DESCRIPTION_LENGTH: usize = 256;

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[0-9]{1,9}(\.[0-9]{2})?$").expect("amount regex is valid")
});

/// Transactions of an account, addressed by id
#[derive(Debug)]
pub struct TransactionResource {
    archivist: Arc<dyn AccountArchivist>,
    settings: ResourceSettings,
    list_producers: Producers<Self, (AccountKey, ListQuery)>,
    item_producers: Producers<Self, (AccountKey, Uuid)>,
}

impl Resource for TransactionResource {
    const NAME: &'static str = "TransactionResource";

    fn settings(&self) -> &ResourceSettings {
        &self.settings
    }
}

impl TransactionResource {
    /// Create the resource and its dispatch tables
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` if a media type cannot be encoded or is
    /// registered twice.
    pub fn new(archivist: Arc<dyn AccountArchivist>, settings: ResourceSettings) -> PipelineResult<Self> {
        let list_producers = ProducerTable::<Self, (AccountKey, ListQuery)>::new()
            .default_type("list_v1", Self::list_v1)
            .version("transactionoverview", "1", "list_v1", Self::list_v1)?
            .build()?;
        let item_producers = ProducerTable::<Self, (AccountKey, Uuid)>::new()
            .default_type("get_v1", Self::get_v1)
            .version("transaction", "1", "get_v1", Self::get_v1)?
            .build()?;

        Ok(Self {
            archivist,
            settings,
            list_producers,
            item_producers,
        })
    }

    /// List the transactions of an account
    ///
    /// # Errors
    ///
    /// Returns `ServerError::NotFound` if the account does not exist
    pub fn list(
        &self,
        context: &RequestContext,
        key: AccountKey,
        query: ListQuery,
    ) -> ServerResult<Response> {
        let arguments = [key.to_string(), query.offset.to_string()];
        negotiate(
            self,
            &self.list_producers,
            context,
            &(key, query),
            &[&arguments[0], &arguments[1]],
        )
    }

    /// Get one transaction of an account
    ///
    /// # Errors
    ///
    /// Returns `ServerError::NotFound` if the account or the transaction does
    /// not exist
    pub fn get(&self, context: &RequestContext, key: AccountKey, id: Uuid) -> ServerResult<Response> {
        let arguments = key.to_string();
        negotiate(
            self,
            &self.item_producers,
            context,
            &(key, id),
            &[&arguments, &id],
        )
    }

    /// Book a transaction at `id` on an existing account
    ///
    /// # Errors
    ///
    /// Returns `ServerError::ValidationError` for a blank or overlong
    /// description or a malformed amount, `ServerError::NotFound` for an
    /// unknown account and `ServerError::Conflict` if `id` is already booked
    pub fn create(
        &self,
        context: &RequestContext,
        key: &AccountKey,
        id: Uuid,
        update: &TransactionUpdate,
    ) -> ServerResult<Response> {
        let result = self.book(context, key, id, update);
        record(Self::NAME, &result);
        result
    }

    fn book(
        &self,
        context: &RequestContext,
        key: &AccountKey,
        id: Uuid,
        update: &TransactionUpdate,
    ) -> ServerResult<Response> {
        let description = update.description.trim();
        if description.is_empty() || description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(ServerError::ValidationError(format!(
                "transaction description must be 1 to {MAX_DESCRIPTION_LENGTH} characters"
            )));
        }
        if !AMOUNT.is_match(&update.amount) {
            return Err(ServerError::ValidationError(format!(
                "invalid amount '{}': expected up to 9 digits with an optional 2 digit fraction",
                update.amount
            )));
        }
        let amount: Amount = update.amount.parse().map_err(ServerError::ValidationError)?;

        instrumented(self, "create", &[key, &id], || {
            let booked = self
                .archivist
                .add_transaction(key, Transaction::with_id(id, amount, description))?;
            info!(%key, %id, %amount, log_token = %context.log_token(), "Booked transaction");

            Ok(self
                .settings
                .respond_with(context, booked, |transaction: &Transaction| {
                    TransactionRepresentation::new(key, transaction)
                })
                .concept("transaction")
                .version("1")
                .max_age(30)
                .created(transaction_path(key, id))
                .build(&Preconditions::none())?)
        })
    }

    fn list_v1(
        &self,
        context: &RequestContext,
        (key, query): &(AccountKey, ListQuery),
        grammar: MediaTypeGrammar,
    ) -> ServerResult<Response> {
        let transactions = self.archivist.list_transactions(key, query)?;
        Ok(self
            .settings
            .respond_with(context, transactions, |transactions: &Vec<Transaction>| {
                TransactionsRepresentation::new(key, transactions)
            })
            .concept("transactionoverview")
            .version("1")
            .grammar(grammar)
            .max_age(10)
            .build(context.preconditions())?)
    }

    fn get_v1(
        &self,
        context: &RequestContext,
        (key, id): &(AccountKey, Uuid),
        grammar: MediaTypeGrammar,
    ) -> ServerResult<Response> {
        let transaction = self.archivist.get_transaction(key, *id)?;
        Ok(self
            .settings
            .respond_with(context, transaction, |transaction: &Transaction| {
                TransactionRepresentation::new(key, transaction)
            })
            .concept("transaction")
            .version("1")
            .grammar(grammar)
            .max_age(ONE_WEEK)
            .build(context.preconditions())?)
    }
}

#[cfg(test)]
mod tests {
    use archivist::{ArchivistError, SortDirection};
    use axum::http::{StatusCode, header};
    use shared_types::Amount;

    use super::*;
    use crate::resources::mocks::{MockAccounts, context};

    fn key() -> AccountKey {
        AccountKey::new("5479", "1234567").expect("valid key")
    }

    fn coffee() -> Transaction {
        Transaction::with_id(Uuid::from_u128(1), Amount::from_minor(-4500), "Starbucks Coffee")
    }

    fn resource(archivist: MockAccounts) -> TransactionResource {
        TransactionResource::new(Arc::new(archivist), ResourceSettings::default())
            .expect("tables build")
    }

    fn header_value<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
        response.headers().get(name).and_then(|value| value.to_str().ok())
    }

    #[test]
    fn single_transaction_is_cached_for_a_week() {
        let mut archivist = MockAccounts::new();
        archivist
            .expect_get_transaction()
            .withf(|key, id| key.to_string() == "5479-1234567" && *id == Uuid::from_u128(1))
            .returning(|_, _| Ok(coffee()));

        let response = resource(archivist)
            .get(&context("application/hal+json;concept=transaction;v=1"), key(), Uuid::from_u128(1))
            .expect("transaction is found");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            header_value(&response, header::CACHE_CONTROL.as_str()),
            Some("max-age=604800")
        );
    }

    #[test]
    fn sorted_window_is_forwarded() {
        let mut archivist = MockAccounts::new();
        archivist
            .expect_list_transactions()
            .withf(|_, query| query.sort == Some(SortDirection::Desc))
            .returning(|_, _| Ok(vec![coffee()]));
        let query = ListQuery {
            sort: Some(SortDirection::Desc),
            ..ListQuery::default()
        };

        let response = resource(archivist)
            .list(&context("application/hal+json+transactionoverview+v1"), key(), query)
            .expect("listing answers");

        assert_eq!(
            header_value(&response, header::CONTENT_TYPE.as_str()),
            Some("application/hal+json+transactionoverview+v1")
        );
    }

    fn booking(description: &str, amount: &str) -> TransactionUpdate {
        TransactionUpdate {
            description: description.to_string(),
            amount: amount.to_string(),
        }
    }

    #[test]
    fn booking_answers_created_at_the_transaction_path() {
        let mut archivist = MockAccounts::new();
        archivist
            .expect_add_transaction()
            .withf(|key, transaction| {
                key.to_string() == "5479-1234567"
                    && transaction.id == Uuid::from_u128(9)
                    && transaction.amount == Amount::from_minor(12_050)
                    && transaction.description == "Refund"
            })
            .times(1)
            .returning(|_, transaction| Ok(transaction));

        let response = resource(archivist)
            .create(&context(""), &key(), Uuid::from_u128(9), &booking("Refund", "120.50"))
            .expect("transaction is booked");

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            header_value(&response, header::LOCATION.as_str()),
            Some("/accounts/5479-1234567/transactions/00000000-0000-0000-0000-000000000009")
        );
        assert_eq!(
            header_value(&response, header::CONTENT_TYPE.as_str()),
            Some("application/hal+json;concept=transaction;v=1")
        );
        assert_eq!(
            header_value(&response, header::CACHE_CONTROL.as_str()),
            Some("max-age=30")
        );
    }

    #[test]
    fn malformed_bookings_never_reach_the_archivist() {
        let mut archivist = MockAccounts::new();
        archivist.expect_add_transaction().times(0);
        let resource = resource(archivist);

        for invalid in [
            booking("", "10.00"),
            booking(&"x".repeat(257), "10.00"),
            booking("Fee", "10.5"),
            booking("Fee", "1234567890"),
            booking("Fee", "ten"),
        ] {
            assert!(matches!(
                resource.create(&context(""), &key(), Uuid::from_u128(9), &invalid),
                Err(ServerError::ValidationError(_))
            ));
        }
    }

    #[test]
    fn booking_on_an_unknown_account_is_not_found() {
        let mut archivist = MockAccounts::new();
        archivist
            .expect_add_transaction()
            .returning(|key, _| Err(ArchivistError::not_found("account", key)));

        let result = resource(archivist).create(&context(""), &key(), Uuid::from_u128(9), &booking("Fee", "-5.00"));

        assert!(matches!(result, Err(ServerError::NotFound { .. })));
    }

    #[test]
    fn unknown_transaction_is_not_found() {
        let mut archivist = MockAccounts::new();
        archivist
            .expect_get_transaction()
            .returning(|_, id| Err(ArchivistError::not_found("transaction", id)));

        let result = resource(archivist).get(&context("application/hal+json"), key(), Uuid::nil());

        assert!(matches!(result, Err(ServerError::NotFound { .. })));
    }
}
