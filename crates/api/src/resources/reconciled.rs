// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Reconciled transaction resource
//!
//! Transactions never change, so their reconciliation state lives in a
//! separate resource sharing the transaction's id.

use std::sync::Arc;

use archivist::{AccountArchivist, ListQuery};
use axum::response::Response;
use pipeline::{MediaTypeGrammar, PipelineResult, Preconditions};
use shared_types::{AccountKey, ReconciledTransaction};
use tracing::info;
use uuid::Uuid;

use super::{ProducerTable, Producers, Resource, ResourceSettings, instrumented, negotiate, record};
use crate::{
    error::{ServerError, ServerResult},
    extractors::RequestContext,
    representations::{
        ReconciledTransactionRepresentation, ReconciledTransactionUpdate,
        ReconciledTransactionsRepresentation, reconciled_transaction_path,
    },
};

const ONE_DAY: u32 = 24 * 60 * 60;
const MAX_NOTE_LENGTH: usize = 256;

/// Reconciliation states of an account's transactions
#[derive(Debug)]
pub struct ReconciledTransactionResource {
    archivist: Arc<dyn AccountArchivist>,
    settings: ResourceSettings,
    list_producers: Producers<Self, (AccountKey, ListQuery)>,
    item_producers: Producers<Self, (AccountKey, Uuid)>,
}

impl Resource for ReconciledTransactionResource {
    const NAME: &'static str = "ReconciledTransactionResource";

    fn settings(&self) -> &ResourceSettings {
        &self.settings
    }
}

impl ReconciledTransactionResource {
    /// Create the resource and its dispatch tables
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` if a media type cannot be encoded or is
    /// registered twice.
    pub fn new(archivist: Arc<dyn AccountArchivist>, settings: ResourceSettings) -> PipelineResult<Self> {
        let list_producers = ProducerTable::<Self, (AccountKey, ListQuery)>::new()
            .default_type("list_v1", Self::list_v1)
            .version("reconciledtransactions", "1", "list_v1", Self::list_v1)?
            .build()?;
        let item_producers = ProducerTable::<Self, (AccountKey, Uuid)>::new()
            .default_type("get_v1", Self::get_v1)
            .version("reconciledtransaction", "1", "get_v1", Self::get_v1)?
            .build()?;

        Ok(Self {
            archivist,
            settings,
            list_producers,
            item_producers,
        })
    }

    /// List the reconciliation states of an account
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

    /// Get the reconciliation state of a transaction
    ///
    /// # Errors
    ///
    /// Returns `ServerError::NotFound` if the transaction was never reconciled
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

    /// Set the reconciliation state of a booked transaction
    ///
    /// # Errors
    ///
    /// Returns `ServerError::ValidationError` for a blank or overlong note, a
    /// flag other than `true` or `false`, or a transaction that is not booked
    /// on the account
    pub fn update(
        &self,
        context: &RequestContext,
        key: &AccountKey,
        id: Uuid,
        update: &ReconciledTransactionUpdate,
    ) -> ServerResult<Response> {
        let result = self.store(context, key, id, update);
        record(Self::NAME, &result);
        result
    }

    fn store(
        &self,
        context: &RequestContext,
        key: &AccountKey,
        id: Uuid,
        update: &ReconciledTransactionUpdate,
    ) -> ServerResult<Response> {
        let note = update.note.trim();
        if note.is_empty() || note.chars().count() > MAX_NOTE_LENGTH {
            return Err(ServerError::ValidationError(format!(
                "reconciliation note must be 1 to {MAX_NOTE_LENGTH} characters"
            )));
        }
        let reconciled = match update.reconciled.as_str() {
            "true" => true,
            "false" => false,
            other => {
                return Err(ServerError::ValidationError(format!(
                    "invalid reconciled flag '{other}': expected true or false"
                )));
            }
        };

        instrumented(self, "update", &[key, &id], || {
            let transaction = self.archivist.find_transaction(key, id)?.ok_or_else(|| {
                ServerError::ValidationError(format!(
                    "transaction '{id}' is not booked on account '{key}'"
                ))
            })?;
            let saved = self
                .archivist
                .save_reconciled(key, ReconciledTransaction::new(&transaction, reconciled, note))?;
            info!(%key, %id, reconciled, log_token = %context.log_token(), "Stored reconciliation");

            Ok(self
                .settings
                .respond_with(context, saved, |saved: &ReconciledTransaction| {
                    ReconciledTransactionRepresentation::new(key, saved)
                })
                .concept("reconciledtransaction")
                .version("1")
                .max_age(60)
                .location(reconciled_transaction_path(key, id))
                .build(&Preconditions::none())?)
        })
    }

    fn list_v1(
        &self,
        context: &RequestContext,
        (key, query): &(AccountKey, ListQuery),
        grammar: MediaTypeGrammar,
    ) -> ServerResult<Response> {
        let reconciled = self.archivist.list_reconciled(key, query)?;
        Ok(self
            .settings
            .respond_with(context, reconciled, |reconciled: &Vec<ReconciledTransaction>| {
                ReconciledTransactionsRepresentation::new(key, reconciled)
            })
            .concept("reconciledtransactions")
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
        let reconciled = self.archivist.get_reconciled(key, *id)?;
        Ok(self
            .settings
            .respond_with(context, reconciled, |reconciled: &ReconciledTransaction| {
                ReconciledTransactionRepresentation::new(key, reconciled)
            })
            .concept("reconciledtransaction")
            .version("1")
            .grammar(grammar)
            .max_age(ONE_DAY)
            .build(context.preconditions())?)
    }
}
