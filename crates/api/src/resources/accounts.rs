// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Account resource
//!
//! Version 1 of an account is sparse and links to its transactions;
//! version 2 embeds them.

use std::sync::Arc;

use archivist::{AccountArchivist, ListQuery};
use axum::response::Response;
use pipeline::{MediaTypeGrammar, PipelineResult, Preconditions};
use shared_types::{Account, AccountKey};
use tracing::info;

use super::{ProducerTable, Producers, Resource, ResourceSettings, instrumented, negotiate, record};
use crate::{
    error::{ServerError, ServerResult},
    extractors::RequestContext,
    representations::{AccountRepresentation, AccountUpdate, AccountsRepresentation, account_path},
};

const MAX_NAME_LENGTH: usize = 40;

/// Accounts, listed as an overview and addressed by `<reg_no>-<account_no>`
#[derive(Debug)]
pub struct AccountResource {
    archivist: Arc<dyn AccountArchivist>,
    settings: ResourceSettings,
    list_producers: Producers<Self, ListQuery>,
    item_producers: Producers<Self, AccountKey>,
}

impl Resource for AccountResource {
    const NAME: &'static str = "AccountResource";

    fn settings(&self) -> &ResourceSettings {
        &self.settings
    }
}

impl AccountResource {
    /// Create the resource and its dispatch tables
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` if a media type cannot be encoded or is
    /// registered twice.
    pub fn new(archivist: Arc<dyn AccountArchivist>, settings: ResourceSettings) -> PipelineResult<Self> {
        let list_producers = ProducerTable::<Self, ListQuery>::new()
            .default_type("overview_v1", Self::overview_v1)
            .version("accountoverview", "1", "overview_v1", Self::overview_v1)?
            .build()?;
        let item_producers = ProducerTable::<Self, AccountKey>::new()
            .default_type("get_v2", Self::get_v2)
            .version("account", "1", "get_v1", Self::get_v1)?
            .version("account", "2", "get_v2", Self::get_v2)?
            .build()?;

        Ok(Self {
            archivist,
            settings,
            list_producers,
            item_producers,
        })
    }

    /// List accounts in the representation negotiated from `Accept`
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the archivist or the response pipeline fails
    pub fn list(&self, context: &RequestContext, query: &ListQuery) -> ServerResult<Response> {
        negotiate(
            self,
            &self.list_producers,
            context,
            query,
            &[&query.offset, &query.effective_limit()],
        )
    }

    /// Get an account in the representation negotiated from `Accept`
    ///
    /// # Errors
    ///
    /// Returns `ServerError::NotFound` if the account does not exist
    pub fn get(&self, context: &RequestContext, key: &AccountKey) -> ServerResult<Response> {
        negotiate(self, &self.item_producers, context, key, &[key])
    }

    /// Create the account at `key` or rename it
    ///
    /// Bookings of an existing account are kept.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::ValidationError` if the body's key differs from
    /// the path or the name is blank or too long.
    pub fn create_or_update(
        &self,
        context: &RequestContext,
        key: &AccountKey,
        update: AccountUpdate,
    ) -> ServerResult<Response> {
        let result = self.store(context, key, update);
        record(Self::NAME, &result);
        result
    }

    /// Media types served by the item endpoint
    pub fn item_media_types(&self) -> Vec<&str> {
        self.item_producers.media_types()
    }

    fn store(
        &self,
        context: &RequestContext,
        key: &AccountKey,
        update: AccountUpdate,
    ) -> ServerResult<Response> {
        if update.reg_no != key.reg_no() || update.account_no != key.account_no() {
            return Err(ServerError::ValidationError(format!(
                "account '{}-{}' in body does not match '{key}' in path",
                update.reg_no, update.account_no
            )));
        }
        let name = update.name.trim();
        if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
            return Err(ServerError::ValidationError(format!(
                "account name must be 1 to {MAX_NAME_LENGTH} characters"
            )));
        }

        instrumented(self, "create_or_update", &[key], || {
            let (account, created) = match self.archivist.find_account(key)? {
                Some(mut existing) => {
                    existing.name = name.to_string();
                    (existing, false)
                }
                None => (Account::new(key.clone(), name), true),
            };
            let saved = self.archivist.save_account(account)?;
            info!(%key, created, log_token = %context.log_token(), "Stored account");

            let location = account_path(key);
            let builder = self
                .settings
                .respond_with(context, saved, AccountRepresentation::full)
                .concept("account")
                .version("2")
                .max_age(30);
            let builder = if created {
                builder.created(location)
            } else {
                builder.location(location)
            };
            Ok(builder.build(&Preconditions::none())?)
        })
    }

    fn overview_v1(
        &self,
        context: &RequestContext,
        query: &ListQuery,
        grammar: MediaTypeGrammar,
    ) -> ServerResult<Response> {
        let accounts = self.archivist.list_accounts(query)?;
        Ok(self
            .settings
            .respond_with(context, accounts, |accounts: &Vec<Account>| {
                AccountsRepresentation::new(accounts)
            })
            .concept("accountoverview")
            .version("1")
            .grammar(grammar)
            .max_age(10)
            .build(context.preconditions())?)
    }

    fn get_v1(
        &self,
        context: &RequestContext,
        key: &AccountKey,
        grammar: MediaTypeGrammar,
    ) -> ServerResult<Response> {
        let account = self.archivist.get_account(key)?;
        Ok(self
            .settings
            .respond_with(context, account, AccountRepresentation::sparse)
            .concept("account")
            .version("1")
            .grammar(grammar)
            .max_age(120)
            .build(context.preconditions())?)
    }

    fn get_v2(
        &self,
        context: &RequestContext,
        key: &AccountKey,
        grammar: MediaTypeGrammar,
    ) -> ServerResult<Response> {
        let account = self.archivist.get_account(key)?;
        Ok(self
            .settings
            .respond_with(context, account, AccountRepresentation::full)
            .concept("account")
            .version("2")
            .grammar(grammar)
            .max_age(60)
            .build(context.preconditions())?)
    }
}
