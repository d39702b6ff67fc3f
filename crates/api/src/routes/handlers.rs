// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! HTTP request handlers module
//!
//! Handlers parse path keys and hand over to the resources. All resource
//! work is synchronous; handlers never hold an instrumented scope across an
//! `.await`.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use archivist::EventFeed;
use shared_types::{AccountKey, CustomerNumber};
use uuid::Uuid;

use crate::{
    error::{ServerError, ServerResult},
    extractors::{EventParams, JsonExtractor, ListParams, RequestContext},
    representations::{
        AccountUpdate, CustomerUpdate, ReconciledTransactionUpdate, TransactionUpdate,
    },
    state::{HealthCheck, ServerState},
};

fn parse_id(kind: &str, id: &str) -> ServerResult<Uuid> {
    Uuid::parse_str(id)
        .map_err(|e| ServerError::ValidationError(format!("invalid {kind} id '{id}': {e}")))
}

/// Health check endpoint handler
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    summary = "Health check endpoint",
    description = "Returns the current health status of the API service including version, environment information, and the status of each archivist.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthCheck),
        (status = 503, description = "Service unavailable", body = String)
    )
)]
pub async fn health_handler(
    State(state): State<ServerState>,
) -> Result<impl IntoResponse, ServerError> {
    let health = state.health_check()?;
    Ok(Json(health))
}

/// List customers
///
/// # Errors
///
/// Returns `ServerError` if the archivist or the response pipeline fails
#[utoipa::path(
    get,
    path = "/customers",
    tag = "customers",
    summary = "List customers",
    description = "Accepts `application/hal+json`, `application/hal+json;concept=customers;v=1` or `application/hal+json+customers+v1`. Any other Accept value is answered with 415.",
    params(ListParams),
    responses(
        (status = 200, description = "Customer list", body = crate::representations::CustomersRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn list_customers(
    State(state): State<ServerState>,
    context: RequestContext,
    Query(params): Query<ListParams>,
) -> ServerResult<Response> {
    state.customers().list(&context, &params.into())
}

/// Get a customer
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for a malformed number and
/// `ServerError::NotFound` for an unknown one
#[utoipa::path(
    get,
    path = "/customers/{number}",
    tag = "customers",
    summary = "Get a customer",
    description = "Version 2 is served for bare `application/hal+json`. Versions are selected with `application/hal+json;concept=customer;v=1|2` or `application/hal+json+customer+v1|v2`.",
    params(("number" = String, Path, description = "Ten-digit customer number", example = "0123456789")),
    responses(
        (status = 200, description = "Customer", body = crate::representations::CustomerRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 400, description = "Malformed customer number", body = String),
        (status = 404, description = "Unknown customer", body = String),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn get_customer(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(number): Path<String>,
) -> ServerResult<Response> {
    let number: CustomerNumber = number.parse()?;
    state.customers().get(&context, &number)
}

/// Create or update a customer
///
/// # Errors
///
/// Returns `ServerError::ValidationError` if the body does not match the path
#[utoipa::path(
    put,
    path = "/customers/{number}",
    tag = "customers",
    summary = "Create or update a customer",
    params(("number" = String, Path, description = "Ten-digit customer number", example = "0123456789")),
    request_body = CustomerUpdate,
    responses(
        (status = 200, description = "Customer updated", body = crate::representations::CustomerRepresentation),
        (status = 201, description = "Customer created", body = crate::representations::CustomerRepresentation),
        (status = 400, description = "Invalid body or number mismatch", body = String)
    )
)]
pub async fn put_customer(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(number): Path<String>,
    JsonExtractor(update): JsonExtractor<CustomerUpdate>,
) -> ServerResult<Response> {
    let number: CustomerNumber = number.parse()?;
    state.customers().create_or_update(&context, &number, update)
}

/// List accounts
///
/// # Errors
///
/// Returns `ServerError` if the archivist or the response pipeline fails
#[utoipa::path(
    get,
    path = "/accounts",
    tag = "accounts",
    summary = "Account overview",
    description = "Accepts `application/hal+json`, `application/hal+json;concept=accountoverview;v=1` or `application/hal+json+accountoverview+v1`.",
    params(ListParams),
    responses(
        (status = 200, description = "Account overview", body = crate::representations::AccountsRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn list_accounts(
    State(state): State<ServerState>,
    context: RequestContext,
    Query(params): Query<ListParams>,
) -> ServerResult<Response> {
    state.accounts().list(&context, &params.into())
}

/// Get an account
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for a malformed key and
/// `ServerError::NotFound` for an unknown one
#[utoipa::path(
    get,
    path = "/accounts/{account}",
    tag = "accounts",
    summary = "Get an account",
    description = "Version 1 is sparse, version 2 embeds the transactions and is served for bare `application/hal+json`.",
    params(("account" = String, Path, description = "Registration and account number", example = "5479-1234567")),
    responses(
        (status = 200, description = "Account", body = crate::representations::AccountRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 400, description = "Malformed account key", body = String),
        (status = 404, description = "Unknown account", body = String),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn get_account(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(account): Path<String>,
) -> ServerResult<Response> {
    let key: AccountKey = account.parse()?;
    state.accounts().get(&context, &key)
}

/// Create or rename an account
///
/// # Errors
///
/// Returns `ServerError::ValidationError` if the body does not match the path
#[utoipa::path(
    put,
    path = "/accounts/{account}",
    tag = "accounts",
    summary = "Create or rename an account",
    params(("account" = String, Path, description = "Registration and account number", example = "5479-1234567")),
    request_body = AccountUpdate,
    responses(
        (status = 200, description = "Account renamed", body = crate::representations::AccountRepresentation),
        (status = 201, description = "Account created", body = crate::representations::AccountRepresentation),
        (status = 400, description = "Invalid body or key mismatch", body = String)
    )
)]
pub async fn put_account(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(account): Path<String>,
    JsonExtractor(update): JsonExtractor<AccountUpdate>,
) -> ServerResult<Response> {
    let key: AccountKey = account.parse()?;
    state.accounts().create_or_update(&context, &key, update)
}

/// List the transactions of an account
///
/// # Errors
///
/// Returns `ServerError::NotFound` if the account does not exist
#[utoipa::path(
    get,
    path = "/accounts/{account}/transactions",
    tag = "transactions",
    summary = "List transactions",
    description = "Transactions keep booking order unless `sort` orders them by amount. Accepts `application/hal+json`, `application/hal+json;concept=transactionoverview;v=1` or `application/hal+json+transactionoverview+v1`.",
    params(
        ("account" = String, Path, description = "Registration and account number", example = "5479-1234567"),
        ListParams
    ),
    responses(
        (status = 200, description = "Transactions", body = crate::representations::TransactionsRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 404, description = "Unknown account", body = String),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn list_transactions(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(account): Path<String>,
    Query(params): Query<ListParams>,
) -> ServerResult<Response> {
    let key: AccountKey = account.parse()?;
    state.transactions().list(&context, key, params.into())
}

/// Get a transaction
///
/// # Errors
///
/// Returns `ServerError::NotFound` if the account or the transaction does not
/// exist
#[utoipa::path(
    get,
    path = "/accounts/{account}/transactions/{id}",
    tag = "transactions",
    summary = "Get a transaction",
    description = "Transactions are immutable and cached for a week.",
    params(
        ("account" = String, Path, description = "Registration and account number", example = "5479-1234567"),
        ("id" = String, Path, description = "Transaction id")
    ),
    responses(
        (status = 200, description = "Transaction", body = crate::representations::TransactionRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 400, description = "Malformed key or id", body = String),
        (status = 404, description = "Unknown account or transaction", body = String),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn get_transaction(
    State(state): State<ServerState>,
    context: RequestContext,
    Path((account, id)): Path<(String, String)>,
) -> ServerResult<Response> {
    let key: AccountKey = account.parse()?;
    let id = parse_id("transaction", &id)?;
    state.transactions().get(&context, key, id)
}

/// Book a transaction
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for a malformed body,
/// `ServerError::NotFound` for an unknown account and `ServerError::Conflict`
/// if the id is already booked
#[utoipa::path(
    put,
    path = "/accounts/{account}/transactions/{id}",
    tag = "transactions",
    summary = "Book a transaction",
    description = "Transactions are immutable: an id can be booked once. Amounts have up to 9 digits and an optional 2 digit fraction.",
    params(
        ("account" = String, Path, description = "Registration and account number", example = "5479-1234567"),
        ("id" = String, Path, description = "Transaction id")
    ),
    request_body = TransactionUpdate,
    responses(
        (status = 201, description = "Transaction booked", body = crate::representations::TransactionRepresentation),
        (status = 400, description = "Invalid body, key or id", body = String),
        (status = 404, description = "Unknown account", body = String),
        (status = 409, description = "Transaction already booked", body = String)
    )
)]
pub async fn put_transaction(
    State(state): State<ServerState>,
    context: RequestContext,
    Path((account, id)): Path<(String, String)>,
    JsonExtractor(update): JsonExtractor<TransactionUpdate>,
) -> ServerResult<Response> {
    let key: AccountKey = account.parse()?;
    let id = parse_id("transaction", &id)?;
    state.transactions().create(&context, &key, id, &update)
}

/// List the reconciliation states of an account
///
/// # Errors
///
/// Returns `ServerError::NotFound` if the account does not exist
#[utoipa::path(
    get,
    path = "/accounts/{account}/reconciled-transactions",
    tag = "reconciled-transactions",
    summary = "List reconciled transactions",
    description = "Accepts `application/hal+json`, `application/hal+json;concept=reconciledtransactions;v=1` or `application/hal+json+reconciledtransactions+v1`.",
    params(
        ("account" = String, Path, description = "Registration and account number", example = "5479-1234567"),
        ListParams
    ),
    responses(
        (status = 200, description = "Reconciliation states", body = crate::representations::ReconciledTransactionsRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 404, description = "Unknown account", body = String),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn list_reconciled_transactions(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(account): Path<String>,
    Query(params): Query<ListParams>,
) -> ServerResult<Response> {
    let key: AccountKey = account.parse()?;
    state
        .reconciled_transactions()
        .list(&context, key, params.into())
}

/// Get the reconciliation state of a transaction
///
/// # Errors
///
/// Returns `ServerError::NotFound` if the transaction was never reconciled
#[utoipa::path(
    get,
    path = "/accounts/{account}/reconciled-transactions/{id}",
    tag = "reconciled-transactions",
    summary = "Get a reconciled transaction",
    params(
        ("account" = String, Path, description = "Registration and account number", example = "5479-1234567"),
        ("id" = String, Path, description = "Transaction id")
    ),
    responses(
        (status = 200, description = "Reconciliation state", body = crate::representations::ReconciledTransactionRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 400, description = "Malformed key or id", body = String),
        (status = 404, description = "Transaction was never reconciled", body = String),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn get_reconciled_transaction(
    State(state): State<ServerState>,
    context: RequestContext,
    Path((account, id)): Path<(String, String)>,
) -> ServerResult<Response> {
    let key: AccountKey = account.parse()?;
    let id = parse_id("transaction", &id)?;
    state.reconciled_transactions().get(&context, key, id)
}

/// Reconcile a transaction
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for a malformed body or a
/// transaction that is not booked on the account
#[utoipa::path(
    put,
    path = "/accounts/{account}/reconciled-transactions/{id}",
    tag = "reconciled-transactions",
    summary = "Reconcile a transaction",
    params(
        ("account" = String, Path, description = "Registration and account number", example = "5479-1234567"),
        ("id" = String, Path, description = "Transaction id")
    ),
    request_body = ReconciledTransactionUpdate,
    responses(
        (status = 200, description = "Reconciliation stored", body = crate::representations::ReconciledTransactionRepresentation),
        (status = 400, description = "Invalid body or unknown transaction", body = String)
    )
)]
pub async fn put_reconciled_transaction(
    State(state): State<ServerState>,
    context: RequestContext,
    Path((account, id)): Path<(String, String)>,
    JsonExtractor(update): JsonExtractor<ReconciledTransactionUpdate>,
) -> ServerResult<Response> {
    let key: AccountKey = account.parse()?;
    let id = parse_id("transaction", &id)?;
    state
        .reconciled_transactions()
        .update(&context, &key, id, &update)
}

fn list_events(
    state: &ServerState,
    feed: EventFeed,
    context: &RequestContext,
    params: &EventParams,
) -> ServerResult<Response> {
    state.events(feed).list(context, params.interval()?)
}

fn list_category_events(
    state: &ServerState,
    feed: EventFeed,
    context: &RequestContext,
    category: String,
    params: &EventParams,
) -> ServerResult<Response> {
    state
        .events(feed)
        .list_category(context, category, params.interval()?)
}

fn get_event(
    state: &ServerState,
    feed: EventFeed,
    context: &RequestContext,
    (category, id): (String, String),
) -> ServerResult<Response> {
    let id = parse_id("event", &id)?;
    state.events(feed).get(context, category, id)
}

/// List the customer event feed
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for a malformed interval
#[utoipa::path(
    get,
    path = "/customer-events",
    tag = "events",
    summary = "Customer events",
    description = "Accepts `application/hal+json`, `application/hal+json;concept=events;v=1` or `application/hal+json+events+v1`.",
    params(EventParams),
    responses(
        (status = 200, description = "Events in sequence order", body = crate::representations::EventsRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 400, description = "Malformed interval", body = String),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn list_customer_events(
    State(state): State<ServerState>,
    context: RequestContext,
    Query(params): Query<EventParams>,
) -> ServerResult<Response> {
    list_events(&state, EventFeed::Customer, &context, &params)
}

/// List the customer events of one category
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for a malformed interval
#[utoipa::path(
    get,
    path = "/customer-events/{category}",
    tag = "events",
    summary = "Customer events of a category",
    description = "Categories are customer numbers. Accepts `application/hal+json`, `application/hal+json;concept=eventcategory;v=1` or `application/hal+json+eventcategory+v1`.",
    params(
        ("category" = String, Path, description = "Event category", example = "0123456789"),
        EventParams
    ),
    responses(
        (status = 200, description = "Events in sequence order", body = crate::representations::EventsRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 400, description = "Malformed interval", body = String),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn list_customer_category_events(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(category): Path<String>,
    Query(params): Query<EventParams>,
) -> ServerResult<Response> {
    list_category_events(&state, EventFeed::Customer, &context, category, &params)
}

/// Get a customer event
///
/// # Errors
///
/// Returns `ServerError::NotFound` if the category holds no event with the id
#[utoipa::path(
    get,
    path = "/customer-events/{category}/{id}",
    tag = "events",
    summary = "Get a customer event",
    params(
        ("category" = String, Path, description = "Event category", example = "0123456789"),
        ("id" = String, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Event", body = crate::representations::EventRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 400, description = "Malformed id", body = String),
        (status = 404, description = "Unknown event", body = String),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn get_customer_event(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(path): Path<(String, String)>,
) -> ServerResult<Response> {
    get_event(&state, EventFeed::Customer, &context, path)
}

/// Describe the customer event feed
///
/// # Errors
///
/// Returns `ServerError::Pipeline` if the response cannot be assembled
#[utoipa::path(
    get,
    path = "/customer-events-metadata",
    tag = "events",
    summary = "Customer event feed metadata",
    description = "Accepts `application/hal+json`, `application/hal+json;concept=metadata;v=1` or `application/hal+json+metadata+v1`.",
    responses(
        (status = 200, description = "Feed metadata", body = crate::representations::EventsMetadataRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn customer_events_metadata(
    State(state): State<ServerState>,
    context: RequestContext,
) -> ServerResult<Response> {
    state.events(EventFeed::Customer).metadata(&context)
}

/// List the account event feed
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for a malformed interval
#[utoipa::path(
    get,
    path = "/account-events",
    tag = "events",
    summary = "Account events",
    description = "Accepts `application/hal+json`, `application/hal+json;concept=events;v=1` or `application/hal+json+events+v1`.",
    params(EventParams),
    responses(
        (status = 200, description = "Events in sequence order", body = crate::representations::EventsRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 400, description = "Malformed interval", body = String),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn list_account_events(
    State(state): State<ServerState>,
    context: RequestContext,
    Query(params): Query<EventParams>,
) -> ServerResult<Response> {
    list_events(&state, EventFeed::Account, &context, &params)
}

/// List the account events of one category
///
/// # Errors
///
/// Returns `ServerError::ValidationError` for a malformed interval
#[utoipa::path(
    get,
    path = "/account-events/{category}",
    tag = "events",
    summary = "Account events of a category",
    description = "Categories are `<account no>-<reg no>`. Accepts `application/hal+json`, `application/hal+json;concept=eventcategory;v=1` or `application/hal+json+eventcategory+v1`.",
    params(
        ("category" = String, Path, description = "Event category", example = "1234567-5479"),
        EventParams
    ),
    responses(
        (status = 200, description = "Events in sequence order", body = crate::representations::EventsRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 400, description = "Malformed interval", body = String),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn list_account_category_events(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(category): Path<String>,
    Query(params): Query<EventParams>,
) -> ServerResult<Response> {
    list_category_events(&state, EventFeed::Account, &context, category, &params)
}

/// Get an account event
///
/// # Errors
///
/// Returns `ServerError::NotFound` if the category holds no event with the id
#[utoipa::path(
    get,
    path = "/account-events/{category}/{id}",
    tag = "events",
    summary = "Get an account event",
    params(
        ("category" = String, Path, description = "Event category", example = "1234567-5479"),
        ("id" = String, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Event", body = crate::representations::EventRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 400, description = "Malformed id", body = String),
        (status = 404, description = "Unknown event", body = String),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn get_account_event(
    State(state): State<ServerState>,
    context: RequestContext,
    Path(path): Path<(String, String)>,
) -> ServerResult<Response> {
    get_event(&state, EventFeed::Account, &context, path)
}

/// Describe the account event feed
///
/// # Errors
///
/// Returns `ServerError::Pipeline` if the response cannot be assembled
#[utoipa::path(
    get,
    path = "/account-events-metadata",
    tag = "events",
    summary = "Account event feed metadata",
    description = "Accepts `application/hal+json`, `application/hal+json;concept=metadata;v=1` or `application/hal+json+metadata+v1`.",
    responses(
        (status = 200, description = "Feed metadata", body = crate::representations::EventsMetadataRepresentation),
        (status = 304, description = "Client copy is current"),
        (status = 415, description = "Accept value is not supported")
    )
)]
pub async fn account_events_metadata(
    State(state): State<ServerState>,
    context: RequestContext,
) -> ServerResult<Response> {
    state.events(EventFeed::Account).metadata(&context)
}
