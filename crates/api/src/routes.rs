// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Routes module
//!
//! This module provides route configuration for the bank API server.

pub mod handlers;

use axum::{Router, routing::get};
use handlers::{
    account_events_metadata, customer_events_metadata, get_account, get_account_event,
    get_customer, get_customer_event, get_reconciled_transaction, get_transaction, health_handler,
    list_account_category_events, list_account_events, list_accounts,
    list_customer_category_events, list_customer_events, list_customers,
    list_reconciled_transactions, list_transactions, put_account, put_customer,
    put_reconciled_transaction, put_transaction,
};

use crate::{
    docs::{openapi_spec, swagger_ui},
    metrics::metrics_handler,
    state::ServerState,
};

/// Create application routes
pub fn create_routes() -> Router<ServerState> {
    let ops_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    let docs_routes = Router::new()
        .route("/api-doc/openapi.json", get(openapi_spec))
        .route("/swagger-ui", get(swagger_ui));

    let customer_routes = Router::new()
        .route("/customers", get(list_customers))
        .route("/customers/{number}", get(get_customer).put(put_customer));

    let account_routes = Router::new()
        .route("/accounts", get(list_accounts))
        .route("/accounts/{account}", get(get_account).put(put_account))
        .route("/accounts/{account}/transactions", get(list_transactions))
        .route(
            "/accounts/{account}/transactions/{id}",
            get(get_transaction).put(put_transaction),
        )
        .route(
            "/accounts/{account}/reconciled-transactions",
            get(list_reconciled_transactions),
        )
        .route(
            "/accounts/{account}/reconciled-transactions/{id}",
            get(get_reconciled_transaction).put(put_reconciled_transaction),
        );

    let event_routes = Router::new()
        .route("/customer-events", get(list_customer_events))
        .route("/customer-events/{category}", get(list_customer_category_events))
        .route("/customer-events/{category}/{id}", get(get_customer_event))
        .route("/customer-events-metadata", get(customer_events_metadata))
        .route("/account-events", get(list_account_events))
        .route("/account-events/{category}", get(list_account_category_events))
        .route("/account-events/{category}/{id}", get(get_account_event))
        .route("/account-events-metadata", get(account_events_metadata));

    Router::new()
        .merge(ops_routes)
        .merge(docs_routes)
        .merge(customer_routes)
        .merge(account_routes)
        .merge(event_routes)
}
