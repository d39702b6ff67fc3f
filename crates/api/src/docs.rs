// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! `OpenAPI` document assembled from the handler annotations, served as JSON
//! and through a Swagger UI page

use std::sync::LazyLock;

use axum::{Json, response::Html};
use utoipa::OpenApi;

use crate::{
    config::Environment,
    representations::{
        AccountLinks, AccountRepresentation, AccountUpdate, AccountsRepresentation,
        CustomerRepresentation, CustomerUpdate, CustomersRepresentation, EmbeddedAccounts,
        EmbeddedCustomers, EmbeddedEvents, EmbeddedReconciledTransactions, EmbeddedTransactions,
        EventLinks, EventRepresentation, EventsMetadataLinks, EventsMetadataRepresentation,
        EventsRepresentation, Link, ReconciledTransactionLinks,
        ReconciledTransactionRepresentation, ReconciledTransactionUpdate,
        ReconciledTransactionsRepresentation, SelfLinks, TransactionRepresentation,
        TransactionUpdate, TransactionsRepresentation,
    },
    routes::handlers,
    state::{HealthCheck, HealthStatus},
};

/// API documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Bank API",
        description = "Versioned, cache-aware HAL resources for customers, accounts, transactions and their event feeds. \
            Representations are selected by exact `Accept` value; unsupported values are answered with 415."
    ),
    paths(
        handlers::health_handler,
        handlers::list_customers,
        handlers::get_customer,
        handlers::put_customer,
        handlers::list_accounts,
        handlers::get_account,
        handlers::put_account,
        handlers::list_transactions,
        handlers::get_transaction,
        handlers::put_transaction,
        handlers::list_reconciled_transactions,
        handlers::get_reconciled_transaction,
        handlers::put_reconciled_transaction,
        handlers::list_customer_events,
        handlers::list_customer_category_events,
        handlers::get_customer_event,
        handlers::customer_events_metadata,
        handlers::list_account_events,
        handlers::list_account_category_events,
        handlers::get_account_event,
        handlers::account_events_metadata,
    ),
    components(schemas(
        HealthCheck,
        HealthStatus,
        Environment,
        Link,
        SelfLinks,
        AccountLinks,
        CustomerRepresentation,
        CustomersRepresentation,
        EmbeddedCustomers,
        AccountRepresentation,
        AccountsRepresentation,
        EmbeddedAccounts,
        TransactionRepresentation,
        TransactionsRepresentation,
        EmbeddedTransactions,
        ReconciledTransactionLinks,
        ReconciledTransactionRepresentation,
        ReconciledTransactionsRepresentation,
        EmbeddedReconciledTransactions,
        EventLinks,
        EventRepresentation,
        EventsRepresentation,
        EmbeddedEvents,
        EventsMetadataLinks,
        EventsMetadataRepresentation,
        CustomerUpdate,
        AccountUpdate,
        TransactionUpdate,
        ReconciledTransactionUpdate,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "customers", description = "Customer resource"),
        (name = "accounts", description = "Account resource"),
        (name = "transactions", description = "Transactions of an account"),
        (name = "reconciled-transactions", description = "Reconciliation state of transactions"),
        (name = "events", description = "Customer and account event feeds")
    )
)]
pub struct ApiDoc;

const SWAGGER_UI_VERSION: &str = "5.17.14";

static SWAGGER_UI_PAGE: LazyLock<String> = LazyLock::new(|| {
    let assets = format!("https://unpkg.com/swagger-ui-dist@{SWAGGER_UI_VERSION}");
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Bank API Documentation</title>
    <link rel="stylesheet" href="{assets}/swagger-ui.css" />
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="{assets}/swagger-ui-bundle.js"></script>
    <script>
        window.onload = () => SwaggerUIBundle({{
            url: '/api-doc/openapi.json',
            dom_id: '#swagger-ui',
            deepLinking: true,
            displayRequestDuration: true,
            showExtensions: true
        }});
    </script>
</body>
</html>
"#
    )
});

/// `OpenAPI` document endpoint
pub async fn openapi_spec() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Swagger UI page rendering [`openapi_spec`]
pub async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI_PAGE.as_str())
}
