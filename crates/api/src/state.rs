// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Server state management module
//!
//! This module provides shared application state for the bank API server,
//! including configuration, the resources and coordinated cancellation.

use std::{collections::HashMap, sync::Arc};

use archivist::{
    AccountArchivist, ArchivistError, CustomerArchivist, EventArchivist, EventFeed, ListQuery,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use utoipa::ToSchema;

use crate::{
    config::{Environment, ServerConfig},
    error::ServerResult,
    resources::{
        AccountResource, CustomerResource, EventResource, ReconciledTransactionResource,
        ResourceSettings, TransactionResource,
    },
};

/// Shared application state with cancellation token support
#[derive(Debug, Clone)]
pub struct ServerState {
    /// Server configuration
    config: ServerConfig,
    customer_archivist: Arc<dyn CustomerArchivist>,
    account_archivist: Arc<dyn AccountArchivist>,
    event_archivist: Arc<dyn EventArchivist>,
    customers: Arc<CustomerResource>,
    accounts: Arc<AccountResource>,
    transactions: Arc<TransactionResource>,
    reconciled_transactions: Arc<ReconciledTransactionResource>,
    customer_events: Arc<EventResource>,
    account_events: Arc<EventResource>,
    /// Cancellation token for coordinated shutdown
    pub cancellation_token: CancellationToken,
}

impl ServerState {
    /// Create new server state and build the resources
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `customer_archivist` - Storage of customers
    /// * `account_archivist` - Storage of accounts and transactions
    /// * `event_archivist` - Storage of the customer and account event feeds
    /// * `cancellation_token` - Token for coordinated cancellation
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Pipeline` if a resource's dispatch table cannot
    /// be built
    pub fn new(
        config: ServerConfig,
        customer_archivist: Arc<dyn CustomerArchivist>,
        account_archivist: Arc<dyn AccountArchivist>,
        event_archivist: Arc<dyn EventArchivist>,
        cancellation_token: CancellationToken,
    ) -> ServerResult<Self> {
        let settings = ResourceSettings::from_config(&config);
        let customers = CustomerResource::new(Arc::clone(&customer_archivist), settings)?;
        let accounts = AccountResource::new(Arc::clone(&account_archivist), settings)?;
        let transactions = TransactionResource::new(Arc::clone(&account_archivist), settings)?;
        let reconciled_transactions =
            ReconciledTransactionResource::new(Arc::clone(&account_archivist), settings)?;
        let customer_events =
            EventResource::new(EventFeed::Customer, Arc::clone(&event_archivist), settings)?;
        let account_events =
            EventResource::new(EventFeed::Account, Arc::clone(&event_archivist), settings)?;

        Ok(Self {
            config,
            customer_archivist,
            account_archivist,
            event_archivist,
            customers: Arc::new(customers),
            accounts: Arc::new(accounts),
            transactions: Arc::new(transactions),
            reconciled_transactions: Arc::new(reconciled_transactions),
            customer_events: Arc::new(customer_events),
            account_events: Arc::new(account_events),
            cancellation_token,
        })
    }

    /// Server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Customer resource
    pub fn customers(&self) -> &CustomerResource {
        &self.customers
    }

    /// Account resource
    pub fn accounts(&self) -> &AccountResource {
        &self.accounts
    }

    /// Transaction resource
    pub fn transactions(&self) -> &TransactionResource {
        &self.transactions
    }

    /// Reconciled transaction resource
    pub fn reconciled_transactions(&self) -> &ReconciledTransactionResource {
        &self.reconciled_transactions
    }

    /// Event resource of `feed`
    pub fn events(&self, feed: EventFeed) -> &EventResource {
        match feed {
            EventFeed::Customer => &self.customer_events,
            EventFeed::Account => &self.account_events,
        }
    }

    /// Perform health check operations
    ///
    /// Each archivist is checked with a cheap listing.
    pub fn health_check(&self) -> ServerResult<HealthCheck> {
        let first_page = ListQuery {
            limit: Some(1),
            ..ListQuery::default()
        };
        let archivists: HashMap<String, HealthStatus> = [
            (
                "customers",
                self.customer_archivist.list_customers(&first_page).map(|_| ()),
            ),
            (
                "accounts",
                self.account_archivist.list_accounts(&first_page).map(|_| ()),
            ),
            (
                "events",
                self.event_archivist
                    .list_category_events(EventFeed::Customer, "", None)
                    .map(|_| ()),
            ),
        ]
        .into_iter()
        .map(|(name, outcome)| (name.to_string(), Self::convert_health_status(outcome)))
        .collect();

        let status = if archivists.values().all(|status| *status == HealthStatus::Up) {
            HealthStatus::Up
        } else {
            HealthStatus::Degraded {
                reason: Box::from("one or more archivists are unavailable"),
            }
        };

        Ok(HealthCheck {
            status,
            version: Box::from(env!("CARGO_PKG_VERSION")),
            environment: self.config.environment,
            timestamp: chrono::Utc::now().to_rfc3339(),
            archivists,
        })
    }

    /// Convert an archivist check result to a health status
    fn convert_health_status(outcome: Result<(), ArchivistError>) -> HealthStatus {
        match outcome {
            Ok(()) => HealthStatus::Up,
            Err(error) => HealthStatus::Down {
                reason: error.to_string().into_boxed_str(),
            },
        }
    }
}

/// Health status of a service or dependency
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum HealthStatus {
    /// Service is fully operational and responding normally
    Up,

    /// Service is not operational or has critical failures
    Down {
        /// Human-readable explanation of why the service is down
        reason: Box<str>,
    },

    /// Service is operational but experiencing partial failures
    Degraded {
        /// Human-readable explanation of the degradation condition
        reason: Box<str>,
    },
}

/// Health check status
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthCheck {
    /// Service status
    pub status: HealthStatus,
    /// Service version
    pub version: Box<str>,
    /// Environment
    pub environment: Environment,
    /// Timestamp
    pub timestamp: String,
    /// Status of the individual archivists
    #[schema(value_type = Object)]
    pub archivists: HashMap<String, HealthStatus>,
}
