// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Test fixtures for end-to-end testing
//!
//! Every test starts its own server on an OS-assigned port, backed by the
//! seeded in-memory archivist.

use std::net::SocketAddr;

use api::{Server, ServerConfig, ShutdownConfig};
use tokio_util::sync::CancellationToken;

/// Customer present in the seed data
pub const SEEDED_CUSTOMER: &str = "0123456789";

/// Account present in the seed data, holding three transactions
pub const SEEDED_ACCOUNT: &str = "5479-1234567";

/// Start a seeded server and return its address
pub async fn start_server() -> (SocketAddr, CancellationToken) {
    Server::new(ServerConfig::for_testing(), ShutdownConfig::default())
        .expect("Failed to create server")
        .run_for_testing()
        .await
        .expect("Failed to start test server")
}

/// Send a GET request with the given `Accept` value
pub async fn get(addr: SocketAddr, path: &str, accept: &str) -> reqwest::Response {
    reqwest::Client::new()
        .get(format!("http://{addr}{path}"))
        .header(reqwest::header::ACCEPT, accept)
        .send()
        .await
        .expect("Failed to send request")
}
