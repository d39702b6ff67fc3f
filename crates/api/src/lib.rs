// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Bank API Server Implementation
//!
//! This crate provides the HTTP server for the bank API: customers, accounts and
//! their transactions served as versioned HAL+JSON representations. Every
//! resource negotiates its representation from the `Accept` header, answers
//! conditional requests with `304 Not Modified` and instruments its work.
//!
//! # Module Structure
//!
//! - [`config`]: Server configuration and environment management with hierarchical loading
//! - [`error`]: Error types and HTTP response handling with proper status codes
//! - [`state`]: Shared application state, resources and health checks
//! - [`server`]: Main server implementation, lifecycle, and coordinated shutdown
//! - [`routes`]: Route configuration and HTTP request handlers
//! - [`resources`]: Per-resource dispatch tables and producers
//! - [`representations`]: HAL+JSON bodies and request bodies
//! - [`extractors`]: Request context and body extraction
//! - [`metrics`]: Prometheus counters and histograms
//! - [`docs`]: `OpenAPI` document and Swagger UI endpoints

pub mod config;
pub mod docs;
pub mod error;
pub mod extractors;
pub mod metrics;
pub mod representations;
pub mod resources;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{Environment, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{Server, ShutdownConfig};
pub use state::{HealthCheck, ServerState};
