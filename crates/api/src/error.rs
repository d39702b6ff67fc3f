// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error handling module
//!
//! This module provides the server error type, its mapping to HTTP
//! responses and conversions from the archivist and key parsing errors.

use std::net::SocketAddr;

use archivist::ArchivistError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pipeline::PipelineError;
use shared_types::KeyError;
use thiserror::Error;
use tracing::error;

/// Comprehensive error types for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration validation errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Network binding errors
    #[error("Failed to bind to {address}: {source}")]
    Bind {
        /// Socket address that failed to bind
        address: SocketAddr,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server startup errors
    #[error("Server startup failed: {source}")]
    Startup {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Server shutdown errors
    #[error("Server shutdown failed: {source}")]
    Shutdown {
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Runtime errors during server operation
    #[error("Runtime error: {message}")]
    Runtime {
        /// Error message
        message: String,
    },

    /// Task join errors for async operations
    #[error("Task join error: {source}")]
    TaskJoin {
        /// Underlying tokio join error
        #[source]
        source: tokio::task::JoinError,
    },

    /// Signal handling errors
    #[error("Signal handling error: {message}")]
    Signal {
        /// Error message
        message: String,
    },

    /// Input validation errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// JSON parsing errors with detailed context
    #[error("Invalid JSON request: {message}")]
    JsonError {
        /// Detailed error message
        message: String,
    },

    /// The addressed record does not exist
    #[error("Not found: {message}")]
    NotFound {
        /// Error message
        message: String,
    },

    /// The addressed record exists and may not change
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message
        message: String,
    },

    /// A storage collaborator could not serve the request
    #[error("Service unavailable: {message}")]
    Unavailable {
        /// Error message
        message: String,
    },

    /// Response assembly failed
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Get the appropriate HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Config { .. }
            | Self::Bind { .. }
            | Self::Startup { .. }
            | Self::Shutdown { .. }
            | Self::Runtime { .. }
            | Self::TaskJoin { .. }
            | Self::Signal { .. }
            | Self::Pipeline(..) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError(..) | Self::JsonError { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        }

        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16()
        }));
        (status, body).into_response()
    }
}

/// Convenient From implementations for common async error types
impl From<tokio::task::JoinError> for ServerError {
    fn from(source: tokio::task::JoinError) -> Self {
        Self::TaskJoin { source }
    }
}

impl From<ArchivistError> for ServerError {
    fn from(error: ArchivistError) -> Self {
        match error {
            ArchivistError::NotFound { .. } => Self::NotFound {
                message: error.to_string(),
            },
            ArchivistError::Conflict { .. } => Self::Conflict {
                message: error.to_string(),
            },
            ArchivistError::Unavailable { message } => Self::Unavailable { message },
        }
    }
}

impl From<KeyError> for ServerError {
    fn from(error: KeyError) -> Self {
        Self::ValidationError(error.to_string())
    }
}
