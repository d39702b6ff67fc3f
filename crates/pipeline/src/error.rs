// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the request-processing pipeline
//!
//! Negotiation failures and unchanged resources are ordinary outcomes (415 and
//! 304 responses) and never show up here. The errors below are configuration or
//! programming defects that must abort the response being built.

use thiserror::Error;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised while encoding a versioned media type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaTypeError {
    /// The suffixed grammar was requested without a concept name
    #[error("suffixed media type requires a concept name")]
    MissingConcept,

    /// The suffixed grammar was requested without a version label
    #[error("suffixed media type for concept '{concept}' requires a version label")]
    MissingVersion {
        /// Concept that lacked a version
        concept: String,
    },
}

/// Errors raised while building a dispatch table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// The same media type key was registered twice
    #[error("media type '{key}' is registered more than once")]
    DuplicateKey {
        /// The offending key
        key: String,
    },
}

/// Errors raised while building an entity response
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Content type could not be encoded
    #[error("Media type error: {0}")]
    MediaType(#[from] MediaTypeError),

    /// Dispatch table could not be built
    #[error("Negotiation error: {0}")]
    Negotiation(#[from] NegotiationError),

    /// The mapped representation could not be serialized
    #[error("Failed to serialize representation: {source}")]
    Representation {
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// A header or status could not be assembled into a response
    #[error("Failed to assemble response: {source}")]
    Response {
        /// Underlying HTTP error
        #[source]
        source: axum::http::Error,
    },
}
