// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! # Pipeline
//!
//! The request-processing pipeline shared by every resource endpoint:
//!
//! - [`negotiation`]: exact-match dispatch from the `Accept` value to a
//!   representation producer, with a `415` fallback
//! - [`instrument`]: per-thread call trees of measured operations, with slow
//!   ones logged at `WARN`
//! - [`media_type`]: concept and version encoded into the content type
//! - [`response`]: conditional-GET evaluation and the final header set
//!
//! The pipeline never suspends. Work measured by the instrumentor runs
//! synchronously on the request's thread.

pub mod error;
pub mod etag;
pub mod http_date;
pub mod instrument;
pub mod log_token;
pub mod media_type;
pub mod negotiation;
pub mod preconditions;
pub mod response;

pub use error::{MediaTypeError, NegotiationError, PipelineError, PipelineResult};
pub use etag::EntityTag;
pub use instrument::{
    CompletedScope, DurationGuard, OperationLabel, ScopeSpec, measure, measure_scope,
};
pub use log_token::{LOG_TOKEN_HEADER, LogToken};
pub use media_type::{APPLICATION_HAL_JSON, MediaTypeGrammar, VersionedMediaType};
pub use negotiation::{DispatchTable, DispatchTableBuilder, Negotiation, unsupported_media_type};
pub use preconditions::Preconditions;
pub use response::{Audited, EntityResponseBuilder, Outcome, RateLimits, ResponseEnvelope};
