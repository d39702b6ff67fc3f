// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Versioned resources
//!
//! Each resource owns one dispatch table per endpoint. A table maps every
//! accepted media type to a [`Producer`]: the bare `application/hal+json`
//! type selects the default version, and each concept/version pair is
//! registered in both the parameterized and the suffixed grammar. The
//! producer runs inside an instrumented scope named after the resource, so
//! archivist calls show up as its children.

use std::fmt::{self, Display};

use axum::response::Response;
use pipeline::{
    APPLICATION_HAL_JSON, DispatchTable, DispatchTableBuilder, EntityResponseBuilder,
    MediaTypeGrammar, Negotiation, PipelineResult, RateLimits, ScopeSpec, measure_scope,
    media_type, unsupported_media_type,
};
use tracing::debug;

use crate::{config::ServerConfig, error::ServerResult, extractors::RequestContext, metrics};

pub mod accounts;
pub mod customers;
pub mod events;
pub mod reconciled;
pub mod transactions;

pub use accounts::AccountResource;
pub use customers::CustomerResource;
pub use events::EventResource;
pub use reconciled::ReconciledTransactionResource;
pub use transactions::TransactionResource;

/// Signature shared by the producers of one endpoint
pub type Produce<R, A> = fn(&R, &RequestContext, &A, MediaTypeGrammar) -> ServerResult<Response>;

/// A representation producer registered under one accepted media type
pub struct Producer<R, A> {
    operation: &'static str,
    grammar: MediaTypeGrammar,
    produce: Produce<R, A>,
}

impl<R, A> Producer<R, A> {
    /// Name of the instrumented operation
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Grammar of the content type the producer answers with
    pub fn grammar(&self) -> MediaTypeGrammar {
        self.grammar
    }
}

impl<R, A> fmt::Debug for Producer<R, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("operation", &self.operation)
            .field("grammar", &self.grammar)
            .finish_non_exhaustive()
    }
}

/// Dispatch table of one endpoint
pub type Producers<R, A> = DispatchTable<Producer<R, A>>;

fn unsupported<R, A>(
    _resource: &R,
    _context: &RequestContext,
    _args: &A,
    _grammar: MediaTypeGrammar,
) -> ServerResult<Response> {
    Ok(unsupported_media_type())
}

/// Builder registering producers under all of their media types
pub(crate) struct ProducerTable<R, A> {
    builder: DispatchTableBuilder<Producer<R, A>>,
}

impl<R, A> ProducerTable<R, A> {
    pub(crate) fn new() -> Self {
        Self {
            builder: DispatchTable::builder(Producer {
                operation: "unsupported",
                grammar: MediaTypeGrammar::Parameterized,
                produce: unsupported::<R, A>,
            }),
        }
    }

    /// Serve the bare `application/hal+json` type with `produce`
    pub(crate) fn default_type(self, operation: &'static str, produce: Produce<R, A>) -> Self {
        Self {
            builder: self.builder.register(
                APPLICATION_HAL_JSON,
                Producer {
                    operation,
                    grammar: MediaTypeGrammar::Parameterized,
                    produce,
                },
            ),
        }
    }

    /// Serve `concept` at `version` in both grammars with `produce`
    pub(crate) fn version(
        self,
        concept: &str,
        version: &str,
        operation: &'static str,
        produce: Produce<R, A>,
    ) -> PipelineResult<Self> {
        let mut builder = self.builder;
        for grammar in [MediaTypeGrammar::Parameterized, MediaTypeGrammar::Suffixed] {
            let key = media_type::encode(
                Some(concept),
                Some(version),
                grammar.parameter_supported(),
            )?;
            builder = builder.register(
                key,
                Producer {
                    operation,
                    grammar,
                    produce,
                },
            );
        }
        Ok(Self { builder })
    }

    pub(crate) fn build(self) -> PipelineResult<Producers<R, A>> {
        Ok(self.builder.build()?)
    }
}

/// Settings shared by all resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSettings {
    /// Warning limit for producers, in milliseconds
    pub handler_limit_ms: u64,
    /// Rate limits advertised on every response
    pub rate_limits: RateLimits,
}

impl ResourceSettings {
    /// Settings taken from the server configuration
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            handler_limit_ms: config.instrumentation.handler_limit_ms.value(),
            rate_limits: config.rate_limits.into(),
        }
    }

    /// Start a response carrying the request's log token and the rate limits
    pub(crate) fn respond_with<E, F>(
        &self,
        context: &RequestContext,
        entity: E,
        mapper: F,
    ) -> EntityResponseBuilder<E, F> {
        EntityResponseBuilder::with_log_token(entity, mapper, context.log_token().clone())
            .rate_limits(self.rate_limits)
    }
}

impl Default for ResourceSettings {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// A resource answering through [`negotiate`]
pub(crate) trait Resource {
    /// Owner name of the resource's instrumented scopes and metric label
    const NAME: &'static str;

    fn settings(&self) -> &ResourceSettings;
}

/// Run `work` in an instrumented scope owned by the resource
pub(crate) fn instrumented<R: Resource, T>(
    resource: &R,
    operation: &'static str,
    arguments: &[&dyn Display],
    work: impl FnOnce() -> ServerResult<T>,
) -> ServerResult<T> {
    let spec = ScopeSpec::new(R::NAME, operation, resource.settings().handler_limit_ms)
        .with_arguments(arguments);
    let (result, scope) = measure_scope(spec, work);
    if let Some(scope) = scope {
        metrics::observe_scope(&scope);
    }
    result
}

/// Select the producer for the accepted media type and run it
///
/// Unsupported types are answered with `415` without entering a scope or
/// touching the archivist.
pub(crate) fn negotiate<R: Resource, A>(
    resource: &R,
    producers: &Producers<R, A>,
    context: &RequestContext,
    args: &A,
    arguments: &[&dyn Display],
) -> ServerResult<Response> {
    let result = match producers.negotiate(context.accept()) {
        Negotiation::Matched(producer) => instrumented(resource, producer.operation, arguments, || {
            (producer.produce)(resource, context, args, producer.grammar)
        }),
        Negotiation::Unsupported(fallback) => {
            metrics::inc_unsupported_media_type(R::NAME);
            debug!(
                resource = R::NAME,
                accept = context.accept(),
                log_token = %context.log_token(),
                "No producer for accepted media type"
            );
            (fallback.produce)(resource, context, args, fallback.grammar)
        }
    };
    record(R::NAME, &result);
    result
}

/// Count the response status of a resource call
pub(crate) fn record(resource: &str, result: &ServerResult<Response>) {
    let status = match result {
        Ok(response) => response.status(),
        Err(error) => error.status_code(),
    };
    metrics::record_response(resource, status);
}
