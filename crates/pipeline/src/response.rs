// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Entity response building
//!
//! [`EntityResponseBuilder`] turns a domain entity into an HTTP response. It
//! derives the validators (ETag, Last-Modified) from the entity, answers `304`
//! when the client's copy is current, and otherwise maps the entity to its
//! representation and attaches the content type, caching, rate-limit and log
//! correlation headers.

use std::hash::Hash;

use axum::{
    body::Body,
    http::{
        StatusCode,
        header::{CACHE_CONTROL, CONTENT_TYPE, ETAG, EXPIRES, LAST_MODIFIED, LOCATION},
    },
    response::Response,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::debug;

use crate::{
    error::{PipelineError, PipelineResult},
    etag::EntityTag,
    http_date,
    log_token::{LOG_TOKEN_HEADER, LogToken},
    media_type::{MediaTypeGrammar, VersionedMediaType},
    preconditions::Preconditions,
};

/// Requests allowed per minute
pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
/// Requests allowed per 24 hours
pub const RATE_LIMIT_LIMIT_24H_HEADER: &str = "x-ratelimit-limit-24h";
/// Requests remaining in the current window
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
/// Seconds until the current window resets
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

const NOT_ENFORCED: &str = "-1";

/// Entities that may carry an audit timestamp
///
/// The timestamp becomes the `Last-Modified` header. Entities without one are
/// reported as modified at build time.
pub trait Audited {
    /// Time of the last modification, if recorded
    fn last_modified_time(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl<T> Audited for Vec<T> {}

impl<T: Audited + ?Sized> Audited for &T {
    fn last_modified_time(&self) -> Option<DateTime<Utc>> {
        (**self).last_modified_time()
    }
}

/// Rate-limit counters advertised to clients
///
/// `None` means not enforced and is sent as `-1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimits {
    /// Requests allowed per minute
    pub per_minute: Option<u64>,
    /// Requests allowed per 24 hours
    pub per_24h: Option<u64>,
    /// Requests remaining in the current window
    pub remaining: Option<u64>,
    /// Seconds until the current window resets
    pub reset: Option<u64>,
}

impl RateLimits {
    /// Nothing enforced
    pub const fn unlimited() -> Self {
        Self {
            per_minute: None,
            per_24h: None,
            remaining: None,
            reset: None,
        }
    }

    fn headers(self) -> [(&'static str, String); 4] {
        let render = |value: Option<u64>| {
            value.map_or_else(|| NOT_ENFORCED.to_string(), |value| value.to_string())
        };
        [
            (RATE_LIMIT_LIMIT_HEADER, render(self.per_minute)),
            (RATE_LIMIT_LIMIT_24H_HEADER, render(self.per_24h)),
            (RATE_LIMIT_REMAINING_HEADER, render(self.remaining)),
            (RATE_LIMIT_RESET_HEADER, render(self.reset)),
        ]
    }
}

/// Everything a fresh entity response carries
#[derive(Debug, Clone)]
pub struct ResponseEnvelope<R> {
    /// Mapped representation, serialized as the body
    pub representation: R,
    /// Status, `200` or `201`
    pub status: StatusCode,
    /// Tag of the entity state
    pub etag: EntityTag,
    /// Last modification time of the entity
    pub last_modified: DateTime<Utc>,
    /// Cache lifetime and the time it ends
    pub expiry: Option<(u32, DateTime<Utc>)>,
    /// Log correlation token
    pub log_token: LogToken,
    /// Advertised rate limits
    pub rate_limits: RateLimits,
    /// Resolved content type
    pub content_type: String,
    /// Path of a created resource
    pub location: Option<String>,
}

impl<R: Serialize> ResponseEnvelope<R> {
    /// Serialize the representation and assemble the response
    pub fn into_response(self) -> PipelineResult<Response> {
        let body = serde_json::to_vec(&self.representation)
            .map_err(|source| PipelineError::Representation { source })?;

        let mut builder = Response::builder()
            .status(self.status)
            .header(CONTENT_TYPE, self.content_type)
            .header(ETAG, self.etag.to_string())
            .header(LAST_MODIFIED, http_date::format(self.last_modified))
            .header(LOG_TOKEN_HEADER, self.log_token.as_str());
        for (name, value) in self.rate_limits.headers() {
            builder = builder.header(name, value);
        }
        if let Some((max_age, expires)) = self.expiry {
            builder = builder
                .header(CACHE_CONTROL, format!("max-age={max_age}"))
                .header(EXPIRES, http_date::format(expires));
        }
        if let Some(location) = self.location {
            builder = builder.header(LOCATION, location);
        }

        builder
            .body(Body::from(body))
            .map_err(|source| PipelineError::Response { source })
    }
}

/// Result of evaluating an entity against the request's preconditions
#[derive(Debug, Clone)]
pub enum Outcome<R> {
    /// The client's copy is current
    NotModified {
        /// Tag of the entity state
        etag: EntityTag,
        /// Log correlation token
        log_token: LogToken,
    },
    /// A full response
    Fresh(Box<ResponseEnvelope<R>>),
}

impl<R: Serialize> Outcome<R> {
    /// Assemble the HTTP response
    pub fn into_response(self) -> PipelineResult<Response> {
        match self {
            Self::NotModified { etag, log_token } => Response::builder()
                .status(StatusCode::NOT_MODIFIED)
                .header(ETAG, etag.to_string())
                .header(LOG_TOKEN_HEADER, log_token.as_str())
                .body(Body::empty())
                .map_err(|source| PipelineError::Response { source }),
            Self::Fresh(envelope) => envelope.into_response(),
        }
    }
}

/// Consuming builder for entity responses
///
/// ```ignore
/// EntityResponseBuilder::new(&customer, CustomerRepresentation::from, token)
///     .concept("customer")
///     .version("2")
///     .max_age(60)
///     .build(&preconditions)
/// ```
#[derive(Debug)]
pub struct EntityResponseBuilder<E, F> {
    entity: E,
    mapper: F,
    log_token: LogToken,
    concept: Option<String>,
    version: Option<String>,
    grammar: MediaTypeGrammar,
    max_age: Option<u32>,
    rate_limits: RateLimits,
    location: Option<String>,
    created: bool,
}

impl<E, F> EntityResponseBuilder<E, F> {
    /// Start a response for `entity`, echoing `log_token` when supplied
    pub fn new(entity: E, mapper: F, log_token: Option<&str>) -> Self {
        Self::with_log_token(entity, mapper, LogToken::from_supplied(log_token))
    }

    /// Start a response with an already resolved log token
    pub fn with_log_token(entity: E, mapper: F, log_token: LogToken) -> Self {
        Self {
            entity,
            mapper,
            log_token,
            concept: None,
            version: None,
            grammar: MediaTypeGrammar::default(),
            max_age: None,
            rate_limits: RateLimits::unlimited(),
            location: None,
            created: false,
        }
    }

    /// Concept name carried in the content type
    #[must_use]
    pub fn concept(mut self, concept: impl Into<String>) -> Self {
        self.concept = Some(concept.into());
        self
    }

    /// Version label carried in the content type
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Content-type grammar
    #[must_use]
    pub fn grammar(mut self, grammar: MediaTypeGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    /// Select the content-type grammar from the client's parameter support
    #[must_use]
    pub fn parameter_supported(self, parameter_supported: bool) -> Self {
        self.grammar(MediaTypeGrammar::from_parameter_support(parameter_supported))
    }

    /// Allow caching for `seconds`
    #[must_use]
    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Advertise the per-minute limit
    #[must_use]
    pub fn rate_limit_per_minute(mut self, limit: u64) -> Self {
        self.rate_limits.per_minute = Some(limit);
        self
    }

    /// Advertise the per-24-hour limit
    #[must_use]
    pub fn rate_limit_per_24h(mut self, limit: u64) -> Self {
        self.rate_limits.per_24h = Some(limit);
        self
    }

    /// Advertise the requests remaining
    #[must_use]
    pub fn rate_limit_remaining(mut self, remaining: u64) -> Self {
        self.rate_limits.remaining = Some(remaining);
        self
    }

    /// Advertise the seconds until reset
    #[must_use]
    pub fn rate_limit_reset(mut self, seconds: u64) -> Self {
        self.rate_limits.reset = Some(seconds);
        self
    }

    /// Replace all rate-limit counters
    #[must_use]
    pub fn rate_limits(mut self, rate_limits: RateLimits) -> Self {
        self.rate_limits = rate_limits;
        self
    }

    /// Answer `200` with a `Location` header
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Answer `201 Created` with a `Location` header
    ///
    /// Preconditions are not evaluated for created resources.
    #[must_use]
    pub fn created(mut self, location: impl Into<String>) -> Self {
        self.created = true;
        self.location(location)
    }

    /// Evaluate the preconditions and, unless short-circuited, map the entity
    ///
    /// The mapper is not invoked when the outcome is
    /// [`Outcome::NotModified`].
    pub fn evaluate<R>(self, preconditions: &Preconditions) -> PipelineResult<Outcome<R>>
    where
        E: Hash + Audited,
        F: FnOnce(&E) -> R,
    {
        let now = Utc::now();
        let etag = EntityTag::of(&self.entity);
        let last_modified = self.entity.last_modified_time().unwrap_or(now);

        if !self.created && preconditions.is_not_modified(&etag, last_modified) {
            debug!(%etag, log_token = %self.log_token, "client copy is current");
            return Ok(Outcome::NotModified {
                etag,
                log_token: self.log_token,
            });
        }

        let mut media_type = VersionedMediaType::hal_json().with_grammar(self.grammar);
        if let Some(concept) = self.concept {
            media_type = media_type.with_concept(concept);
        }
        if let Some(version) = self.version {
            media_type = media_type.with_version(version);
        }
        let content_type = media_type.encode()?;

        let representation = (self.mapper)(&self.entity);
        let expiry = self
            .max_age
            .map(|seconds| (seconds, now + TimeDelta::seconds(i64::from(seconds))));

        Ok(Outcome::Fresh(Box::new(ResponseEnvelope {
            representation,
            status: if self.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            },
            etag,
            last_modified,
            expiry,
            log_token: self.log_token,
            rate_limits: self.rate_limits,
            content_type,
            location: self.location,
        })))
    }

    /// Evaluate and assemble the HTTP response
    pub fn build<R>(self, preconditions: &Preconditions) -> PipelineResult<Response>
    where
        E: Hash + Audited,
        F: FnOnce(&E) -> R,
        R: Serialize,
    {
        self.evaluate(preconditions)?.into_response()
    }
}
