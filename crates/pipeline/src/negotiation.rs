// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Content negotiation by exact media type
//!
//! A [`DispatchTable`] maps the literal value of the `Accept` header to the
//! handler producing that representation. Lookup is byte-for-byte: no
//! quality values, no wildcards and no parameter reordering. Anything not
//! registered resolves to the table's fallback, which by convention answers
//! with [`unsupported_media_type`].
//!
//! Tables are assembled once through [`DispatchTableBuilder`] and never
//! mutated afterwards, so concurrent lookups need no synchronization.

use std::{
    collections::{HashMap, hash_map::Entry},
    fmt,
};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::NegotiationError;

/// Immutable mapping from media type keys to handlers, plus one fallback
pub struct DispatchTable<H> {
    handlers: HashMap<Box<str>, H>,
    fallback: H,
}

/// Result of negotiating a media type against a [`DispatchTable`]
#[derive(Debug)]
pub enum Negotiation<'a, H> {
    /// The accepted type was registered
    Matched(&'a H),
    /// The accepted type was unknown; the fallback handler applies
    Unsupported(&'a H),
}

impl<H> Clone for Negotiation<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H> Copy for Negotiation<'_, H> {}

impl<'a, H> Negotiation<'a, H> {
    /// The handler to invoke, whichever branch was taken
    pub fn handler(self) -> &'a H {
        match self {
            Self::Matched(handler) | Self::Unsupported(handler) => handler,
        }
    }

    /// Whether the accepted type matched a registered key
    pub fn is_supported(self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

impl<H> DispatchTable<H> {
    /// Start building a table around its fallback handler
    pub fn builder(fallback: H) -> DispatchTableBuilder<H> {
        DispatchTableBuilder {
            handlers: HashMap::new(),
            fallback,
            duplicates: Vec::new(),
        }
    }

    /// Select the handler for the accepted media type
    ///
    /// Always returns a handler: the registered one on an exact match,
    /// otherwise the fallback.
    pub fn dispatch(&self, accepted: &str) -> &H {
        self.negotiate(accepted).handler()
    }

    /// Select the handler and report whether the accepted type matched
    pub fn negotiate(&self, accepted: &str) -> Negotiation<'_, H> {
        match self.handlers.get(accepted) {
            Some(handler) => Negotiation::Matched(handler),
            None => Negotiation::Unsupported(&self.fallback),
        }
    }

    /// Whether `accepted` is a registered key
    pub fn supports(&self, accepted: &str) -> bool {
        self.handlers.contains_key(accepted)
    }

    /// The fallback handler
    pub fn fallback(&self) -> &H {
        &self.fallback
    }

    /// Registered keys in lexical order
    pub fn media_types(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.handlers.keys().map(AsRef::as_ref).collect();
        keys.sort_unstable();
        keys
    }

    /// Number of registered keys
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no key is registered
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<H> fmt::Debug for DispatchTable<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTable")
            .field("media_types", &self.media_types())
            .finish_non_exhaustive()
    }
}

/// Builder collecting the registrations of a [`DispatchTable`]
pub struct DispatchTableBuilder<H> {
    handlers: HashMap<Box<str>, H>,
    fallback: H,
    duplicates: Vec<String>,
}

impl<H> DispatchTableBuilder<H> {
    /// Register `handler` for the literal media type `key`
    #[must_use]
    pub fn register(mut self, key: impl Into<Box<str>>, handler: H) -> Self {
        match self.handlers.entry(key.into()) {
            Entry::Occupied(entry) => self.duplicates.push(entry.key().to_string()),
            Entry::Vacant(entry) => {
                entry.insert(handler);
            }
        }
        self
    }

    /// Freeze the registrations into a table
    ///
    /// # Errors
    ///
    /// Returns [`NegotiationError::DuplicateKey`] when a key was registered
    /// more than once.
    pub fn build(mut self) -> Result<DispatchTable<H>, NegotiationError> {
        if let Some(key) = self.duplicates.pop() {
            return Err(NegotiationError::DuplicateKey { key });
        }
        Ok(DispatchTable {
            handlers: self.handlers,
            fallback: self.fallback,
        })
    }
}

impl<H> fmt::Debug for DispatchTableBuilder<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchTableBuilder")
            .field("registered", &self.handlers.len())
            .field("duplicates", &self.duplicates)
            .finish_non_exhaustive()
    }
}

/// `415 Unsupported Media Type` with an empty body
pub fn unsupported_media_type() -> Response {
    StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    type Handler = fn() -> Response;

    fn version_one() -> Response {
        StatusCode::OK.into_response()
    }

    fn version_two() -> Response {
        StatusCode::ACCEPTED.into_response()
    }

    fn table() -> DispatchTable<Handler> {
        DispatchTable::builder(unsupported_media_type as Handler)
            .register("application/hal+json", version_two as Handler)
            .register("application/hal+json;concept=customer;v=1", version_one)
            .register("application/hal+json;concept=customer;v=2", version_two)
            .build()
            .expect("keys are unique")
    }

    #[test]
    fn registered_keys_dispatch_to_their_handler() {
        let table = table();
        assert_eq!(
            (table.dispatch("application/hal+json;concept=customer;v=1"))().status(),
            StatusCode::OK
        );
        assert_eq!(
            (table.dispatch("application/hal+json;concept=customer;v=2"))().status(),
            StatusCode::ACCEPTED
        );
        assert!(table.negotiate("application/hal+json").is_supported());
    }

    #[tokio::test]
    async fn unknown_keys_fall_back_to_unsupported_media_type() {
        let table = table();
        for accepted in [
            "",
            "*/*",
            "application/json",
            "application/hal+json;concept=customer;v=0",
            "application/hal+json;v=1;concept=customer",
            "APPLICATION/HAL+JSON",
            "application/hal+json ",
        ] {
            let negotiation = table.negotiate(accepted);
            assert!(!negotiation.is_supported(), "{accepted:?} must not match");

            let response = (negotiation.handler())();
            assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("body readable");
            assert!(body.is_empty());
        }
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let result = DispatchTable::builder(unsupported_media_type as Handler)
            .register("application/hal+json", version_one as Handler)
            .register("application/hal+json", version_two)
            .build();

        assert_eq!(
            result.err(),
            Some(NegotiationError::DuplicateKey {
                key: "application/hal+json".to_string()
            })
        );
    }

    #[test]
    fn media_types_are_listed_in_order() {
        let table = table();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.media_types(),
            vec![
                "application/hal+json",
                "application/hal+json;concept=customer;v=1",
                "application/hal+json;concept=customer;v=2",
            ]
        );
    }

    #[test]
    fn tables_are_shared_across_threads() {
        let table = std::sync::Arc::new(table());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let table = std::sync::Arc::clone(&table);
                std::thread::spawn(move || {
                    table.supports("application/hal+json;concept=customer;v=1")
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().expect("lookup thread finished"));
        }
    }
}
