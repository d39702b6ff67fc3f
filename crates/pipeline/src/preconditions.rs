// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Conditional-GET preconditions
//!
//! `If-None-Match` takes precedence: when present it alone decides. Otherwise
//! `If-Modified-Since` is compared at whole-second precision, the resolution
//! of an HTTP-date. Headers that fail to parse are ignored.

use axum::http::{
    HeaderMap,
    header::{IF_MODIFIED_SINCE, IF_NONE_MATCH},
};
use chrono::{DateTime, DurationRound, TimeDelta, Utc};

use crate::{etag::EntityTag, http_date};

#[derive(Debug, Clone, PartialEq, Eq)]
enum IfNoneMatch {
    Any,
    Tags(Vec<EntityTag>),
}

/// The validators a client sent with its request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preconditions {
    if_none_match: Option<IfNoneMatch>,
    if_modified_since: Option<DateTime<Utc>>,
}

impl Preconditions {
    /// No validators: the client holds no copy
    pub fn none() -> Self {
        Self::default()
    }

    /// Read `If-None-Match` and `If-Modified-Since` from request headers
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let if_none_match = headers
            .get_all(IF_NONE_MATCH)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .fold(None, |accumulated, value| {
                merge(accumulated, parse_if_none_match(value))
            });
        let if_modified_since = headers
            .get(IF_MODIFIED_SINCE)
            .and_then(|value| value.to_str().ok())
            .and_then(http_date::parse);
        Self {
            if_none_match,
            if_modified_since,
        }
    }

    /// Add a tag the client holds
    #[must_use]
    pub fn with_if_none_match(mut self, tag: EntityTag) -> Self {
        self.if_none_match = merge(self.if_none_match, Some(IfNoneMatch::Tags(vec![tag])));
        self
    }

    /// Set the time of the client's copy
    #[must_use]
    pub fn with_if_modified_since(mut self, since: DateTime<Utc>) -> Self {
        self.if_modified_since = Some(since);
        self
    }

    /// Whether any validator was supplied
    pub fn is_conditional(&self) -> bool {
        self.if_none_match.is_some() || self.if_modified_since.is_some()
    }

    /// Whether the client's copy is still current
    pub fn is_not_modified(&self, etag: &EntityTag, last_modified: DateTime<Utc>) -> bool {
        match &self.if_none_match {
            Some(IfNoneMatch::Any) => true,
            Some(IfNoneMatch::Tags(tags)) => tags.iter().any(|tag| tag.weak_eq(etag)),
            None => self
                .if_modified_since
                .is_some_and(|since| truncate_to_seconds(last_modified) <= since),
        }
    }
}

fn merge(current: Option<IfNoneMatch>, next: Option<IfNoneMatch>) -> Option<IfNoneMatch> {
    match (current, next) {
        (Some(IfNoneMatch::Any), _) | (_, Some(IfNoneMatch::Any)) => Some(IfNoneMatch::Any),
        (Some(IfNoneMatch::Tags(mut tags)), Some(IfNoneMatch::Tags(more))) => {
            tags.extend(more);
            Some(IfNoneMatch::Tags(tags))
        }
        (current, None) => current,
        (None, next) => next,
    }
}

fn parse_if_none_match(value: &str) -> Option<IfNoneMatch> {
    if value.trim() == "*" {
        return Some(IfNoneMatch::Any);
    }
    let tags: Vec<EntityTag> = value.split(',').filter_map(EntityTag::parse).collect();
    (!tags.is_empty()).then_some(IfNoneMatch::Tags(tags))
}

fn truncate_to_seconds(time: DateTime<Utc>) -> DateTime<Utc> {
    time.duration_trunc(TimeDelta::seconds(1)).unwrap_or(time)
}
