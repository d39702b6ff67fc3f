// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Event feed resource
//!
//! One instance serves each feed under `/<feed>-events`:
//!
//! | Endpoint | Concept | max-age |
//! |---|---|---|
//! | feed | `events` | 60 s |
//! | category | `eventcategory` | 60 s |
//! | single event | `event` | one week |
//! | metadata | `metadata` | four weeks |
//!
//! Every endpoint serves version 1 only, which is also the default.

use std::sync::Arc;

use archivist::{EventArchivist, EventFeed, Interval};
use axum::response::Response;
use pipeline::{Audited, MediaTypeGrammar, PipelineResult};
use shared_types::Event;
use uuid::Uuid;

use super::{ProducerTable, Producers, Resource, ResourceSettings, negotiate};
use crate::{
    error::ServerResult,
    extractors::RequestContext,
    representations::{
        EventRepresentation, EventsMetadataRepresentation, EventsRepresentation,
        event_category_path, events_path,
    },
};

const ONE_WEEK: u32 = 7 * 24 * 60 * 60;
const FOUR_WEEKS: u32 = 4 * ONE_WEEK;

/// Static description of a feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FeedMetadata(EventFeed);

impl FeedMetadata {
    fn description(self) -> &'static str {
        match self.0 {
            EventFeed::Customer => {
                "Customer events are grouped in categories named by customer number. \
                 Lists accept interval=<start>/<end> with RFC 3339 timestamps and keep \
                 the events published strictly inside it."
            }
            EventFeed::Account => {
                "Account events are grouped in categories named <account no>-<reg no>. \
                 Lists accept interval=<start>/<end> with RFC 3339 timestamps and keep \
                 the events published strictly inside it."
            }
        }
    }
}

impl Audited for FeedMetadata {}

/// Events of one feed, listed whole, by category or addressed singly
#[derive(Debug)]
pub struct EventResource {
    feed: EventFeed,
    archivist: Arc<dyn EventArchivist>,
    settings: ResourceSettings,
    list_producers: Producers<Self, Option<Interval>>,
    category_producers: Producers<Self, (String, Option<Interval>)>,
    item_producers: Producers<Self, (String, Uuid)>,
    metadata_producers: Producers<Self, ()>,
}

impl Resource for EventResource {
    const NAME: &'static str = "EventResource";

    fn settings(&self) -> &ResourceSettings {
        &self.settings
    }
}

impl EventResource {
    /// Create the resource serving `feed` and its dispatch tables
    ///
    /// # Errors
    ///
    /// Returns `PipelineError` if a media type cannot be encoded or is
    /// registered twice.
    pub fn new(
        feed: EventFeed,
        archivist: Arc<dyn EventArchivist>,
        settings: ResourceSettings,
    ) -> PipelineResult<Self> {
        let list_producers = ProducerTable::<Self, Option<Interval>>::new()
            .default_type("list_v1", Self::list_v1)
            .version("events", "1", "list_v1", Self::list_v1)?
            .build()?;
        let category_producers = ProducerTable::<Self, (String, Option<Interval>)>::new()
            .default_type("category_v1", Self::category_v1)
            .version("eventcategory", "1", "category_v1", Self::category_v1)?
            .build()?;
        let item_producers = ProducerTable::<Self, (String, Uuid)>::new()
            .default_type("get_v1", Self::get_v1)
            .version("event", "1", "get_v1", Self::get_v1)?
            .build()?;
        let metadata_producers = ProducerTable::<Self, ()>::new()
            .default_type("metadata_v1", Self::metadata_v1)
            .version("metadata", "1", "metadata_v1", Self::metadata_v1)?
            .build()?;

        Ok(Self {
            feed,
            archivist,
            settings,
            list_producers,
            category_producers,
            item_producers,
            metadata_producers,
        })
    }

    /// Feed served by the resource
    pub fn feed(&self) -> EventFeed {
        self.feed
    }

    /// List the events of the feed
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the archivist or the response pipeline fails
    pub fn list(&self, context: &RequestContext, within: Option<Interval>) -> ServerResult<Response> {
        let interval = within.map(|interval| interval.to_string()).unwrap_or_default();
        negotiate(
            self,
            &self.list_producers,
            context,
            &within,
            &[&self.feed, &interval],
        )
    }

    /// List the events of one category
    ///
    /// # Errors
    ///
    /// Returns `ServerError` if the archivist or the response pipeline fails
    pub fn list_category(
        &self,
        context: &RequestContext,
        category: String,
        within: Option<Interval>,
    ) -> ServerResult<Response> {
        let arguments = category.clone();
        negotiate(
            self,
            &self.category_producers,
            context,
            &(category, within),
            &[&self.feed, &arguments],
        )
    }

    /// Get a single event
    ///
    /// # Errors
    ///
    /// Returns `ServerError::NotFound` if the category holds no event with
    /// the id
    pub fn get(&self, context: &RequestContext, category: String, id: Uuid) -> ServerResult<Response> {
        let arguments = category.clone();
        negotiate(
            self,
            &self.item_producers,
            context,
            &(category, id),
            &[&self.feed, &arguments, &id],
        )
    }

    /// Describe the feed
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Pipeline` if the response cannot be assembled
    pub fn metadata(&self, context: &RequestContext) -> ServerResult<Response> {
        negotiate(self, &self.metadata_producers, context, &(), &[&self.feed])
    }

    fn list_v1(
        &self,
        context: &RequestContext,
        within: &Option<Interval>,
        grammar: MediaTypeGrammar,
    ) -> ServerResult<Response> {
        let events = self.archivist.list_events(self.feed, within.as_ref())?;
        Ok(self
            .settings
            .respond_with(context, events, |events: &Vec<Event>| {
                EventsRepresentation::new(self.feed, events_path(self.feed), events)
            })
            .concept("events")
            .version("1")
            .grammar(grammar)
            .max_age(60)
            .build(context.preconditions())?)
    }

    fn category_v1(
        &self,
        context: &RequestContext,
        (category, within): &(String, Option<Interval>),
        grammar: MediaTypeGrammar,
    ) -> ServerResult<Response> {
        let events = self
            .archivist
            .list_category_events(self.feed, category, within.as_ref())?;
        Ok(self
            .settings
            .respond_with(context, events, |events: &Vec<Event>| {
                EventsRepresentation::new(self.feed, event_category_path(self.feed, category), events)
            })
            .concept("eventcategory")
            .version("1")
            .grammar(grammar)
            .max_age(60)
            .build(context.preconditions())?)
    }

    fn get_v1(
        &self,
        context: &RequestContext,
        (category, id): &(String, Uuid),
        grammar: MediaTypeGrammar,
    ) -> ServerResult<Response> {
        let event = self.archivist.get_event(self.feed, category, *id)?;
        Ok(self
            .settings
            .respond_with(context, event, |event: &Event| {
                EventRepresentation::new(self.feed, event)
            })
            .concept("event")
            .version("1")
            .grammar(grammar)
            .max_age(ONE_WEEK)
            .build(context.preconditions())?)
    }

    fn metadata_v1(
        &self,
        context: &RequestContext,
        _args: &(),
        grammar: MediaTypeGrammar,
    ) -> ServerResult<Response> {
        Ok(self
            .settings
            .respond_with(context, FeedMetadata(self.feed), |metadata: &FeedMetadata| {
                EventsMetadataRepresentation::new(metadata.0, metadata.description())
            })
            .concept("metadata")
            .version("1")
            .grammar(grammar)
            .max_age(FOUR_WEEKS)
            .build(context.preconditions())?)
    }
}
