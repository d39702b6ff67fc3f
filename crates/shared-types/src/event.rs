// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Events published on the customer and account feeds
//!
//! An event records that something happened to a resource. It is immutable
//! once written and addressed by its category and id.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use pipeline::Audited;
use uuid::Uuid;

use crate::audit::AuditInfo;

/// Category of events that were published without one
pub const DEFAULT_CATEGORY: &str = "default";

/// Something that happened to a resource
#[derive(Debug, Clone)]
pub struct Event {
    /// Technical id, never exposed
    pub tid: Uuid,
    /// Semantic id used in resource paths
    pub id: Uuid,
    /// Ordering within a feed, nanoseconds since the epoch at publication
    pub sequence: i64,
    /// Publication time
    pub time: DateTime<Utc>,
    /// Grouping used to follow a single resource's history
    pub category: String,
    /// What happened, in human readable form
    pub information: String,
    /// Path of the resource the event concerns
    pub origin: String,
    /// Last modification
    pub audit: AuditInfo,
}

impl Event {
    /// Create an event published now
    ///
    /// A blank category falls back to [`DEFAULT_CATEGORY`].
    pub fn new(
        origin: impl Into<String>,
        category: impl Into<String>,
        information: impl Into<String>,
    ) -> Self {
        Self::at(Utc::now(), origin, category, information)
    }

    /// Create an event published at `time`
    pub fn at(
        time: DateTime<Utc>,
        origin: impl Into<String>,
        category: impl Into<String>,
        information: impl Into<String>,
    ) -> Self {
        let category = category.into();
        let category = if category.trim().is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            category
        };
        Self {
            tid: Uuid::new_v4(),
            id: Uuid::new_v4(),
            sequence: time.timestamp_nanos_opt().unwrap_or(i64::MAX),
            time,
            category,
            information: information.into(),
            origin: origin.into(),
            audit: AuditInfo::default(),
        }
    }

    /// Category name combining a scope and a name, e.g. `1234567-5479`
    pub fn category(scope: &str, name: &str) -> String {
        format!("{scope}-{name}")
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.sequence == other.sequence
            && self.category == other.category
            && self.information == other.information
            && self.origin == other.origin
    }
}

impl Eq for Event {}

impl Hash for Event {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.sequence.hash(state);
        self.category.hash(state);
        self.information.hash(state);
        self.origin.hash(state);
    }
}

impl Audited for Event {
    fn last_modified_time(&self) -> Option<DateTime<Utc>> {
        Some(self.time)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0)
            .single()
            .expect("valid date")
    }

    #[test]
    fn blank_category_falls_back_to_default() {
        let event = Event::at(noon(), "/customers/0123456789", " ", "customer saved");
        assert_eq!(event.category, DEFAULT_CATEGORY);
    }

    #[test]
    fn sequence_follows_publication_time() {
        let earlier = Event::at(noon(), "/a", "c", "first");
        let later = Event::at(noon() + chrono::Duration::nanoseconds(1), "/a", "c", "second");

        assert!(earlier.sequence < later.sequence);
        assert_eq!(earlier.last_modified_time(), Some(noon()));
    }

    #[test]
    fn category_joins_scope_and_name() {
        assert_eq!(Event::category("1234567", "5479"), "1234567-5479");
    }
}
