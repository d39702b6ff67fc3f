// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Audit information carried by persisted entities

use chrono::{DateTime, Utc};

/// Who last changed an entity, and when
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditInfo {
    last_modified_by: Option<String>,
    last_modified_time: Option<DateTime<Utc>>,
}

impl AuditInfo {
    /// Record a modification
    pub fn stamp(&mut self, by: impl Into<String>, at: DateTime<Utc>) {
        self.last_modified_by = Some(by.into());
        self.last_modified_time = Some(at);
    }

    /// Last modifier, if the entity was ever saved
    pub fn last_modified_by(&self) -> Option<&str> {
        self.last_modified_by.as_deref()
    }

    /// Time of the last modification
    ///
    /// Entities that were never saved report the Unix epoch.
    pub fn last_modified_time(&self) -> DateTime<Utc> {
        self.last_modified_time.unwrap_or(DateTime::UNIX_EPOCH)
    }
}
