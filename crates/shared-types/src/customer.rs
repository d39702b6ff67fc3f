// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Customer entity

use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use pipeline::Audited;
use uuid::Uuid;

use crate::{audit::AuditInfo, keys::CustomerNumber};

/// A bank customer identified by a ten-digit number
#[derive(Debug, Clone)]
pub struct Customer {
    /// Technical id, never exposed
    pub tid: Uuid,
    /// Business key
    pub number: CustomerNumber,
    /// First name
    pub first_name: String,
    /// Middle name, may be empty
    pub middle_name: String,
    /// Surname
    pub surname: String,
    /// Last modification
    pub audit: AuditInfo,
}

impl Customer {
    /// Create an unsaved customer
    pub fn new(
        number: CustomerNumber,
        first_name: impl Into<String>,
        middle_name: impl Into<String>,
        surname: impl Into<String>,
    ) -> Self {
        Self {
            tid: Uuid::new_v4(),
            number,
            first_name: first_name.into(),
            middle_name: middle_name.into(),
            surname: surname.into(),
            audit: AuditInfo::default(),
        }
    }
}

impl PartialEq for Customer {
    fn eq(&self, other: &Self) -> bool {
        self.number == other.number
            && self.first_name == other.first_name
            && self.middle_name == other.middle_name
            && self.surname == other.surname
    }
}

impl Eq for Customer {}

impl Hash for Customer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.number.hash(state);
        self.first_name.hash(state);
        self.middle_name.hash(state);
        self.surname.hash(state);
    }
}

impl Audited for Customer {
    fn last_modified_time(&self) -> Option<DateTime<Utc>> {
        Some(self.audit.last_modified_time())
    }
}
