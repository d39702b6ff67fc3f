// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Pre-resolved list windows and time intervals

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest number of records a single list call returns
pub const MAX_LIMIT: usize = 500;

/// Sort direction applied to a list's natural key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Asc,
    /// Largest first
    Desc,
}

/// Window and ordering of a list request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    /// Records to skip
    pub offset: usize,
    /// Records to return, capped at [`MAX_LIMIT`]
    pub limit: Option<usize>,
    /// Requested ordering; `None` keeps the archivist's natural order
    pub sort: Option<SortDirection>,
}

impl ListQuery {
    /// Effective limit after capping
    pub fn effective_limit(&self) -> usize {
        self.limit.unwrap_or(MAX_LIMIT).min(MAX_LIMIT)
    }

    /// Apply the window to records already in ascending order
    pub fn window<T>(&self, mut records: Vec<T>) -> Vec<T> {
        if self.sort == Some(SortDirection::Desc) {
            records.reverse();
        }
        records
            .into_iter()
            .skip(self.offset)
            .take(self.effective_limit())
            .collect()
    }
}

/// Open time interval in ISO 8601 `<start>/<end>` notation
///
/// Both ends are RFC 3339 timestamps and excluded from the interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Interval {
    /// Interval between `start` and `end`, or `None` if `end` is not after `start`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Whether `time` lies strictly inside the interval
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.start < time && time < self.end
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| format!("invalid interval '{s}': {reason}");
        let (start, end) = s
            .split_once('/')
            .ok_or_else(|| invalid("expected <start>/<end>"))?;
        let parse = |value: &str| {
            DateTime::parse_from_rfc3339(value.trim())
                .map(|time| time.with_timezone(&Utc))
                .map_err(|e| invalid(&e.to_string()))
        };
        Self::new(parse(start)?, parse(end)?).ok_or_else(|| invalid("end must be after start"))
    }
}
